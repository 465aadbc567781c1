use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use wd_types::{
    Account, AccountBalance, AddressAssetPresence, AddressFlag, AssetPageResponse, AssetStandard,
    ConnectedSite, Keyring, PriceMap, VersionInfo, WalletAddress, WalletConfig,
};
use wd_wallet_client::WalletService;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8080";

/// JSON-over-HTTP client for the wallet service bridge.
///
/// Reads `WALLET_SERVICE_URL` from environment when no endpoint is given
/// (default: `http://localhost:8080`).
pub struct HttpWalletService {
    endpoint: String,
    http: reqwest::Client,
}

impl HttpWalletService {
    pub fn new(endpoint: Option<String>, timeout: Duration) -> Result<Self> {
        let endpoint = endpoint
            .or_else(|| std::env::var("WALLET_SERVICE_URL").ok())
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("wallet-http client build")?;
        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, op: &str) -> Result<T> {
        let response = self
            .http
            .get(self.url(path))
            .send()
            .await
            .with_context(|| format!("wallet-http {op} transport"))?;
        decode(response, op).await
    }

    async fn send_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &B,
        op: &str,
    ) -> Result<T> {
        let response = self
            .http
            .request(method, self.url(path))
            .json(body)
            .send()
            .await
            .with_context(|| format!("wallet-http {op} transport"))?;
        decode(response, op).await
    }
}

// ── Wallet service bridge types ──────────────────────────────────────

#[derive(Debug, Serialize)]
struct PriceRequest<'a> {
    tickers: &'a [String],
}

#[derive(Debug, Deserialize)]
struct PriceResponse {
    #[serde(default)]
    prices: PriceMap,
}

#[derive(Debug, Serialize)]
struct AddFlagRequest<'a> {
    account: &'a Account,
    flag: AddressFlag,
}

#[derive(Debug, Serialize, Deserialize)]
struct SafeNoticeBody {
    show: bool,
}

#[derive(Debug, Deserialize)]
struct SafeBalanceResponse {
    safe_sats: u64,
}

#[derive(Debug, Serialize)]
struct SkipVersionRequest<'a> {
    version: &'a str,
}

#[derive(Debug, Deserialize)]
struct BtcPriceResponse {
    usd: f64,
}

#[derive(Debug, Deserialize)]
struct ServiceErrorResponse {
    error: String,
}

#[derive(Debug, Deserialize)]
struct Empty {}

async fn decode<T: DeserializeOwned>(response: reqwest::Response, op: &str) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        if let Ok(err) = serde_json::from_str::<ServiceErrorResponse>(&text) {
            anyhow::bail!("wallet-http {op} HTTP {status}: {}", err.error);
        }
        anyhow::bail!("wallet-http {op} HTTP {status}: {text}");
    }

    response
        .json()
        .await
        .with_context(|| format!("wallet-http {op} parse"))
}

#[async_trait]
impl WalletService for HttpWalletService {
    async fn get_asset_page(
        &self,
        address: &WalletAddress,
        standard: AssetStandard,
        page: u32,
        page_size: u32,
    ) -> Result<AssetPageResponse> {
        let path = format!(
            "/v1/address/{}/assets/{}?page={page}&page_size={page_size}",
            address,
            standard.as_str()
        );
        self.get_json(&path, "get_asset_page").await
    }

    async fn get_price_overlay(&self, standard: AssetStandard, tickers: &[String]) -> Result<PriceMap> {
        let path = format!("/v1/prices/{}", standard.as_str());
        let response: PriceResponse = self
            .send_json(reqwest::Method::POST, &path, &PriceRequest { tickers }, "get_price_overlay")
            .await?;
        Ok(response.prices)
    }

    async fn add_address_flag(&self, account: &Account, flag: AddressFlag) -> Result<Account> {
        let path = format!("/v1/address/{}/flags", account.address);
        self.send_json(
            reqwest::Method::POST,
            &path,
            &AddFlagRequest { account, flag },
            "add_address_flag",
        )
        .await
    }

    async fn get_show_safe_notice(&self) -> Result<bool> {
        let body: SafeNoticeBody = self
            .get_json("/v1/settings/safe-notice", "get_show_safe_notice")
            .await?;
        Ok(body.show)
    }

    async fn set_show_safe_notice(&self, show: bool) -> Result<()> {
        let _: Empty = self
            .send_json(
                reqwest::Method::PUT,
                "/v1/settings/safe-notice",
                &SafeNoticeBody { show },
                "set_show_safe_notice",
            )
            .await?;
        Ok(())
    }

    async fn fetch_unspent_outputs(&self, account: &Account) -> Result<()> {
        let path = format!("/v1/address/{}/utxos/refresh", account.address);
        let _: Empty = self
            .send_json(reqwest::Method::POST, &path, &serde_json::json!({}), "fetch_unspent_outputs")
            .await?;
        Ok(())
    }

    async fn get_connected_site_status(&self, tab_id: i64) -> Result<Option<ConnectedSite>> {
        let response = self
            .http
            .get(self.url(&format!("/v1/sites/{tab_id}")))
            .send()
            .await
            .context("wallet-http get_connected_site_status transport")?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            // No site is bound to this tab
            debug!(tab_id, "no connected site");
            return Ok(None);
        }

        decode(response, "get_connected_site_status").await.map(Some)
    }

    async fn get_account_balance(&self, address: &WalletAddress) -> Result<AccountBalance> {
        self.get_json(&format!("/v1/address/{address}/balance"), "get_account_balance")
            .await
    }

    async fn get_safe_balance(&self, address: &WalletAddress) -> Result<u64> {
        let body: SafeBalanceResponse = self
            .get_json(&format!("/v1/address/{address}/balance/safe"), "get_safe_balance")
            .await?;
        Ok(body.safe_sats)
    }

    async fn get_address_summary(&self, address: &WalletAddress) -> Result<AddressAssetPresence> {
        self.get_json(&format!("/v1/address/{address}/summary"), "get_address_summary")
            .await
    }

    async fn get_wallet_config(&self) -> Result<WalletConfig> {
        self.get_json("/v1/settings/wallet-config", "get_wallet_config")
            .await
    }

    async fn get_version_info(&self) -> Result<VersionInfo> {
        self.get_json("/v1/settings/version", "get_version_info").await
    }

    async fn skip_version(&self, version: &str) -> Result<()> {
        let _: Empty = self
            .send_json(
                reqwest::Method::PUT,
                "/v1/settings/version/skip",
                &SkipVersionRequest { version },
                "skip_version",
            )
            .await?;
        Ok(())
    }

    async fn get_current_keyring(&self) -> Result<Option<Keyring>> {
        let response = self
            .http
            .get(self.url("/v1/keyrings/current"))
            .send()
            .await
            .context("wallet-http get_current_keyring transport")?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            debug!("wallet is locked, no current keyring");
            return Ok(None);
        }

        decode(response, "get_current_keyring").await.map(Some)
    }

    async fn get_btc_price(&self) -> Result<f64> {
        let body: BtcPriceResponse = self.get_json("/v1/prices/btc-usd", "get_btc_price").await?;
        Ok(body.usd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Json, Router,
        extract::{Path, Query},
        http::StatusCode,
        routing::{get, post, put},
    };
    use std::collections::HashMap;
    use wd_types::{FlagSet, TickerPrice, TokenBalance};

    async fn serve(app: Router) -> Result<HttpWalletService> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        HttpWalletService::new(Some(format!("http://{addr}/")), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn asset_page_forwards_pagination() -> Result<()> {
        let app = Router::new().route(
            "/v1/address/{address}/assets/{standard}",
            get(
                |Path((address, standard)): Path<(String, String)>,
                 Query(query): Query<HashMap<String, u32>>| async move {
                    let ticker = format!("{address}:{standard}:{}:{}", query["page"], query["page_size"]);
                    Json(AssetPageResponse {
                        items: vec![TokenBalance::new(ticker, "5")],
                        total: 42,
                    })
                },
            ),
        );
        let service = serve(app).await?;

        let page = service
            .get_asset_page(&WalletAddress::from("bc1qa"), AssetStandard::Brc20, 3, 20)
            .await?;

        assert_eq!(page.total, 42);
        assert_eq!(page.items[0].ticker, "bc1qa:brc20:3:20");
        Ok(())
    }

    #[tokio::test]
    async fn price_overlay_keeps_only_returned_tickers() -> Result<()> {
        let app = Router::new().route(
            "/v1/prices/{standard}",
            post(|Json(body): Json<serde_json::Value>| async move {
                assert_eq!(body["tickers"], serde_json::json!(["AAA", "BBB"]));
                Json(serde_json::json!({
                    "prices": { "AAA": { "cur_price": 1.5, "change_percent": -2.0 } }
                }))
            }),
        );
        let service = serve(app).await?;

        let prices = service
            .get_price_overlay(AssetStandard::Brc20, &["AAA".to_owned(), "BBB".to_owned()])
            .await?;

        assert_eq!(
            prices.get("AAA"),
            Some(&TickerPrice {
                cur_price: 1.5,
                change_percent: -2.0
            })
        );
        assert!(!prices.contains_key("BBB"));
        Ok(())
    }

    #[tokio::test]
    async fn add_flag_returns_service_record() -> Result<()> {
        let app = Router::new().route(
            "/v1/address/{address}/flags",
            post(|Json(body): Json<serde_json::Value>| async move {
                assert_eq!(body["flag"], "confirmed_utxo_mode");
                let mut account: Account = serde_json::from_value(body["account"].clone()).unwrap();
                account.flags = account.flags.with(AddressFlag::ConfirmedUtxoMode);
                Json(account)
            }),
        );
        let service = serve(app).await?;
        let account = Account::new("bc1qflag", "Account 1");

        let updated = service
            .add_address_flag(&account, AddressFlag::ConfirmedUtxoMode)
            .await?;

        assert_eq!(updated.flags, FlagSet::empty().with(AddressFlag::ConfirmedUtxoMode));
        assert_eq!(updated.display_name, "Account 1");
        Ok(())
    }

    #[tokio::test]
    async fn missing_site_is_not_an_error() -> Result<()> {
        let app = Router::new().route(
            "/v1/sites/{tab_id}",
            get(|Path(tab_id): Path<i64>| async move {
                if tab_id == 7 {
                    Ok(Json(ConnectedSite { is_connected: true }))
                } else {
                    Err(StatusCode::NOT_FOUND)
                }
            }),
        );
        let service = serve(app).await?;

        assert_eq!(
            service.get_connected_site_status(7).await?,
            Some(ConnectedSite { is_connected: true })
        );
        assert_eq!(service.get_connected_site_status(8).await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn service_errors_carry_message() -> Result<()> {
        let app = Router::new().route(
            "/v1/address/{address}/balance",
            get(|| async {
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(serde_json::json!({ "error": "indexer lagging" })),
                )
            }),
        );
        let service = serve(app).await?;

        let err = service
            .get_account_balance(&WalletAddress::from("bc1qerr"))
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("get_account_balance"), "{message}");
        assert!(message.contains("indexer lagging"), "{message}");
        Ok(())
    }

    #[tokio::test]
    async fn safe_notice_roundtrip() -> Result<()> {
        let app = Router::new().route(
            "/v1/settings/safe-notice",
            get(|| async { Json(serde_json::json!({ "show": true })) }).put(
                |Json(body): Json<serde_json::Value>| async move {
                    assert_eq!(body["show"], false);
                    Json(serde_json::json!({}))
                },
            ),
        );
        let service = serve(app).await?;

        assert!(service.get_show_safe_notice().await?);
        service.set_show_safe_notice(false).await?;
        Ok(())
    }

    #[tokio::test]
    async fn account_balance_is_a_decimal_amount() -> Result<()> {
        let app = Router::new().route(
            "/v1/address/{address}/balance",
            get(|| async { Json(serde_json::json!({ "amount": "0.00012345" })) }),
        );
        let service = serve(app).await?;

        let balance = service.get_account_balance(&WalletAddress::from("bc1qa")).await?;
        assert_eq!(balance.total_sats()?, 12_345);
        Ok(())
    }

    #[tokio::test]
    async fn home_settings_and_version_skip() -> Result<()> {
        let app = Router::new()
            .route(
                "/v1/settings/wallet-config",
                get(|| async { Json(serde_json::json!({ "chain_tip": "fees are high" })) }),
            )
            .route(
                "/v1/settings/version",
                get(|| async {
                    Json(serde_json::json!({
                        "current_version": "1.4.0",
                        "new_version": "1.5.0",
                        "skipped": false
                    }))
                }),
            )
            .route(
                "/v1/settings/version/skip",
                put(|Json(body): Json<serde_json::Value>| async move {
                    assert_eq!(body["version"], "1.5.0");
                    Json(serde_json::json!({}))
                }),
            )
            .route(
                "/v1/prices/btc-usd",
                get(|| async { Json(serde_json::json!({ "usd": 60000.0 })) }),
            );
        let service = serve(app).await?;

        let config = service.get_wallet_config().await?;
        assert_eq!(config.chain_tip, "fees are high");
        assert!(config.status_message.is_empty());

        let version = service.get_version_info().await?;
        assert_eq!(version.pending_upgrade(), Some("1.5.0"));
        service.skip_version("1.5.0").await?;

        assert_eq!(service.get_btc_price().await?, 60000.0);
        Ok(())
    }

    #[tokio::test]
    async fn locked_wallet_has_no_keyring() -> Result<()> {
        let unlocked = serve(Router::new().route(
            "/v1/keyrings/current",
            get(|| async { Json(serde_json::json!({ "alias_name": "HD Wallet #1" })) }),
        ))
        .await?;
        assert_eq!(
            unlocked.get_current_keyring().await?,
            Some(Keyring {
                alias_name: "HD Wallet #1".into()
            })
        );

        let locked = serve(Router::new().route(
            "/v1/keyrings/current",
            get(|| async { StatusCode::NOT_FOUND }),
        ))
        .await?;
        assert_eq!(locked.get_current_keyring().await?, None);
        Ok(())
    }
}
