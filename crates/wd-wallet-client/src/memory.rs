use anyhow::{Result, bail};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use wd_types::{
    Account, AccountBalance, AddressAssetPresence, AddressFlag, AssetPageResponse, AssetStandard,
    ConnectedSite, FlagSet, Keyring, PriceMap, TickerPrice, TokenBalance, VersionInfo, WalletAddress,
    WalletConfig,
};

use crate::WalletService;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    AssetPage,
    PriceOverlay,
    AddAddressFlag,
    GetShowSafeNotice,
    SetShowSafeNotice,
    FetchUnspentOutputs,
    ConnectedSiteStatus,
    AccountBalance,
    SafeBalance,
    AddressSummary,
    WalletConfig,
    VersionInfo,
    SkipVersion,
    CurrentKeyring,
    BtcPrice,
}

#[derive(Default)]
struct Inner {
    tokens: HashMap<(WalletAddress, AssetStandard), Vec<TokenBalance>>,
    prices: PriceMap,
    flags: HashMap<WalletAddress, FlagSet>,
    show_safe_notice: bool,
    balances: HashMap<WalletAddress, AccountBalance>,
    chain_safe_sats: HashMap<WalletAddress, u64>,
    refreshed_safe_sats: HashMap<WalletAddress, u64>,
    sites: HashMap<i64, ConnectedSite>,
    summaries: HashMap<WalletAddress, AddressAssetPresence>,
    wallet_config: WalletConfig,
    version: VersionInfo,
    keyring: Option<Keyring>,
    btc_price: f64,
    failing: HashSet<Operation>,
    calls: HashMap<Operation, usize>,
}

/// In-process wallet service with call counting and failure injection.
#[derive(Default)]
pub struct InMemoryWalletService {
    inner: RwLock<Inner>,
}

impl InMemoryWalletService {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_tokens(&self, address: &WalletAddress, standard: AssetStandard, tokens: Vec<TokenBalance>) {
        let mut guard = self.inner.write().await;
        guard.tokens.insert((address.clone(), standard), tokens);
    }

    pub async fn set_price(&self, ticker: &str, price: TickerPrice) {
        let mut guard = self.inner.write().await;
        guard.prices.insert(ticker.to_owned(), price);
    }

    pub async fn set_show_safe_notice_flag(&self, show: bool) {
        self.inner.write().await.show_safe_notice = show;
    }

    pub async fn set_account_balance(&self, address: &WalletAddress, total_sats: u64) {
        let mut guard = self.inner.write().await;
        guard.balances.insert(address.clone(), AccountBalance::from_sats(total_sats));
    }

    /// Stores the amount string verbatim, including ones that do not parse.
    pub async fn set_account_amount(&self, address: &WalletAddress, amount: &str) {
        let mut guard = self.inner.write().await;
        guard.balances.insert(
            address.clone(),
            AccountBalance {
                amount: amount.to_owned(),
            },
        );
    }

    /// Spendable balance the next unspent-output refresh will observe.
    pub async fn set_chain_safe_balance(&self, address: &WalletAddress, safe_sats: u64) {
        let mut guard = self.inner.write().await;
        guard.chain_safe_sats.insert(address.clone(), safe_sats);
    }

    pub async fn set_connected_site(&self, tab_id: i64, is_connected: bool) {
        let mut guard = self.inner.write().await;
        guard.sites.insert(tab_id, ConnectedSite { is_connected });
    }

    pub async fn set_address_summary(&self, presence: AddressAssetPresence) {
        let mut guard = self.inner.write().await;
        guard.summaries.insert(presence.address.clone(), presence);
    }

    pub async fn set_wallet_config(&self, config: WalletConfig) {
        self.inner.write().await.wallet_config = config;
    }

    pub async fn set_version_info(&self, version: VersionInfo) {
        self.inner.write().await.version = version;
    }

    pub async fn set_keyring(&self, alias_name: &str) {
        self.inner.write().await.keyring = Some(Keyring {
            alias_name: alias_name.to_owned(),
        });
    }

    pub async fn set_btc_price(&self, usd: f64) {
        self.inner.write().await.btc_price = usd;
    }

    pub async fn flags(&self, address: &WalletAddress) -> FlagSet {
        let guard = self.inner.read().await;
        guard.flags.get(address).copied().unwrap_or_default()
    }

    pub async fn fail(&self, operation: Operation) {
        self.inner.write().await.failing.insert(operation);
    }

    pub async fn recover(&self, operation: Operation) {
        self.inner.write().await.failing.remove(&operation);
    }

    pub async fn calls(&self, operation: Operation) -> usize {
        let guard = self.inner.read().await;
        guard.calls.get(&operation).copied().unwrap_or(0)
    }

    async fn record(&self, operation: Operation) -> Result<()> {
        let mut guard = self.inner.write().await;
        *guard.calls.entry(operation).or_insert(0) += 1;
        if guard.failing.contains(&operation) {
            bail!("in-memory wallet service: {operation:?} unavailable");
        }
        Ok(())
    }
}

#[async_trait]
impl WalletService for InMemoryWalletService {
    async fn get_asset_page(
        &self,
        address: &WalletAddress,
        standard: AssetStandard,
        page: u32,
        page_size: u32,
    ) -> Result<AssetPageResponse> {
        self.record(Operation::AssetPage).await?;
        if page == 0 || page_size == 0 {
            bail!("page and page_size must be positive");
        }

        let guard = self.inner.read().await;
        let all = guard
            .tokens
            .get(&(address.clone(), standard))
            .map(Vec::as_slice)
            .unwrap_or_default();

        let start = (page as usize - 1).saturating_mul(page_size as usize);
        let items = all
            .iter()
            .skip(start)
            .take(page_size as usize)
            .cloned()
            .collect();

        Ok(AssetPageResponse {
            items,
            total: all.len() as u64,
        })
    }

    async fn get_price_overlay(&self, _standard: AssetStandard, tickers: &[String]) -> Result<PriceMap> {
        self.record(Operation::PriceOverlay).await?;
        let guard = self.inner.read().await;
        Ok(tickers
            .iter()
            .filter_map(|ticker| guard.prices.get(ticker).map(|price| (ticker.clone(), *price)))
            .collect())
    }

    async fn add_address_flag(&self, account: &Account, flag: AddressFlag) -> Result<Account> {
        self.record(Operation::AddAddressFlag).await?;
        let mut guard = self.inner.write().await;
        let stored = guard.flags.entry(account.address.clone()).or_insert(account.flags);
        *stored = account.flags.union(*stored).with(flag);
        Ok(Account {
            flags: *stored,
            ..account.clone()
        })
    }

    async fn get_show_safe_notice(&self) -> Result<bool> {
        self.record(Operation::GetShowSafeNotice).await?;
        Ok(self.inner.read().await.show_safe_notice)
    }

    async fn set_show_safe_notice(&self, show: bool) -> Result<()> {
        self.record(Operation::SetShowSafeNotice).await?;
        self.inner.write().await.show_safe_notice = show;
        Ok(())
    }

    async fn fetch_unspent_outputs(&self, account: &Account) -> Result<()> {
        self.record(Operation::FetchUnspentOutputs).await?;
        let mut guard = self.inner.write().await;
        let safe = guard.chain_safe_sats.get(&account.address).copied().unwrap_or(0);
        guard.refreshed_safe_sats.insert(account.address.clone(), safe);
        Ok(())
    }

    async fn get_connected_site_status(&self, tab_id: i64) -> Result<Option<ConnectedSite>> {
        self.record(Operation::ConnectedSiteStatus).await?;
        Ok(self.inner.read().await.sites.get(&tab_id).copied())
    }

    async fn get_account_balance(&self, address: &WalletAddress) -> Result<AccountBalance> {
        self.record(Operation::AccountBalance).await?;
        let guard = self.inner.read().await;
        Ok(guard
            .balances
            .get(address)
            .cloned()
            .unwrap_or_else(|| AccountBalance::from_sats(0)))
    }

    async fn get_safe_balance(&self, address: &WalletAddress) -> Result<u64> {
        self.record(Operation::SafeBalance).await?;
        let guard = self.inner.read().await;
        Ok(guard.refreshed_safe_sats.get(address).copied().unwrap_or(0))
    }

    async fn get_address_summary(&self, address: &WalletAddress) -> Result<AddressAssetPresence> {
        self.record(Operation::AddressSummary).await?;
        let guard = self.inner.read().await;
        Ok(guard
            .summaries
            .get(address)
            .cloned()
            .unwrap_or_else(|| AddressAssetPresence {
                address: address.clone(),
                arc20_count: 0,
                runes_count: 0,
            }))
    }

    async fn get_wallet_config(&self) -> Result<WalletConfig> {
        self.record(Operation::WalletConfig).await?;
        Ok(self.inner.read().await.wallet_config.clone())
    }

    async fn get_version_info(&self) -> Result<VersionInfo> {
        self.record(Operation::VersionInfo).await?;
        Ok(self.inner.read().await.version.clone())
    }

    async fn skip_version(&self, version: &str) -> Result<()> {
        self.record(Operation::SkipVersion).await?;
        let mut guard = self.inner.write().await;
        if guard.version.new_version.as_deref() == Some(version) {
            guard.version.skipped = true;
        }
        Ok(())
    }

    async fn get_current_keyring(&self) -> Result<Option<Keyring>> {
        self.record(Operation::CurrentKeyring).await?;
        Ok(self.inner.read().await.keyring.clone())
    }

    async fn get_btc_price(&self) -> Result<f64> {
        self.record(Operation::BtcPrice).await?;
        Ok(self.inner.read().await.btc_price)
    }
}
