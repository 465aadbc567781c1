use serde::Deserialize;
use std::num::NonZeroUsize;
use std::time::Duration;
use wd_types::ChainType;

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    /// Wallet service bridge base URL
    #[serde(default = "default_wallet_service_url")]
    pub wallet_service_url: String,

    /// Per-request timeout for wallet service calls
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Asset catalog page size
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,

    /// Addresses tracked by the unspent-output refresh cache
    #[serde(default = "default_utxo_cache_capacity")]
    pub utxo_cache_capacity: usize,

    /// Chain selected at startup
    #[serde(default = "default_chain")]
    pub chain: ChainType,
}

fn default_wallet_service_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_request_timeout_secs() -> u64 {
    15
}

fn default_page_size() -> u32 {
    100
}

fn default_utxo_cache_capacity() -> usize {
    256
}

fn default_chain() -> ChainType {
    ChainType::BitcoinMainnet
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            wallet_service_url: default_wallet_service_url(),
            request_timeout_secs: default_request_timeout_secs(),
            default_page_size: default_page_size(),
            utxo_cache_capacity: default_utxo_cache_capacity(),
            chain: default_chain(),
        }
    }
}

impl DashboardConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            wallet_service_url: lookup("WALLET_SERVICE_URL")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(default_wallet_service_url),
            request_timeout_secs: lookup("WALLET_SERVICE_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or_else(default_request_timeout_secs),
            default_page_size: lookup("DASHBOARD_PAGE_SIZE")
                .and_then(|s| s.parse().ok())
                .filter(|size| *size > 0)
                .unwrap_or_else(default_page_size),
            utxo_cache_capacity: lookup("DASHBOARD_UTXO_CACHE_CAPACITY")
                .and_then(|s| s.parse().ok())
                .filter(|cap| *cap > 0)
                .unwrap_or_else(default_utxo_cache_capacity),
            chain: lookup("DASHBOARD_CHAIN")
                .and_then(|s| ChainType::parse(&s))
                .unwrap_or_else(default_chain),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn utxo_capacity(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.utxo_cache_capacity).unwrap_or(NonZeroUsize::MIN)
    }

    pub fn page_size(&self) -> u32 {
        self.default_page_size.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = DashboardConfig::from_lookup(lookup(&[]));
        assert_eq!(config.wallet_service_url, "http://localhost:8080");
        assert_eq!(config.default_page_size, 100);
        assert_eq!(config.utxo_cache_capacity, 256);
        assert_eq!(config.chain, ChainType::BitcoinMainnet);
        assert_eq!(config.request_timeout(), Duration::from_secs(15));
    }

    #[test]
    fn reads_overrides_and_ignores_zero() {
        let config = DashboardConfig::from_lookup(lookup(&[
            ("WALLET_SERVICE_URL", "http://wallet.local:9000"),
            ("DASHBOARD_PAGE_SIZE", "0"),
            ("DASHBOARD_UTXO_CACHE_CAPACITY", "8"),
            ("DASHBOARD_CHAIN", "fractal_mainnet"),
        ]));
        assert_eq!(config.wallet_service_url, "http://wallet.local:9000");
        assert_eq!(config.default_page_size, 100);
        assert_eq!(config.utxo_capacity().get(), 8);
        assert_eq!(config.chain, ChainType::FractalMainnet);
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: DashboardConfig =
            serde_json::from_str(r#"{"chain":"bitcoin_signet","default_page_size":20}"#).unwrap();
        assert_eq!(config.chain, ChainType::BitcoinSignet);
        assert_eq!(config.default_page_size, 20);
        assert_eq!(config.request_timeout_secs, 15);
    }
}
