use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

mod amount;
mod chain;
mod flags;

pub use amount::{AmountError, SATS_PER_BTC, amount_to_satoshis, satoshis_to_amount};
pub use chain::{AssetStandard, ChainCapabilities, ChainType};
pub use flags::{AddressFlag, FlagSet};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct WalletAddress(pub String);

impl WalletAddress {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WalletAddress {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// An account record. Identity is `address`; a flag change produces a new record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Account {
    pub address: WalletAddress,
    #[serde(default)]
    pub flags: FlagSet,
    #[serde(default)]
    pub display_name: String,
}

impl Account {
    pub fn new(address: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            address: WalletAddress(address.into()),
            flags: FlagSet::empty(),
            display_name: display_name.into(),
        }
    }

    pub fn has_flag(&self, flag: AddressFlag) -> bool {
        self.flags.contains(flag)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenBalance {
    pub ticker: String,
    pub amount: String,
    #[serde(default)]
    pub decimals: Option<u8>,
    /// Standard-specific fields (transferable amount, rune id, inscription id...).
    #[serde(default, flatten)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

impl TokenBalance {
    pub fn new(ticker: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            amount: amount.into(),
            decimals: None,
            details: serde_json::Map::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TickerPrice {
    pub cur_price: f64,
    #[serde(default)]
    pub change_percent: f64,
}

pub type PriceMap = HashMap<String, TickerPrice>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssetPageResponse {
    pub items: Vec<TokenBalance>,
    pub total: u64,
}

/// Balance of an account as the wallet service reports it: a decimal BTC amount.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountBalance {
    pub amount: String,
}

impl AccountBalance {
    pub fn from_sats(sats: u64) -> Self {
        Self {
            amount: satoshis_to_amount(sats),
        }
    }

    pub fn total_sats(&self) -> Result<u64, AmountError> {
        amount_to_satoshis(&self.amount)
    }
}

/// Wallet-wide banner settings; either field may be blank.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct WalletConfig {
    #[serde(default)]
    pub chain_tip: String,
    #[serde(default)]
    pub status_message: String,
}

impl WalletConfig {
    pub fn has_banner(&self) -> bool {
        !self.chain_tip.trim().is_empty() || !self.status_message.trim().is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct VersionInfo {
    #[serde(default)]
    pub current_version: String,
    #[serde(default)]
    pub new_version: Option<String>,
    /// Set once the user dismissed the upgrade prompt for `new_version`.
    #[serde(default)]
    pub skipped: bool,
}

impl VersionInfo {
    /// The version to offer, unless there is none or the user skipped it.
    pub fn pending_upgrade(&self) -> Option<&str> {
        match &self.new_version {
            Some(version) if !self.skipped && !version.is_empty() => Some(version),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Keyring {
    pub alias_name: String,
}

/// Counts of higher-risk assets detected on an address.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AddressAssetPresence {
    pub address: WalletAddress,
    /// Secondary smart-asset protocol holdings.
    #[serde(default)]
    pub arc20_count: u64,
    /// Native multi-asset protocol holdings.
    #[serde(default)]
    pub runes_count: u64,
}

impl AddressAssetPresence {
    pub fn has_risky_assets(&self) -> bool {
        self.arc20_count > 0 || self.runes_count > 0
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConnectedSite {
    pub is_connected: bool,
}

/// Abbreviates long strings as `head...tail`, keeping `len` characters on each side.
pub fn short_address(value: &str, len: usize) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= len * 2 {
        return value.to_owned();
    }
    let head: String = chars[..len].iter().collect();
    let tail: String = chars[chars.len() - len..].iter().collect();
    format!("{head}...{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_address_keeps_short_values() {
        assert_eq!(short_address("bc1qxyz", 4), "bc1qxyz");
        assert_eq!(short_address("Account 1", 8), "Account 1");
    }

    #[test]
    fn short_address_abbreviates() {
        assert_eq!(
            short_address("bc1p5d7rjq7g6rdk2yhzks9smlaqtedr4dekq08ge8", 4),
            "bc1p...8ge8"
        );
    }

    #[test]
    fn token_balance_keeps_standard_specific_fields() {
        let raw = r#"{"ticker":"ordi","amount":"10","transferable":"2","decimals":18}"#;
        let token: TokenBalance = serde_json::from_str(raw).unwrap();
        assert_eq!(token.ticker, "ordi");
        assert_eq!(token.decimals, Some(18));
        assert_eq!(token.details.get("transferable"), Some(&serde_json::json!("2")));
    }

    #[test]
    fn account_balance_parses_decimal_amount() {
        let balance: AccountBalance = serde_json::from_str(r#"{"amount":"0.00012345"}"#).unwrap();
        assert_eq!(balance.total_sats(), Ok(12_345));
        assert_eq!(AccountBalance::from_sats(250_000_000).amount, "2.50000000");

        let broken = AccountBalance { amount: "lots".into() };
        assert!(matches!(broken.total_sats(), Err(AmountError::Malformed(_))));
    }

    #[test]
    fn banner_and_upgrade_visibility() {
        assert!(!WalletConfig::default().has_banner());
        let config: WalletConfig = serde_json::from_str(r#"{"status_message":"maintenance"}"#).unwrap();
        assert!(config.has_banner());

        let mut version = VersionInfo {
            current_version: "1.4.0".into(),
            new_version: Some("1.5.0".into()),
            skipped: false,
        };
        assert_eq!(version.pending_upgrade(), Some("1.5.0"));
        version.skipped = true;
        assert_eq!(version.pending_upgrade(), None);
        assert_eq!(VersionInfo::default().pending_upgrade(), None);
    }

    #[test]
    fn presence_detects_either_asset_kind() {
        let mut presence = AddressAssetPresence {
            address: "bc1q".into(),
            arc20_count: 0,
            runes_count: 0,
        };
        assert!(!presence.has_risky_assets());
        presence.runes_count = 3;
        assert!(presence.has_risky_assets());
    }
}
