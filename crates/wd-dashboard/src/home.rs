//! Home screen details around the balance and asset tabs.

use serde::Serialize;
use wd_types::{ChainCapabilities, SATS_PER_BTC, WalletAddress, WalletConfig, satoshis_to_amount};

pub const NO_BALANCE: &str = "--";

/// Headline amount; a zero balance is shown as `--`.
pub fn balance_headline(total_sats: u64) -> String {
    if total_sats == 0 {
        NO_BALANCE.to_owned()
    } else {
        satoshis_to_amount(total_sats)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryTarget {
    InApp,
    External(String),
}

pub fn history_target(capabilities: &ChainCapabilities, address: &WalletAddress) -> HistoryTarget {
    if capabilities.view_tx_history_internally {
        HistoryTarget::InApp
    } else {
        HistoryTarget::External(format!("{}/address/{}", capabilities.explorer_url, address))
    }
}

/// USD value of the headline balance, on chains that show prices.
///
/// Nothing is shown for a zero balance or before the rate is known.
pub fn fiat_line(total_sats: u64, usd_per_btc: Option<f64>, capabilities: &ChainCapabilities) -> Option<String> {
    if !capabilities.show_price || total_sats == 0 {
        return None;
    }
    let rate = usd_per_btc.filter(|rate| rate.is_finite() && *rate > 0.0)?;
    let usd = total_sats as f64 / SATS_PER_BTC as f64 * rate;
    Some(format!("${usd:.2}"))
}

/// Everything on the home screen that does not depend on the current account.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HomeStatus {
    pub show_safe_notice: bool,
    pub site_connected: bool,
    pub wallet_config: WalletConfig,
    /// Version offered for upgrade, unless the user skipped it.
    pub upgrade_available: Option<String>,
    pub keyring_name: Option<String>,
    pub btc_usd: Option<f64>,
}


#[cfg(test)]
mod tests {
    use super::*;
    use wd_types::ChainType;

    #[test]
    fn zero_balance_shows_placeholder() {
        assert_eq!(balance_headline(0), NO_BALANCE);
        assert_eq!(balance_headline(546), "0.00000546");
    }

    #[test]
    fn history_opens_explorer_unless_in_app() {
        let address = WalletAddress::from("bc1qhist");
        assert_eq!(
            history_target(&ChainType::BitcoinMainnet.capabilities(), &address),
            HistoryTarget::External("https://mempool.space/address/bc1qhist".to_owned())
        );
        assert_eq!(
            history_target(&ChainType::FractalMainnet.capabilities(), &address),
            HistoryTarget::InApp
        );
    }

    #[test]
    fn fiat_line_needs_price_chain_rate_and_balance() {
        let mainnet = ChainType::BitcoinMainnet.capabilities();
        assert_eq!(fiat_line(150_000_000, Some(60_000.0), &mainnet), Some("$90000.00".to_owned()));
        assert_eq!(fiat_line(1_000, Some(60_000.0), &mainnet), Some("$0.60".to_owned()));
        assert_eq!(fiat_line(0, Some(60_000.0), &mainnet), None);
        assert_eq!(fiat_line(1_000, None, &mainnet), None);
        assert_eq!(fiat_line(1_000, Some(0.0), &mainnet), None);

        let signet = ChainType::BitcoinSignet.capabilities();
        assert!(!signet.show_price);
        assert_eq!(fiat_line(1_000, Some(60_000.0), &signet), None);
    }
}
