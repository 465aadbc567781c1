use anyhow::Result;
use async_trait::async_trait;
use wd_types::{
    Account, AccountBalance, AddressAssetPresence, AddressFlag, AssetPageResponse, AssetStandard,
    ConnectedSite, Keyring, PriceMap, VersionInfo, WalletAddress, WalletConfig,
};

mod memory;

pub use memory::{InMemoryWalletService, Operation};

/// The wallet service that owns keys, chain access and persisted settings.
///
/// Every method is a suspension point for the dashboard; nothing else awaits.
#[async_trait]
pub trait WalletService: Send + Sync {
    /// One page (1-based) of an address's holdings for a standard.
    async fn get_asset_page(
        &self,
        address: &WalletAddress,
        standard: AssetStandard,
        page: u32,
        page_size: u32,
    ) -> Result<AssetPageResponse>;

    /// Prices keyed by ticker. Tickers without a price are simply absent.
    async fn get_price_overlay(&self, standard: AssetStandard, tickers: &[String]) -> Result<PriceMap>;

    /// Persists `flag` on the account and returns the updated record.
    async fn add_address_flag(&self, account: &Account, flag: AddressFlag) -> Result<Account>;

    async fn get_show_safe_notice(&self) -> Result<bool>;

    async fn set_show_safe_notice(&self, show: bool) -> Result<()>;

    /// Refreshes the unspent outputs of the account; read the result back with
    /// [`WalletService::get_safe_balance`].
    async fn fetch_unspent_outputs(&self, account: &Account) -> Result<()>;

    async fn get_connected_site_status(&self, tab_id: i64) -> Result<Option<ConnectedSite>>;

    /// Total balance as a decimal BTC amount.
    async fn get_account_balance(&self, address: &WalletAddress) -> Result<AccountBalance>;

    /// Spendable satoshis as of the last unspent-output refresh.
    async fn get_safe_balance(&self, address: &WalletAddress) -> Result<u64>;

    async fn get_address_summary(&self, address: &WalletAddress) -> Result<AddressAssetPresence>;

    async fn get_wallet_config(&self) -> Result<WalletConfig>;

    async fn get_version_info(&self) -> Result<VersionInfo>;

    /// Stops offering `version` as an upgrade.
    async fn skip_version(&self, version: &str) -> Result<()>;

    /// The keyring holding the current account, if one is unlocked.
    async fn get_current_keyring(&self) -> Result<Option<Keyring>>;

    /// USD per whole BTC.
    async fn get_btc_price(&self) -> Result<f64>;
}
