//! Session-scoped scheduler for the home dashboard.
//!
//! The components in this crate are plain state with pure transitions.
//! [`Dashboard`] owns them for one session, issues the wallet service calls
//! they ask for, and feeds results back. The state lock is never held
//! across a service call, so every call is a suspension point where other
//! work (an account switch, a page change) may interleave; request tokens
//! decide whether a late result still applies.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use wd_types::{
    Account, AddressAssetPresence, AddressFlag, AssetStandard, ChainCapabilities, ChainType,
    PriceMap, WalletAddress,
};
use wd_wallet_client::WalletService;

use crate::auto_switch::{AutoModeSwitchPolicy, SwitchEffect, SwitchState};
use crate::balance::{BalanceDisplay, BalanceReconciler, BalanceSummary, UtxoFetchState};
use crate::catalog::{AssetCatalogPaginator, AssetPage, CatalogOutcome, Pagination};
use crate::config::DashboardConfig;
use crate::error::{DashboardError, Result};
use crate::flags::AddressFlagStore;
use crate::home::{self, HistoryTarget, HomeStatus};
use crate::notice::{Notice, NoticeBoard, NoticeKind};
use crate::price::{PriceOverlay, PriceOverlayFetcher};
use crate::tabs::AssetTabSelector;
use crate::tokens::RequestTokens;

const CONFIRMED_MODE_NOTICE: &str =
    "Atomicals or Runes assets detected. Spending is now limited to confirmed UTXOs.";

struct DashboardState {
    accounts: AddressFlagStore,
    chain: ChainType,
    tabs: AssetTabSelector,
    balances: BalanceReconciler,
    /// Total satoshis of the address the balance was fetched for.
    account_balance: Option<(WalletAddress, u64)>,
    balance_tokens: RequestTokens,
    catalog: AssetCatalogPaginator,
    prices: PriceOverlayFetcher,
    presence: Option<AddressAssetPresence>,
    presence_tokens: RequestTokens,
    auto_switch: AutoModeSwitchPolicy,
    home: HomeStatus,
    notices: NoticeBoard,
}

impl DashboardState {
    fn capabilities(&self) -> ChainCapabilities {
        self.chain.capabilities()
    }

    fn current_account(&self) -> Result<Account> {
        self.accounts
            .current()
            .cloned()
            .ok_or(DashboardError::NoActiveAccount)
    }

    /// Drops everything derived from the previous account or chain.
    fn invalidate_identity(&mut self) {
        self.catalog.reset();
        self.prices.invalidate();
        self.presence = None;
        self.presence_tokens.invalidate();
        self.account_balance = None;
        self.balance_tokens.invalidate();
    }

    fn balance_summary(&self) -> Option<BalanceSummary> {
        let account = self.accounts.current()?;
        let (address, total_sats) = self.account_balance.as_ref()?;
        if *address != account.address {
            return None;
        }
        Some(self.balances.summary(address, *total_sats))
    }
}

/// Everything the home screen renders, captured at one instant.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub account: Option<Account>,
    pub chain: ChainType,
    pub tabs: Vec<AssetStandard>,
    pub requested_tab: AssetStandard,
    pub active_tab: AssetStandard,
    pub headline: String,
    /// Headline balance in USD, on chains that show prices.
    pub fiat: Option<String>,
    pub balance: Option<BalanceDisplay>,
    pub page: AssetPage,
    pub prices: Option<PriceMap>,
    pub switch_state: SwitchState,
    pub home: HomeStatus,
    pub history: Option<HistoryTarget>,
    pub buy_enabled: bool,
}

pub struct Dashboard<W: ?Sized> {
    service: Arc<W>,
    state: Mutex<DashboardState>,
}

impl<W: WalletService + ?Sized> Dashboard<W> {
    pub fn new(service: Arc<W>, config: &DashboardConfig) -> Self {
        let state = DashboardState {
            accounts: AddressFlagStore::default(),
            chain: config.chain,
            tabs: AssetTabSelector::default(),
            balances: BalanceReconciler::new(config.utxo_capacity()),
            account_balance: None,
            balance_tokens: RequestTokens::default(),
            catalog: AssetCatalogPaginator::new(config.page_size()),
            prices: PriceOverlayFetcher::default(),
            presence: None,
            presence_tokens: RequestTokens::default(),
            auto_switch: AutoModeSwitchPolicy::default(),
            home: HomeStatus::default(),
            notices: NoticeBoard::default(),
        };

        Self {
            service,
            state: Mutex::new(state),
        }
    }

    // ── Selection ──

    /// Makes `account` current and refreshes what depends on it. Selecting the
    /// current address again only re-evaluates the auto-switch with its flags.
    pub async fn switch_account(&self, account: Account) {
        let changed = {
            let mut state = self.state.lock().await;
            let changed = state.accounts.select(account.clone());
            if changed {
                info!(address = %account.address, "switched account");
                state.invalidate_identity();
            }
            changed
        };

        if changed {
            self.refresh_if_active().await;
        } else {
            self.evaluate_auto_switch().await;
        }
    }

    pub async fn remove_account(&self, address: &WalletAddress) -> Option<Account> {
        let mut state = self.state.lock().await;
        let was_current = state
            .accounts
            .current()
            .is_some_and(|account| &account.address == address);
        let removed = state.accounts.remove(address);
        if was_current {
            state.invalidate_identity();
        }
        removed
    }

    pub async fn switch_chain(&self, chain: ChainType) {
        {
            let mut state = self.state.lock().await;
            if state.chain == chain {
                return;
            }
            info!(?chain, "switched chain");
            state.chain = chain;
            state.balances.clear();
            state.invalidate_identity();
        }
        self.refresh_if_active().await;
    }

    pub async fn select_tab(&self, tab: AssetStandard) {
        let changed = {
            let mut state = self.state.lock().await;
            let capabilities = state.capabilities();
            let before = state.tabs.effective(&capabilities);
            state.tabs.request(tab);
            let changed = state.tabs.effective(&capabilities) != before;
            if changed {
                state.catalog.reset();
                state.prices.invalidate();
            }
            changed
        };

        if changed {
            if let Err(err) = self.refresh_catalog().await {
                debug!(%err, "catalog refresh skipped");
            }
        }
    }

    pub async fn set_page(&self, page: u32, page_size: u32) -> Result<()> {
        let pagination = Pagination::new(page, page_size)?;
        self.state.lock().await.catalog.set_pagination(pagination);
        self.refresh_catalog().await
    }

    // ── Fetches ──

    /// Account balance, asset presence and the catalog page, concurrently.
    pub async fn refresh(&self) -> Result<()> {
        let (balance, presence, catalog) = tokio::join!(
            self.refresh_account_balance(),
            self.refresh_presence(),
            self.refresh_catalog(),
        );
        balance?;
        presence?;
        catalog
    }

    async fn refresh_if_active(&self) {
        if let Err(err) = self.refresh().await {
            debug!(%err, "refresh skipped");
        }
    }

    pub async fn refresh_account_balance(&self) -> Result<()> {
        let (token, address) = {
            let mut state = self.state.lock().await;
            let account = state.current_account()?;
            (state.balance_tokens.issue(), account.address)
        };

        let result = self.service.get_account_balance(&address).await;

        let mut state = self.state.lock().await;
        if !state.balance_tokens.is_current(token) {
            debug!(%address, "discarding stale account balance");
            return Ok(());
        }
        match result.and_then(|balance| Ok(balance.total_sats()?)) {
            Ok(total_sats) => state.account_balance = Some((address, total_sats)),
            Err(err) => {
                warn!(%address, error = %format!("{err:#}"), "account balance fetch failed");
                state.notices.error(format!("{err:#}"));
            }
        }
        Ok(())
    }

    /// Fetches the current page, then its prices when the chain shows prices
    /// and the page is not empty.
    pub async fn refresh_catalog(&self) -> Result<()> {
        let (token, query, capabilities) = {
            let mut state = self.state.lock().await;
            let account = state.current_account()?;
            let capabilities = state.capabilities();
            let standard = state.tabs.effective(&capabilities);
            state.prices.invalidate();
            let (token, query) = state.catalog.begin(&account.address, standard);
            (token, query, capabilities)
        };

        debug!(
            address = %query.address,
            standard = query.standard.as_str(),
            page = query.pagination.page,
            page_size = query.pagination.page_size,
            "fetching asset page"
        );
        let result = self
            .service
            .get_asset_page(
                &query.address,
                query.standard,
                query.pagination.page,
                query.pagination.page_size,
            )
            .await;

        let tickers = {
            let mut state = self.state.lock().await;
            let failure = result.as_ref().err().map(|err| format!("{err:#}"));
            match state.catalog.complete(token, &query, result) {
                CatalogOutcome::Stale => {
                    debug!(address = %query.address, "discarding stale asset page");
                    return Ok(());
                }
                CatalogOutcome::Failed => {
                    let message = failure.unwrap_or_default();
                    warn!(
                        address = %query.address,
                        standard = query.standard.as_str(),
                        error = %message,
                        "asset page fetch failed"
                    );
                    state.notices.error(message);
                    return Ok(());
                }
                CatalogOutcome::Applied { tickers } => {
                    if !PriceOverlayFetcher::wants_fetch(&capabilities, &tickers) {
                        return Ok(());
                    }
                    state.prices.arm(token);
                    tickers
                }
            }
        };

        let result = self.service.get_price_overlay(query.standard, &tickers).await;

        let mut state = self.state.lock().await;
        match result {
            Ok(prices) => {
                if !state.prices.apply(token, prices) {
                    debug!(address = %query.address, "discarding stale price overlay");
                }
            }
            Err(err) => {
                warn!(address = %query.address, error = %format!("{err:#}"), "price overlay fetch failed");
                if state.catalog.is_current(token) {
                    state.notices.error(format!("{err:#}"));
                }
            }
        }
        Ok(())
    }

    /// Refreshes unspent outputs of the current account at most once per
    /// session. Returns `true` if this call issued the fetch.
    ///
    /// A failure is logged and leaves the last known safe amount in place.
    pub async fn request_utxo_refresh(&self) -> Result<bool> {
        let (account, ticket) = {
            let mut state = self.state.lock().await;
            let account = state.current_account()?;
            match state.balances.begin_refresh(&account.address) {
                Some(ticket) => (account, ticket),
                None => return Ok(false),
            }
        };

        debug!(address = %account.address, "refreshing unspent outputs");
        let safe_sats = match self.load_safe_balance(&account).await {
            Ok(safe_sats) => Some(safe_sats),
            Err(err) => {
                warn!(address = %account.address, error = %format!("{err:#}"), "unspent output refresh failed");
                None
            }
        };

        let mut state = self.state.lock().await;
        if !state.balances.finish_refresh(ticket, safe_sats) {
            debug!(address = %account.address, "discarding unspent outputs from previous chain");
        }
        Ok(true)
    }

    async fn load_safe_balance(&self, account: &Account) -> anyhow::Result<u64> {
        self.service.fetch_unspent_outputs(account).await?;
        self.service.get_safe_balance(&account.address).await
    }

    pub async fn refresh_presence(&self) -> Result<()> {
        let (token, address) = {
            let mut state = self.state.lock().await;
            let account = state.current_account()?;
            (state.presence_tokens.issue(), account.address)
        };

        let result = self.service.get_address_summary(&address).await;

        {
            let mut state = self.state.lock().await;
            if !state.presence_tokens.is_current(token) {
                debug!(%address, "discarding stale asset presence");
                return Ok(());
            }
            match result {
                Ok(presence) => state.presence = Some(presence),
                Err(err) => {
                    warn!(%address, error = %format!("{err:#}"), "asset presence fetch failed");
                    state.notices.error(format!("{err:#}"));
                    return Ok(());
                }
            }
        }

        self.evaluate_auto_switch().await;
        Ok(())
    }

    /// Runs the auto-switch policy against the current account and the last
    /// presence, executing any flag mutation it asks for.
    pub async fn evaluate_auto_switch(&self) {
        let account = {
            let mut state = self.state.lock().await;
            let Some(account) = state.accounts.current().cloned() else {
                return;
            };
            let Some(presence) = state.presence.clone() else {
                return;
            };

            let mut enable = false;
            for effect in state.auto_switch.evaluate(&account, &presence) {
                match effect {
                    SwitchEffect::EnableConfirmedMode(_) => enable = true,
                    SwitchEffect::RaiseNotice(_) => state
                        .notices
                        .push(NoticeKind::ConfirmedModeEnabled, CONFIRMED_MODE_NOTICE),
                }
            }
            if !enable {
                return;
            }
            account
        };

        info!(address = %account.address, "enabling confirmed UTXO mode");
        let result = self
            .service
            .add_address_flag(&account, AddressFlag::ConfirmedUtxoMode)
            .await;

        let mut state = self.state.lock().await;
        match result {
            Ok(updated) => {
                state.auto_switch.confirm(&account.address);
                // The record may have changed while the call was out; only
                // the flags come from the service.
                state.accounts.merge_flags(&account.address, updated.flags);
            }
            Err(err) => {
                warn!(address = %account.address, error = %format!("{err:#}"), "enabling confirmed UTXO mode failed");
                state.auto_switch.abort(&account.address, account.flags);
                state
                    .notices
                    .error(format!("Failed to enable confirmed UTXO mode: {err:#}"));
            }
        }
    }

    /// Loads everything on the home screen that does not depend on the
    /// account: the safe-notice setting, the banner, a pending upgrade, the
    /// keyring name, the BTC price and, given the active browser tab, whether
    /// its site is connected.
    ///
    /// Each part fails on its own; a failure is logged and leaves that part
    /// as it was.
    pub async fn load_home_status(&self, tab_id: Option<i64>) {
        let site = async {
            match tab_id {
                Some(tab_id) => Some(self.service.get_connected_site_status(tab_id).await),
                None => None,
            }
        };
        let (show_safe_notice, config, version, keyring, btc_usd, site) = tokio::join!(
            self.service.get_show_safe_notice(),
            self.service.get_wallet_config(),
            self.service.get_version_info(),
            self.service.get_current_keyring(),
            self.service.get_btc_price(),
            site,
        );

        let mut state = self.state.lock().await;
        let home = &mut state.home;
        match show_safe_notice {
            Ok(show) => home.show_safe_notice = show,
            Err(err) => {
                warn!(error = %format!("{err:#}"), "safe notice setting unavailable");
                home.show_safe_notice = false;
            }
        }
        match config {
            Ok(config) => home.wallet_config = config,
            Err(err) => warn!(error = %format!("{err:#}"), "wallet config unavailable"),
        }
        match version {
            Ok(version) => home.upgrade_available = version.pending_upgrade().map(str::to_owned),
            Err(err) => warn!(error = %format!("{err:#}"), "version info unavailable"),
        }
        match keyring {
            Ok(keyring) => home.keyring_name = keyring.map(|keyring| keyring.alias_name),
            Err(err) => warn!(error = %format!("{err:#}"), "current keyring unavailable"),
        }
        match btc_usd {
            Ok(rate) => home.btc_usd = Some(rate),
            Err(err) => warn!(error = %format!("{err:#}"), "btc price unavailable"),
        }
        match site {
            Some(Ok(site)) => {
                if let Some(site) = site {
                    home.site_connected = site.is_connected;
                }
            }
            Some(Err(err)) => warn!(error = %format!("{err:#}"), "connected site lookup failed"),
            None => {}
        }
    }

    /// Hides the upgrade prompt and tells the wallet not to offer that
    /// version again.
    pub async fn dismiss_upgrade(&self) {
        let Some(version) = self.state.lock().await.home.upgrade_available.take() else {
            return;
        };
        info!(%version, "skipping upgrade");
        if let Err(err) = self.service.skip_version(&version).await {
            warn!(%version, error = %format!("{err:#}"), "persisting skipped version failed");
            self.state.lock().await.notices.error(format!("{err:#}"));
        }
    }

    pub async fn dismiss_safe_notice(&self) {
        self.state.lock().await.home.show_safe_notice = false;
        if let Err(err) = self.service.set_show_safe_notice(false).await {
            warn!(error = %format!("{err:#}"), "persisting safe notice dismissal failed");
            self.state.lock().await.notices.error(format!("{err:#}"));
        }
    }

    // ── Reads ──

    pub async fn current_account(&self) -> Option<Account> {
        self.state.lock().await.accounts.current().cloned()
    }

    pub async fn chain(&self) -> ChainType {
        self.state.lock().await.chain
    }

    pub async fn requested_tab(&self) -> AssetStandard {
        self.state.lock().await.tabs.requested()
    }

    pub async fn active_tab(&self) -> AssetStandard {
        let state = self.state.lock().await;
        state.tabs.effective(&state.capabilities())
    }

    pub async fn asset_page(&self) -> AssetPage {
        self.state.lock().await.catalog.page().clone()
    }

    pub async fn price_overlay(&self) -> PriceOverlay {
        self.state.lock().await.prices.overlay().clone()
    }

    pub async fn balance_summary(&self) -> Option<BalanceSummary> {
        self.state.lock().await.balance_summary()
    }

    pub async fn utxo_state(&self) -> Option<UtxoFetchState> {
        let state = self.state.lock().await;
        let account = state.accounts.current()?;
        state.balances.state(&account.address)
    }

    pub async fn is_utxo_loading(&self) -> bool {
        self.utxo_state().await == Some(UtxoFetchState::Loading)
    }

    pub async fn switch_state(&self) -> SwitchState {
        let state = self.state.lock().await;
        match state.accounts.current() {
            Some(account) => state.auto_switch.state(&account.address),
            None => SwitchState::Unrestricted,
        }
    }

    pub async fn home_status(&self) -> HomeStatus {
        self.state.lock().await.home.clone()
    }

    pub async fn drain_notices(&self) -> Vec<Notice> {
        self.state.lock().await.notices.drain()
    }

    pub async fn snapshot(&self) -> DashboardSnapshot {
        let state = self.state.lock().await;
        let capabilities = state.capabilities();
        let account = state.accounts.current().cloned();
        let summary = state.balance_summary();

        let headline = match summary {
            Some(summary) => home::balance_headline(summary.total_sats()),
            None => home::NO_BALANCE.to_owned(),
        };
        let fiat = summary
            .and_then(|summary| home::fiat_line(summary.total_sats(), state.home.btc_usd, &capabilities));
        let balance = match (&account, summary) {
            (Some(account), Some(summary)) => {
                Some(state.balances.display(&account.address, summary.total_sats()))
            }
            _ => None,
        };

        DashboardSnapshot {
            history: account
                .as_ref()
                .map(|account| home::history_target(&capabilities, &account.address)),
            switch_state: account
                .as_ref()
                .map(|account| state.auto_switch.state(&account.address))
                .unwrap_or_default(),
            account,
            chain: state.chain,
            tabs: AssetTabSelector::tabs(&capabilities).to_vec(),
            requested_tab: state.tabs.requested(),
            active_tab: state.tabs.effective(&capabilities),
            headline,
            fiat,
            balance,
            page: state.catalog.page().clone(),
            prices: state.prices.visible(&capabilities).cloned(),
            home: state.home.clone(),
            buy_enabled: capabilities.buy_enabled(),
        }
    }
}
