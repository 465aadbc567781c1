//! Home dashboard state for a Bitcoin asset wallet: paged holdings per asset
//! standard, price overlays, balance reconciliation and the automatic switch
//! into confirmed-UTXO mode.

pub mod auto_switch;
pub mod balance;
pub mod catalog;
pub mod config;
mod dashboard;
pub mod error;
pub mod flags;
pub mod home;
pub mod notice;
pub mod price;
pub mod tabs;
pub mod tokens;

pub use auto_switch::{AutoModeSwitchPolicy, SwitchEffect, SwitchState};
pub use balance::{BalanceDisplay, BalanceReconciler, BalanceSummary, UtxoFetchState};
pub use catalog::{AssetCatalogPaginator, AssetPage, CatalogView, Pagination};
pub use config::DashboardConfig;
pub use dashboard::{Dashboard, DashboardSnapshot};
pub use error::{DashboardError, Result};
pub use flags::AddressFlagStore;
pub use home::{HistoryTarget, HomeStatus};
pub use notice::{Notice, NoticeKind};
pub use price::{PriceOverlay, PriceOverlayFetcher};
pub use tabs::AssetTabSelector;
