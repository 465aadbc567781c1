//! Available / unavailable / total balance reconciliation.
//!
//! The total is authoritative as soon as the account balance is known. The
//! spendable ("safe") part needs an unspent-output refresh, which is issued
//! at most once per address: concurrent triggers collapse into the one in
//! flight, and a completed refresh is never repeated. A failed refresh is
//! recorded as [`UtxoFetchState::Failed`] and may be retried by a later
//! trigger; the previously known safe amount is kept.
//!
//! Only settled entries live in the bounded cache. Refreshes in flight are
//! tracked separately and cannot be evicted, so an address never has two.

use lru::LruCache;
use serde::Serialize;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use wd_types::{WalletAddress, satoshis_to_amount};

pub const LOADING_LABEL: &str = "loading...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UtxoFetchState {
    Loading,
    Loaded,
    Failed,
}

/// A settled refresh; `state` is never `Loading` here.
#[derive(Debug, Clone, Copy)]
struct UtxoEntry {
    state: UtxoFetchState,
    safe_sats: Option<u64>,
}

/// Proof that a refresh was started; hand it back to [`BalanceReconciler::finish_refresh`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTicket {
    address: WalletAddress,
    epoch: u64,
}

/// `safe_sats <= total_sats` holds for every constructed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BalanceSummary {
    total_sats: u64,
    safe_sats: u64,
}

impl BalanceSummary {
    /// A stale safe amount larger than the total is clamped to the total.
    pub fn new(total_sats: u64, safe_sats: u64) -> Self {
        Self {
            total_sats,
            safe_sats: safe_sats.min(total_sats),
        }
    }

    pub fn total_sats(&self) -> u64 {
        self.total_sats
    }

    pub fn safe_sats(&self) -> u64 {
        self.safe_sats
    }

    pub fn unavailable_sats(&self) -> u64 {
        self.total_sats - self.safe_sats
    }
}

/// Tooltip rows: Available, Unavailable, Total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceDisplay {
    pub available: String,
    pub unavailable: String,
    pub total: String,
    pub loading: bool,
}

pub struct BalanceReconciler {
    entries: LruCache<WalletAddress, UtxoEntry>,
    /// Addresses with a refresh in flight, with the safe amount known before it.
    in_flight: HashMap<WalletAddress, Option<u64>>,
    epoch: u64,
}

impl BalanceReconciler {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: LruCache::new(capacity),
            in_flight: HashMap::new(),
            epoch: 0,
        }
    }

    /// Marks `address` loading and returns a ticket, or `None` when a refresh
    /// is already in flight or has completed.
    pub fn begin_refresh(&mut self, address: &WalletAddress) -> Option<RefreshTicket> {
        if self.in_flight.contains_key(address) {
            return None;
        }

        let previous = match self.entries.peek(address) {
            Some(entry) if entry.state == UtxoFetchState::Loaded => return None,
            Some(_) => self.entries.pop(address).and_then(|entry| entry.safe_sats),
            None => None,
        };
        self.in_flight.insert(address.clone(), previous);

        Some(RefreshTicket {
            address: address.clone(),
            epoch: self.epoch,
        })
    }

    /// Clears the loading flag. `safe_sats` is `None` when the refresh failed.
    /// Returns `false` if the cache was cleared after the ticket was issued.
    pub fn finish_refresh(&mut self, ticket: RefreshTicket, safe_sats: Option<u64>) -> bool {
        if ticket.epoch != self.epoch {
            return false;
        }

        let previous = self.in_flight.remove(&ticket.address).flatten();
        let entry = match safe_sats {
            Some(safe) => UtxoEntry {
                state: UtxoFetchState::Loaded,
                safe_sats: Some(safe),
            },
            None => UtxoEntry {
                state: UtxoFetchState::Failed,
                safe_sats: previous,
            },
        };
        self.entries.put(ticket.address, entry);
        true
    }

    pub fn state(&self, address: &WalletAddress) -> Option<UtxoFetchState> {
        if self.in_flight.contains_key(address) {
            return Some(UtxoFetchState::Loading);
        }
        self.entries.peek(address).map(|entry| entry.state)
    }

    pub fn is_loading(&self, address: &WalletAddress) -> bool {
        self.state(address) == Some(UtxoFetchState::Loading)
    }

    /// Last known safe amount, if any refresh ever succeeded.
    pub fn safe_sats(&self, address: &WalletAddress) -> Option<u64> {
        match self.in_flight.get(address) {
            Some(previous) => *previous,
            None => self.entries.peek(address).and_then(|entry| entry.safe_sats),
        }
    }

    /// Before the first successful refresh the safe amount is reported as 0,
    /// a lower bound.
    pub fn summary(&self, address: &WalletAddress, total_sats: u64) -> BalanceSummary {
        BalanceSummary::new(total_sats, self.safe_sats(address).unwrap_or(0))
    }

    pub fn display(&self, address: &WalletAddress, total_sats: u64) -> BalanceDisplay {
        let summary = self.summary(address, total_sats);
        let total = satoshis_to_amount(summary.total_sats());
        if self.is_loading(address) {
            return BalanceDisplay {
                available: LOADING_LABEL.to_owned(),
                unavailable: LOADING_LABEL.to_owned(),
                total,
                loading: true,
            };
        }

        BalanceDisplay {
            available: satoshis_to_amount(summary.safe_sats()),
            unavailable: satoshis_to_amount(summary.unavailable_sats()),
            total,
            loading: false,
        }
    }

    /// Drops every entry; refreshes started before the clear are discarded.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.in_flight.clear();
        self.epoch += 1;
    }

    pub fn len(&self) -> usize {
        self.entries.len() + self.in_flight.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.in_flight.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reconciler(capacity: usize) -> BalanceReconciler {
        BalanceReconciler::new(NonZeroUsize::new(capacity).unwrap())
    }

    #[test]
    fn summary_never_goes_negative() {
        for (total, safe) in [(0, 0), (10, 3), (10, 10), (5, 9), (0, u64::MAX)] {
            let summary = BalanceSummary::new(total, safe);
            assert!(summary.safe_sats() <= summary.total_sats());
            assert_eq!(summary.unavailable_sats(), summary.total_sats() - summary.safe_sats());
        }
        assert_eq!(BalanceSummary::new(5, 9).unavailable_sats(), 0);
    }

    #[test]
    fn second_begin_while_loading_is_noop() {
        let mut balances = reconciler(4);
        let address = WalletAddress::from("bc1qa");

        let ticket = balances.begin_refresh(&address).unwrap();
        assert!(balances.is_loading(&address));
        assert!(balances.begin_refresh(&address).is_none());

        assert!(balances.finish_refresh(ticket, Some(1_000)));
        assert_eq!(balances.state(&address), Some(UtxoFetchState::Loaded));
        assert!(balances.begin_refresh(&address).is_none());
    }

    #[test]
    fn failure_keeps_last_safe_amount_and_allows_retry() {
        let mut balances = reconciler(4);
        let address = WalletAddress::from("bc1qa");

        let ticket = balances.begin_refresh(&address).unwrap();
        balances.finish_refresh(ticket, None);
        assert_eq!(balances.state(&address), Some(UtxoFetchState::Failed));
        assert_eq!(balances.safe_sats(&address), None);
        assert!(!balances.is_loading(&address));

        let retry = balances.begin_refresh(&address).unwrap();
        assert!(balances.is_loading(&address));
        balances.finish_refresh(retry, Some(700));
        assert_eq!(balances.summary(&address, 1_000).safe_sats(), 700);
    }

    #[test]
    fn display_masks_safe_rows_while_loading() {
        let mut balances = reconciler(4);
        let address = WalletAddress::from("bc1qa");
        let ticket = balances.begin_refresh(&address).unwrap();

        let loading = balances.display(&address, 150_000_000);
        assert!(loading.loading);
        assert_eq!(loading.available, LOADING_LABEL);
        assert_eq!(loading.unavailable, LOADING_LABEL);
        assert_eq!(loading.total, "1.50000000");

        balances.finish_refresh(ticket, Some(100_000_000));
        let loaded = balances.display(&address, 150_000_000);
        assert_eq!(loaded.available, "1.00000000");
        assert_eq!(loaded.unavailable, "0.50000000");
        assert!(!loaded.loading);
    }

    #[test]
    fn clear_discards_refreshes_in_flight() {
        let mut balances = reconciler(4);
        let address = WalletAddress::from("bc1qa");
        let ticket = balances.begin_refresh(&address).unwrap();

        balances.clear();
        assert!(!balances.finish_refresh(ticket, Some(5)));
        assert!(balances.state(&address).is_none());
        assert!(balances.is_empty());
    }

    #[test]
    fn cache_is_bounded() {
        let mut balances = reconciler(2);
        for address in ["bc1qa", "bc1qb", "bc1qc"] {
            let ticket = balances.begin_refresh(&WalletAddress::from(address)).unwrap();
            balances.finish_refresh(ticket, Some(1));
        }

        assert_eq!(balances.len(), 2);
        assert!(balances.state(&WalletAddress::from("bc1qa")).is_none());
    }

    #[test]
    fn loading_entries_are_never_evicted() {
        let mut balances = reconciler(1);
        let a = WalletAddress::from("bc1qa");
        let b = WalletAddress::from("bc1qb");

        let first_a = balances.begin_refresh(&a).unwrap();
        let first_b = balances.begin_refresh(&b).unwrap();
        assert!(balances.begin_refresh(&a).is_none());
        assert!(balances.is_loading(&a));
        assert!(balances.is_loading(&b));

        assert!(balances.finish_refresh(first_a, Some(10)));
        assert!(balances.finish_refresh(first_b, Some(20)));
        assert_eq!(balances.len(), 1);
        assert_eq!(balances.safe_sats(&b), Some(20));
    }

    #[test]
    fn retry_keeps_previous_safe_amount_while_loading() {
        let mut balances = reconciler(1);
        let address = WalletAddress::from("bc1qa");

        balances.entries.put(
            address.clone(),
            UtxoEntry {
                state: UtxoFetchState::Failed,
                safe_sats: Some(300),
            },
        );
        let retry = balances.begin_refresh(&address).unwrap();
        assert!(balances.is_loading(&address));
        assert_eq!(balances.safe_sats(&address), Some(300));
        balances.finish_refresh(retry, None);
        assert_eq!(balances.state(&address), Some(UtxoFetchState::Failed));
        assert_eq!(balances.safe_sats(&address), Some(300));
    }
}
