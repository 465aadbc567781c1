use std::collections::HashMap;
use wd_types::{Account, AddressFlag, FlagSet, WalletAddress};

/// Account records keyed by address, plus which one is current.
///
/// Flags only ever accumulate: neither re-selecting an address nor merging a
/// service update can drop a flag the store already holds.
#[derive(Debug, Default)]
pub struct AddressFlagStore {
    accounts: HashMap<WalletAddress, Account>,
    current: Option<WalletAddress>,
}

impl AddressFlagStore {
    /// Makes `account` current. Returns `true` when the current address changed.
    ///
    /// Flags already stored for the address are kept alongside the ones the
    /// caller passes in; the other fields come from `account`.
    pub fn select(&mut self, mut account: Account) -> bool {
        let changed = self.current.as_ref() != Some(&account.address);
        if let Some(stored) = self.accounts.get(&account.address) {
            account.flags = stored.flags.union(account.flags);
        }
        self.current = Some(account.address.clone());
        self.accounts.insert(account.address.clone(), account);
        changed
    }

    /// Adds `flags` to the stored record of `address`, leaving its other
    /// fields as they are. Returns `false` when the address is unknown.
    pub fn merge_flags(&mut self, address: &WalletAddress, flags: FlagSet) -> bool {
        match self.accounts.get_mut(address) {
            Some(account) => {
                account.flags = account.flags.union(flags);
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, address: &WalletAddress) -> Option<Account> {
        if self.current.as_ref() == Some(address) {
            self.current = None;
        }
        self.accounts.remove(address)
    }

    pub fn current(&self) -> Option<&Account> {
        self.current.as_ref().and_then(|address| self.accounts.get(address))
    }

    pub fn get(&self, address: &WalletAddress) -> Option<&Account> {
        self.accounts.get(address)
    }

    pub fn flags(&self, address: &WalletAddress) -> FlagSet {
        self.accounts
            .get(address)
            .map(|account| account.flags)
            .unwrap_or_default()
    }

    pub fn has_flag(&self, address: &WalletAddress, flag: AddressFlag) -> bool {
        self.flags(address).contains(flag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_reports_address_changes() {
        let mut store = AddressFlagStore::default();
        assert!(store.select(Account::new("bc1qa", "A")));
        assert!(!store.select(Account::new("bc1qa", "A renamed")));
        assert_eq!(store.current().map(|a| a.display_name.as_str()), Some("A renamed"));
        assert!(store.select(Account::new("bc1qb", "B")));
    }

    #[test]
    fn reselect_keeps_stored_flags() {
        let mut store = AddressFlagStore::default();
        let a = Account::new("bc1qa", "A");
        store.select(a.clone());
        assert!(store.merge_flags(&a.address, FlagSet::empty().with(AddressFlag::ConfirmedUtxoMode)));

        store.select(Account::new("bc1qb", "B"));
        assert!(store.select(Account::new("bc1qa", "A again")));

        let current = store.current().unwrap();
        assert_eq!(current.display_name, "A again");
        assert!(current.has_flag(AddressFlag::ConfirmedUtxoMode));
    }

    #[test]
    fn merge_keeps_other_fields_and_flags() {
        let mut store = AddressFlagStore::default();
        let account = Account {
            flags: FlagSet::empty().with(AddressFlag::DisableAutoSwitchConfirmed),
            ..Account::new("bc1qa", "A")
        };
        store.select(account.clone());
        store.select(Account {
            display_name: "Renamed".into(),
            ..account.clone()
        });

        assert!(store.merge_flags(&account.address, FlagSet::empty().with(AddressFlag::ConfirmedUtxoMode)));
        let stored = store.get(&account.address).unwrap();
        assert_eq!(stored.display_name, "Renamed");
        assert!(stored.has_flag(AddressFlag::ConfirmedUtxoMode));
        assert!(stored.has_flag(AddressFlag::DisableAutoSwitchConfirmed));
    }

    #[test]
    fn merge_into_unknown_address_is_ignored() {
        let mut store = AddressFlagStore::default();
        store.select(Account::new("bc1qa", "A"));
        let other = WalletAddress::from("bc1qb");

        assert!(!store.merge_flags(&other, FlagSet::empty().with(AddressFlag::ConfirmedUtxoMode)));
        assert!(store.get(&other).is_none());
        assert_eq!(store.current().map(|a| a.address.as_str()), Some("bc1qa"));
    }

    #[test]
    fn removing_current_clears_selection() {
        let mut store = AddressFlagStore::default();
        let account = Account::new("bc1qa", "A");
        store.select(account.clone());

        assert_eq!(store.remove(&account.address), Some(account));
        assert!(store.current().is_none());
    }
}
