use serde::{Deserialize, Serialize};

/// Persisted per-address behaviour switches. [`AddressFlag::bit`] is the mask
/// the wallet service stores.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AddressFlag {
    EnableAtomicals,
    ConfirmedUtxoMode,
    DisableAutoSwitchConfirmed,
    DisableArc20,
}

impl AddressFlag {
    pub const ALL: [AddressFlag; 4] = [
        AddressFlag::EnableAtomicals,
        AddressFlag::ConfirmedUtxoMode,
        AddressFlag::DisableAutoSwitchConfirmed,
        AddressFlag::DisableArc20,
    ];

    pub const fn bit(self) -> u32 {
        match self {
            AddressFlag::EnableAtomicals => 0b0001,
            AddressFlag::ConfirmedUtxoMode => 0b0010,
            AddressFlag::DisableAutoSwitchConfirmed => 0b0100,
            AddressFlag::DisableArc20 => 0b1000,
        }
    }
}

/// Order-independent set of [`AddressFlag`]s, serialized as the raw bitmask.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct FlagSet(u32);

impl FlagSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, flag: AddressFlag) -> bool {
        self.0 & flag.bit() != 0
    }

    #[must_use]
    pub const fn with(self, flag: AddressFlag) -> Self {
        Self(self.0 | flag.bit())
    }

    #[must_use]
    pub const fn without(self, flag: AddressFlag) -> Self {
        Self(self.0 & !flag.bit())
    }

    #[must_use]
    pub const fn union(self, other: FlagSet) -> Self {
        Self(self.0 | other.0)
    }

    pub fn iter(self) -> impl Iterator<Item = AddressFlag> {
        AddressFlag::ALL.into_iter().filter(move |flag| self.contains(*flag))
    }
}

impl FromIterator<AddressFlag> for FlagSet {
    fn from_iter<I: IntoIterator<Item = AddressFlag>>(iter: I) -> Self {
        iter.into_iter().fold(FlagSet::empty(), FlagSet::with)
    }
}
