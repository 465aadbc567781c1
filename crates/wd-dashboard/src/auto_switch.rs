//! Automatic switch into confirmed-UTXO mode.
//!
//! States: `Unrestricted` → `PendingNotice` → `ConfirmedMode`.
//!
//! When the current account holds secondary smart-assets or native
//! multi-assets and neither `ConfirmedUtxoMode` nor
//! `DisableAutoSwitchConfirmed` is set, the account enters `PendingNotice`:
//! the flag is requested from the wallet service and a one-time notice is
//! raised. The flag landing on the account record moves it to
//! `ConfirmedMode`.
//!
//! Presence is computed asynchronously, so a presence for any address other
//! than the current account's never fires.

use serde::Serialize;
use std::collections::HashMap;
use wd_types::{Account, AddressAssetPresence, AddressFlag, FlagSet, WalletAddress};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SwitchState {
    #[default]
    Unrestricted,
    PendingNotice,
    ConfirmedMode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchEffect {
    /// Persist `ConfirmedUtxoMode` on the account and merge it into the stored record.
    EnableConfirmedMode(WalletAddress),
    RaiseNotice(WalletAddress),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub next: SwitchState,
    pub effects: Vec<SwitchEffect>,
}

impl Transition {
    fn stay(state: SwitchState) -> Self {
        Self {
            next: state,
            effects: Vec::new(),
        }
    }
}

pub fn transition(state: SwitchState, account: &Account, presence: &AddressAssetPresence) -> Transition {
    if presence.address != account.address {
        return Transition::stay(state);
    }
    if account.has_flag(AddressFlag::ConfirmedUtxoMode) {
        return Transition::stay(SwitchState::ConfirmedMode);
    }
    if account.has_flag(AddressFlag::DisableAutoSwitchConfirmed) {
        return Transition::stay(SwitchState::Unrestricted);
    }
    if state == SwitchState::PendingNotice {
        return Transition::stay(state);
    }
    if !presence.has_risky_assets() {
        return Transition::stay(SwitchState::Unrestricted);
    }

    Transition {
        next: SwitchState::PendingNotice,
        effects: vec![
            SwitchEffect::EnableConfirmedMode(account.address.clone()),
            SwitchEffect::RaiseNotice(account.address.clone()),
        ],
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Track {
    state: SwitchState,
    /// Flags the account had when a flag mutation last failed.
    failed_at: Option<FlagSet>,
}

/// Per-address driver around [`transition`].
#[derive(Debug, Default)]
pub struct AutoModeSwitchPolicy {
    tracks: HashMap<WalletAddress, Track>,
}

impl AutoModeSwitchPolicy {
    pub fn state(&self, address: &WalletAddress) -> SwitchState {
        self.tracks
            .get(address)
            .map(|track| track.state)
            .unwrap_or_default()
    }

    /// Evaluates the account against a presence and returns the effects to run.
    pub fn evaluate(&mut self, account: &Account, presence: &AddressAssetPresence) -> Vec<SwitchEffect> {
        let track = self.tracks.entry(account.address.clone()).or_default();
        let step = transition(track.state, account, presence);

        if !step.effects.is_empty() && track.failed_at == Some(account.flags) {
            return Vec::new();
        }

        track.state = step.next;
        step.effects
    }

    /// The flag mutation succeeded.
    pub fn confirm(&mut self, address: &WalletAddress) {
        let track = self.tracks.entry(address.clone()).or_default();
        track.state = SwitchState::ConfirmedMode;
        track.failed_at = None;
    }

    /// The flag mutation failed; do not fire again while the flags stay `flags`.
    pub fn abort(&mut self, address: &WalletAddress, flags: FlagSet) {
        let track = self.tracks.entry(address.clone()).or_default();
        track.state = SwitchState::Unrestricted;
        track.failed_at = Some(flags);
    }
}
