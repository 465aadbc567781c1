use wd_types::{AssetStandard, ChainCapabilities};

/// Shown whenever the requested standard is unavailable on the chain.
pub const DEFAULT_STANDARD: AssetStandard = AssetStandard::Ordinals;

pub fn select_active_tab(requested: AssetStandard, capabilities: &ChainCapabilities) -> AssetStandard {
    if capabilities.supports(requested) {
        requested
    } else {
        DEFAULT_STANDARD
    }
}

/// Remembers the tab the user asked for, not the one currently shown, so a
/// capable chain restores it.
#[derive(Debug, Clone, Copy)]
pub struct AssetTabSelector {
    requested: AssetStandard,
}

impl Default for AssetTabSelector {
    fn default() -> Self {
        Self {
            requested: DEFAULT_STANDARD,
        }
    }
}

impl AssetTabSelector {
    pub fn request(&mut self, tab: AssetStandard) {
        self.requested = tab;
    }

    pub fn requested(&self) -> AssetStandard {
        self.requested
    }

    pub fn effective(&self, capabilities: &ChainCapabilities) -> AssetStandard {
        select_active_tab(self.requested, capabilities)
    }

    pub fn tabs(capabilities: &ChainCapabilities) -> &'static [AssetStandard] {
        capabilities.standards
    }
}
