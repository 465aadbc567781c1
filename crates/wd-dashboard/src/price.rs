use wd_types::{ChainCapabilities, PriceMap, TickerPrice};

use crate::tokens::RequestToken;

/// Market prices merged over the displayed page.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum PriceOverlay {
    /// Not fetched for the page currently displayed.
    #[default]
    NotFetched,
    Fetched(PriceMap),
}

impl PriceOverlay {
    pub fn is_fetched(&self) -> bool {
        matches!(self, PriceOverlay::Fetched(_))
    }

    /// `None` both before the fetch and for tickers the service has no price for.
    pub fn price_for(&self, ticker: &str) -> Option<&TickerPrice> {
        match self {
            PriceOverlay::NotFetched => None,
            PriceOverlay::Fetched(prices) => prices.get(ticker),
        }
    }
}

/// Tracks which page the overlay belongs to. The page's catalog token is the
/// overlay's token, so prices for a superseded page are never shown.
#[derive(Debug, Default)]
pub struct PriceOverlayFetcher {
    overlay: PriceOverlay,
    armed_for: Option<RequestToken>,
}

impl PriceOverlayFetcher {
    pub fn overlay(&self) -> &PriceOverlay {
        &self.overlay
    }

    pub fn invalidate(&mut self) {
        self.overlay = PriceOverlay::NotFetched;
        self.armed_for = None;
    }

    /// Whether a page with these tickers needs a price fetch on this chain.
    pub fn wants_fetch(capabilities: &ChainCapabilities, tickers: &[String]) -> bool {
        capabilities.show_price && !tickers.is_empty()
    }

    /// Expects prices for the page loaded under `token`.
    pub fn arm(&mut self, token: RequestToken) {
        self.overlay = PriceOverlay::NotFetched;
        self.armed_for = Some(token);
    }

    /// Replaces the overlay. Returns `false` when `token` is not the armed page.
    pub fn apply(&mut self, token: RequestToken, prices: PriceMap) -> bool {
        if self.armed_for != Some(token) {
            return false;
        }
        self.overlay = PriceOverlay::Fetched(prices);
        true
    }

    /// Prices to render, if the chain shows prices and the overlay arrived.
    pub fn visible(&self, capabilities: &ChainCapabilities) -> Option<&PriceMap> {
        match &self.overlay {
            PriceOverlay::Fetched(prices) if capabilities.show_price => Some(prices),
            _ => None,
        }
    }
}
