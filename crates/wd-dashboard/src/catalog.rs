use serde::Serialize;
use wd_types::{AssetPageResponse, AssetStandard, TokenBalance, WalletAddress};

use crate::error::{DashboardError, Result};
use crate::tokens::{RequestToken, RequestTokens};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    /// 1-based.
    pub page: u32,
    pub page_size: u32,
}

impl Pagination {
    pub fn new(page: u32, page_size: u32) -> Result<Self> {
        if page == 0 || page_size == 0 {
            return Err(DashboardError::InvalidPagination { page, page_size });
        }
        Ok(Self { page, page_size })
    }

    fn first(page_size: u32) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogQuery {
    pub address: WalletAddress,
    pub standard: AssetStandard,
    pub pagination: Pagination,
}

/// The displayed page. `total == None` means not loaded yet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetPage {
    pub items: Vec<TokenBalance>,
    pub total: Option<u64>,
    pub page: u32,
    pub page_size: u32,
}

impl AssetPage {
    fn loading(pagination: Pagination) -> Self {
        Self {
            items: Vec::new(),
            total: None,
            page: pagination.page,
            page_size: pagination.page_size,
        }
    }

    pub fn view(&self) -> CatalogView<'_> {
        match self.total {
            None => CatalogView::Loading,
            Some(0) => CatalogView::Empty,
            Some(total) => CatalogView::Populated {
                items: &self.items,
                total,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CatalogView<'a> {
    Loading,
    Empty,
    Populated { items: &'a [TokenBalance], total: u64 },
}

#[derive(Debug, PartialEq, Eq)]
pub enum CatalogOutcome {
    /// The page replaced the previous one. `tickers` are its distinct tickers
    /// in display order (empty for an empty page).
    Applied { tickers: Vec<String> },
    /// A newer query was issued after this one.
    Stale,
    /// The fetch failed; the previous page is still displayed.
    Failed,
}

/// Paged holdings of one standard for the current account.
#[derive(Debug)]
pub struct AssetCatalogPaginator {
    page: AssetPage,
    pagination: Pagination,
    tokens: RequestTokens,
}

impl AssetCatalogPaginator {
    pub fn new(page_size: u32) -> Self {
        let pagination = Pagination::first(page_size);
        Self {
            page: AssetPage::loading(pagination),
            pagination,
            tokens: RequestTokens::default(),
        }
    }

    pub fn page(&self) -> &AssetPage {
        &self.page
    }

    pub fn view(&self) -> CatalogView<'_> {
        self.page.view()
    }

    pub fn pagination(&self) -> Pagination {
        self.pagination
    }

    /// Back to the loading state at page 1. Results still in flight become stale.
    pub fn reset(&mut self) {
        self.pagination = Pagination::first(self.pagination.page_size);
        self.page = AssetPage::loading(self.pagination);
        self.tokens.invalidate();
    }

    /// Requests another page. The current items stay until the new page lands.
    pub fn set_pagination(&mut self, pagination: Pagination) {
        self.pagination = pagination;
    }

    pub fn begin(&mut self, address: &WalletAddress, standard: AssetStandard) -> (RequestToken, CatalogQuery) {
        let token = self.tokens.issue();
        let query = CatalogQuery {
            address: address.clone(),
            standard,
            pagination: self.pagination,
        };
        (token, query)
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        self.tokens.is_current(token)
    }

    pub fn complete<E>(
        &mut self,
        token: RequestToken,
        query: &CatalogQuery,
        result: std::result::Result<AssetPageResponse, E>,
    ) -> CatalogOutcome {
        if !self.tokens.is_current(token) {
            return CatalogOutcome::Stale;
        }

        let response = match result {
            Ok(response) => response,
            Err(_) => return CatalogOutcome::Failed,
        };

        let mut tickers: Vec<String> = Vec::new();
        for item in &response.items {
            if !tickers.contains(&item.ticker) {
                tickers.push(item.ticker.clone());
            }
        }

        self.page = AssetPage {
            items: response.items,
            total: Some(response.total),
            page: query.pagination.page,
            page_size: query.pagination.page_size,
        };
        CatalogOutcome::Applied { tickers }
    }
}
