use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("no active account")]
    NoActiveAccount,

    #[error("invalid pagination: page={page}, page_size={page_size}")]
    InvalidPagination { page: u32, page_size: u32 },
}

pub type Result<T> = std::result::Result<T, DashboardError>;
