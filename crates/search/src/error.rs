use thiserror::Error;

pub type Result<T> = std::result::Result<T, SearchError>;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("store error: {0}")]
    Store(#[from] dishcovery_store::StoreError),

    #[error("{0}")]
    Other(String),
}
