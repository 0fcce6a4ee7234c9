use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("store error: {0}")]
    Store(#[from] dishcovery_store::StoreError),

    #[error("search error: {0}")]
    Search(#[from] dishcovery_search::SearchError),

    #[error("language model error: {0}")]
    Model(#[from] crate::llm::ModelError),
}
