use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("restaurant {0} not found")]
    RestaurantNotFound(i64),

    #[error("invalid similarity threshold {0} (expected 0.0..=1.0)")]
    InvalidThreshold(f32),

    #[error("store backend error: {0}")]
    Backend(String),
}
