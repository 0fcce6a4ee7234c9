//! # Dishcovery Store
//!
//! Search-primitive contracts the engine consumes, plus an in-memory
//! reference implementation.
//!
//! The engine treats the backing data store purely as a set of callable
//! search primitives ([`MenuStore`]); the storage format and index
//! implementation behind them are a collaborator concern. [`MemoryStore`]
//! implements the same contracts over plain vectors and backs the CLI and
//! the test suites.
//!
//! Ordering contract shared by the dish-returning primitives: rows come
//! back sorted by dish name ascending; ties are not otherwise broken.
//! `search_semantic` is the one exception and orders by similarity.

mod error;
mod memory;
mod store;
mod text;
mod types;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use store::MenuStore;
pub use text::trigram_similarity;
pub use types::{
    AliasHit, Dish, MenuPage, MenuRow, Restaurant, RestaurantCandidate, RestaurantSummary, Tag,
};
