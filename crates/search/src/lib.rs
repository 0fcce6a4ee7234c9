//! # Dishcovery Search
//!
//! The retrieval core: a five-step fallback ladder over the store's search
//! primitives ([`FallbackChain`]) and the result finalizer that turns raw
//! ladder output into the bounded card page the user actually sees
//! ([`finalize`]).

mod chain;
mod error;
mod finalize;
mod relevance;

pub use chain::{
    group_rows, FallbackChain, LadderOutcome, LadderStep, LOOSE_FUZZY_THRESHOLD,
    STRICT_FUZZY_THRESHOLD,
};
pub use error::{Result, SearchError};
pub use finalize::{finalize, finalize_page, restaurant_matches, Finalized};
pub use relevance::RelevanceFilter;
