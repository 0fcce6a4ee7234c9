//! # Dishcovery Intent
//!
//! Turns a raw user turn into a structured [`dishcovery_protocol::Intent`]:
//! dietary/allergen vocabulary scanning with word-boundary matching, city
//! and restaurant-name extraction, the tag-resolution ladder, and the pure
//! meat-vs-veg sanitize rule.
//!
//! Normalization never fails; anything that cannot be resolved is dropped
//! and the search degrades to broader recall.

mod normalize;
mod resolver;
mod sanitize;
pub mod vocab;

pub use normalize::{ExtractionHint, IntentNormalizer};
pub use resolver::TagResolver;
pub use sanitize::sanitize;
