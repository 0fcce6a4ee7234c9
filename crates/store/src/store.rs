use async_trait::async_trait;
use dishcovery_protocol::TagType;

use crate::error::Result;
use crate::types::{AliasHit, MenuPage, MenuRow, RestaurantCandidate, RestaurantSummary, Tag};

/// The search primitives the engine is allowed to call. Implementations are
/// remote in production; [`crate::MemoryStore`] is the reference.
///
/// Every dish-returning method sorts rows by dish name ascending.
#[async_trait]
pub trait MenuStore: Send + Sync {
    /// Strict tag search: a dish qualifies only if it carries *all* of
    /// `tag_ids`. `query` adds a case-insensitive substring filter over
    /// dish name, description, and section; `city` filters the restaurant.
    async fn search_by_tags_strict(
        &self,
        tag_ids: &[i64],
        query: Option<&str>,
        city: Option<&str>,
    ) -> Result<Vec<MenuRow>>;

    /// Similarity search over dish name/description/section. `threshold`
    /// is the minimal similarity in `0.0..=1.0`.
    async fn search_fuzzy(
        &self,
        text: &str,
        city: Option<&str>,
        threshold: f32,
    ) -> Result<Vec<MenuRow>>;

    /// Cosine similarity against stored dish embeddings, optionally
    /// restricted to a city and a tag set.
    async fn search_semantic(
        &self,
        embedding: &[f32],
        city: Option<&str>,
        tag_ids: &[i64],
    ) -> Result<Vec<MenuRow>>;

    /// Restaurants whose name resembles `text`, best match first.
    async fn search_restaurant_by_name(&self, text: &str) -> Result<Vec<RestaurantCandidate>>;

    /// One page of a restaurant's menu in stored order.
    async fn restaurant_menu(
        &self,
        restaurant_id: i64,
        offset: usize,
        limit: usize,
    ) -> Result<MenuPage>;

    /// Alias-table lookup for a loose dietary/allergen term.
    async fn resolve_alias(&self, term: &str) -> Result<Option<AliasHit>>;

    /// Catalog lookup by slug, restricted to the allowed tag types.
    async fn tag_by_slug(&self, slug: &str, allowed: &[TagType]) -> Result<Option<Tag>>;

    /// Fuzzy tag lookup by display name.
    async fn search_tags_fuzzy(&self, name: &str) -> Result<Vec<Tag>>;

    /// Alphabetical list of searchable restaurants, for the degenerate
    /// no-results fallback.
    async fn list_restaurants_alpha(&self, limit: usize) -> Result<Vec<RestaurantSummary>>;
}
