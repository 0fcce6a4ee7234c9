use dishcovery_protocol::TagType;
use serde::{Deserialize, Serialize};

/// Canonical tag catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tag {
    pub id: i64,
    pub slug: String,
    pub tag_type: TagType,
    pub name: String,
    /// Loose spellings that resolve to this tag ("veggie", "vegansk").
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// Alias-table hit: which catalog slug a loose term maps to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AliasHit {
    pub tag_type: TagType,
    pub tag_slug: String,
}

/// One row returned by the dish-searching primitives. Carries the owning
/// restaurant's identity so callers can group rows into cards without a
/// second lookup; `tag_slugs` is the dish's full tag set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MenuRow {
    pub restaurant_id: i64,
    pub restaurant_name: String,
    pub city: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default)]
    pub delivery: bool,
    #[serde(default)]
    pub takeaway: bool,
    pub dish_id: i64,
    pub dish_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_minor: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(default)]
    pub tag_slugs: Vec<String>,
}

/// Candidate from restaurant-name lookup, best match first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RestaurantCandidate {
    pub id: i64,
    pub name: String,
    pub city: String,
    pub score: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RestaurantSummary {
    pub id: i64,
    pub name: String,
    pub city: String,
}

/// One page of a restaurant's menu in stored order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MenuPage {
    pub rows: Vec<MenuRow>,
    pub total: usize,
    pub offset: usize,
}

impl MenuPage {
    /// Offset for the next page, absent when this page reached the end.
    pub fn next_offset(&self) -> Option<usize> {
        let end = self.offset + self.rows.len();
        (end < self.total).then_some(end)
    }
}

/// Seed shape for the in-memory store (and the CLI's JSON fixture file).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Restaurant {
    pub id: i64,
    pub name: String,
    pub city: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default)]
    pub delivery: bool,
    #[serde(default)]
    pub takeaway: bool,
    #[serde(default)]
    pub searchable: bool,
    #[serde(default)]
    pub dishes: Vec<Dish>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Dish {
    pub id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_minor: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(default)]
    pub tag_slugs: Vec<String>,
    /// Optional embedding for semantic search; dishes without one are
    /// invisible to `search_semantic`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embedding: Vec<f32>,
}

impl Restaurant {
    pub(crate) fn row_for(&self, dish: &Dish) -> MenuRow {
        MenuRow {
            restaurant_id: self.id,
            restaurant_name: self.name.clone(),
            city: self.city.clone(),
            address: self.address.clone(),
            delivery: self.delivery,
            takeaway: self.takeaway,
            dish_id: dish.id,
            dish_name: dish.name.clone(),
            description: dish.description.clone(),
            price_minor: dish.price_minor,
            section: dish.section.clone(),
            tag_slugs: dish.tag_slugs.clone(),
        }
    }
}
