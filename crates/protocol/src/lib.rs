//! # Dishcovery Protocol
//!
//! Shared data model for the conversational discovery engine: the per-turn
//! [`Intent`], the planner's [`Plan`]/[`Action`], result cards, grounding
//! records, and the caller-owned [`ConversationState`].
//!
//! Every type here is a plain serde value. The engine never mutates shared
//! process memory; it consumes a `ConversationState` and returns a new one.

use serde::{Deserialize, Serialize};

pub mod chat;

pub use chat::{
    chips_for, AssistantMessage, ChatMessage, ChatRequest, ChatResponse, MessageKind,
    ResponseMeta, Role, UiAction,
};

pub const STATE_SCHEMA_VERSION: u32 = 1;

/// Default page shape: at most 8 restaurants, 4 dishes each.
pub const MAX_RESTAURANTS_PER_PAGE: usize = 8;
pub const MAX_DISHES_PER_RESTAURANT: usize = 4;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TagType {
    Diet,
    Dietary,
    Religious,
    Allergen,
    Other,
}

impl TagType {
    /// Tag types eligible for dietary/allergen slug resolution.
    pub const RESOLVABLE: [TagType; 4] = [
        TagType::Diet,
        TagType::Dietary,
        TagType::Religious,
        TagType::Allergen,
    ];
}

/// A dietary/allergen/religious tag resolved to its canonical catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolvedTag {
    pub id: i64,
    pub slug: String,
    pub tag_type: TagType,
    pub name: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    #[default]
    En,
    Sv,
}

/// Normalized view of one user turn. Derived fresh per turn from the raw
/// text plus light carry-over from the prior state; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Intent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dish_query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// Raw dietary terms as the user wrote them ("vegansk", "gluten free").
    #[serde(default)]
    pub dietary: Vec<String>,
    #[serde(default)]
    pub allergies: Vec<String>,
    /// Tags that resolved against the catalog; these gate strict search.
    #[serde(default)]
    pub hard_tags: Vec<ResolvedTag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restaurant_name: Option<String>,
    #[serde(default)]
    pub language: Language,
    /// True when the dish text was filler only ("anything", "something").
    #[serde(default)]
    pub vague: bool,
    #[serde(default)]
    pub wants_full_menu: bool,
}

impl Intent {
    /// Minimal fallback intent built straight from the raw query text, used
    /// when extraction fails so the pipeline degrades instead of aborting.
    pub fn from_raw(text: &str) -> Self {
        let trimmed = text.trim();
        Self {
            dish_query: (!trimmed.is_empty()).then(|| trimmed.to_string()),
            ..Self::default()
        }
    }

    pub fn tag_ids(&self) -> Vec<i64> {
        self.hard_tags.iter().map(|t| t.id).collect()
    }
}

/// The eight conversational actions. The dispatch site matches exhaustively;
/// there is no "no handler" state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Search,
    Followup,
    Explain,
    Reshow,
    ExitRestaurant,
    ShowMenu,
    Clarify,
    RestaurantLookup,
}

/// Forces aspects of a search regardless of what the intent carried.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SearchOverride {
    /// Drop the dish text and search by tags alone.
    #[serde(default)]
    pub clear_dish_query: bool,
    /// Scope the search to a single restaurant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restaurant_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Prefs {
    #[serde(default)]
    pub dietary: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PrefsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dietary: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

impl Prefs {
    pub fn apply(&mut self, patch: &PrefsPatch) {
        if let Some(dietary) = &patch.dietary {
            self.dietary = dietary.clone();
        }
        if let Some(city) = &patch.city {
            self.city = Some(city.clone());
        }
    }
}

/// Ephemeral planner output, produced once per turn and consumed once.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Plan {
    pub action: Action,
    pub confidence: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_override: Option<SearchOverride>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefs_patch: Option<PrefsPatch>,
}

impl Plan {
    pub fn new(action: Action, confidence: f32) -> Self {
        Self {
            action,
            confidence,
            search_override: None,
            prefs_patch: None,
        }
    }
}

/// One matched dish on a card. `price_minor` is minor currency units and
/// non-negative when present; unknown prices are `None`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DishMatch {
    pub id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_minor: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RestaurantCard {
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
    pub dishes: Vec<DishMatch>,
    /// Pagination metadata, set by the finalizer when the card was cut.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shown: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_offset: Option<usize>,
}

/// Flattened per-dish grounding record: the unit the follow-up resolver
/// matches elliptical questions against.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LastResultDish {
    pub dish_id: i64,
    pub dish_name: String,
    pub restaurant_id: i64,
    pub restaurant_name: String,
    #[serde(default)]
    pub tag_slugs: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_minor: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroundedRestaurant {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub dish_ids: Vec<i64>,
}

/// Snapshot of exactly what the user was just shown. Always reflects the
/// finalized (post-truncation) result, never raw retrieval output, so
/// follow-ups can only reference dishes the user actually saw.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct GroundedState {
    #[serde(default)]
    pub restaurants: Vec<GroundedRestaurant>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_query: Option<String>,
    #[serde(default)]
    pub last_dietary: Vec<String>,
    #[serde(default)]
    pub match_count: usize,
    #[serde(default)]
    pub no_results: bool,
}

/// Per-restaurant pagination state. A missing `next_offset` means the
/// restaurant's matches are exhausted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RestaurantCursor {
    pub restaurant_id: i64,
    pub shown_count: usize,
    pub total_matches: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_offset: Option<usize>,
}

impl RestaurantCursor {
    pub fn exhausted(&self) -> bool {
        self.next_offset.is_none()
    }
}

/// Enough of a prior search to re-run it for "show more".
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SearchParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default)]
    pub tag_ids: Vec<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// Restaurant the search was scoped to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restaurant_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Discovery,
    Restaurant,
}

/// The caller-owned record threaded through every turn. Created empty on
/// the first turn, replaced wholesale each turn, discarded when the
/// caller's session ends.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ConversationState {
    #[serde(default)]
    pub mode: Mode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_restaurant_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grounded: Option<GroundedState>,
    #[serde(default)]
    pub last_results: Vec<LastResultDish>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_search_params: Option<SearchParams>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_offset: Option<usize>,
    #[serde(default)]
    pub restaurant_cursors: Vec<RestaurantCursor>,
    #[serde(default)]
    pub prefs: Prefs,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_explain: Option<String>,
}

impl ConversationState {
    pub fn cursor_for(&self, restaurant_id: i64) -> Option<&RestaurantCursor> {
        self.restaurant_cursors
            .iter()
            .find(|c| c.restaurant_id == restaurant_id)
    }

    pub fn upsert_cursor(&mut self, cursor: RestaurantCursor) {
        if let Some(existing) = self
            .restaurant_cursors
            .iter_mut()
            .find(|c| c.restaurant_id == cursor.restaurant_id)
        {
            *existing = cursor;
        } else {
            self.restaurant_cursors.push(cursor);
        }
    }

    /// Record the finalized cards as this turn's grounding. Only dishes that
    /// survived truncation become referenceable in follow-ups.
    pub fn ground(&mut self, cards: &[RestaurantCard], query: Option<&str>, dietary: &[String]) {
        let mut last_results = Vec::new();
        let mut restaurants = Vec::new();
        for card in cards {
            restaurants.push(GroundedRestaurant {
                id: card.id,
                name: card.name.clone(),
                dish_ids: card.dishes.iter().map(|d| d.id).collect(),
            });
            for dish in &card.dishes {
                last_results.push(LastResultDish {
                    dish_id: dish.id,
                    dish_name: dish.name.clone(),
                    restaurant_id: card.id,
                    restaurant_name: card.name.clone(),
                    tag_slugs: dish.tags.clone(),
                    price_minor: dish.price_minor,
                    description: dish.description.clone(),
                });
            }
        }
        let match_count = last_results.len();
        self.last_results = last_results;
        self.grounded = Some(GroundedState {
            restaurants,
            last_query: query.map(str::to_string),
            last_dietary: dietary.to_vec(),
            match_count,
            no_results: false,
        });
    }
}
