use std::sync::Arc;

use dishcovery_protocol::{DishMatch, RestaurantCard, MAX_RESTAURANTS_PER_PAGE};
use dishcovery_store::{MenuRow, MenuStore};

use crate::error::Result;

/// Step C similarity floor: the city-scoped fuzzy pass stays strict.
pub const STRICT_FUZZY_THRESHOLD: f32 = 0.45;
/// Step D similarity floor: the last dish-matching pass trades precision
/// for recall and drops the city filter entirely.
pub const LOOSE_FUZZY_THRESHOLD: f32 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LadderStep {
    /// Tags AND query text AND city (exact substring + all-tags).
    TagsQueryCity,
    /// Tags only, city kept.
    TagsOnly,
    /// Query only, fuzzy, strict threshold, city kept.
    FuzzyStrict,
    /// Query only, fuzzy, loose threshold, no city.
    FuzzyLoose,
    /// Alphabetical restaurant list, no dish matches.
    Degenerate,
}

impl LadderStep {
    pub fn as_char(self) -> char {
        match self {
            LadderStep::TagsQueryCity => 'A',
            LadderStep::TagsOnly => 'B',
            LadderStep::FuzzyStrict => 'C',
            LadderStep::FuzzyLoose => 'D',
            LadderStep::Degenerate => 'E',
        }
    }
}

#[derive(Debug, Clone)]
pub struct LadderOutcome {
    pub cards: Vec<RestaurantCard>,
    pub step: LadderStep,
    /// Set only by steps A/B; gates the client-side relevance re-filter.
    pub was_tag_filtered: bool,
    /// Set only by step E: grounding must record "no results" so follow-up
    /// logic avoids re-running the same hopeless search.
    pub no_results: bool,
}

/// The five-step fallback ladder. Strict filtering is precise but
/// low-recall on a small, inconsistently tagged menu corpus, so filters
/// are relaxed one dimension at a time; the first non-empty step wins.
pub struct FallbackChain {
    store: Arc<dyn MenuStore>,
}

impl FallbackChain {
    pub fn new(store: Arc<dyn MenuStore>) -> Self {
        Self { store }
    }

    pub async fn search(
        &self,
        tag_ids: &[i64],
        query: Option<&str>,
        city: Option<&str>,
    ) -> Result<LadderOutcome> {
        let query = query.map(str::trim).filter(|q| !q.is_empty());

        if !tag_ids.is_empty() {
            if let Some(q) = query {
                let rows = self
                    .store
                    .search_by_tags_strict(tag_ids, Some(q), city)
                    .await?;
                if !rows.is_empty() {
                    return Ok(outcome(rows, LadderStep::TagsQueryCity));
                }
            }

            let rows = self.store.search_by_tags_strict(tag_ids, None, city).await?;
            if !rows.is_empty() {
                return Ok(outcome(rows, LadderStep::TagsOnly));
            }
        }

        if let Some(q) = query {
            let rows = self
                .store
                .search_fuzzy(q, city, STRICT_FUZZY_THRESHOLD)
                .await?;
            if !rows.is_empty() {
                return Ok(outcome(rows, LadderStep::FuzzyStrict));
            }

            let rows = self
                .store
                .search_fuzzy(q, None, LOOSE_FUZZY_THRESHOLD)
                .await?;
            if !rows.is_empty() {
                return Ok(outcome(rows, LadderStep::FuzzyLoose));
            }
        }

        log::info!(
            "ladder exhausted for tags={:?} query={:?} city={:?}, falling to step E",
            tag_ids,
            query,
            city
        );
        let summaries = self
            .store
            .list_restaurants_alpha(MAX_RESTAURANTS_PER_PAGE)
            .await?;
        let cards = summaries
            .into_iter()
            .map(|s| RestaurantCard {
                id: s.id,
                name: s.name,
                city: s.city,
                address: None,
                delivery: false,
                takeaway: false,
                dishes: Vec::new(),
                shown: None,
                total: None,
                next_offset: None,
            })
            .collect();
        Ok(LadderOutcome {
            cards,
            step: LadderStep::Degenerate,
            was_tag_filtered: false,
            no_results: true,
        })
    }
}

fn outcome(rows: Vec<MenuRow>, step: LadderStep) -> LadderOutcome {
    let was_tag_filtered = matches!(step, LadderStep::TagsQueryCity | LadderStep::TagsOnly);
    log::debug!("ladder step {} hit with {} rows", step.as_char(), rows.len());
    LadderOutcome {
        cards: group_rows(rows),
        step,
        was_tag_filtered,
        no_results: false,
    }
}

/// Group store rows into cards, keeping the rows' dish-name order inside
/// each card and first-appearance order across restaurants.
pub fn group_rows(rows: Vec<MenuRow>) -> Vec<RestaurantCard> {
    let mut cards: Vec<RestaurantCard> = Vec::new();
    for row in rows {
        let dish = DishMatch {
            id: row.dish_id,
            name: row.dish_name,
            description: row.description,
            price_minor: row.price_minor,
            section: row.section,
            tags: row.tag_slugs,
        };
        if let Some(card) = cards.iter_mut().find(|c| c.id == row.restaurant_id) {
            card.dishes.push(dish);
        } else {
            cards.push(RestaurantCard {
                id: row.restaurant_id,
                name: row.restaurant_name,
                city: row.city,
                address: row.address,
                delivery: row.delivery,
                takeaway: row.takeaway,
                dishes: vec![dish],
                shown: None,
                total: None,
                next_offset: None,
            });
        }
    }
    cards
}
