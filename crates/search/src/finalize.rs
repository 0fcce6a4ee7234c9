use dishcovery_protocol::{
    ConversationState, Intent, Mode, RestaurantCard, MAX_DISHES_PER_RESTAURANT,
    MAX_RESTAURANTS_PER_PAGE,
};

use crate::relevance::RelevanceFilter;

/// Finalized page plus the flag "show more" keys off.
#[derive(Debug, Clone, PartialEq)]
pub struct Finalized {
    pub cards: Vec<RestaurantCard>,
    pub truncated: bool,
}

/// Post-process raw ladder output into the page the user actually sees.
///
/// Applied in order: focus isolation by conversation mode, token relevance
/// re-filter (only for tag-filtered results), de-duplication by restaurant
/// id, match-count re-sort, and truncation to the default page shape with
/// per-restaurant continuation offsets.
///
/// Idempotent: `finalize(finalize(x)) == finalize(x)` for the same state,
/// intent, and flag.
pub fn finalize(
    cards: Vec<RestaurantCard>,
    state: &ConversationState,
    intent: &Intent,
    was_tag_filtered: bool,
) -> Finalized {
    finalize_page(cards, state, intent, was_tag_filtered, 0)
}

/// Like [`finalize`] but skips the first `restaurant_offset` surviving
/// restaurants before truncation, so "show more" pages never repeat cards.
/// The ladder and every step here are deterministic, which is what makes
/// re-running the prior search with an offset equivalent to a stored page.
pub fn finalize_page(
    cards: Vec<RestaurantCard>,
    state: &ConversationState,
    intent: &Intent,
    was_tag_filtered: bool,
    restaurant_offset: usize,
) -> Finalized {
    let cards = isolate_focus(cards, state);
    let cards = refilter_relevance(cards, intent, was_tag_filtered);
    let cards = dedup_by_restaurant(cards);
    let mut cards = sort_by_match_count(cards);
    if restaurant_offset > 0 {
        cards.drain(..restaurant_offset.min(cards.len()));
    }
    truncate(cards)
}

/// The full (re-filtered, de-duplicated, untruncated) match list for one
/// restaurant. Per-restaurant "show more" slices into this.
pub fn restaurant_matches(
    cards: Vec<RestaurantCard>,
    intent: &Intent,
    was_tag_filtered: bool,
    restaurant_id: i64,
) -> Vec<dishcovery_protocol::DishMatch> {
    let cards = refilter_relevance(cards, intent, was_tag_filtered);
    let cards = dedup_by_restaurant(cards);
    cards
        .into_iter()
        .find(|c| c.id == restaurant_id)
        .map(|c| c.dishes)
        .unwrap_or_default()
}

/// In restaurant mode only the focused restaurant's card survives; results
/// from other restaurants must never leak into a focused conversation.
fn isolate_focus(mut cards: Vec<RestaurantCard>, state: &ConversationState) -> Vec<RestaurantCard> {
    if state.mode == Mode::Restaurant {
        if let Some(focus_id) = state.current_restaurant_id {
            cards.retain(|card| card.id == focus_id);
        }
    }
    cards
}

fn refilter_relevance(
    mut cards: Vec<RestaurantCard>,
    intent: &Intent,
    was_tag_filtered: bool,
) -> Vec<RestaurantCard> {
    if !was_tag_filtered {
        return cards;
    }
    let Some(query) = intent.dish_query.as_deref() else {
        return cards;
    };
    let tokens: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
    if tokens.is_empty() {
        return cards;
    }

    let mut filter = RelevanceFilter::new();
    for card in &mut cards {
        card.dishes.retain(|dish| filter.is_relevant(dish, &tokens));
    }
    cards.retain(|card| !card.dishes.is_empty());
    cards
}

/// Restaurants can appear twice when multiple fallback branches ran; merge
/// by id keeping first-occurrence order and dropping duplicate dishes.
fn dedup_by_restaurant(cards: Vec<RestaurantCard>) -> Vec<RestaurantCard> {
    let mut merged: Vec<RestaurantCard> = Vec::new();
    for card in cards {
        if let Some(existing) = merged.iter_mut().find(|c| c.id == card.id) {
            for dish in card.dishes {
                if !existing.dishes.iter().any(|d| d.id == dish.id) {
                    existing.dishes.push(dish);
                }
            }
        } else {
            merged.push(card);
        }
    }
    merged
}

fn sort_by_match_count(mut cards: Vec<RestaurantCard>) -> Vec<RestaurantCard> {
    cards.sort_by_key(|card| std::cmp::Reverse(card.dishes.len()));
    cards
}

fn truncate(mut cards: Vec<RestaurantCard>) -> Finalized {
    let mut truncated = cards.len() > MAX_RESTAURANTS_PER_PAGE;
    cards.truncate(MAX_RESTAURANTS_PER_PAGE);

    for card in &mut cards {
        // A previously finalized card keeps its original total so repeated
        // finalization cannot shrink it.
        let total = card.total.unwrap_or(card.dishes.len());
        if card.dishes.len() > MAX_DISHES_PER_RESTAURANT {
            card.dishes.truncate(MAX_DISHES_PER_RESTAURANT);
            truncated = true;
        }
        let shown = card.dishes.len();
        card.shown = Some(shown);
        card.total = Some(total);
        card.next_offset = (shown < total).then_some(shown);
        if card.next_offset.is_some() {
            truncated = true;
        }
    }

    Finalized { cards, truncated }
}
