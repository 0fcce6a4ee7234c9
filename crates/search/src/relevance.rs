//! Client-side relevance re-filter for tag-filtered results.
//!
//! Steps A/B match on tags, so a broad tag like "vegan" can drag in dishes
//! that have nothing to do with the dish text the user typed. This pass
//! re-scores each dish against the query tokens and drops the rest.

use dishcovery_protocol::DishMatch;
use nucleo_matcher::{pattern::Pattern, Matcher};

/// Minimal nucleo score for a token to count as a character-level match.
/// Catches minor spelling variants ("dal" vs "daal") without letting a
/// short token match arbitrary long text.
const MIN_CHAR_SCORE: u32 = 40;

/// Dishes that are pizzas without carrying the word. Only consulted when
/// the query token is "pizza".
const PIZZA_SYNONYMS: &[&str] = &[
    "margherita",
    "margarita",
    "capricciosa",
    "calzone",
    "quattro",
    "hawaii",
    "vesuvio",
    "funghi",
    "pepperoni",
    "marinara",
    "napoletana",
];

pub struct RelevanceFilter {
    matcher: Matcher,
}

impl RelevanceFilter {
    pub fn new() -> Self {
        Self {
            matcher: Matcher::new(nucleo_matcher::Config::DEFAULT),
        }
    }

    /// Does this dish plausibly answer the query tokens?
    pub fn is_relevant(&mut self, dish: &DishMatch, tokens: &[String]) -> bool {
        if tokens.is_empty() {
            return true;
        }
        tokens.iter().any(|token| self.token_hits(dish, token))
    }

    fn token_hits(&mut self, dish: &DishMatch, token: &str) -> bool {
        let token = token.to_lowercase();
        let mut haystacks = vec![dish.name.to_lowercase()];
        if let Some(desc) = &dish.description {
            haystacks.push(desc.to_lowercase());
        }
        if let Some(section) = &dish.section {
            haystacks.push(section.to_lowercase());
        }

        // Exact substring first.
        if haystacks.iter().any(|h| h.contains(&token)) {
            return true;
        }

        // Fixed synonym vocabulary for the "pizza" special case.
        if token == "pizza"
            && haystacks
                .iter()
                .any(|h| PIZZA_SYNONYMS.iter().any(|syn| h.contains(syn)))
        {
            return true;
        }

        // Character-level similarity for spelling variants.
        let pattern = Pattern::parse(
            &token,
            nucleo_matcher::pattern::CaseMatching::Ignore,
            nucleo_matcher::pattern::Normalization::Smart,
        );
        haystacks.iter().any(|h| {
            h.split_whitespace().any(|word| {
                let haystack = nucleo_matcher::Utf32String::from(word);
                pattern
                    .score(haystack.slice(..), &mut self.matcher)
                    .is_some_and(|score| score >= MIN_CHAR_SCORE)
            })
        })
    }
}

impl Default for RelevanceFilter {
    fn default() -> Self {
        Self::new()
    }
}
