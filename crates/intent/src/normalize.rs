use std::sync::Arc;

use dishcovery_protocol::{ChatMessage, ConversationState, Intent, Language, Role};
use dishcovery_store::MenuStore;
use serde::Deserialize;

use crate::resolver::TagResolver;
use crate::vocab::{
    canonical_city, is_known_city, ALLERGEN_RE, CITY_RE, DIETARY_RE, FILLER_WORDS, FULL_MENU_RE,
    REQUEST_STOPWORDS, RESTAURANT_RE, SWEDISH_MARKERS,
};

/// Minimum name similarity before a lookup candidate confirms a
/// restaurant-name mention.
const RESTAURANT_CONFIRM_SCORE: f32 = 0.55;

/// What the language model thinks it extracted from the turn. Unreliable;
/// the normalizer re-derives everything it can and treats this as hints.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct ExtractionHint {
    #[serde(default)]
    pub dish_query: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub dietary: Vec<String>,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub restaurant_name: Option<String>,
}

/// Turns raw text plus short history into a structured [`Intent`].
/// Never fails: on any internal miss it degrades to a broader intent.
pub struct IntentNormalizer {
    store: Arc<dyn MenuStore>,
    resolver: TagResolver,
}

impl IntentNormalizer {
    pub fn new(store: Arc<dyn MenuStore>) -> Self {
        let resolver = TagResolver::new(Arc::clone(&store));
        Self { store, resolver }
    }

    pub async fn normalize(
        &self,
        text: &str,
        history: &[ChatMessage],
        prior: &ConversationState,
        hint: Option<&ExtractionHint>,
    ) -> Intent {
        let raw = text.trim();
        if raw.is_empty() {
            return Intent {
                vague: true,
                ..Intent::default()
            };
        }
        let lower = raw.to_lowercase();

        // Dietary/allergen scan over the *raw* query. This runs even when
        // the model hint already carries dietary terms: the word-boundary
        // re-scan is the failsafe for terms extraction missed.
        let mut dietary = scan_terms(&DIETARY_RE, raw);
        let mut allergies = scan_terms(&ALLERGEN_RE, raw);
        if let Some(hint) = hint {
            merge_terms(&mut dietary, &hint.dietary);
            merge_terms(&mut allergies, &hint.allergies);
        }

        let wants_full_menu = FULL_MENU_RE.is_match(raw);
        let city = self.extract_city(&lower, hint, prior);
        let restaurant_name = self.extract_restaurant(raw, hint).await;

        // Inherit the prior turn's dietary filter when this turn adds none.
        // The sanitize pass may drop inherited veg tags again.
        if dietary.is_empty() {
            if let Some(grounded) = &prior.grounded {
                dietary = grounded.last_dietary.clone();
            } else {
                dietary = prior.prefs.dietary.clone();
            }
        }

        let dish_query = extract_dish_query(&lower, restaurant_name.as_deref());
        let vague = dish_query.is_none() && !wants_full_menu;

        let mut terms = dietary.clone();
        terms.extend(allergies.iter().cloned());
        let hard_tags = self.resolver.resolve_terms(&terms).await;

        Intent {
            dish_query,
            city,
            dietary,
            allergies,
            hard_tags,
            restaurant_name,
            language: detect_language(&lower, history),
            vague,
            wants_full_menu,
        }
    }

    fn extract_city(
        &self,
        lower: &str,
        hint: Option<&ExtractionHint>,
        prior: &ConversationState,
    ) -> Option<String> {
        if let Some(caps) = CITY_RE.captures(lower) {
            if is_known_city(&caps[1]) {
                return Some(canonical_city(&caps[1]));
            }
        }
        for word in lower.split_whitespace() {
            let word = word.trim_matches(|c: char| !c.is_alphanumeric());
            if is_known_city(word) {
                return Some(canonical_city(word));
            }
        }
        if let Some(city) = hint.and_then(|h| h.city.as_deref()) {
            if is_known_city(city) {
                return Some(canonical_city(city));
            }
        }
        prior.prefs.city.clone()
    }

    async fn extract_restaurant(&self, raw: &str, hint: Option<&ExtractionHint>) -> Option<String> {
        let mention = hint
            .and_then(|h| h.restaurant_name.clone())
            .or_else(|| {
                RESTAURANT_RE
                    .captures(raw)
                    .map(|caps| caps[1].trim().to_string())
            })?;
        if mention.is_empty() {
            return None;
        }
        match self.store.search_restaurant_by_name(&mention).await {
            Ok(candidates) => candidates
                .into_iter()
                .find(|c| c.score >= RESTAURANT_CONFIRM_SCORE)
                .map(|c| c.name),
            Err(err) => {
                log::warn!("restaurant lookup failed for '{mention}': {err}");
                None
            }
        }
    }
}

fn scan_terms(re: &regex::Regex, text: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for m in re.find_iter(text) {
        let term = m.as_str().to_lowercase();
        if !terms.contains(&term) {
            terms.push(term);
        }
    }
    terms
}

fn merge_terms(into: &mut Vec<String>, extra: &[String]) {
    for term in extra {
        let term = term.to_lowercase();
        if !term.is_empty() && !into.contains(&term) {
            into.push(term);
        }
    }
}

/// Remaining dish text after stripping dietary vocabulary, the city phrase,
/// the restaurant mention, request boilerplate, and filler words.
fn extract_dish_query(lower: &str, restaurant: Option<&str>) -> Option<String> {
    let mut text = DIETARY_RE.replace_all(lower, " ").into_owned();
    text = ALLERGEN_RE.replace_all(&text, " ").into_owned();
    text = FULL_MENU_RE.replace_all(&text, " ").into_owned();
    text = CITY_RE.replace_all(&text, " ").into_owned();
    if let Some(name) = restaurant {
        text = text.replace(&name.to_lowercase(), " ");
    }
    // Multi-word fillers must go before the text is tokenized.
    for phrase in FILLER_WORDS.iter().filter(|p| p.contains(' ')) {
        text = text.replace(phrase, " ");
    }

    let tokens: Vec<&str> = text
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric() && c != '-'))
        .filter(|w| !w.is_empty())
        .filter(|w| !REQUEST_STOPWORDS.contains(w))
        .filter(|w| !FILLER_WORDS.contains(w))
        .collect();

    if tokens.is_empty() {
        return None;
    }
    Some(tokens.join(" "))
}

fn detect_language(lower: &str, history: &[ChatMessage]) -> Language {
    if has_swedish_marker(lower) {
        return Language::Sv;
    }
    // Very short turns ("mer?") inherit the language of the last user turn.
    if lower.split_whitespace().count() <= 2 {
        if let Some(prev) = history.iter().rev().find(|m| m.role == Role::User) {
            if has_swedish_marker(&prev.content.to_lowercase()) {
                return Language::Sv;
            }
        }
    }
    Language::En
}

fn has_swedish_marker(lower: &str) -> bool {
    lower
        .split_whitespace()
        .any(|w| SWEDISH_MARKERS.contains(&w.trim_matches(|c: char| !c.is_alphanumeric())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dishcovery_protocol::{GroundedState, TagType};
    use dishcovery_store::{MemoryStore, Restaurant, Tag};
    use pretty_assertions::assert_eq;

    fn normalizer() -> IntentNormalizer {
        let tags = vec![
            Tag {
                id: 1,
                slug: "vegan".into(),
                tag_type: TagType::Diet,
                name: "Vegan".into(),
                aliases: vec!["vegansk".into()],
            },
            Tag {
                id: 2,
                slug: "halal".into(),
                tag_type: TagType::Religious,
                name: "Halal".into(),
                aliases: vec![],
            },
        ];
        let restaurants = vec![Restaurant {
            id: 11,
            name: "Indian Bites".into(),
            city: "Gothenburg".into(),
            address: None,
            delivery: true,
            takeaway: true,
            searchable: true,
            dishes: Vec::new(),
        }];
        IntentNormalizer::new(Arc::new(MemoryStore::new(restaurants, tags)))
    }

    #[tokio::test]
    async fn strips_diet_words_and_city_from_dish_query() {
        let n = normalizer();
        let intent = n
            .normalize(
                "find me vegan pizza in Stockholm",
                &[],
                &ConversationState::default(),
                None,
            )
            .await;
        assert_eq!(intent.dish_query.as_deref(), Some("pizza"));
        assert_eq!(intent.city.as_deref(), Some("Stockholm"));
        assert_eq!(intent.dietary, vec!["vegan".to_string()]);
        assert_eq!(intent.hard_tags.len(), 1);
        assert_eq!(intent.hard_tags[0].slug, "vegan");
        assert!(!intent.vague);
    }

    #[tokio::test]
    async fn filler_only_query_normalizes_to_none() {
        let n = normalizer();
        let intent = n
            .normalize("anything", &[], &ConversationState::default(), None)
            .await;
        assert!(intent.dish_query.is_none());
        assert!(intent.vague);
    }

    #[tokio::test]
    async fn multi_word_filler_normalizes_to_none() {
        let n = normalizer();
        let intent = n
            .normalize("vad som helst", &[], &ConversationState::default(), None)
            .await;
        assert!(intent.dish_query.is_none());
        assert!(intent.vague);
    }

    #[tokio::test]
    async fn failsafe_rescan_catches_terms_the_hint_missed() {
        let n = normalizer();
        let hint = ExtractionHint {
            dish_query: Some("butter chicken".into()),
            ..ExtractionHint::default()
        };
        let intent = n
            .normalize(
                "halal butter chicken in Gothenburg",
                &[],
                &ConversationState::default(),
                Some(&hint),
            )
            .await;
        assert_eq!(intent.dietary, vec!["halal".to_string()]);
        assert_eq!(intent.hard_tags[0].slug, "halal");
    }

    #[tokio::test]
    async fn restaurant_mention_is_confirmed_against_the_store() {
        let n = normalizer();
        let intent = n
            .normalize(
                "show more from Indian Bites",
                &[],
                &ConversationState::default(),
                None,
            )
            .await;
        assert_eq!(intent.restaurant_name.as_deref(), Some("Indian Bites"));

        let none = n
            .normalize(
                "show more from Galactic Diner",
                &[],
                &ConversationState::default(),
                None,
            )
            .await;
        assert!(none.restaurant_name.is_none());
    }

    #[tokio::test]
    async fn dietary_filter_is_inherited_from_grounding() {
        let n = normalizer();
        let mut prior = ConversationState::default();
        prior.grounded = Some(GroundedState {
            last_dietary: vec!["vegan".to_string()],
            ..GroundedState::default()
        });
        let intent = n.normalize("pizza", &[], &prior, None).await;
        assert_eq!(intent.dietary, vec!["vegan".to_string()]);
        assert_eq!(intent.hard_tags[0].slug, "vegan");
    }

    #[tokio::test]
    async fn swedish_markers_flip_the_language() {
        let n = normalizer();
        let intent = n
            .normalize(
                "jag vill ha vegansk pizza",
                &[],
                &ConversationState::default(),
                None,
            )
            .await;
        assert_eq!(intent.language, Language::Sv);
    }

    #[tokio::test]
    async fn full_menu_phrase_sets_the_flag() {
        let n = normalizer();
        let intent = n
            .normalize(
                "show the menu",
                &[],
                &ConversationState::default(),
                None,
            )
            .await;
        assert!(intent.wants_full_menu);
        assert!(intent.dish_query.is_none());
        // A menu request is directed, not vague.
        assert!(!intent.vague);
    }
}
