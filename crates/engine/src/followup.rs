//! Follow-up / grounding resolver: answers elliptical questions against
//! the previous turn's grounded dish list, and recognizes pagination
//! requests before they ever reach the planner.

use dishcovery_protocol::{ConversationState, Intent, LastResultDish};

const STOPWORDS: &[&str] = &[
    "is", "it", "the", "a", "an", "are", "was", "does", "do", "did", "can", "could", "how",
    "what", "whats", "this", "that", "they", "them", "there", "have", "has", "much", "many",
    "and", "or", "of", "in", "on", "with", "for", "to", "me", "my", "i", "you", "please",
    "är", "den", "det", "en", "ett", "har", "de", "och", "eller", "med", "hur", "vad", "tack",
];

const TRANSLATE_CUES: &[&str] = &[
    "translate",
    "in english",
    "på engelska",
    "på svenska",
    "översätt",
];

const SHOW_MORE_CUES: &[&str] = &[
    "show more",
    "more please",
    "load more",
    "see more",
    "visa mer",
    "visa fler",
    "mer tack",
];

const PRONOUN_CUES: &[&str] = &["it", "its", "it's", "den", "det", "one"];

#[derive(Debug, Clone, PartialEq)]
pub enum FollowupOutcome {
    /// Nothing grounded matched; defer to the planner.
    Pass,
    /// Exactly one grounded dish matched; answer from its stored record.
    Resolved {
        dish: LastResultDish,
        answer: String,
    },
    /// Several grounded dishes are plausible; ask, never guess.
    Clarify { candidates: Vec<String> },
    /// "Translate that": re-render the previous answer.
    TranslateLast,
    /// Generic "show more": resume the prior search from its offset.
    Paginate,
    /// "Show more from X": resume one restaurant's cursor.
    ShowMoreRestaurant { restaurant_id: i64 },
}

/// Resolve an elliptical query against the grounded snapshot. Pure; all
/// the data it needs came from the prior turn's finalized output.
pub fn resolve(text: &str, intent: &Intent, state: &ConversationState) -> FollowupOutcome {
    let lower = text.to_lowercase();

    if TRANSLATE_CUES.iter().any(|cue| lower.contains(cue)) {
        return FollowupOutcome::TranslateLast;
    }

    if SHOW_MORE_CUES.iter().any(|cue| lower.contains(cue)) {
        if let Some(name) = &intent.restaurant_name {
            if let Some(id) = restaurant_id_by_name(state, name) {
                return FollowupOutcome::ShowMoreRestaurant { restaurant_id: id };
            }
        }
        return FollowupOutcome::Paginate;
    }

    if state.last_results.is_empty() {
        return FollowupOutcome::Pass;
    }

    let tokens = content_tokens(&lower);
    if tokens.is_empty() && !mentions_pronoun(&lower) {
        return FollowupOutcome::Pass;
    }

    let mut candidates: Vec<&LastResultDish> = state
        .last_results
        .iter()
        .filter(|dish| dish_mentions(dish, &tokens))
        .collect();

    // Pronoun ellipsis: "is it spicy?" with exactly one grounded dish can
    // only mean that dish.
    if candidates.is_empty() && mentions_pronoun(&lower) && state.last_results.len() == 1 {
        candidates.push(&state.last_results[0]);
    }

    match candidates.len() {
        0 => FollowupOutcome::Pass,
        1 => {
            let dish = candidates[0].clone();
            let answer = answer_for(&dish, &tokens);
            FollowupOutcome::Resolved { dish, answer }
        }
        _ => {
            let mut names: Vec<String> = candidates
                .iter()
                .map(|d| format!("{} ({})", d.dish_name, d.restaurant_name))
                .collect();
            names.dedup();
            FollowupOutcome::Clarify { candidates: names }
        }
    }
}

fn restaurant_id_by_name(state: &ConversationState, name: &str) -> Option<i64> {
    let lower = name.to_lowercase();
    if let Some(dish) = state
        .last_results
        .iter()
        .find(|d| d.restaurant_name.to_lowercase() == lower)
    {
        return Some(dish.restaurant_id);
    }
    state
        .grounded
        .as_ref()?
        .restaurants
        .iter()
        .find(|r| r.name.to_lowercase() == lower)
        .map(|r| r.id)
}

fn content_tokens(lower: &str) -> Vec<String> {
    lower
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|w| !w.is_empty())
        .filter(|w| !STOPWORDS.contains(w))
        .map(str::to_string)
        .collect()
}

fn mentions_pronoun(lower: &str) -> bool {
    lower
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric() && c != '\''))
        .any(|w| PRONOUN_CUES.contains(&w))
}

/// Does the dish's name or description contain any query token? Attribute
/// words like "spicy" match the *question*, not the dish, so they are
/// excluded from the name check only when they match a tag instead.
fn dish_mentions(dish: &LastResultDish, tokens: &[String]) -> bool {
    let name = dish.dish_name.to_lowercase();
    let desc = dish
        .description
        .as_deref()
        .unwrap_or_default()
        .to_lowercase();
    tokens
        .iter()
        .any(|t| name.contains(t.as_str()) || desc.contains(t.as_str()))
}

/// Templated answer citing only the dish's stored record. MENU_FACT
/// discipline: the grounded description is the single source of truth.
fn answer_for(dish: &LastResultDish, tokens: &[String]) -> String {
    if let Some(tag) = tokens.iter().find_map(|t| tag_match(dish, t)) {
        return format!(
            "Yes — {} at {} is tagged \"{}\".",
            dish.dish_name, dish.restaurant_name, tag
        );
    }
    let asked: Vec<&str> = tokens
        .iter()
        .map(String::as_str)
        .filter(|t| !dish.dish_name.to_lowercase().contains(*t))
        .collect();
    match (&dish.description, asked.is_empty()) {
        (Some(desc), false) => format!(
            "The menu doesn't mark {} as {}. Its description says: \"{}\"",
            dish.dish_name,
            asked.join(" "),
            desc
        ),
        (Some(desc), true) => format!(
            "{} at {} — the menu says: \"{}\"",
            dish.dish_name, dish.restaurant_name, desc
        ),
        (None, _) => format!(
            "The menu doesn't say more about {} at {}.",
            dish.dish_name, dish.restaurant_name
        ),
    }
}

fn tag_match<'a>(dish: &'a LastResultDish, token: &str) -> Option<&'a str> {
    dish.tag_slugs
        .iter()
        .find(|slug| slug.contains(token) || token.contains(slug.as_str()))
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn grounded_dish(id: i64, name: &str, desc: Option<&str>, tags: &[&str]) -> LastResultDish {
        LastResultDish {
            dish_id: id,
            dish_name: name.to_string(),
            restaurant_id: 11,
            restaurant_name: "Indian Bites".to_string(),
            tag_slugs: tags.iter().map(|t| t.to_string()).collect(),
            price_minor: Some(15900),
            description: desc.map(str::to_string),
        }
    }

    fn state_with(dishes: Vec<LastResultDish>) -> ConversationState {
        ConversationState {
            last_results: dishes,
            ..ConversationState::default()
        }
    }

    #[test]
    fn pronoun_question_resolves_the_only_grounded_dish() {
        let state = state_with(vec![grounded_dish(
            1,
            "Butter Chicken",
            Some("mild creamy tomato curry"),
            &["halal"],
        )]);
        let out = resolve("is it spicy?", &Intent::default(), &state);
        match out {
            FollowupOutcome::Resolved { dish, answer } => {
                assert_eq!(dish.dish_name, "Butter Chicken");
                assert!(answer.contains("mild creamy tomato curry"));
            }
            other => panic!("expected Resolved, got {other:?}"),
        }
    }

    #[test]
    fn tag_question_gets_a_templated_tag_answer() {
        let state = state_with(vec![grounded_dish(1, "Butter Chicken", None, &["halal"])]);
        let out = resolve("is the butter chicken halal?", &Intent::default(), &state);
        match out {
            FollowupOutcome::Resolved { answer, .. } => {
                assert!(answer.starts_with("Yes"));
                assert!(answer.contains("halal"));
            }
            other => panic!("expected Resolved, got {other:?}"),
        }
    }

    #[test]
    fn multiple_candidates_ask_for_clarification() {
        let state = state_with(vec![
            grounded_dish(1, "Chicken Korma", None, &[]),
            grounded_dish(2, "Chicken Vindaloo", None, &[]),
        ]);
        let out = resolve("how spicy is the chicken?", &Intent::default(), &state);
        match out {
            FollowupOutcome::Clarify { candidates } => assert_eq!(candidates.len(), 2),
            other => panic!("expected Clarify, got {other:?}"),
        }
    }

    #[test]
    fn unrelated_question_passes_to_the_planner() {
        let state = state_with(vec![grounded_dish(1, "Butter Chicken", None, &[])]);
        let out = resolve("sushi near the harbor", &Intent::default(), &state);
        assert_eq!(out, FollowupOutcome::Pass);
    }

    #[test]
    fn show_more_from_a_known_restaurant_targets_its_cursor() {
        let state = state_with(vec![grounded_dish(1, "Butter Chicken", None, &[])]);
        let intent = Intent {
            restaurant_name: Some("Indian Bites".into()),
            ..Intent::default()
        };
        let out = resolve("show more from Indian Bites", &intent, &state);
        assert_eq!(out, FollowupOutcome::ShowMoreRestaurant { restaurant_id: 11 });
    }

    #[test]
    fn generic_show_more_paginates() {
        let state = state_with(vec![grounded_dish(1, "Butter Chicken", None, &[])]);
        let out = resolve("show more", &Intent::default(), &state);
        assert_eq!(out, FollowupOutcome::Paginate);
    }

    #[test]
    fn translate_request_rerenders_the_last_answer() {
        let state = state_with(Vec::new());
        let out = resolve("translate that", &Intent::default(), &state);
        assert_eq!(out, FollowupOutcome::TranslateLast);
    }

    #[test]
    fn empty_grounding_always_passes() {
        let out = resolve("is it spicy?", &Intent::default(), &state_with(Vec::new()));
        assert_eq!(out, FollowupOutcome::Pass);
    }
}
