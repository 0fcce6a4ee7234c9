//! Deterministic override rules evaluated before the classifier.
//!
//! Each rule is a named predicate plus a forced action, evaluated in
//! order; the first hit bypasses the classifier entirely. Keeping these
//! as data makes each rule unit-testable independently of the planner.

use dishcovery_protocol::{ConversationState, Intent, Mode};

const AVAILABILITY_CUES: &[&str] = &[
    "do you have",
    "do they have",
    "does it have",
    "is there",
    "are there",
    "any ",
    "serve",
    "finns det",
    "har de",
    "har ni",
];

const PLACE_INFO_CUES: &[&str] = &[
    "where is",
    "address",
    "opening hours",
    "when do they open",
    "when does it open",
    "phone",
    "var ligger",
    "öppettider",
    "telefon",
];

/// Fixed phrase set: issued right after a restaurant profile, these switch
/// mode deterministically. Keeping this transition free of the model means
/// a safety-critical state change never depends on model nondeterminism.
const ENTER_RESTAURANT_PHRASES: &[&str] = &[
    "ask about this restaurant",
    "about this restaurant",
    "tell me about this restaurant",
    "fråga om denna restaurang",
    "fråga om restaurangen",
];

#[derive(Debug, Clone, PartialEq)]
pub enum ForcedAction {
    /// Run a search scoped to the named restaurant, whatever the
    /// classifier would have said.
    RestaurantScopedSearch { restaurant_name: String },
    /// Switch mode to Restaurant around the already-focused restaurant.
    EnterRestaurantMode,
}

pub struct RuleContext<'a> {
    pub text: &'a str,
    pub intent: &'a Intent,
    pub state: &'a ConversationState,
}

pub struct OverrideRule {
    pub name: &'static str,
    check: fn(&RuleContext) -> Option<ForcedAction>,
}

pub fn default_rules() -> Vec<OverrideRule> {
    vec![
        OverrideRule {
            name: "restaurant_scoped_search",
            check: restaurant_scoped_search,
        },
        OverrideRule {
            name: "enter_restaurant_phrase",
            check: enter_restaurant_phrase,
        },
    ]
}

/// First matching rule wins.
pub fn evaluate(rules: &[OverrideRule], ctx: &RuleContext) -> Option<(&'static str, ForcedAction)> {
    for rule in rules {
        if let Some(forced) = (rule.check)(ctx) {
            log::debug!("override rule '{}' fired", rule.name);
            return Some((rule.name, forced));
        }
    }
    None
}

/// The query names a restaurant, is not a pure place-info question, is not
/// just the name alone, and either looks like an availability/menu question
/// or carries hard tags or a dish query: force a restaurant-scoped search.
fn restaurant_scoped_search(ctx: &RuleContext) -> Option<ForcedAction> {
    let name = ctx.intent.restaurant_name.as_deref()?;
    let lower = ctx.text.to_lowercase();

    if contains_any(&lower, PLACE_INFO_CUES) {
        return None;
    }
    if is_bare_name(&lower, name) {
        return None;
    }
    let wants_food = contains_any(&lower, AVAILABILITY_CUES)
        || !ctx.intent.hard_tags.is_empty()
        || ctx.intent.dish_query.is_some();
    wants_food.then(|| ForcedAction::RestaurantScopedSearch {
        restaurant_name: name.to_string(),
    })
}

/// Enter-restaurant phrase right after a profile: the profile handler left
/// a focus candidate in `current_restaurant_id` with mode still Discovery.
fn enter_restaurant_phrase(ctx: &RuleContext) -> Option<ForcedAction> {
    if ctx.state.mode == Mode::Restaurant || ctx.state.current_restaurant_id.is_none() {
        return None;
    }
    let lower = ctx.text.to_lowercase();
    contains_any(&lower, ENTER_RESTAURANT_PHRASES).then_some(ForcedAction::EnterRestaurantMode)
}

fn contains_any(text: &str, cues: &[&str]) -> bool {
    cues.iter().any(|cue| text.contains(cue))
}

fn is_bare_name(lower_text: &str, name: &str) -> bool {
    let normalize = |s: &str| {
        s.chars()
            .filter(|c| c.is_alphanumeric() || c.is_whitespace())
            .collect::<String>()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    };
    normalize(lower_text) == normalize(&name.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dishcovery_protocol::{ResolvedTag, TagType};

    fn intent_with_restaurant(name: &str) -> Intent {
        Intent {
            restaurant_name: Some(name.to_string()),
            ..Intent::default()
        }
    }

    fn ctx_eval(text: &str, intent: &Intent, state: &ConversationState) -> Option<ForcedAction> {
        let rules = default_rules();
        evaluate(
            &rules,
            &RuleContext {
                text,
                intent,
                state,
            },
        )
        .map(|(_, forced)| forced)
    }

    #[test]
    fn availability_question_with_name_forces_scoped_search() {
        let mut intent = intent_with_restaurant("Indian Bites");
        intent.dish_query = Some("butter chicken".into());
        let forced = ctx_eval(
            "do they have butter chicken at Indian Bites?",
            &intent,
            &ConversationState::default(),
        );
        assert_eq!(
            forced,
            Some(ForcedAction::RestaurantScopedSearch {
                restaurant_name: "Indian Bites".into()
            })
        );
    }

    #[test]
    fn hard_tags_alone_also_force_scoped_search() {
        let mut intent = intent_with_restaurant("Indian Bites");
        intent.hard_tags.push(ResolvedTag {
            id: 2,
            slug: "halal".into(),
            tag_type: TagType::Religious,
            name: "Halal".into(),
        });
        let forced = ctx_eval("halal at Indian Bites", &intent, &ConversationState::default());
        assert!(matches!(
            forced,
            Some(ForcedAction::RestaurantScopedSearch { .. })
        ));
    }

    #[test]
    fn place_info_question_is_not_scoped_search() {
        let mut intent = intent_with_restaurant("Indian Bites");
        intent.dish_query = Some("indian".into());
        let forced = ctx_eval(
            "where is Indian Bites?",
            &intent,
            &ConversationState::default(),
        );
        assert_eq!(forced, None);
    }

    #[test]
    fn bare_name_is_left_to_the_planner() {
        let intent = intent_with_restaurant("Indian Bites");
        let forced = ctx_eval("Indian Bites", &intent, &ConversationState::default());
        assert_eq!(forced, None);
    }

    #[test]
    fn enter_phrase_fires_only_with_a_focus_candidate() {
        let intent = Intent::default();
        let mut state = ConversationState::default();
        assert_eq!(
            ctx_eval("ask about this restaurant", &intent, &state),
            None
        );

        state.current_restaurant_id = Some(11);
        assert_eq!(
            ctx_eval("ask about this restaurant", &intent, &state),
            Some(ForcedAction::EnterRestaurantMode)
        );

        state.mode = Mode::Restaurant;
        assert_eq!(
            ctx_eval("ask about this restaurant", &intent, &state),
            None
        );
    }
}
