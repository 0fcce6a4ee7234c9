//! Action classifier. Heuristic cues decide confidently-shaped turns; the
//! language model is consulted only when they don't, and an unusable model
//! answer defaults to Search. Every turn gets exactly one action.

use std::sync::Arc;

use dishcovery_protocol::{Action, ConversationState, Intent, Mode, Plan};

use crate::explain::{classify, ExplainQuestion};
use crate::llm::LanguageModel;

const EXIT_CUES: &[&str] = &[
    "exit",
    "back to all",
    "all restaurants",
    "leave this restaurant",
    "new search",
    "start over",
    "börja om",
    "alla restauranger",
];

const RESHOW_CUES: &[&str] = &[
    "show the results again",
    "show them again",
    "results again",
    "show again",
    "what were they",
    "visa igen",
    "visa resultaten igen",
];

/// Model advice below this confidence is ignored.
const MIN_MODEL_CONFIDENCE: f32 = 0.55;

pub struct Planner {
    model: Arc<dyn LanguageModel>,
}

impl Planner {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    pub async fn plan(&self, text: &str, intent: &Intent, state: &ConversationState) -> Plan {
        if let Some(plan) = heuristic_plan(text, intent, state) {
            return plan;
        }

        match self.model.classify(text, &summarize(state)).await {
            Ok(advice) if advice.confidence >= MIN_MODEL_CONFIDENCE => {
                Plan::new(advice.action, advice.confidence)
            }
            Ok(advice) => {
                log::debug!(
                    "classifier advice {:?} too weak ({:.2}), defaulting to search",
                    advice.action,
                    advice.confidence
                );
                Plan::new(Action::Search, 0.5)
            }
            Err(err) => {
                log::debug!("classifier unavailable ({err}), defaulting to search");
                Plan::new(Action::Search, 0.5)
            }
        }
    }
}

fn heuristic_plan(text: &str, intent: &Intent, state: &ConversationState) -> Option<Plan> {
    let lower = text.trim().to_lowercase();

    if lower.is_empty() {
        return Some(Plan::new(Action::Clarify, 1.0));
    }

    if EXIT_CUES.iter().any(|cue| lower.contains(cue)) {
        let action = if state.mode == Mode::Restaurant {
            Action::ExitRestaurant
        } else {
            Action::Search
        };
        return Some(Plan::new(action, 0.9));
    }

    if RESHOW_CUES.iter().any(|cue| lower.contains(cue)) {
        return Some(Plan::new(Action::Reshow, 0.9));
    }

    if matches!(classify(&lower), ExplainQuestion::Definition { .. }) {
        return Some(Plan::new(Action::Explain, 0.9));
    }

    if intent.wants_full_menu
        && (state.current_restaurant_id.is_some() || intent.restaurant_name.is_some())
    {
        return Some(Plan::new(Action::ShowMenu, 0.9));
    }

    // The restaurant name alone, with nothing asked about its food:
    // a profile lookup, not a search.
    if intent.restaurant_name.is_some()
        && intent.dish_query.is_none()
        && intent.hard_tags.is_empty()
        && !intent.wants_full_menu
    {
        return Some(Plan::new(Action::RestaurantLookup, 0.8));
    }

    if is_question(&lower) && !state.last_results.is_empty() {
        return Some(Plan::new(Action::Followup, 0.7));
    }

    None
}

fn is_question(lower: &str) -> bool {
    if lower.trim_end().ends_with('?') {
        return true;
    }
    const LEADERS: &[&str] = &[
        "is", "are", "does", "do", "did", "can", "how", "what", "which", "where", "är", "har",
        "finns", "hur", "vad", "vilken",
    ];
    lower
        .split_whitespace()
        .next()
        .is_some_and(|first| LEADERS.contains(&first))
}

fn summarize(state: &ConversationState) -> String {
    format!(
        "mode={:?} focused={:?} grounded_dishes={}",
        state.mode,
        state.current_restaurant_id,
        state.last_results.len()
    )
}
