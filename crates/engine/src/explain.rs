//! Explainer sub-mode classification.
//!
//! DEFINITION questions are general food knowledge and are answered
//! without restaurant data (optionally annotated with where the term shows
//! up on the grounded menu). MENU_FACT questions must cite only a grounded
//! dish's stored description; when no dish can be confidently matched the
//! engine asks instead of guessing.

use dishcovery_protocol::LastResultDish;
use once_cell::sync::Lazy;
use regex::Regex;

static DEFINITION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:what\s+is|what's|whats|vad\s+är)\s+(?:a\s+|an\s+|the\s+|en\s+|ett\s+)?(.+?)\s*\??\s*$")
        .expect("static definition regex")
});

static MEANING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*what\s+does\s+(.+?)\s+mean\s*\??\s*$").expect("static meaning regex")
});

#[derive(Debug, Clone, PartialEq)]
pub enum ExplainQuestion {
    /// General food knowledge; answered from the model, no menu data.
    Definition { term: String },
    /// A fact about a specific dish on the grounded menu.
    MenuFact,
}

pub fn classify(text: &str) -> ExplainQuestion {
    if let Some(caps) = MEANING_RE.captures(text).or_else(|| DEFINITION_RE.captures(text)) {
        let term = caps[1].trim().trim_matches('"').to_string();
        if !term.is_empty() {
            return ExplainQuestion::Definition { term };
        }
    }
    ExplainQuestion::MenuFact
}

/// Grounded dishes whose name or description mentions the term, for the
/// "this term also appears on this menu in: …" annotation.
pub fn menu_hits(term: &str, last_results: &[LastResultDish]) -> Vec<String> {
    let term = term.to_lowercase();
    let mut hits: Vec<String> = last_results
        .iter()
        .filter(|d| {
            d.dish_name.to_lowercase().contains(&term)
                || d.description
                    .as_deref()
                    .is_some_and(|desc| desc.to_lowercase().contains(&term))
        })
        .map(|d| d.dish_name.clone())
        .collect();
    hits.dedup();
    hits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn what_is_questions_are_definitions() {
        assert_eq!(
            classify("what is a vindaloo?"),
            ExplainQuestion::Definition {
                term: "vindaloo".into()
            }
        );
        assert_eq!(
            classify("vad är halal?"),
            ExplainQuestion::Definition {
                term: "halal".into()
            }
        );
        assert_eq!(
            classify("what does calzone mean?"),
            ExplainQuestion::Definition {
                term: "calzone".into()
            }
        );
    }

    #[test]
    fn dish_fact_questions_are_menu_facts() {
        assert_eq!(classify("is the butter chicken spicy?"), ExplainQuestion::MenuFact);
        assert_eq!(classify("does it contain nuts"), ExplainQuestion::MenuFact);
    }

    #[test]
    fn menu_hits_scan_names_and_descriptions() {
        let dishes = vec![
            LastResultDish {
                dish_id: 1,
                dish_name: "Chicken Vindaloo".into(),
                restaurant_id: 1,
                restaurant_name: "Indian Bites".into(),
                tag_slugs: vec![],
                price_minor: None,
                description: None,
            },
            LastResultDish {
                dish_id: 2,
                dish_name: "House Curry".into(),
                restaurant_id: 1,
                restaurant_name: "Indian Bites".into(),
                tag_slugs: vec![],
                price_minor: None,
                description: Some("vindaloo-style heat".into()),
            },
        ];
        let hits = menu_hits("vindaloo", &dishes);
        assert_eq!(hits, vec!["Chicken Vindaloo".to_string(), "House Curry".to_string()]);
    }
}
