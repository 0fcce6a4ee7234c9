//! Language-model collaborator contract.
//!
//! The model is a latent, non-deterministic, unreliable dependency. Every
//! advisory call site (intent extraction, plan classification) has a
//! deterministic fallback path; only content-producing calls (explain,
//! translate) are allowed to fail a request, and those failures stop at
//! the engine's error boundary.

use async_trait::async_trait;
use dishcovery_intent::ExtractionHint;
use dishcovery_protocol::{Action, ChatMessage, Language};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("language model unavailable")]
    Unavailable,

    #[error("language model returned malformed output: {0}")]
    Malformed(String),

    #[error("language model call failed: {0}")]
    Upstream(String),
}

/// Advisory plan classification.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanAdvice {
    pub action: Action,
    pub confidence: f32,
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Extract a structured hint from free text. Advisory.
    async fn extract_intent(
        &self,
        text: &str,
        history: &[ChatMessage],
    ) -> Result<ExtractionHint, ModelError>;

    /// Classify the turn into an action. Advisory; the planner's heuristics
    /// and overrides take precedence.
    async fn classify(
        &self,
        text: &str,
        state_summary: &str,
    ) -> Result<PlanAdvice, ModelError>;

    /// General food-knowledge definition for a term.
    async fn explain(&self, term: &str, language: Language) -> Result<String, ModelError>;

    /// Translate text to the target language.
    async fn translate(&self, text: &str, target: Language) -> Result<String, ModelError>;
}

/// Zero-dependency model with a small built-in food phrasebook. Extraction
/// and classification always defer to the engine's heuristics; explain
/// answers from the phrasebook; translate is identity (linguistic
/// correctness is out of scope).
pub struct PhrasebookModel;

const PHRASEBOOK: &[(&str, &str)] = &[
    ("halal", "Halal food is prepared following Islamic dietary law."),
    ("kosher", "Kosher food is prepared following Jewish dietary law."),
    ("vindaloo", "Vindaloo is a hot, tangy curry from Goa, usually with vinegar and chili."),
    ("daal", "Daal (dal) is a spiced stew of lentils or other split pulses."),
    ("dal", "Daal (dal) is a spiced stew of lentils or other split pulses."),
    ("calzone", "A calzone is a folded, sealed pizza baked as a turnover."),
    ("gluten", "Gluten is a protein found in wheat, barley and rye."),
    ("vegan", "Vegan food contains no animal products at all."),
];

#[async_trait]
impl LanguageModel for PhrasebookModel {
    async fn extract_intent(
        &self,
        _text: &str,
        _history: &[ChatMessage],
    ) -> Result<ExtractionHint, ModelError> {
        Err(ModelError::Unavailable)
    }

    async fn classify(&self, _text: &str, _state_summary: &str) -> Result<PlanAdvice, ModelError> {
        Err(ModelError::Unavailable)
    }

    async fn explain(&self, term: &str, _language: Language) -> Result<String, ModelError> {
        let key = term.trim().to_lowercase();
        PHRASEBOOK
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| (*v).to_string())
            .ok_or(ModelError::Unavailable)
    }

    async fn translate(&self, text: &str, _target: Language) -> Result<String, ModelError> {
        Ok(text.to_string())
    }
}
