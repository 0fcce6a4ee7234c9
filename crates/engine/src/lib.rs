//! # Dishcovery Engine
//!
//! The per-turn conversational core: planner, deterministic overrides,
//! follow-up resolver, explain/translate handlers, and the orchestrator
//! that ties them to the search ladder and the menu store.
//!
//! The engine is stateless between calls. Each turn consumes a
//! [`dishcovery_protocol::ChatRequest`] carrying the caller-owned
//! conversation state and returns a [`dishcovery_protocol::ChatResponse`]
//! with the replacement state; the only boundary that can fail hands back
//! an apology message with the previous state untouched.

mod engine;
mod error;
mod explain;
mod followup;
mod llm;
mod messages;
mod overrides;
mod planner;
mod trace;

pub use engine::Engine;
pub use error::{EngineError, Result};
pub use followup::FollowupOutcome;
pub use llm::{LanguageModel, ModelError, PhrasebookModel, PlanAdvice};
pub use overrides::{default_rules, evaluate, ForcedAction, OverrideRule, RuleContext};
pub use planner::Planner;
pub use trace::RequestTrace;
