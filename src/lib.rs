//! # replygate
//!
//! Response quality control for conversational agents.
//!
//! Upstream generators propose several candidate replies; this crate ranks
//! them with heuristic signals (confidence, persona alignment, novelty,
//! contradictions), adapts per-persona weights over the life of a
//! conversation, and renders the chosen template behind a quality gate that
//! falls back to a safer message when the upstream quality signal is low.
//! Rendered text is finally passed through a humanizer that swaps internal
//! concept identifiers for user-facing labels.
//!
//! Everything is synchronous and CPU-bound.  Session state is explicit:
//! create one [`Orchestrator`] (or [`Evaluator`]) per conversation.

pub mod config;
pub mod error;
pub mod evaluator;
pub mod orchestrator;
pub mod persona;
pub mod render;

pub use config::EngineConfig;
pub use error::ConfigError;
pub use evaluator::{
    Candidate, ConversationHistory, EvaluationResult, Evaluator, EvaluatorState, Turn,
};
pub use orchestrator::{Decision, GenerateOptions, GenerateOutput, Orchestrator};
pub use persona::{sanitize_profile, Persona, PersonaProfile, PersonaWeights};
pub use render::{humanize, LabelsMap, RenderContext, RenderOptions, RenderOutput, Renderer};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
