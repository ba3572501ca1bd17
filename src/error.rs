//! Error types for replygate.
//!
//! Only construction-time work (loading configuration and rule tables) can
//! fail.  Scoring, rendering and the quality gate degrade to safe defaults
//! instead of returning errors.

use thiserror::Error;

/// Errors raised while loading or validating engine configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// YAML parsing or serialization failed.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parsing or serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// File I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration value is out of its allowed range.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A persona rule pattern failed to compile.
    #[error("Invalid pattern for persona '{persona}': {pattern}")]
    InvalidPattern {
        persona: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },
}
