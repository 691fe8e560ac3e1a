//! Error types for webproof-steps.
//!
//! Most orchestration failures are not errors at all: a DOM bridge glitch
//! downgrades a step to "not completed" and is only logged. What remains here
//! is invalid input (bad URL patterns, malformed step definitions) and errors
//! bubbled up from webproof-core.

use webproof_core::WebProofError;

pub type StepResult<T> = Result<T, StepError>;

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("tab bridge failed: {0}")]
    Bridge(String),

    #[error("invalid url pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("invalid step: {0}")]
    InvalidStep(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error(transparent)]
    Core(#[from] WebProofError),
}

impl StepError {
    pub fn bridge(err: &anyhow::Error) -> Self {
        Self::Bridge(format!("{err:#}"))
    }

    pub fn invalid_pattern(pattern: &str, reason: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.into(),
        }
    }

    pub fn invalid_step(msg: impl Into<String>) -> Self {
        Self::InvalidStep(msg.into())
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
