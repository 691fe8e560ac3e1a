//! Error types for webproof-core.
//!
//! All fallible operations in this crate return [`WebProofResult`]. Variants are
//! grouped by what went wrong, not by which module raised them:
//! - encoding errors (unsupported label, cross-encoding comparison)
//! - malformed input (HTTP message, JSON body, URL, redaction config)
//! - capacity errors (request larger than the notary accepts)
//!
//! "Not found" is never an error here. Searches return `Option` and redaction
//! targets missing from a transcript simply produce no range.

use crate::encoding::Encoding;

/// Crate-wide result alias.
pub type WebProofResult<T> = Result<T, WebProofError>;

#[derive(Debug, thiserror::Error)]
pub enum WebProofError {
    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),

    #[error("encoding mismatch: cannot compare {left} with {right}")]
    EncodingMismatch { left: Encoding, right: Encoding },

    #[error("invalid http message: {reason} (near {fragment:?})")]
    InvalidHttpMessage { reason: String, fragment: String },

    #[error("invalid redaction config: {0}")]
    InvalidRedactionConfig(String),

    #[error("invalid json body: {0}")]
    InvalidJsonBody(String),

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("request too large: {size} bytes exceeds maximum of {max} bytes")]
    RequestTooLarge { size: usize, max: usize },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl WebProofError {
    pub fn invalid_encoding(msg: impl Into<String>) -> Self {
        Self::InvalidEncoding(msg.into())
    }

    /// Build a malformed-message error, keeping a short excerpt of the input for diagnosis.
    pub fn invalid_http_message(reason: impl Into<String>, fragment: &str) -> Self {
        Self::InvalidHttpMessage {
            reason: reason.into(),
            fragment: excerpt(fragment, 64),
        }
    }

    pub fn invalid_redaction_config(msg: impl Into<String>) -> Self {
        Self::InvalidRedactionConfig(msg.into())
    }

    pub fn invalid_json_body(msg: impl Into<String>) -> Self {
        Self::InvalidJsonBody(msg.into())
    }

    pub fn invalid_url(msg: impl Into<String>) -> Self {
        Self::InvalidUrl(msg.into())
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }
}

fn excerpt(s: &str, max_chars: usize) -> String {
    let mut out: String = s.chars().take(max_chars).collect();
    if s.chars().count() > max_chars {
        out.push_str("...");
    }
    out
}
