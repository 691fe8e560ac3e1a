//! Redaction range calculation.
//!
//! A [`RedactionConfig`] is a list of [`RedactionItem`]s, each saying what to
//! hide on one side of the transcript. This module turns each item into byte
//! ranges of the sent (request) or received (response) message, which are then
//! handed to the notarization library.
//!
//! Items are a closed enum and dispatch has no wildcard arm: adding a new kind
//! of redaction does not compile until it is handled here. A silently ignored
//! item would leak data the user asked to hide.
//!
//! Redaction targets that are not present in a transcript produce no range.
//! Header and query presence depends on the server, not on the config.
//!
//! Config JSON shape:
//!
//! ```json
//! [
//!   { "request":  { "headers": ["Authorization"] } },
//!   { "request":  { "url_query_except": ["page"] } },
//!   { "response": { "json_body": ["user.email"] } }
//! ]
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{WebProofError, WebProofResult};
use crate::http::{parse_http_message, ParsedHttpMessage};
use crate::range::{normalize_ranges, Range};

pub mod headers;
pub mod json_body;
pub mod url_query;

/// A captured request/response pair as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpTranscript {
    pub sent: String,
    pub recv: String,
}

impl HttpTranscript {
    pub fn new(sent: impl Into<String>, recv: impl Into<String>) -> Self {
        Self {
            sent: sent.into(),
            recv: recv.into(),
        }
    }
}

/// Which half of the transcript a range applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Sent,
    Received,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestRedaction {
    Headers(Vec<String>),
    HeadersExcept(Vec<String>),
    UrlQuery(Vec<String>),
    UrlQueryExcept(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseRedaction {
    Headers(Vec<String>),
    HeadersExcept(Vec<String>),
    JsonBody(Vec<String>),
    JsonBodyExcept(Vec<String>),
}

/// One redaction directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedactionItem {
    Request(RequestRedaction),
    Response(ResponseRedaction),
}

impl RedactionItem {
    pub fn direction(&self) -> Direction {
        match self {
            Self::Request(_) => Direction::Sent,
            Self::Response(_) => Direction::Received,
        }
    }

    /// Stable name used for exclusivity checks and diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Request(RequestRedaction::Headers(_)) => "request.headers",
            Self::Request(RequestRedaction::HeadersExcept(_)) => "request.headers_except",
            Self::Request(RequestRedaction::UrlQuery(_)) => "request.url_query",
            Self::Request(RequestRedaction::UrlQueryExcept(_)) => "request.url_query_except",
            Self::Response(ResponseRedaction::Headers(_)) => "response.headers",
            Self::Response(ResponseRedaction::HeadersExcept(_)) => "response.headers_except",
            Self::Response(ResponseRedaction::JsonBody(_)) => "response.json_body",
            Self::Response(ResponseRedaction::JsonBodyExcept(_)) => "response.json_body_except",
        }
    }
}

/// A full redaction configuration for one notarize step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RedactionConfig(pub Vec<RedactionItem>);

/// Pairs of kinds that may not appear together in one config.
const EXCLUSIVE_KINDS: &[(&str, &str)] = &[
    ("request.headers", "request.headers_except"),
    ("request.url_query", "request.url_query_except"),
    ("response.headers", "response.headers_except"),
    ("response.json_body", "response.json_body_except"),
];

impl RedactionConfig {
    pub fn new(items: Vec<RedactionItem>) -> Self {
        Self(items)
    }

    pub fn items(&self) -> &[RedactionItem] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn from_json_str(s: &str) -> WebProofResult<Self> {
        let cfg: Self = serde_json::from_str(s)
            .map_err(|e| WebProofError::serialization(format!("failed to parse redaction config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject configs that combine a mode with its `_except` counterpart.
    pub fn validate(&self) -> WebProofResult<()> {
        for (a, b) in EXCLUSIVE_KINDS {
            let has_a = self.0.iter().any(|i| i.kind() == *a);
            let has_b = self.0.iter().any(|i| i.kind() == *b);
            if has_a && has_b {
                return Err(WebProofError::invalid_redaction_config(format!(
                    "{a} and {b} are mutually exclusive"
                )));
            }
        }
        Ok(())
    }
}

/// Redaction ranges for both halves of a transcript, sorted and merged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedactionRanges {
    pub sent: Vec<Range>,
    pub recv: Vec<Range>,
}

impl RedactionRanges {
    pub fn is_empty(&self) -> bool {
        self.sent.is_empty() && self.recv.is_empty()
    }
}

/// Compute ranges for a single item, relative to the side it targets.
pub fn calculate_item_ranges(item: &RedactionItem, transcript: &HttpTranscript) -> WebProofResult<Vec<Range>> {
    match item {
        RedactionItem::Request(req) => {
            let msg = parse_http_message(&transcript.sent)?;
            request_ranges(req, &msg)
        }
        RedactionItem::Response(resp) => {
            let msg = parse_http_message(&transcript.recv)?;
            response_ranges(resp, &msg)
        }
    }
}

fn request_ranges(item: &RequestRedaction, msg: &ParsedHttpMessage) -> WebProofResult<Vec<Range>> {
    match item {
        RequestRedaction::Headers(names) => Ok(headers::redact_headers(msg, names)),
        RequestRedaction::HeadersExcept(names) => Ok(headers::redact_headers_except(msg, names)),
        RequestRedaction::UrlQuery(names) => url_query::redact_url_query(msg, names),
        RequestRedaction::UrlQueryExcept(names) => url_query::redact_url_query_except(msg, names),
    }
}

fn response_ranges(item: &ResponseRedaction, msg: &ParsedHttpMessage) -> WebProofResult<Vec<Range>> {
    match item {
        ResponseRedaction::Headers(names) => Ok(headers::redact_headers(msg, names)),
        ResponseRedaction::HeadersExcept(names) => Ok(headers::redact_headers_except(msg, names)),
        ResponseRedaction::JsonBody(paths) => json_body::redact_json_body(msg, paths),
        ResponseRedaction::JsonBodyExcept(paths) => json_body::redact_json_body_except(msg, paths),
    }
}

/// Validate `config` and compute ranges for every item.
pub fn calculate_redaction_ranges(config: &RedactionConfig, transcript: &HttpTranscript) -> WebProofResult<RedactionRanges> {
    config.validate()?;

    let mut sent = Vec::new();
    let mut recv = Vec::new();
    for item in config.items() {
        let ranges = calculate_item_ranges(item, transcript)?;
        tracing::debug!(kind = item.kind(), count = ranges.len(), "computed redaction ranges");
        match item.direction() {
            Direction::Sent => sent.extend(ranges),
            Direction::Received => recv.extend(ranges),
        }
    }

    Ok(RedactionRanges {
        sent: normalize_ranges(&sent),
        recv: normalize_ranges(&recv),
    })
}
