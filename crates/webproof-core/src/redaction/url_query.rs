//! URL query parameter redaction.
//!
//! Only parameter values are hidden; names stay visible so a verifier can see
//! which parameters were sent. Names are compared exactly as they appear on
//! the wire (no percent-decoding).

use crate::errors::{WebProofError, WebProofResult};
use crate::http::ParsedHttpMessage;
use crate::range::Range;

/// A query parameter and the byte range of its value inside the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParam {
    pub name: String,
    pub value: String,
    pub value_range: Range,
}

/// Parse the request target's query string into parameters.
///
/// `url_offset` is the byte offset of `target` inside the whole message;
/// returned ranges are relative to the whole message.
pub fn parse_query_params(msg: &ParsedHttpMessage, target: &str, url_offset: usize) -> Vec<QueryParam> {
    let enc = msg.encoding;
    let Some(q_start) = target.find('?').map(|i| i + 1) else {
        return Vec::new();
    };
    let q_end = target[q_start..].find('#').map(|i| q_start + i).unwrap_or(target.len());

    let mut out = Vec::new();
    let mut pos = q_start;
    for pair in target[q_start..q_end].split('&') {
        let pair_start = pos;
        pos += pair.len() + 1;
        if pair.is_empty() {
            continue;
        }

        let (name, value, value_start) = match pair.split_once('=') {
            Some((n, v)) => (n, v, pair_start + n.len() + 1),
            None => (pair, "", pair_start + pair.len()),
        };

        let start = url_offset + enc.encoded_len(&target[..value_start]);
        out.push(QueryParam {
            name: name.to_string(),
            value: value.to_string(),
            value_range: Range::new(start, start + enc.encoded_len(value)),
        });
    }
    out
}

fn query_params(msg: &ParsedHttpMessage) -> WebProofResult<Vec<QueryParam>> {
    let (target, url_offset) = msg.request_target().ok_or_else(|| {
        WebProofError::invalid_http_message("url query redaction needs a request line", msg.info_line())
    })?;
    Ok(parse_query_params(msg, &target, url_offset))
}

/// Redact the values of the named parameters.
pub fn redact_url_query(msg: &ParsedHttpMessage, names: &[String]) -> WebProofResult<Vec<Range>> {
    let params = query_params(msg)?;

    for name in names {
        if !params.iter().any(|p| &p.name == name) {
            tracing::debug!(param = %name, "query parameter not present in transcript, skipping");
        }
    }

    Ok(params
        .into_iter()
        .filter(|p| names.contains(&p.name) && !p.value_range.is_empty())
        .map(|p| p.value_range)
        .collect())
}

/// Redact the values of every parameter not named in `keep`.
pub fn redact_url_query_except(msg: &ParsedHttpMessage, keep: &[String]) -> WebProofResult<Vec<Range>> {
    Ok(query_params(msg)?
        .into_iter()
        .filter(|p| !keep.contains(&p.name) && !p.value_range.is_empty())
        .map(|p| p.value_range)
        .collect())
}
