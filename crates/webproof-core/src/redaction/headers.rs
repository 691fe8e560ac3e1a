//! Header redaction.
//!
//! A redacted header hides its whole line, `Name: value\r\n`. Names compare
//! case-insensitively. Repeated headers (e.g. `Set-Cookie`) are all redacted.

use crate::http::ParsedHttpMessage;
use crate::range::Range;

fn listed(names: &[String], name: &str) -> bool {
    names.iter().any(|n| n.trim().eq_ignore_ascii_case(name))
}

/// Redact every line whose header name is in `names`.
pub fn redact_headers(msg: &ParsedHttpMessage, names: &[String]) -> Vec<Range> {
    let lines = msg.header_lines();

    for name in names {
        if !lines.iter().any(|l| l.name.eq_ignore_ascii_case(name.trim())) {
            tracing::debug!(header = %name, "header not present in transcript, skipping");
        }
    }

    lines
        .into_iter()
        .filter(|l| listed(names, &l.name))
        .map(|l| l.range)
        .collect()
}

/// Redact every header line except those named in `keep`.
pub fn redact_headers_except(msg: &ParsedHttpMessage, keep: &[String]) -> Vec<Range> {
    msg.header_lines()
        .into_iter()
        .filter(|l| !listed(keep, &l.name))
        .map(|l| l.range)
        .collect()
}
