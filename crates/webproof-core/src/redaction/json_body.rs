//! JSON body redaction by field path.
//!
//! Paths are dot separated, array elements addressed by index:
//! `user.emails.0`. A path naming an object or array redacts every leaf under
//! it. String leaves are redacted without their quotes so the document shape
//! stays visible; numbers, booleans and `null` are redacted as whole tokens.
//! Object keys are never redacted.
//!
//! serde_json does not report source positions, so the body is validated with
//! serde_json first and then walked by a small scanner that records the byte
//! span of each leaf.

use crate::errors::{WebProofError, WebProofResult};
use crate::http::ParsedHttpMessage;
use crate::range::Range;

const MAX_DEPTH: usize = 128;

/// A scalar value and its span inside the body text (UTF-8 offsets).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonLeaf {
    pub path: Vec<String>,
    pub span: std::ops::Range<usize>,
}

impl JsonLeaf {
    fn is_under(&self, path: &[&str]) -> bool {
        self.path.len() >= path.len() && self.path.iter().zip(path).all(|(a, b)| a == b)
    }
}

fn split_path(path: &str) -> Vec<&str> {
    path.split('.').filter(|s| !s.is_empty()).collect()
}

/// Collect every scalar leaf of a JSON document with its span.
pub fn scan_leaves(body: &str) -> WebProofResult<Vec<JsonLeaf>> {
    serde_json::from_str::<serde_json::Value>(body)
        .map_err(|e| WebProofError::invalid_json_body(e.to_string()))?;

    let mut scanner = Scanner {
        src: body.as_bytes(),
        pos: 0,
        leaves: Vec::new(),
    };
    let mut path = Vec::new();
    scanner.value(&mut path, 0)?;
    Ok(scanner.leaves)
}

struct Scanner<'a> {
    src: &'a [u8],
    pos: usize,
    leaves: Vec<JsonLeaf>,
}

impl<'a> Scanner<'a> {
    fn err(&self, msg: &str) -> WebProofError {
        WebProofError::invalid_json_body(format!("{msg} at byte {}", self.pos))
    }

    fn skip_ws(&mut self) {
        while self.pos < self.src.len() && matches!(self.src[self.pos], b' ' | b'\t' | b'\n' | b'\r') {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn expect(&mut self, b: u8) -> WebProofResult<()> {
        self.skip_ws();
        if self.peek() == Some(b) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.err(&format!("expected '{}'", b as char)))
        }
    }

    fn value(&mut self, path: &mut Vec<String>, depth: usize) -> WebProofResult<()> {
        if depth > MAX_DEPTH {
            return Err(self.err("document nested too deeply"));
        }
        self.skip_ws();
        match self.peek() {
            Some(b'{') => self.object(path, depth),
            Some(b'[') => self.array(path, depth),
            Some(b'"') => {
                let span = self.string()?;
                // Quotes excluded.
                self.leaves.push(JsonLeaf {
                    path: path.clone(),
                    span: span.start + 1..span.end - 1,
                });
                Ok(())
            }
            Some(_) => {
                let start = self.pos;
                while self.pos < self.src.len()
                    && matches!(self.src[self.pos], b'0'..=b'9' | b'a'..=b'z' | b'A'..=b'Z' | b'+' | b'-' | b'.')
                {
                    self.pos += 1;
                }
                if self.pos == start {
                    return Err(self.err("unexpected character"));
                }
                self.leaves.push(JsonLeaf {
                    path: path.clone(),
                    span: start..self.pos,
                });
                Ok(())
            }
            None => Err(self.err("unexpected end of input")),
        }
    }

    /// Consume a string literal, returning its span including quotes.
    fn string(&mut self) -> WebProofResult<std::ops::Range<usize>> {
        let start = self.pos;
        self.pos += 1;
        while let Some(b) = self.peek() {
            self.pos += 1;
            match b {
                b'\\' => self.pos += 1,
                b'"' => return Ok(start..self.pos),
                _ => {}
            }
        }
        Err(self.err("unterminated string"))
    }

    fn object(&mut self, path: &mut Vec<String>, depth: usize) -> WebProofResult<()> {
        self.expect(b'{')?;
        self.skip_ws();
        if self.peek() == Some(b'}') {
            self.pos += 1;
            return Ok(());
        }
        loop {
            self.skip_ws();
            if self.peek() != Some(b'"') {
                return Err(self.err("expected object key"));
            }
            let span = self.string()?;
            let raw = std::str::from_utf8(&self.src[span])
                .map_err(|_| self.err("invalid utf-8 in key"))?;
            let key: String = serde_json::from_str(raw)
                .map_err(|e| WebProofError::invalid_json_body(e.to_string()))?;

            self.expect(b':')?;
            path.push(key);
            self.value(path, depth + 1)?;
            path.pop();

            self.skip_ws();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b'}') => {
                    self.pos += 1;
                    return Ok(());
                }
                _ => return Err(self.err("expected ',' or '}'")),
            }
        }
    }

    fn array(&mut self, path: &mut Vec<String>, depth: usize) -> WebProofResult<()> {
        self.expect(b'[')?;
        self.skip_ws();
        if self.peek() == Some(b']') {
            self.pos += 1;
            return Ok(());
        }
        let mut index = 0usize;
        loop {
            path.push(index.to_string());
            self.value(path, depth + 1)?;
            path.pop();
            index += 1;

            self.skip_ws();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b']') => {
                    self.pos += 1;
                    return Ok(());
                }
                _ => return Err(self.err("expected ',' or ']'")),
            }
        }
    }
}

/// Map leaf spans (UTF-8 offsets into `body`) to whole-message byte ranges.
fn to_message_ranges<'a>(
    msg: &ParsedHttpMessage,
    body: &str,
    leaves: impl Iterator<Item = &'a JsonLeaf>,
) -> Vec<Range> {
    let enc = msg.encoding;
    let base = msg.body.range.start;
    leaves
        .filter(|l| !l.span.is_empty())
        .map(|l| {
            let start = base + enc.encoded_len(&body[..l.span.start]);
            let len = enc.encoded_len(&body[l.span.clone()]);
            Range::new(start, start + len)
        })
        .collect()
}

/// Redact the values at the given paths.
pub fn redact_json_body(msg: &ParsedHttpMessage, paths: &[String]) -> WebProofResult<Vec<Range>> {
    let body = msg.body_text()?;
    let leaves = scan_leaves(&body)?;
    let targets: Vec<Vec<&str>> = paths.iter().map(|p| split_path(p)).collect();

    for (raw, t) in paths.iter().zip(&targets) {
        if !leaves.iter().any(|l| l.is_under(t)) {
            tracing::debug!(path = %raw, "json path not present in body, skipping");
        }
    }

    let selected = leaves.iter().filter(|l| targets.iter().any(|t| l.is_under(t)));
    Ok(to_message_ranges(msg, &body, selected))
}

/// Redact every leaf value not at or under one of the given paths.
pub fn redact_json_body_except(msg: &ParsedHttpMessage, keep: &[String]) -> WebProofResult<Vec<Range>> {
    let body = msg.body_text()?;
    let leaves = scan_leaves(&body)?;
    let kept: Vec<Vec<&str>> = keep.iter().map(|p| split_path(p)).collect();

    let selected = leaves.iter().filter(|l| !kept.iter().any(|t| l.is_under(t)));
    Ok(to_message_ranges(msg, &body, selected))
}
