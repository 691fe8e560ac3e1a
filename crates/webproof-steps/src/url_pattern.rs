//! URL patterns used by step definitions.
//!
//! Syntax:
//! - `*` matches any run of characters, `/` included
//! - `:name` matches one non-empty path segment (no `/`, `?` or `#`)
//! - everything else is literal
//!
//! The whole URL must match. `https://x.com:8080/` is literal: a `:` only
//! starts a parameter when followed by a letter or `_`.

use regex::Regex;

use crate::errors::{StepError, StepResult};

#[derive(Debug, Clone)]
pub struct UrlPattern {
    source: String,
    regex: Regex,
}

impl UrlPattern {
    pub fn new(pattern: &str) -> StepResult<Self> {
        if pattern.trim().is_empty() {
            return Err(StepError::invalid_pattern(pattern, "pattern is empty"));
        }

        let mut re = String::with_capacity(pattern.len() * 2 + 2);
        re.push('^');

        let mut chars = pattern.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '*' => re.push_str(".*"),
                ':' if chars.peek().is_some_and(|n| n.is_ascii_alphabetic() || *n == '_') => {
                    while chars.peek().is_some_and(|n| n.is_ascii_alphanumeric() || *n == '_') {
                        chars.next();
                    }
                    re.push_str("[^/?#]+");
                }
                other => re.push_str(&regex::escape(other.encode_utf8(&mut [0u8; 4]))),
            }
        }
        re.push('$');

        let regex = Regex::new(&re).map_err(|e| StepError::invalid_pattern(pattern, e.to_string()))?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, url: &str) -> bool {
        self.regex.is_match(url)
    }
}
