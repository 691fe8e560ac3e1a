//! Half-open byte ranges over a transcript.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A half-open byte range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawRange")]
pub struct Range {
    pub start: usize,
    pub end: usize,
}

#[derive(Deserialize)]
struct RawRange {
    start: usize,
    end: usize,
}

impl TryFrom<RawRange> for Range {
    type Error = String;

    fn try_from(raw: RawRange) -> Result<Self, Self::Error> {
        if raw.start > raw.end {
            return Err(format!("range start {} > end {}", raw.start, raw.end));
        }
        Ok(Self {
            start: raw.start,
            end: raw.end,
        })
    }
}

impl Range {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "range start {start} > end {end}");
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Shift both ends by `offset`.
    pub fn offset(&self, offset: usize) -> Self {
        Self::new(self.start + offset, self.end + offset)
    }

    pub fn contains(&self, pos: usize) -> bool {
        self.start <= pos && pos < self.end
    }

    pub fn as_std(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

impl From<std::ops::Range<usize>> for Range {
    fn from(r: std::ops::Range<usize>) -> Self {
        Self::new(r.start, r.end)
    }
}

/// Sort ranges and merge overlapping or touching ones. Empty ranges are dropped.
pub fn normalize_ranges(ranges: &[Range]) -> Vec<Range> {
    let mut sorted: Vec<Range> = ranges.iter().copied().filter(|r| !r.is_empty()).collect();
    sorted.sort();

    let mut out: Vec<Range> = Vec::with_capacity(sorted.len());
    for r in sorted {
        match out.last_mut() {
            Some(last) if r.start <= last.end => last.end = last.end.max(r.end),
            _ => out.push(r),
        }
    }
    out
}

/// Complement of `redacted` within `[0, total_len)`: the ranges left visible.
pub fn reveal_ranges(total_len: usize, redacted: &[Range]) -> Vec<Range> {
    let mut out = Vec::new();
    let mut cursor = 0;
    for r in normalize_ranges(redacted) {
        let start = r.start.min(total_len);
        if start > cursor {
            out.push(Range::new(cursor, start));
        }
        cursor = cursor.max(r.end.min(total_len));
    }
    if cursor < total_len {
        out.push(Range::new(cursor, total_len));
    }
    out
}
