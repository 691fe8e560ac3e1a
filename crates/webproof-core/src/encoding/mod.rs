//! Text encodings and the byte-accurate [`EncodedString`].
//!
//! Everything downstream of this module (HTTP parsing, redaction) does range
//! math in bytes of a specific encoding. Character offsets are never used.

use std::fmt;

use crate::errors::{WebProofError, WebProofResult};

mod encoded_string;

pub use encoded_string::{EncodedString, Needle};

/// Supported transcript encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    Utf8,
    Utf16Be,
}

impl Encoding {
    /// Parse a charset label as found in a `Content-Type` header.
    ///
    /// Accepts `utf-8`, `utf8`, `utf-16be` and `utf-16` (big-endian when no BOM
    /// is present). Matching is case-insensitive and surrounding quotes are ignored.
    pub fn parse(label: &str) -> WebProofResult<Self> {
        let normalized = label.trim().trim_matches('"').to_ascii_lowercase();
        match normalized.as_str() {
            "utf-8" | "utf8" => Ok(Self::Utf8),
            "utf-16be" | "utf-16" => Ok(Self::Utf16Be),
            _ => Err(WebProofError::invalid_encoding(format!(
                "unsupported charset: {label}"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Utf16Be => "utf-16be",
        }
    }

    /// Encode `s` into this encoding's byte representation.
    pub fn encode(&self, s: &str) -> Vec<u8> {
        match self {
            Self::Utf8 => s.as_bytes().to_vec(),
            // Raw code units, so astral characters become two surrogate halves.
            Self::Utf16Be => s.encode_utf16().flat_map(u16::to_be_bytes).collect(),
        }
    }

    /// Number of bytes `s` occupies in this encoding, without allocating.
    pub fn encoded_len(&self, s: &str) -> usize {
        match self {
            Self::Utf8 => s.len(),
            Self::Utf16Be => s.encode_utf16().count() * 2,
        }
    }

    /// Strictly decode bytes produced by [`Encoding::encode`].
    pub fn decode(&self, bytes: &[u8]) -> WebProofResult<String> {
        match self {
            Self::Utf8 => String::from_utf8(bytes.to_vec())
                .map_err(|e| WebProofError::invalid_encoding(format!("invalid utf-8: {e}"))),
            Self::Utf16Be => {
                if bytes.len() % 2 != 0 {
                    return Err(WebProofError::invalid_encoding(
                        "utf-16be input has odd byte length",
                    ));
                }
                let units: Vec<u16> = bytes
                    .chunks_exact(2)
                    .map(|c| u16::from_be_bytes([c[0], c[1]]))
                    .collect();
                String::from_utf16(&units)
                    .map_err(|e| WebProofError::invalid_encoding(format!("invalid utf-16be: {e}")))
            }
        }
    }

    /// Decode, replacing malformed sequences with U+FFFD.
    pub fn decode_lossy(&self, bytes: &[u8]) -> String {
        match self {
            Self::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Self::Utf16Be => {
                let units: Vec<u16> = bytes
                    .chunks(2)
                    .map(|c| match c {
                        [hi, lo] => u16::from_be_bytes([*hi, *lo]),
                        _ => 0xFFFD,
                    })
                    .collect();
                String::from_utf16_lossy(&units)
            }
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
