//! Human-readable rendering of a (partially redacted) transcript.
//!
//! Redacted bytes arrive as `0x00`. They are swapped for a placeholder byte
//! before UTF-8 decoding, not after: a zero byte sitting inside a multi-byte
//! sequence would otherwise corrupt the neighbouring characters.

use serde::{Deserialize, Serialize};

/// Placeholder shown in place of each redacted byte.
pub const REDACTION_PLACEHOLDER: u8 = b'*';

/// Sent/received halves decoded for preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedTranscript {
    pub sent: String,
    pub recv: String,
}

impl DecodedTranscript {
    pub fn new(sent: &[u8], recv: &[u8]) -> Self {
        Self {
            sent: decode_redacted(sent),
            recv: decode_redacted(recv),
        }
    }
}

/// Replace every zero byte with [`REDACTION_PLACEHOLDER`] and decode as UTF-8.
///
/// Input that is still invalid UTF-8 after substitution is decoded lossily.
pub fn decode_redacted(bytes: &[u8]) -> String {
    let substituted: Vec<u8> = bytes
        .iter()
        .map(|&b| if b == 0 { REDACTION_PLACEHOLDER } else { b })
        .collect();
    match String::from_utf8(substituted) {
        Ok(s) => s,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_bytes_become_placeholders() {
        let t = DecodedTranscript::new(&[0, 0x68, 0x65, 0x6c, 0x6c, 0x6f, 0, 0], b"ok");
        assert_eq!(t.sent, "*hello**");
        assert_eq!(t.recv, "ok");
    }

    #[test]
    fn unredacted_multibyte_chars_survive() {
        let mut bytes = "żółw".as_bytes().to_vec();
        bytes.extend_from_slice(&[0, 0]);
        assert_eq!(decode_redacted(&bytes), "żółw**");
    }

    #[test]
    fn partially_redacted_char_is_replaced_not_propagated() {
        // First byte of 'ż' redacted: its continuation byte is invalid on its own.
        let mut bytes = "żx".as_bytes().to_vec();
        bytes[0] = 0;
        assert_eq!(decode_redacted(&bytes), "*\u{FFFD}x");
    }
}
