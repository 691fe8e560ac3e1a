//! webproof-core
//!
//! Pure primitives for preparing a captured HTTP exchange for notarization:
//! - `EncodedString`: byte-accurate search/split/slice over UTF-8 and UTF-16BE
//! - HTTP message parsing into byte windows (info line, headers, body)
//! - redaction range calculation for headers, URL query and JSON body
//! - wire-size prediction for outgoing requests
//! - redacted transcript preview
//!
//! Nothing in this crate performs I/O or holds shared state. Every function is
//! reentrant and can run on any thread.

pub mod config;
pub mod encoding;
pub mod errors;
pub mod http;
pub mod range;
pub mod redaction;
pub mod request_size;
pub mod transcript;

pub use crate::errors::{WebProofError, WebProofResult};

/// Convenience re-exports.
pub mod prelude {
    pub use crate::config::{validate_config, NotaryLimits, WebProofConfig};
    pub use crate::encoding::{EncodedString, Encoding, Needle};
    pub use crate::http::{parse_http_message, HeaderLine, MessagePart, ParsedHttpMessage};
    pub use crate::range::{normalize_ranges, reveal_ranges, Range};
    pub use crate::redaction::{
        calculate_item_ranges, calculate_redaction_ranges, Direction, HttpTranscript, RedactionConfig,
        RedactionItem, RedactionRanges, RequestRedaction, ResponseRedaction,
    };
    pub use crate::request_size::{calculate_request_size, ensure_within_capacity, RequestParams, RequestSize};
    pub use crate::transcript::{decode_redacted, DecodedTranscript};
    pub use crate::{WebProofError, WebProofResult};
}
