//! Configuration structures for webproof-core.
//!
//! Configuration is explicit and passed by the caller. The core crate does not
//! read environment variables or any other ambient state.

use serde::{Deserialize, Serialize};

use crate::errors::{WebProofError, WebProofResult};

/// Default maximum bytes the notary accepts in the sent direction.
pub const DEFAULT_MAX_SENT_SIZE: usize = 1 << 12;

/// Default maximum bytes the notary accepts in the received direction.
pub const DEFAULT_MAX_RECV_SIZE: usize = 1 << 14;

/// Global configuration container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WebProofConfig {
    pub notary: NotaryLimits,
}

/// Capacity limits of the notarization channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NotaryLimits {
    pub max_sent_size: usize,
    pub max_recv_size: usize,
}

impl Default for NotaryLimits {
    fn default() -> Self {
        Self {
            max_sent_size: DEFAULT_MAX_SENT_SIZE,
            max_recv_size: DEFAULT_MAX_RECV_SIZE,
        }
    }
}

impl WebProofConfig {
    /// Parse from JSON; missing fields take their defaults.
    pub fn from_json_str(s: &str) -> WebProofResult<Self> {
        let cfg: Self = serde_json::from_str(s)
            .map_err(|e| WebProofError::serialization(format!("failed to parse config: {e}")))?;
        validate_config(&cfg)?;
        Ok(cfg)
    }
}

/// Validate a full configuration object.
pub fn validate_config(cfg: &WebProofConfig) -> WebProofResult<()> {
    if cfg.notary.max_sent_size == 0 {
        return Err(WebProofError::invalid_config(
            "notary.maxSentSize must be greater than zero",
        ));
    }

    if cfg.notary.max_recv_size == 0 {
        return Err(WebProofError::invalid_config(
            "notary.maxRecvSize must be greater than zero",
        ));
    }

    Ok(())
}
