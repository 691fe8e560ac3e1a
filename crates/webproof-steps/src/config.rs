//! Orchestrator configuration.
//!
//! Passed explicitly to the poller at construction; nothing here is read from
//! the environment.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{StepError, StepResult};

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;
pub const DEFAULT_REDIRECT_DELAY_MS: u64 = 5_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OrchestratorConfig {
    /// Delay between the end of one status computation and the start of the next.
    pub poll_interval_ms: u64,
    /// How long to wait after every step completed before the flow is reported finished.
    pub redirect_delay_ms: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            redirect_delay_ms: DEFAULT_REDIRECT_DELAY_MS,
        }
    }
}

impl OrchestratorConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn redirect_delay(&self) -> Duration {
        Duration::from_millis(self.redirect_delay_ms)
    }

    pub fn from_json_str(s: &str) -> StepResult<Self> {
        let cfg: Self = serde_json::from_str(s)
            .map_err(|e| StepError::Serialization(format!("failed to parse orchestrator config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> StepResult<()> {
        if self.poll_interval_ms == 0 {
            return Err(StepError::invalid_config("pollIntervalMs must be greater than zero"));
        }
        Ok(())
    }
}
