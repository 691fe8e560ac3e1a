//! webproof-steps
//!
//! Drives a guided web proof flow:
//! - step definitions and URL patterns
//! - status computation (`Completed` / `Current` / `Further`) from session
//!   signals and DOM assertions in the active tab
//! - session state and a polling scheduler publishing statuses
//!
//! Browser access goes through the [`bridge::TabBridge`] trait.

pub mod assertions;
pub mod bridge;
pub mod config;
pub mod errors;
pub mod history;
pub mod orchestrator;
pub mod poller;
pub mod session;
pub mod step;
pub mod url_pattern;

pub use crate::errors::{StepError, StepResult};

/// Convenience re-exports.
pub mod prelude {
    pub use crate::assertions::AssertionStore;
    pub use crate::bridge::{DomElement, TabBridge};
    pub use crate::config::OrchestratorConfig;
    pub use crate::history::{BrowsingHistoryItem, SignalSource, Signals, ZkProvingStatus};
    pub use crate::orchestrator::{all_completed, notarize_gate, StepOrchestrator};
    pub use crate::poller::{PollerHandle, StepPoller};
    pub use crate::session::Session;
    pub use crate::step::{
        steps_from_json_str, validate_steps, DomAssertion, Require, Step, StepKind, StepStatus, WebProofStep,
    };
    pub use crate::url_pattern::UrlPattern;
    pub use crate::{StepError, StepResult};
}
