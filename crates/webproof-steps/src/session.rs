//! Per-proof session state.
//!
//! The host feeds captured requests and prover progress into a [`Session`];
//! the poller reads it through [`SignalSource`]. Everything is cleared on
//! [`Session::reset`] when a new proof starts.

use parking_lot::RwLock;
use webproof_core::request_size::RequestParams;

use crate::assertions::AssertionStore;
use crate::errors::StepResult;
use crate::history::{BrowsingHistoryItem, SignalSource, ZkProvingStatus};
use crate::step::NotarizeStep;
use crate::url_pattern::UrlPattern;

#[derive(Debug, Default)]
pub struct Session {
    history: RwLock<Vec<BrowsingHistoryItem>>,
    proving_status: RwLock<ZkProvingStatus>,
    assertions: AssertionStore,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_request(&self, item: BrowsingHistoryItem) {
        tracing::debug!(url = %item.url, method = %item.method, ready = item.ready, "request recorded");
        self.history.write().push(item);
    }

    /// Mark the most recent matching request as completed.
    ///
    /// Returns false if no pending request matches.
    pub fn mark_ready(&self, url: &str, method: &str) -> bool {
        let mut history = self.history.write();
        match history
            .iter_mut()
            .rev()
            .find(|item| !item.ready && item.url == url && item.method_matches(method))
        {
            Some(item) => {
                item.ready = true;
                true
            }
            None => false,
        }
    }

    pub fn set_proving_status(&self, status: ZkProvingStatus) {
        *self.proving_status.write() = status;
    }

    /// Shared handle to the assertion store; pass it to the orchestrator.
    pub fn assertions(&self) -> AssertionStore {
        self.assertions.clone()
    }

    pub fn reset(&self) {
        self.history.write().clear();
        *self.proving_status.write() = ZkProvingStatus::NotStarted;
        self.assertions.clear();
        tracing::info!("session reset");
    }

    /// The latest completed request a notarize step would replay.
    pub fn notarize_request(&self, step: &NotarizeStep) -> StepResult<Option<RequestParams>> {
        let pattern = UrlPattern::new(&step.url)?;
        let history = self.history.read();
        let found = history
            .iter()
            .rev()
            .find(|item| item.ready && item.method_matches(&step.method) && pattern.matches(&item.url));

        Ok(found.map(|item| RequestParams {
            url: item.url.clone(),
            method: item.method.clone(),
            headers: item.headers.clone(),
            body: item.body.clone(),
        }))
    }
}

impl SignalSource for Session {
    fn history(&self) -> Vec<BrowsingHistoryItem> {
        self.history.read().clone()
    }

    fn proving_status(&self) -> ZkProvingStatus {
        *self.proving_status.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use webproof_core::config::NotaryLimits;
    use webproof_core::request_size::ensure_within_capacity;

    fn notarize_step() -> NotarizeStep {
        NotarizeStep {
            url: "https://api.bank.example/v1/*".to_string(),
            method: "GET".to_string(),
            label: "prove".to_string(),
            redaction: Default::default(),
            outputs: Vec::new(),
        }
    }

    #[test]
    fn mark_ready_updates_latest_pending() {
        let session = Session::new();
        session.record_request(BrowsingHistoryItem::new("https://a/x", "GET").ready());
        session.record_request(BrowsingHistoryItem::new("https://a/x", "GET"));
        assert!(session.mark_ready("https://a/x", "get"));
        assert!(session.history().iter().all(|i| i.ready));
        assert!(!session.mark_ready("https://a/x", "GET"));
    }

    #[test]
    fn reset_clears_everything() {
        let session = Session::new();
        session.record_request(BrowsingHistoryItem::new("https://a/", "GET"));
        session.set_proving_status(ZkProvingStatus::Done);
        session.assertions().set("2fa", true);

        session.reset();
        assert!(session.history().is_empty());
        assert_eq!(session.proving_status(), ZkProvingStatus::NotStarted);
        assert!(!session.assertions().contains("2fa"));
    }

    #[test]
    fn notarize_request_replays_captured_request() {
        let session = Session::new();
        session.record_request(BrowsingHistoryItem::new("https://api.bank.example/v1/accounts", "GET"));
        assert!(session.notarize_request(&notarize_step()).unwrap().is_none());

        session.record_request(
            BrowsingHistoryItem::new("https://api.bank.example/v1/accounts?page=2", "GET")
                .with_headers(vec![("Authorization".to_string(), "Bearer t".to_string())])
                .ready(),
        );
        let params = session.notarize_request(&notarize_step()).unwrap().unwrap();
        assert_eq!(params.url, "https://api.bank.example/v1/accounts?page=2");
        assert_eq!(params.headers.len(), 1);
        assert!(ensure_within_capacity(&params, &NotaryLimits::default()).is_ok());
    }
}
