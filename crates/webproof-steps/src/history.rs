//! Session signals observed from the browser.

use serde::{Deserialize, Serialize};

/// A request seen in the browsing session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowsingHistoryItem {
    pub url: String,
    pub method: String,
    /// True once the request/response pair has completed.
    #[serde(default)]
    pub ready: bool,
    /// Request headers captured for replay by a notarize step.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<(String, String)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl BrowsingHistoryItem {
    pub fn new(url: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: method.into(),
            ready: false,
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn ready(mut self) -> Self {
        self.ready = true;
        self
    }

    pub fn with_headers(mut self, headers: Vec<(String, String)>) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn method_matches(&self, method: &str) -> bool {
        self.method.eq_ignore_ascii_case(method)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ZkProvingStatus {
    #[default]
    NotStarted,
    Proving,
    Done,
    Error,
}

/// Point-in-time view of the signals a status computation reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signals {
    pub history: Vec<BrowsingHistoryItem>,
    pub proving_status: ZkProvingStatus,
}

impl Signals {
    pub fn new(history: Vec<BrowsingHistoryItem>, proving_status: ZkProvingStatus) -> Self {
        Self {
            history,
            proving_status,
        }
    }
}

/// Source of session signals, read once per tick.
pub trait SignalSource: Send + Sync {
    fn history(&self) -> Vec<BrowsingHistoryItem>;

    fn proving_status(&self) -> ZkProvingStatus;

    fn snapshot(&self) -> Signals {
        Signals::new(self.history(), self.proving_status())
    }
}

impl SignalSource for Signals {
    fn history(&self) -> Vec<BrowsingHistoryItem> {
        self.history.clone()
    }

    fn proving_status(&self) -> ZkProvingStatus {
        self.proving_status
    }
}
