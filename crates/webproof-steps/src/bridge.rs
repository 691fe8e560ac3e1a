//! Access to the browser tab the user is driving.
//!
//! The orchestrator never talks to a browser directly. Hosts implement
//! [`TabBridge`] over whatever channel they have (extension messaging, CDP,
//! a test double).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// An element found by a selector query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomElement {
    pub tag_name: String,
    #[serde(default)]
    pub text_content: Option<String>,
}

#[async_trait]
pub trait TabBridge: Send + Sync {
    /// URL of the tab currently in focus, if any.
    async fn active_tab_url(&self) -> anyhow::Result<Option<String>>;

    /// First element in the active tab matching `selector`.
    async fn element_on_page(&self, selector: &str) -> anyhow::Result<Option<DomElement>>;
}
