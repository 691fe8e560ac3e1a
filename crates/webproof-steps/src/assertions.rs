//! Last observed result of each DOM assertion, keyed by step label.
//!
//! A `userAction` step can only be checked while its page is open. Once the
//! user navigates away the stored result stands in for the live check.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

#[derive(Debug, Clone, Default)]
pub struct AssertionStore {
    inner: Arc<RwLock<HashMap<String, bool>>>,
}

impl AssertionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored result for `label`; `false` when never observed.
    pub fn get(&self, label: &str) -> bool {
        self.inner.read().get(label).copied().unwrap_or(false)
    }

    pub fn set(&self, label: &str, value: bool) {
        self.inner.write().insert(label.to_string(), value);
    }

    pub fn contains(&self, label: &str) -> bool {
        self.inner.read().contains_key(label)
    }

    pub fn clear(&self) {
        self.inner.write().clear();
    }
}
