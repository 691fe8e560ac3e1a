//! Step status computation.
//!
//! Statuses are recomputed from scratch on every tick from the session
//! signals, the active tab and the assertion store. The walk is sequential:
//! - a step is only evaluated when every earlier step is `Completed`
//! - the first step that is not completed becomes `Current` if it is ready,
//!   `Further` otherwise
//! - every step after it is `Further` without being evaluated
//!
//! The assertion store is the only state written here.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::assertions::AssertionStore;
use crate::bridge::TabBridge;
use crate::errors::{StepError, StepResult};
use crate::history::{Signals, ZkProvingStatus};
use crate::step::{NavigationStep, NotarizeStep, Step, StepKind, StepStatus, UserActionStep, WebProofStep};
use crate::url_pattern::UrlPattern;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Evaluation {
    Completed,
    Ready,
    NotReady,
}

pub struct StepOrchestrator {
    bridge: Arc<dyn TabBridge>,
    assertions: AssertionStore,
}

impl StepOrchestrator {
    pub fn new(bridge: Arc<dyn TabBridge>, assertions: AssertionStore) -> Self {
        Self { bridge, assertions }
    }

    pub fn assertions(&self) -> &AssertionStore {
        &self.assertions
    }

    /// Compute the status of every step, in order.
    pub async fn calculate_steps(&self, steps: &[WebProofStep], signals: &Signals) -> Vec<Step> {
        let mut out = Vec::with_capacity(steps.len());
        let mut blocked = false;

        for def in steps {
            let status = if blocked {
                StepStatus::Further
            } else {
                match self.evaluate(def, signals).await {
                    Evaluation::Completed => StepStatus::Completed,
                    Evaluation::Ready => {
                        blocked = true;
                        StepStatus::Current
                    }
                    Evaluation::NotReady => {
                        blocked = true;
                        StepStatus::Further
                    }
                }
            };
            out.push(Step::from_definition(def, status));
        }
        out
    }

    async fn evaluate(&self, def: &WebProofStep, signals: &Signals) -> Evaluation {
        match def {
            WebProofStep::StartPage(s) | WebProofStep::Redirect(s) | WebProofStep::ExpectUrl(s) => {
                completed_or_ready(visited(s, signals))
            }
            WebProofStep::Notarize(s) => evaluate_notarize(s, signals),
            WebProofStep::UserAction(s) => completed_or_ready(self.user_action_completed(s).await),
            WebProofStep::ExtractVariables(_) | WebProofStep::ClickButton(_) => Evaluation::Completed,
        }
    }

    async fn user_action_completed(&self, step: &UserActionStep) -> bool {
        match self.observe_assertion(step).await {
            Ok(Some(result)) => {
                self.assertions.set(&step.label, result);
                result
            }
            Ok(None) => self.assertions.get(&step.label),
            Err(e) => {
                warn!(label = %step.label, error = %e, "dom assertion check failed");
                false
            }
        }
    }

    /// Live assertion result, or `None` when the step's page is not in the active tab.
    async fn observe_assertion(&self, step: &UserActionStep) -> StepResult<Option<bool>> {
        let pattern = UrlPattern::new(&step.url)?;
        let active = self
            .bridge
            .active_tab_url()
            .await
            .map_err(|e| StepError::bridge(&e))?;

        match active {
            Some(url) if pattern.matches(&url) => {
                let element = self
                    .bridge
                    .element_on_page(&step.assertion.dom_element)
                    .await
                    .map_err(|e| StepError::bridge(&e))?;
                let result = step.assertion.require.is_satisfied_by(element.is_some());
                debug!(label = %step.label, selector = %step.assertion.dom_element, result, "dom assertion observed");
                Ok(Some(result))
            }
            _ => Ok(None),
        }
    }
}

fn completed_or_ready(completed: bool) -> Evaluation {
    if completed {
        Evaluation::Completed
    } else {
        Evaluation::Ready
    }
}

fn compile(url: &str, label: &str) -> Option<UrlPattern> {
    match UrlPattern::new(url) {
        Ok(p) => Some(p),
        Err(e) => {
            warn!(label, error = %e, "step has an invalid url pattern");
            None
        }
    }
}

fn visited(step: &NavigationStep, signals: &Signals) -> bool {
    let Some(pattern) = compile(&step.url, &step.label) else {
        return false;
    };
    signals.history.iter().any(|item| pattern.matches(&item.url))
}

fn evaluate_notarize(step: &NotarizeStep, signals: &Signals) -> Evaluation {
    if signals.proving_status == ZkProvingStatus::Done {
        return Evaluation::Completed;
    }
    let Some(pattern) = compile(&step.url, &step.label) else {
        return Evaluation::NotReady;
    };
    let ready = signals
        .history
        .iter()
        .any(|item| item.ready && item.method_matches(&step.method) && pattern.matches(&item.url));
    if ready {
        Evaluation::Ready
    } else {
        Evaluation::NotReady
    }
}

/// The notarize step, when it is the one the user should act on now.
pub fn notarize_gate(steps: &[Step]) -> Option<&Step> {
    steps
        .iter()
        .find(|s| s.status == StepStatus::Current)
        .filter(|s| s.kind == StepKind::Notarize)
}

pub fn all_completed(steps: &[Step]) -> bool {
    steps.iter().all(|s| s.status == StepStatus::Completed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::DomElement;
    use crate::history::BrowsingHistoryItem;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct FakeTab {
        url: Mutex<Option<String>>,
        element: Mutex<bool>,
        fail: Mutex<bool>,
    }

    #[async_trait]
    impl TabBridge for FakeTab {
        async fn active_tab_url(&self) -> anyhow::Result<Option<String>> {
            if *self.fail.lock() {
                anyhow::bail!("tab closed");
            }
            Ok(self.url.lock().clone())
        }

        async fn element_on_page(&self, _selector: &str) -> anyhow::Result<Option<DomElement>> {
            let present = *self.element.lock();
            Ok(present.then(|| DomElement {
                tag_name: "div".to_string(),
                text_content: None,
            }))
        }
    }

    fn nav(kind: &str, url: &str, label: &str) -> WebProofStep {
        let s = NavigationStep {
            url: url.to_string(),
            label: label.to_string(),
        };
        match kind {
            "startPage" => WebProofStep::StartPage(s),
            "redirect" => WebProofStep::Redirect(s),
            _ => WebProofStep::ExpectUrl(s),
        }
    }

    fn notarize(url: &str) -> WebProofStep {
        WebProofStep::Notarize(NotarizeStep {
            url: url.to_string(),
            method: "GET".to_string(),
            label: "prove".to_string(),
            redaction: Default::default(),
            outputs: Vec::new(),
        })
    }

    fn statuses(steps: &[Step]) -> Vec<StepStatus> {
        steps.iter().map(|s| s.status).collect()
    }

    fn orchestrator(tab: Arc<FakeTab>) -> StepOrchestrator {
        StepOrchestrator::new(tab, AssertionStore::new())
    }

    #[tokio::test]
    async fn navigation_steps_follow_history() {
        let orch = orchestrator(Arc::new(FakeTab::default()));
        let steps = vec![
            nav("startPage", "https://bank.example/login", "login"),
            nav("expectUrl", "https://bank.example/dashboard*", "dashboard"),
            nav("redirect", "https://bank.example/accounts", "accounts"),
        ];
        let signals = Signals::new(
            vec![BrowsingHistoryItem::new("https://bank.example/login", "GET")],
            ZkProvingStatus::NotStarted,
        );
        let out = orch.calculate_steps(&steps, &signals).await;
        assert_eq!(
            statuses(&out),
            vec![StepStatus::Completed, StepStatus::Current, StepStatus::Further]
        );
        assert_eq!(out[0].link.as_deref(), Some("https://bank.example/login"));
    }

    #[tokio::test]
    async fn notarize_waits_for_ready_request() {
        let orch = orchestrator(Arc::new(FakeTab::default()));
        let steps = vec![notarize("https://api.bank.example/v1/*")];

        let pending = Signals::new(
            vec![BrowsingHistoryItem::new("https://api.bank.example/v1/accounts", "GET")],
            ZkProvingStatus::NotStarted,
        );
        let out = orch.calculate_steps(&steps, &pending).await;
        assert_eq!(statuses(&out), vec![StepStatus::Further]);
        assert!(notarize_gate(&out).is_none());

        let ready = Signals::new(
            vec![BrowsingHistoryItem::new("https://api.bank.example/v1/accounts", "get").ready()],
            ZkProvingStatus::Proving,
        );
        let out = orch.calculate_steps(&steps, &ready).await;
        assert_eq!(statuses(&out), vec![StepStatus::Current]);
        assert_eq!(notarize_gate(&out).map(|s| s.label.as_str()), Some("prove"));

        let done = Signals::new(Vec::new(), ZkProvingStatus::Done);
        let out = orch.calculate_steps(&steps, &done).await;
        assert!(all_completed(&out));
    }

    #[tokio::test]
    async fn notarize_method_must_match() {
        let orch = orchestrator(Arc::new(FakeTab::default()));
        let steps = vec![notarize("https://api.bank.example/v1/*")];
        let signals = Signals::new(
            vec![BrowsingHistoryItem::new("https://api.bank.example/v1/accounts", "POST").ready()],
            ZkProvingStatus::NotStarted,
        );
        let out = orch.calculate_steps(&steps, &signals).await;
        assert_eq!(statuses(&out), vec![StepStatus::Further]);
    }

    #[tokio::test]
    async fn extract_and_click_complete_once_reached() {
        let orch = orchestrator(Arc::new(FakeTab::default()));
        let steps = vec![
            WebProofStep::ExtractVariables(crate::step::ExtractVariablesStep {
                url: "https://a/".to_string(),
                label: "vars".to_string(),
                variables: vec!["x".to_string()],
            }),
            WebProofStep::ClickButton(crate::step::ClickButtonStep {
                url: "https://a/".to_string(),
                label: "click".to_string(),
                selector: "#go".to_string(),
            }),
        ];
        let out = orch.calculate_steps(&steps, &Signals::default()).await;
        assert!(all_completed(&out));
    }

    #[tokio::test]
    async fn bridge_failure_leaves_store_untouched() {
        let tab = Arc::new(FakeTab::default());
        let orch = orchestrator(Arc::clone(&tab));
        orch.assertions().set("2fa", true);
        *tab.fail.lock() = true;

        let step = UserActionStep {
            url: "https://bank.example/settings".to_string(),
            label: "2fa".to_string(),
            instruction: "Enable 2FA".to_string(),
            assertion: crate::step::DomAssertion {
                dom_element: "#on".to_string(),
                require: crate::step::Require::Exist,
            },
        };
        let out = orch
            .calculate_steps(&[WebProofStep::UserAction(step)], &Signals::default())
            .await;
        assert_eq!(statuses(&out), vec![StepStatus::Current]);
        assert!(orch.assertions().get("2fa"));
    }

    #[test]
    fn gate_ignores_current_non_notarize() {
        let steps = vec![Step {
            label: "login".to_string(),
            link: None,
            kind: StepKind::StartPage,
            status: StepStatus::Current,
        }];
        assert!(notarize_gate(&steps).is_none());
        assert!(!all_completed(&steps));
    }
}
