//! Guided flow scenarios against a scripted browser tab.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;
use webproof_steps::prelude::*;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// A tab whose URL and DOM are set by the test; records every selector query.
#[derive(Default)]
struct ScriptedTab {
    url: Mutex<Option<String>>,
    present: Mutex<HashSet<String>>,
    queries: Mutex<Vec<String>>,
    broken: Mutex<bool>,
}

impl ScriptedTab {
    fn at(url: &str) -> Arc<Self> {
        let tab = Arc::new(Self::default());
        tab.navigate(url);
        tab
    }

    fn navigate(&self, url: &str) {
        *self.url.lock() = Some(url.to_string());
    }

    fn show(&self, selector: &str) {
        self.present.lock().insert(selector.to_string());
    }

    fn hide(&self, selector: &str) {
        self.present.lock().remove(selector);
    }

    fn queries(&self) -> Vec<String> {
        self.queries.lock().clone()
    }
}

#[async_trait]
impl TabBridge for ScriptedTab {
    async fn active_tab_url(&self) -> anyhow::Result<Option<String>> {
        Ok(self.url.lock().clone())
    }

    async fn element_on_page(&self, selector: &str) -> anyhow::Result<Option<DomElement>> {
        self.queries.lock().push(selector.to_string());
        if *self.broken.lock() {
            anyhow::bail!("content script not injected");
        }
        let found = self.present.lock().contains(selector);
        Ok(found.then(|| DomElement {
            tag_name: "span".to_string(),
            text_content: None,
        }))
    }
}

/// A tab whose DOM query blocks until the test releases it.
struct StalledTab {
    entered: Notify,
    release: Notify,
}

#[async_trait]
impl TabBridge for StalledTab {
    async fn active_tab_url(&self) -> anyhow::Result<Option<String>> {
        Ok(Some("https://bank.example/settings".to_string()))
    }

    async fn element_on_page(&self, _selector: &str) -> anyhow::Result<Option<DomElement>> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(Some(DomElement {
            tag_name: "div".to_string(),
            text_content: None,
        }))
    }
}

fn user_action(label: &str, url: &str, selector: &str) -> WebProofStep {
    steps_from_json_str(&format!(
        r#"[{{"step": "userAction", "url": "{url}", "label": "{label}",
             "instruction": "do it", "assertion": {{"domElement": "{selector}", "require": "exist"}}}}]"#
    ))
    .unwrap()
    .remove(0)
}

fn statuses(steps: &[Step]) -> Vec<StepStatus> {
    steps.iter().map(|s| s.status).collect()
}

#[tokio::test]
async fn later_steps_are_not_evaluated() {
    init_tracing();
    let tab = ScriptedTab::at("https://bank.example/settings");
    tab.show("#a");
    let orch = StepOrchestrator::new(tab.clone(), AssertionStore::new());

    let steps = vec![
        user_action("A", "https://bank.example/*", "#a"),
        user_action("B", "https://bank.example/*", "#b"),
        user_action("C", "https://bank.example/*", "#c"),
    ];
    let out = orch.calculate_steps(&steps, &Signals::default()).await;

    assert_eq!(
        statuses(&out),
        vec![StepStatus::Completed, StepStatus::Current, StepStatus::Further]
    );
    assert_eq!(tab.queries(), vec!["#a".to_string(), "#b".to_string()]);
}

#[tokio::test]
async fn user_action_result_survives_navigation() {
    init_tracing();
    let tab = ScriptedTab::at("https://bank.example/settings");
    tab.show("#tfa-on");
    let orch = StepOrchestrator::new(tab.clone(), AssertionStore::new());
    let steps = vec![user_action("2fa", "https://bank.example/settings", "#tfa-on")];

    let out = orch.calculate_steps(&steps, &Signals::default()).await;
    assert_eq!(statuses(&out), vec![StepStatus::Completed]);

    tab.navigate("https://bank.example/home");
    tab.hide("#tfa-on");
    let out = orch.calculate_steps(&steps, &Signals::default()).await;
    assert_eq!(statuses(&out), vec![StepStatus::Completed]);
    assert_eq!(tab.queries().len(), 1);

    // Back on the page, the live check wins again.
    tab.navigate("https://bank.example/settings");
    let out = orch.calculate_steps(&steps, &Signals::default()).await;
    assert_eq!(statuses(&out), vec![StepStatus::Current]);
    assert!(!orch.assertions().get("2fa"));
}

#[tokio::test]
async fn dom_query_failure_is_not_completion() {
    init_tracing();
    let tab = ScriptedTab::at("https://bank.example/settings");
    tab.show("#tfa-on");
    *tab.broken.lock() = true;
    let orch = StepOrchestrator::new(tab.clone(), AssertionStore::new());
    let steps = vec![user_action("2fa", "https://bank.example/settings", "#tfa-on")];

    let out = orch.calculate_steps(&steps, &Signals::default()).await;
    assert_eq!(statuses(&out), vec![StepStatus::Current]);
    assert!(!orch.assertions().contains("2fa"));
}

#[tokio::test(start_paused = true)]
async fn poller_tracks_session_until_finished() {
    init_tracing();
    let session = Arc::new(Session::new());
    let tab = ScriptedTab::at("https://bank.example/login");
    let orch = Arc::new(StepOrchestrator::new(tab, session.assertions()));

    let steps = steps_from_json_str(
        r#"[
            {"step": "startPage", "url": "https://bank.example/login", "label": "Log in"},
            {"step": "notarize", "url": "https://api.bank.example/v1/accounts*", "method": "GET",
             "label": "Prove balance"}
        ]"#,
    )
    .unwrap();

    session.record_request(BrowsingHistoryItem::new("https://bank.example/login", "GET").ready());
    let signals: Arc<dyn SignalSource> = session.clone();
    let handle = StepPoller::spawn(orch, steps, signals, &OrchestratorConfig::default());
    let mut rx = handle.subscribe();

    let first = rx.wait_for(|s| !s.is_empty()).await.unwrap().clone();
    assert_eq!(statuses(&first), vec![StepStatus::Completed, StepStatus::Further]);
    assert!(notarize_gate(&first).is_none());

    session.record_request(BrowsingHistoryItem::new("https://api.bank.example/v1/accounts?page=1", "GET"));
    assert!(session.mark_ready("https://api.bank.example/v1/accounts?page=1", "GET"));
    let ready = rx
        .wait_for(|s| s.get(1).is_some_and(|step| step.status == StepStatus::Current))
        .await
        .unwrap()
        .clone();
    assert_eq!(notarize_gate(&ready).map(|s| s.label.as_str()), Some("Prove balance"));

    session.set_proving_status(ZkProvingStatus::Done);
    rx.wait_for(|s| all_completed(s)).await.unwrap();
    assert!(!handle.finished());

    tokio::time::sleep(Duration::from_secs(6)).await;
    assert!(handle.finished());
    handle.shutdown().await;
}

fn login_flow() -> Vec<WebProofStep> {
    steps_from_json_str(r#"[{"step": "startPage", "url": "https://bank.example/login", "label": "Log in"}]"#).unwrap()
}

fn spawn_over(session: &Arc<Session>, steps: Vec<WebProofStep>) -> PollerHandle {
    let tab = ScriptedTab::at("https://bank.example/login");
    let orch = Arc::new(StepOrchestrator::new(tab, session.assertions()));
    let signals: Arc<dyn SignalSource> = session.clone();
    StepPoller::spawn(orch, steps, signals, &OrchestratorConfig::default())
}

#[tokio::test(start_paused = true)]
async fn reset_after_finish_reopens_flow() {
    init_tracing();
    let session = Arc::new(Session::new());
    session.record_request(BrowsingHistoryItem::new("https://bank.example/login", "GET").ready());
    let handle = spawn_over(&session, login_flow());
    let mut rx = handle.subscribe();

    rx.wait_for(|s| !s.is_empty() && all_completed(s)).await.unwrap();
    tokio::time::sleep(Duration::from_secs(6)).await;
    assert!(handle.finished());

    session.reset();
    rx.wait_for(|s| s.first().is_some_and(|step| step.status == StepStatus::Current))
        .await
        .unwrap();
    assert!(!handle.finished());

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(!handle.finished());
    assert_eq!(statuses(&handle.latest()), vec![StepStatus::Current]);
    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn completion_must_hold_for_whole_delay() {
    init_tracing();
    let session = Arc::new(Session::new());
    session.record_request(BrowsingHistoryItem::new("https://bank.example/login", "GET").ready());
    let handle = spawn_over(&session, login_flow());
    let mut rx = handle.subscribe();

    rx.wait_for(|s| !s.is_empty() && all_completed(s)).await.unwrap();
    tokio::time::sleep(Duration::from_secs(2)).await;
    session.reset();
    rx.wait_for(|s| !all_completed(s)).await.unwrap();

    // Completed again: the delay starts over.
    session.record_request(BrowsingHistoryItem::new("https://bank.example/login", "GET").ready());
    rx.wait_for(|s| all_completed(s)).await.unwrap();
    tokio::time::sleep(Duration::from_secs(4)).await;
    assert!(!handle.finished());
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(handle.finished());
    handle.shutdown().await;
}

#[tokio::test]
async fn stop_discards_in_flight_tick() {
    init_tracing();
    let tab = Arc::new(StalledTab {
        entered: Notify::new(),
        release: Notify::new(),
    });
    let orch = Arc::new(StepOrchestrator::new(tab.clone(), AssertionStore::new()));
    let steps = vec![user_action("2fa", "https://bank.example/settings", "#tfa-on")];
    let signals: Arc<dyn SignalSource> = Arc::new(Signals::default());

    let handle = StepPoller::spawn(orch, steps, signals, &OrchestratorConfig::default());
    let rx = handle.subscribe();

    tab.entered.notified().await;
    handle.stop();
    tab.release.notify_one();
    handle.shutdown().await;

    assert!(rx.borrow().is_empty());
}

#[tokio::test(start_paused = true)]
async fn stop_interrupts_idle_poller() {
    init_tracing();
    let tab = ScriptedTab::at("https://bank.example/login");
    let orch = Arc::new(StepOrchestrator::new(tab, AssertionStore::new()));
    let steps = steps_from_json_str(
        r#"[{"step": "expectUrl", "url": "https://bank.example/dashboard", "label": "Dashboard"}]"#,
    )
    .unwrap();
    let signals: Arc<dyn SignalSource> = Arc::new(Signals::default());
    let config = OrchestratorConfig::from_json_str(r#"{"pollIntervalMs": 60000}"#).unwrap();

    let handle = StepPoller::spawn(orch, steps, signals, &config);
    let mut rx = handle.subscribe();
    let first = rx.wait_for(|s| !s.is_empty()).await.unwrap().clone();
    assert_eq!(statuses(&first), vec![StepStatus::Current]);

    handle.stop();
    assert!(!handle.finished());
    handle.shutdown().await;
}
