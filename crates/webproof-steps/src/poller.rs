//! Periodic step status computation.
//!
//! One tick runs at a time: the next sleep starts only after the previous
//! computation settled. Results are published on a `watch` channel so any
//! number of observers see the latest statuses. Polling continues until the
//! handle is stopped.
//!
//! The flow counts as finished once every step has stayed `Completed` for the
//! whole redirect delay. A later tick that is not all-completed clears it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::OrchestratorConfig;
use crate::history::SignalSource;
use crate::orchestrator::{all_completed, StepOrchestrator};
use crate::step::{Step, WebProofStep};

pub struct StepPoller {
    orchestrator: Arc<StepOrchestrator>,
    steps: Vec<WebProofStep>,
    signals: Arc<dyn SignalSource>,
    interval: Duration,
    redirect_delay: Duration,
    tx: watch::Sender<Vec<Step>>,
    stop: Arc<Notify>,
    stopped: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
}

impl StepPoller {
    /// Start polling on the current tokio runtime.
    ///
    /// The first computation runs immediately.
    pub fn spawn(
        orchestrator: Arc<StepOrchestrator>,
        steps: Vec<WebProofStep>,
        signals: Arc<dyn SignalSource>,
        config: &OrchestratorConfig,
    ) -> PollerHandle {
        let (tx, rx) = watch::channel(Vec::new());
        let stop = Arc::new(Notify::new());
        let stopped = Arc::new(AtomicBool::new(false));
        let finished = Arc::new(AtomicBool::new(false));

        let poller = StepPoller {
            orchestrator,
            steps,
            signals,
            interval: config.poll_interval(),
            redirect_delay: config.redirect_delay(),
            tx,
            stop: Arc::clone(&stop),
            stopped: Arc::clone(&stopped),
            finished: Arc::clone(&finished),
        };
        let task = tokio::spawn(poller.run());

        PollerHandle {
            rx,
            stop,
            stopped,
            finished,
            task: Some(task),
        }
    }

    async fn run(self) {
        info!(
            steps = self.steps.len(),
            interval_ms = self.interval.as_millis() as u64,
            "step poller started"
        );

        // When the current all-completed streak started.
        let mut completed_since: Option<Instant> = None;

        loop {
            let snapshot = self.signals.snapshot();
            let computed = self.orchestrator.calculate_steps(&self.steps, &snapshot).await;

            if self.stopped.load(Ordering::Acquire) {
                debug!("poller stopped during computation, result discarded");
                break;
            }

            let done = all_completed(&computed);
            self.tx.send_replace(computed);

            let mut pause = self.interval;
            if done {
                let since = *completed_since.get_or_insert_with(Instant::now);
                let elapsed = since.elapsed();
                if elapsed >= self.redirect_delay {
                    if !self.finished.swap(true, Ordering::AcqRel) {
                        info!("all steps completed");
                    }
                } else {
                    pause = pause.min(self.redirect_delay - elapsed);
                }
            } else {
                completed_since = None;
                if self.finished.swap(false, Ordering::AcqRel) {
                    info!("flow no longer complete");
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(pause) => {}
                _ = self.stop.notified() => break,
            }
        }

        info!("step poller stopped");
    }
}

/// Control and observation handle for a running poller. Dropping it stops the poller.
pub struct PollerHandle {
    rx: watch::Receiver<Vec<Step>>,
    stop: Arc<Notify>,
    stopped: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl PollerHandle {
    pub fn subscribe(&self) -> watch::Receiver<Vec<Step>> {
        self.rx.clone()
    }

    /// Most recently published statuses; empty before the first tick settles.
    pub fn latest(&self) -> Vec<Step> {
        self.rx.borrow().clone()
    }

    /// True while every step has been `Completed` for at least the redirect delay.
    pub fn finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    pub fn stop(&self) {
        if !self.stopped.swap(true, Ordering::AcqRel) {
            self.stop.notify_one();
        }
    }

    /// Stop the poller and wait for its task to exit.
    pub async fn shutdown(mut self) {
        self.stop();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "step poller task failed");
            }
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
