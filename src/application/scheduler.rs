use crate::domain::schedule::TimeWindow;
use crate::infrastructure::mode_gateway::ModeGateway;
use chrono::{Local, NaiveTime};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

type NowProvider = Arc<dyn Fn() -> NaiveTime + Send + Sync>;

/// A tunable, not a correctness parameter: the interval only affects how
/// quickly the loop reacts to window boundaries and out-of-band changes.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(30);

/// Handle for one live polling loop.
///
/// `stop` signals cancellation and returns immediately; the task observes
/// the signal within one tick interval and exits on its own. A stopped run
/// is terminal: resuming means spawning a fresh run.
#[derive(Debug)]
pub struct SchedulerRun {
    start: String,
    end: String,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl SchedulerRun {
    /// The window bounds this run was started with.
    pub fn window(&self) -> (&str, &str) {
        (&self.start, &self.end)
    }

    pub fn is_live(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Signal cancellation without waiting for the task to exit.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Wait for the task to exit. `stop` itself never blocks; hosts that
    /// want an orderly join can await this afterwards.
    pub async fn stopped(self) {
        let _ = self.handle.await;
    }
}

/// The poll-evaluate-act loop: every tick, compare where the window says the
/// external mode should be against where the gateway says it is, and request
/// at most one toggle when they disagree.
pub struct SchedulerLoop<G: ModeGateway> {
    gateway: Arc<G>,
    tick_interval: Duration,
    now_provider: NowProvider,
}

impl<G: ModeGateway> Clone for SchedulerLoop<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            tick_interval: self.tick_interval,
            now_provider: Arc::clone(&self.now_provider),
        }
    }
}

impl<G: ModeGateway + 'static> SchedulerLoop<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self {
            gateway,
            tick_interval: DEFAULT_TICK_INTERVAL,
            now_provider: Arc::new(|| Local::now().time()),
        }
    }

    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    pub fn with_now_provider(mut self, now_provider: NowProvider) -> Self {
        self.now_provider = now_provider;
        self
    }

    /// Spawn the loop as a background task and return its handle.
    pub fn spawn(&self, start: &str, end: &str) -> SchedulerRun {
        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();
        let scheduler = self.clone();
        let task_start = start.to_string();
        let task_end = end.to_string();
        let handle = tokio::spawn(async move {
            scheduler.run(&task_start, &task_end, task_cancel).await;
        });

        SchedulerRun {
            start: start.to_string(),
            end: end.to_string(),
            cancel,
            handle,
        }
    }

    /// Run until `cancel` is observed. Exits immediately, without polling,
    /// when the window bounds fail to parse.
    pub async fn run(&self, start: &str, end: &str, cancel: CancellationToken) {
        let window = match TimeWindow::parse(start, end) {
            Ok(window) => window,
            Err(message) => {
                error!(start, end, "refusing to poll: {message}");
                return;
            }
        };
        if window.is_empty() {
            warn!(start, end, "start equals end; the window is empty and the mode will never activate");
        }

        info!(start, end, "scheduler loop started");
        loop {
            if cancel.is_cancelled() {
                break;
            }
            self.tick(&window).await;
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = sleep(self.tick_interval) => {}
            }
        }
        info!("scheduler loop stopped");
    }

    async fn tick(&self, window: &TimeWindow) {
        let now = (self.now_provider)();
        let desired = window.contains(now);
        let current = match self.gateway.query().await {
            Ok(state) => state,
            Err(error) => {
                // Transient: treat as "no change observed" and retry next tick.
                warn!(%error, "mode query failed; skipping tick");
                return;
            }
        };

        if desired == current {
            return;
        }

        debug!(desired, current, "state mismatch; requesting toggle");
        if let Err(error) = self.gateway.invoke().await {
            warn!(%error, "mode toggle failed; will retry next tick");
        }
        // No re-query here: the gateway is a toggle, not a setter, so the
        // next tick's query is the only reliable view of the outcome.
    }
}
