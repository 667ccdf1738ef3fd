use crate::application::scheduler::{SchedulerLoop, SchedulerRun};
use crate::domain::schedule::ScheduleConfig;
use crate::infrastructure::config_store::ConfigStore;
use crate::infrastructure::error::InfraError;
use crate::infrastructure::mode_gateway::ModeGateway;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// The public facade mediating between UI-origin events and the scheduler.
///
/// Sole owner of the live [`SchedulerRun`]: all start/stop/reconfigure
/// transitions go through one mutex, so two runs can never poll (and
/// double-toggle) concurrently. Config writes are applied before a new run
/// starts, so a crash right after a start never leaves stale on-disk state.
pub struct ScheduleController<G: ModeGateway + 'static> {
    store: ConfigStore,
    scheduler: SchedulerLoop<G>,
    gateway: Arc<G>,
    state: Mutex<ControllerState>,
}

#[derive(Debug)]
struct ControllerState {
    config: ScheduleConfig,
    run: Option<SchedulerRun>,
}

impl<G: ModeGateway + 'static> ScheduleController<G> {
    /// Load the persisted config and build the controller. Does not start
    /// polling; call [`Self::start_if_enabled`] for the startup path.
    pub fn new(store: ConfigStore, gateway: Arc<G>) -> Self {
        let config = store.load();
        let scheduler = SchedulerLoop::new(Arc::clone(&gateway));
        Self {
            store,
            scheduler,
            gateway,
            state: Mutex::new(ControllerState { config, run: None }),
        }
    }

    /// Replace the scheduler loop, keeping the loaded config. Used to tune
    /// the tick interval or inject a deterministic clock.
    pub fn with_scheduler(mut self, scheduler: SchedulerLoop<G>) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Startup path: begin polling when the persisted config says so.
    pub async fn start_if_enabled(&self) {
        let mut state = self.state.lock().await;
        if state.config.enabled {
            self.start_locked(&mut state);
        }
    }

    /// Enable or disable scheduling: persist the flag, then start or stop
    /// the loop to match. Both directions are no-ops when already there.
    pub async fn set_enabled(&self, enabled: bool) {
        let mut state = self.state.lock().await;
        state.config.enabled = enabled;
        self.persist_locked(&state);
        if enabled {
            self.start_locked(&mut state);
        } else {
            Self::stop_locked(&mut state);
        }
    }

    /// Replace the window bounds. Malformed times report an error and force
    /// scheduling off rather than keeping stale bounds; valid times persist
    /// and, when scheduling is enabled, restart the loop with fresh bounds.
    pub async fn update_window(&self, start: &str, end: &str) -> Result<(), InfraError> {
        let mut state = self.state.lock().await;

        let candidate = ScheduleConfig {
            start_time: start.to_string(),
            end_time: end.to_string(),
            enabled: state.config.enabled,
        };
        if let Err(message) = candidate.validate() {
            warn!(start, end, "rejected window update: {message}");
            state.config.enabled = false;
            Self::stop_locked(&mut state);
            self.persist_locked(&state);
            return Err(InfraError::InvalidTime(message));
        }

        state.config.start_time = candidate.start_time;
        state.config.end_time = candidate.end_time;
        self.persist_locked(&state);

        if state.config.enabled {
            Self::stop_locked(&mut state);
            self.start_locked(&mut state);
        }
        Ok(())
    }

    /// Persistence-only path for in-progress edits; never touches the loop.
    /// Malformed entries stay in memory and the disk write is skipped, so
    /// invalid times are never persisted.
    pub async fn save_current_entries(&self, start: &str, end: &str) {
        let mut state = self.state.lock().await;
        state.config.start_time = start.to_string();
        state.config.end_time = end.to_string();
        if state.config.validate().is_err() {
            debug!(start, end, "entries not yet valid; skipping persistence");
            return;
        }
        self.persist_locked(&state);
    }

    /// Direct toggle pass-through, bypassing the window logic entirely.
    /// Note the gateway cannot express a direction: toggling while the
    /// state already matches the schedule inverts it, and the next tick
    /// will toggle it right back.
    pub async fn manual_activate(&self) {
        if let Err(error) = self.gateway.invoke().await {
            warn!(%error, "manual toggle failed");
        }
    }

    /// Stop any live run. Idempotent; returns without waiting for the
    /// background task to exit.
    pub async fn shutdown(&self) {
        let mut state = self.state.lock().await;
        Self::stop_locked(&mut state);
    }

    /// Snapshot of the current in-memory config.
    pub async fn config(&self) -> ScheduleConfig {
        self.state.lock().await.config.clone()
    }

    pub async fn is_run_live(&self) -> bool {
        let state = self.state.lock().await;
        state.run.as_ref().is_some_and(SchedulerRun::is_live)
    }

    /// Window bounds of the live run, if any.
    pub async fn active_window(&self) -> Option<(String, String)> {
        let state = self.state.lock().await;
        state.run.as_ref().filter(|run| run.is_live()).map(|run| {
            let (start, end) = run.window();
            (start.to_string(), end.to_string())
        })
    }

    fn start_locked(&self, state: &mut ControllerState) {
        if state.run.as_ref().is_some_and(SchedulerRun::is_live) {
            debug!("scheduler already running; start is a no-op");
            return;
        }

        // Invalid stored times force scheduling off instead of spawning a
        // loop that would only fail fast.
        if let Err(message) = state.config.validate() {
            warn!("cannot start scheduling: {message}");
            state.config.enabled = false;
            self.persist_locked(state);
            return;
        }

        let run = self
            .scheduler
            .spawn(&state.config.start_time, &state.config.end_time);
        info!(
            start = %state.config.start_time,
            end = %state.config.end_time,
            "scheduling started"
        );
        state.run = Some(run);
    }

    fn stop_locked(state: &mut ControllerState) {
        if let Some(run) = state.run.take() {
            run.stop();
            info!("scheduling stopped");
        }
    }

    fn persist_locked(&self, state: &ControllerState) {
        if let Err(error) = self.store.save(&state.config) {
            warn!(%error, "failed to persist schedule config; continuing with in-memory values");
        }
    }
}
