//! Window-based activation scheduler for an external grayscale display mode.
//!
//! The crate decides, on a fixed polling tick, whether an externally owned
//! binary display mode should currently be active given a daily time window
//! (which may wrap past midnight), and requests a toggle through an injected
//! [`ModeGateway`] when the observed state disagrees. Scheduling preferences
//! persist across restarts through [`ConfigStore`]; [`ScheduleController`]
//! is the facade an embedding shell (tray icon, settings window) drives.
//!
//! Platform specifics (how the mode is actually read or flipped, any UI)
//! live outside this crate behind the [`ModeGateway`] trait.

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::controller::ScheduleController;
pub use application::scheduler::{DEFAULT_TICK_INTERVAL, SchedulerLoop, SchedulerRun};
pub use domain::schedule::{
    DEFAULT_END_TIME, DEFAULT_START_TIME, ScheduleConfig, TimeWindow, parse_window_time,
};
pub use infrastructure::config_store::ConfigStore;
pub use infrastructure::error::InfraError;
pub use infrastructure::logging::{LoggingError, init_logging};
pub use infrastructure::mode_gateway::ModeGateway;
