use std::env;
use std::io;
use std::sync::OnceLock;

use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const LOG_ENV_VAR: &str = "GRAYSCHED_LOG";

static LOGGING_INSTALLED: OnceLock<()> = OnceLock::new();

/// Errors that can arise while standing up structured logging.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid logging filter: {0}")]
    Filter(#[from] ParseError),
    #[error("failed to install logging subscriber: {0}")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),
}

/// Install the global tracing subscriber (stderr, env-filtered).
///
/// The first call wins; subsequent calls are no-ops. The filter comes from
/// `GRAYSCHED_LOG`, then `RUST_LOG`, then defaults to `info`.
pub fn init_logging() -> Result<(), LoggingError> {
    if LOGGING_INSTALLED.get().is_some() {
        return Ok(());
    }

    let filter = build_filter()?;
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(true);
    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .try_init()?;

    let _ = LOGGING_INSTALLED.set(());
    Ok(())
}

fn build_filter() -> Result<EnvFilter, ParseError> {
    if let Ok(spec) = env::var(LOG_ENV_VAR) {
        if !spec.trim().is_empty() {
            return EnvFilter::try_new(spec);
        }
    }

    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new("info"),
    }
}
