//! Logging setup.
//!
//! Installs a global tracing subscriber writing to stdout. The filter comes
//! from `RAWSCOPE_LOG`, then `RUST_LOG`, then defaults to `info`.

use std::sync::OnceLock;

use tracing_subscriber::{fmt, prelude::*, EnvFilter, Registry};

const LOG_ENV: &str = "RAWSCOPE_LOG";
const DEFAULT_DIRECTIVE: &str = "info";

static INITIALIZED: OnceLock<()> = OnceLock::new();

/// Errors that may occur while initializing logging.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("failed to install global tracing subscriber: {0}")]
    SetGlobal(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Initialize tracing. Subsequent calls are no-ops.
///
/// Failures are returned so the viewer can keep running without logs.
pub fn init() -> Result<(), LoggingError> {
    if INITIALIZED.get().is_some() {
        return Ok(());
    }
    let subscriber = Registry::default()
        .with(build_env_filter())
        .with(fmt::layer().with_target(true).with_writer(std::io::stdout));
    tracing::subscriber::set_global_default(subscriber)?;
    let _ = INITIALIZED.set(());
    tracing::info!("logging initialized");
    Ok(())
}

fn build_env_filter() -> EnvFilter {
    std::env::var(LOG_ENV)
        .ok()
        .and_then(|value| EnvFilter::try_new(value).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVE))
}
