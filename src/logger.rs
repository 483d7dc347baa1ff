use crate::error::{Error, Result};
use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber, writing compact lines to stderr.
///
/// `RUST_LOG` takes precedence over `level` when set.
pub fn init(level: &str) -> Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level).map_err(|e| {
            Error::Settings(format!("invalid log level/filter '{}': {}", level, e))
        })?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .with_ansi(false)
        .try_init()
        .map_err(|e| Error::Settings(format!("failed to install logger: {}", e)))
}
