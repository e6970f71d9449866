//! Tracing subscriber setup

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::StrataError;

/// Environment variable consulted before `RUST_LOG` and the configured level
pub const LOG_ENV_VAR: &str = "STRATA_LOG";

/// Install the global fmt subscriber.
///
/// Filter precedence: `STRATA_LOG`, then `RUST_LOG`, then `config.level`.
/// Calling this more than once is harmless; later calls leave the first
/// subscriber in place and return `Ok(false)`.
pub fn init_logging(config: &LoggingConfig) -> Result<bool, StrataError> {
    let filter = match std::env::var(LOG_ENV_VAR) {
        Ok(directives) => EnvFilter::try_new(directives),
        Err(_) => EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.level)),
    }
    .map_err(|e| StrataError::Configuration(format!("Invalid log filter: {}", e)))?;

    Ok(tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok())
}
