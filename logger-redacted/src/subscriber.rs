use crate::{LoggerConfig, LoggerError, Result};
use tracing_subscriber::{fmt, fmt::time::ChronoUtc, prelude::*, EnvFilter};

/// Build the filter: `RUST_LOG` wins, otherwise the configured level.
pub fn build_filter(config: &LoggerConfig) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.log_level)
            .map_err(|e| LoggerError::InvalidFilter(format!("{}: {}", config.log_level, e))),
    }
}

/// Install the global subscriber.
///
/// Fails with [`LoggerError::AlreadyInitialized`] when another subscriber was
/// set first, which happens routinely in test binaries.
pub fn init_logging(config: &LoggerConfig) -> Result<()> {
    let env_filter = build_filter(config)?;

    let installed = if config.json_output {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(config.with_target)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(false)
                    .json(),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(config.with_target)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_level(true),
            )
            .try_init()
    };
    installed.map_err(|_| LoggerError::AlreadyInitialized)?;

    tracing::debug!(
        level = %config.log_level,
        json = config.json_output,
        "Logging initialized"
    );
    Ok(())
}
