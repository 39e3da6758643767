//! Tracing subscriber setup for the binary

use chrono_tz::Tz;
use plansync_domain::LoggingConfig;
use plansync_infra::{log_channel, LogBuffer, LogForwarder};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::EnvFilter;

/// `RUST_LOG` when set and valid, otherwise the configured filter.
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter))
}

/// Install the global subscriber: filter, stdout formatter and the log buffer
/// layer rendering timestamps in `zone`.
///
/// The returned forwarder must be spawned for lines to reach `buffer`.
///
/// # Errors
/// Fails when a global subscriber is already installed.
pub fn init_tracing(
    config: &LoggingConfig,
    zone: Tz,
    buffer: LogBuffer,
) -> Result<LogForwarder, TryInitError> {
    let (layer, forwarder) = log_channel(buffer);
    tracing_subscriber::registry()
        .with(env_filter(config))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(layer.with_time_zone(zone))
        .try_init()?;
    Ok(forwarder)
}
