//! Installation of the process-wide tracing subscriber.

use std::error::Error;

use syslog_tracing::{Facility, Options, Syslog};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::LogDestination;

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info";

/// Errors raised while installing the subscriber.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The syslog connection could not be opened.
    #[error("cannot open syslog")]
    SyslogUnavailable,
    /// A global subscriber was already set.
    #[error("cannot install logger: {0}")]
    Install(#[source] Box<dyn Error + Send + Sync>),
}

/// Install a `fmt` subscriber writing to `destination`.
///
/// The filter comes from `RUST_LOG`, falling back to [`DEFAULT_FILTER`].
///
/// # Errors
///
/// Returns [`LoggingError`] if syslog cannot be opened or a subscriber is
/// already installed.
pub fn init(destination: LogDestination) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match destination {
        LogDestination::Stdout => builder.with_writer(std::io::stdout).try_init(),
        LogDestination::Stderr => builder.with_writer(std::io::stderr).try_init(),
        LogDestination::Syslog => {
            let writer = Syslog::new(c"warplink", Options::LOG_PID, Facility::Daemon)
                .ok_or(LoggingError::SyslogUnavailable)?;
            // syslog stamps its own time and has no use for colour codes.
            builder
                .with_ansi(false)
                .without_time()
                .with_writer(writer)
                .try_init()
        }
    }
    .map_err(LoggingError::Install)
}
