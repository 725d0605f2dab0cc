//! Errors raised while installing the subscriber.

use thiserror::Error;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::util::TryInitError;

use crate::subscriber::FilterSource;

/// Result alias for telemetry operations.
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Telemetry setup failures.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The filter directives did not parse.
    #[error("invalid log filter '{directives}' from {origin}")]
    InvalidFilter {
        /// Where the directives came from.
        origin: FilterSource,
        /// Directives as supplied.
        directives: String,
        /// Underlying parse error.
        source: ParseError,
    },
    /// The format name is not one of `json` or `pretty`.
    #[error("unknown log format '{value}'")]
    UnknownFormat {
        /// Name as supplied.
        value: String,
    },
    /// A global subscriber is already installed.
    #[error("tracing subscriber already installed")]
    AlreadyInstalled {
        /// Underlying installation error.
        source: TryInitError,
    },
}
