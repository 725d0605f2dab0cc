#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

//! Logging setup for binaries and tests built on `gocd-client`.
//!
//! The client only emits `tracing` events (request lines, redacted headers,
//! bodies and failures under the `gocd_client` target). This crate installs
//! the process-wide subscriber that filters and renders them.
//!
//! ```no_run
//! use gocd_telemetry::{LogFormat, LoggingConfig, init_logging};
//!
//! # fn main() -> Result<(), gocd_telemetry::TelemetryError> {
//! init_logging(&LoggingConfig::new("gocd_client=debug").with_format(LogFormat::Json))?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod subscriber;

pub use error::{Result, TelemetryError};
pub use subscriber::{
    DEFAULT_DIRECTIVES, FilterSource, LOG_ENV, LogFormat, LoggingConfig, init_logging,
    resolve_directives,
};
