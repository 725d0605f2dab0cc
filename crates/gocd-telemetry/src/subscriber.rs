//! Filter resolution and subscriber installation.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::{Result, TelemetryError};

/// Environment variable whose directives override the configured ones.
pub const LOG_ENV: &str = "RUST_LOG";

/// Directives used when neither `RUST_LOG` nor the caller supplies any.
pub const DEFAULT_DIRECTIVES: &str = "info";

/// Output format of the installed subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event, fields flattened.
    Json,
    /// Multi-line human-readable output.
    Pretty,
}

impl Default for LogFormat {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

impl FromStr for LogFormat {
    type Err = TelemetryError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            _ => Err(TelemetryError::UnknownFormat {
                value: value.to_string(),
            }),
        }
    }
}

/// Origin of the filter directives that were applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterSource {
    /// Read from [`LOG_ENV`].
    Environment,
    /// Taken from [`LoggingConfig::directives`].
    Config,
}

impl Display for FilterSource {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Environment => write!(formatter, "{LOG_ENV}"),
            Self::Config => formatter.write_str("configuration"),
        }
    }
}

/// Subscriber settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// `EnvFilter` directives, e.g. `info,gocd_client=debug`.
    pub directives: String,
    /// Output format.
    pub format: LogFormat,
    /// Colourise output; ignored by the JSON format.
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DIRECTIVES)
    }
}

impl LoggingConfig {
    /// Settings with `directives` and the build's default format.
    pub fn new(directives: impl Into<String>) -> Self {
        Self {
            directives: directives.into(),
            format: LogFormat::default(),
            ansi: true,
        }
    }

    /// Override the output format.
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Enable or disable colour.
    #[must_use]
    pub fn with_ansi(mut self, ansi: bool) -> Self {
        self.ansi = ansi;
        self
    }
}

/// Pick the directives to apply: a non-blank `env` value wins over
/// `configured`, and a blank `configured` falls back to [`DEFAULT_DIRECTIVES`].
#[must_use]
pub fn resolve_directives(env: Option<&str>, configured: &str) -> (FilterSource, String) {
    match env.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => (FilterSource::Environment, value.to_string()),
        None if configured.trim().is_empty() => {
            (FilterSource::Config, DEFAULT_DIRECTIVES.to_string())
        }
        None => (FilterSource::Config, configured.trim().to_string()),
    }
}

/// Install the global subscriber described by `config`.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidFilter`] when the applied directives do
/// not parse (an invalid `RUST_LOG` is reported, not ignored), and
/// [`TelemetryError::AlreadyInstalled`] when a global subscriber exists.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let env = std::env::var(LOG_ENV).ok();
    let (origin, directives) = resolve_directives(env.as_deref(), &config.directives);
    let filter =
        EnvFilter::try_new(&directives).map_err(|source| TelemetryError::InvalidFilter {
            origin,
            directives: directives.clone(),
            source,
        })?;

    let installed = match config.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().flatten_event(true))
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty().with_ansi(config.ansi))
            .try_init(),
    };
    installed.map_err(|source| TelemetryError::AlreadyInstalled { source })?;

    tracing::debug!(%origin, %directives, format = ?config.format, "log subscriber installed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn environment_directives_win_when_present() {
        assert_eq!(
            resolve_directives(Some("gocd_client=trace"), "warn"),
            (FilterSource::Environment, "gocd_client=trace".to_string())
        );
        assert_eq!(
            resolve_directives(Some("  "), "warn"),
            (FilterSource::Config, "warn".to_string())
        );
        assert_eq!(
            resolve_directives(None, ""),
            (FilterSource::Config, DEFAULT_DIRECTIVES.to_string())
        );
    }

    #[test]
    fn formats_parse_case_insensitively() {
        assert!(matches!("JSON".parse::<LogFormat>(), Ok(LogFormat::Json)));
        assert!(matches!(" pretty ".parse::<LogFormat>(), Ok(LogFormat::Pretty)));
        let err = "xml".parse::<LogFormat>();
        assert!(matches!(err, Err(TelemetryError::UnknownFormat { value }) if value == "xml"));
    }

    #[test]
    fn config_builders_override_defaults() {
        let config = LoggingConfig::default()
            .with_format(LogFormat::Json)
            .with_ansi(false);
        assert_eq!(config.directives, DEFAULT_DIRECTIVES);
        assert_eq!(config.format, LogFormat::Json);
        assert!(!config.ansi);
    }

    #[test]
    fn invalid_filter_names_its_origin() {
        let directives = "gocd_client=loud";
        let Err(source) = EnvFilter::try_new(directives) else {
            panic!("directive should not parse");
        };
        let err = TelemetryError::InvalidFilter {
            origin: FilterSource::Environment,
            directives: directives.to_string(),
            source,
        };
        assert_eq!(
            err.to_string(),
            "invalid log filter 'gocd_client=loud' from RUST_LOG"
        );
        assert!(err.source().is_some());
    }
}
