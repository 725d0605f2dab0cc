//! Typed client configuration and validation.
//!
//! The struct is deserializable from whatever source the caller owns; this
//! crate never reads files, environment variables or prompts.

use std::fmt::{self, Debug, Formatter};
use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Server URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8153/go/";

/// Per-request timeout applied by the HTTP client.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// `User-Agent` sent with every request.
pub const DEFAULT_USER_AGENT: &str = concat!("gocd-rs/", env!("CARGO_PKG_VERSION"));

/// Errors raised while validating a [`ClientConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Field contained an invalid value.
    #[error("invalid client configuration field '{field}': {reason}")]
    InvalidField {
        /// Field that failed validation.
        field: &'static str,
        /// Offending value when it is safe to echo.
        value: Option<String>,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
    /// Only one half of the basic-auth credential pair was supplied.
    #[error("client configuration field '{field}' is required when '{paired_with}' is set")]
    IncompleteCredentials {
        /// Missing field.
        field: &'static str,
        /// Field that was supplied.
        paired_with: &'static str,
    },
    /// The underlying HTTP client could not be constructed.
    #[error("failed to build HTTP client")]
    HttpClient {
        /// Source `reqwest` error.
        source: reqwest::Error,
    },
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Basic-auth credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Account name.
    pub username: String,
    /// Account password.
    pub password: String,
}

impl Debug for Credentials {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Connection settings for a GoCD server.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Server base URL, e.g. `https://ci.example.com/go/`.
    pub base_url: String,
    /// Basic-auth username.
    pub username: Option<String>,
    /// Basic-auth password.
    #[serde(skip_serializing)]
    pub password: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// `User-Agent` header value.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            username: None,
            password: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl Debug for ClientConfig {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl ClientConfig {
    /// Configuration pointing at `base_url` with defaults for everything else.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Attach basic-auth credentials.
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Override the request timeout.
    #[must_use]
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Validate every field.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field encountered.
    pub fn validate(&self) -> ConfigResult<()> {
        self.parsed_base_url()?;
        self.credentials()?;
        self.timeout()?;
        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::InvalidField {
                field: "user_agent",
                value: None,
                reason: "must not be empty",
            });
        }
        Ok(())
    }

    /// Parse the base URL, appending a trailing `/` so relative API paths
    /// resolve underneath it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] for empty, unparsable or non-HTTP URLs.
    pub fn parsed_base_url(&self) -> ConfigResult<Url> {
        let raw = self.base_url.trim();
        if raw.is_empty() {
            return Err(ConfigError::InvalidField {
                field: "base_url",
                value: None,
                reason: "must not be empty",
            });
        }

        let mut url = Url::parse(raw).map_err(|_| ConfigError::InvalidField {
            field: "base_url",
            value: Some(raw.to_string()),
            reason: "must be an absolute URL",
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidField {
                field: "base_url",
                value: Some(raw.to_string()),
                reason: "scheme must be http or https",
            });
        }

        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }

    /// Credentials, when both halves are configured.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::IncompleteCredentials`] when only one half is set,
    /// or [`ConfigError::InvalidField`] for a blank username.
    pub fn credentials(&self) -> ConfigResult<Option<Credentials>> {
        match (&self.username, &self.password) {
            (None, None) => Ok(None),
            (Some(_), None) => Err(ConfigError::IncompleteCredentials {
                field: "password",
                paired_with: "username",
            }),
            (None, Some(_)) => Err(ConfigError::IncompleteCredentials {
                field: "username",
                paired_with: "password",
            }),
            (Some(username), Some(password)) => {
                let username = username.trim();
                if username.is_empty() {
                    return Err(ConfigError::InvalidField {
                        field: "username",
                        value: None,
                        reason: "must not be empty",
                    });
                }
                Ok(Some(Credentials {
                    username: username.to_string(),
                    password: password.clone(),
                }))
            }
        }
    }

    /// Request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] when the timeout is zero.
    pub fn timeout(&self) -> ConfigResult<Duration> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidField {
                field: "timeout_secs",
                value: Some("0".to_string()),
                reason: "must be greater than zero",
            });
        }
        Ok(Duration::from_secs(self.timeout_secs))
    }
}
