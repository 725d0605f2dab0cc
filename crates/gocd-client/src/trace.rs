//! Request/response trace observers.
//!
//! Observers are a side channel: they see every request, every JSON response
//! and every failure, and cannot influence the call.

use std::borrow::Cow;

use reqwest::header::{AUTHORIZATION, HeaderMap, PROXY_AUTHORIZATION};

use crate::error::ApiError;
use crate::transport::{ApiRequest, ApiResponse};

const REDACTED: &str = "<redacted>";

/// Receives diagnostic traces from the dispatcher.
pub trait TraceObserver: Send + Sync {
    /// Called once the request is fully built, right before it is executed.
    fn on_request(&self, _request: &ApiRequest) {}

    /// Called after a successful JSON response was decoded.
    fn on_response(&self, _response: &ApiResponse) {}

    /// Called when a call fails after the request was built.
    fn on_error(&self, _error: &ApiError) {}
}

/// Observer that discards every trace.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl TraceObserver for NoopObserver {}

/// Observer that forwards traces to `tracing` at debug level, and failures at
/// error level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl TraceObserver for TracingObserver {
    fn on_request(&self, request: &ApiRequest) {
        tracing::debug!(request = %request.request_line(), "HTTP request");
        for (name, value) in header_lines(request.headers()) {
            tracing::debug!(header = %name, value = %value, "request header");
        }
        if let Some(body) = request.body() {
            tracing::debug!(body = %body_text(body), "request body");
        }
    }

    fn on_response(&self, response: &ApiResponse) {
        tracing::debug!(status = %response.status_line(), "HTTP response");
        for (name, value) in header_lines(response.headers()) {
            tracing::debug!(header = %name, value = %value, "response header");
        }
        tracing::debug!(body = %body_text(response.body()), "response body");
    }

    fn on_error(&self, error: &ApiError) {
        match error.status() {
            Some(status) => {
                tracing::error!(error = %error, status = %status, "HTTP action failed");
            }
            None => tracing::error!(error = %error, "HTTP action failed"),
        }
    }
}

/// Flatten a header map into printable `(name, value)` pairs, redacting
/// credentials and sensitive values.
#[must_use]
pub fn header_lines(headers: &HeaderMap) -> Vec<(&str, Cow<'_, str>)> {
    headers
        .iter()
        .map(|(name, value)| {
            let redact = value.is_sensitive()
                || *name == AUTHORIZATION
                || *name == PROXY_AUTHORIZATION;
            let text = if redact {
                Cow::Borrowed(REDACTED)
            } else {
                String::from_utf8_lossy(value.as_bytes())
            };
            (name.as_str(), text)
        })
        .collect()
}

/// Render a body for logging.
#[must_use]
pub fn body_text(body: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use reqwest::header::HeaderValue;
    use reqwest::{Method, Url};

    #[test]
    fn header_lines_redact_credentials() -> Result<()> {
        let mut request =
            ApiRequest::new(Method::GET, Url::parse("http://gocd.test/go/api")?, None);
        request.set_header("Authorization", "Basic dXNlcjpwYXNz")?;
        request.set_header("Accept", "application/json")?;
        let mut secret = HeaderValue::from_static("token");
        secret.set_sensitive(true);
        request.headers_mut().insert("x-api-token", secret);

        let lines = header_lines(request.headers());
        let lookup = |name: &str| {
            lines
                .iter()
                .find(|(header, _)| *header == name)
                .map(|(_, value)| value.to_string())
        };
        assert_eq!(lookup("authorization").as_deref(), Some(REDACTED));
        assert_eq!(lookup("x-api-token").as_deref(), Some(REDACTED));
        assert_eq!(lookup("accept").as_deref(), Some("application/json"));
        Ok(())
    }

    #[test]
    fn tracing_observer_tolerates_every_event_without_subscriber() -> Result<()> {
        let observer = TracingObserver;
        let request = ApiRequest::new(
            Method::POST,
            Url::parse("http://gocd.test/go/api/admin/templates")?,
            Some(br#"{"name":"build"}"#.to_vec()),
        );
        observer.on_request(&request);
        observer.on_error(&ApiError::Cancelled);
        Ok(())
    }
}
