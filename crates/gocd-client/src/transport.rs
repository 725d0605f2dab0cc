//! Transport seam between the dispatcher and the wire.
//!
//! # Design
//! - [`Transport`] mirrors the two steps of a call: building a request object
//!   whose headers stay mutable, then executing it.
//! - [`ApiRequest`]/[`ApiResponse`] are plain owned envelopes so transports
//!   other than `reqwest` (mocks, recorders) can produce them.
//! - [`CallContext`] carries cooperative cancellation and an optional deadline;
//!   transports run their I/O through [`CallContext::run`].

use std::borrow::Cow;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode, Url, Version};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{ApiError, ApiResult};

/// Media type requested when no API version token is supplied.
pub const DEFAULT_MEDIA_TYPE: &str = "application/json";

/// Content type attached to JSON request bodies.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Resolve an API version token into the `Accept` media type.
///
/// An empty token requests plain JSON, a bare token such as `v4` selects
/// `application/vnd.go.cd.v4+json`, and anything containing `/` is already a
/// media type and is used verbatim.
#[must_use]
pub fn media_type_for(api_version: &str) -> Cow<'_, str> {
    let token = api_version.trim();
    if token.is_empty() {
        Cow::Borrowed(DEFAULT_MEDIA_TYPE)
    } else if token.contains('/') {
        Cow::Borrowed(token)
    } else {
        Cow::Owned(format!("application/vnd.go.cd.{token}+json"))
    }
}

/// Request object produced by [`Transport::new_request`].
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Option<Vec<u8>>,
}

impl ApiRequest {
    /// Create a request with an empty header map.
    #[must_use]
    pub fn new(method: Method, url: Url, body: Option<Vec<u8>>) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body,
        }
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Fully resolved request URL.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Request headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable access to the request headers.
    pub const fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Serialized request body, if any.
    #[must_use]
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// Look up a header value as text.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Set a header, replacing any existing values for the same name.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidHeader`] when the name or value cannot be
    /// encoded as an HTTP header.
    pub fn set_header(&mut self, name: &str, value: &str) -> ApiResult<()> {
        let invalid = || ApiError::InvalidHeader {
            name: name.to_string(),
        };
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
        let header_value = HeaderValue::from_str(value).map_err(|_| invalid())?;
        self.headers.insert(header_name, header_value);
        Ok(())
    }

    /// Request line as logged by trace observers, e.g. `GET /go/api/agents`.
    #[must_use]
    pub fn request_line(&self) -> String {
        let mut target = self.url.path().to_string();
        if let Some(query) = self.url.query() {
            target.push('?');
            target.push_str(query);
        }
        format!("{} {target}", self.method)
    }

    /// Split the request into its parts.
    #[must_use]
    pub fn into_parts(self) -> (Method, Url, HeaderMap, Option<Vec<u8>>) {
        (self.method, self.url, self.headers, self.body)
    }
}

/// Response envelope returned alongside every decoded body.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    version: Version,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl ApiResponse {
    /// Assemble an envelope from transport output.
    #[must_use]
    pub const fn new(
        status: StatusCode,
        version: Version,
        headers: HeaderMap,
        body: Vec<u8>,
    ) -> Self {
        Self {
            status,
            version,
            headers,
            body,
        }
    }

    /// Status code.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Protocol version.
    #[must_use]
    pub const fn version(&self) -> Version {
        self.version
    }

    /// Response headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Look up a header value as text.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Raw response body.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Whether the status is in the 2xx range.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Status line as logged by trace observers, e.g. `HTTP/1.1 200 OK`.
    #[must_use]
    pub fn status_line(&self) -> String {
        format!("{:?} {}", self.version, self.status)
    }
}

/// Per-call cancellation and deadline context.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    /// Context that is never cancelled and has no deadline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Context bound to a caller-owned cancellation token.
    #[must_use]
    pub fn with_cancellation(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            deadline: None,
        }
    }

    /// Set a deadline relative to now.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Set an absolute deadline.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Token observed by [`CallContext::run`].
    #[must_use]
    pub const fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Deadline, if one was set.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Drive `future` unless the context is cancelled or its deadline passes first.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Cancelled`] or [`ApiError::DeadlineExceeded`] when the
    /// context fires first, otherwise whatever `future` resolves to.
    pub async fn run<F, T>(&self, future: F) -> ApiResult<T>
    where
        F: Future<Output = ApiResult<T>>,
    {
        if self.cancel.is_cancelled() {
            return Err(ApiError::Cancelled);
        }

        let deadline = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(ApiError::Cancelled),
            () = deadline => Err(ApiError::DeadlineExceeded),
            result = future => result,
        }
    }
}

/// Builds and executes HTTP requests on behalf of the dispatcher.
///
/// Retry, authentication and connection pooling are the implementation's
/// business; the dispatcher never retries.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Build a request for `method`/`path` with an already serialized body,
    /// negotiating the media type selected by `api_version`.
    ///
    /// # Errors
    ///
    /// Returns a request-construction error when the path cannot be resolved.
    fn new_request(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
        api_version: &str,
    ) -> ApiResult<ApiRequest>;

    /// Execute `request`, honouring the cancellation and deadline in `ctx`.
    ///
    /// Non-success statuses are returned as responses, not errors.
    ///
    /// # Errors
    ///
    /// Returns transport errors (network failure, timeout, cancellation).
    async fn execute(&self, ctx: &CallContext, request: ApiRequest) -> ApiResult<ApiResponse>;
}
