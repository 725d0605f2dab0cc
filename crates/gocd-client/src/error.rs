//! Error types for dispatcher calls.

use reqwest::StatusCode;
use thiserror::Error;

use crate::transport::ApiResponse;

/// Boxed error raised by a transport implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Convenience alias for dispatcher results.
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors returned by [`crate::Client`] actions.
///
/// Variants fall into three groups: request construction (`InvalidUrl`,
/// `InvalidHeader`, `Encode`), transport (`Transport`, `Cancelled`,
/// `DeadlineExceeded`, `Status`) and deserialization (`Decode`,
/// `InvalidUtf8`). Whatever response envelope was obtained before the failure
/// is carried on the variant and exposed through [`ApiError::response`].
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request path could not be resolved against the base URL.
    #[error("invalid request path '{path}'")]
    InvalidUrl {
        /// Path supplied by the caller.
        path: String,
        /// Underlying URL parse error.
        source: url::ParseError,
    },
    /// A header name or value could not be encoded.
    #[error("invalid header '{name}'")]
    InvalidHeader {
        /// Header name supplied by the caller.
        name: String,
    },
    /// Serialising the request payload failed.
    #[error("failed to encode request body")]
    Encode {
        /// Underlying serde error.
        source: serde_json::Error,
    },
    /// The transport failed before a response was received.
    #[error("transport failure")]
    Transport {
        /// Error reported by the transport.
        source: BoxError,
    },
    /// The caller cancelled the call.
    #[error("request cancelled")]
    Cancelled,
    /// The call did not complete before its deadline.
    #[error("request deadline exceeded")]
    DeadlineExceeded,
    /// The server answered with a non-success status.
    #[error("server responded with status {status}")]
    Status {
        /// Status code returned by the server.
        status: StatusCode,
        /// Full response envelope.
        response: Box<ApiResponse>,
    },
    /// The response body did not match the expected shape.
    #[error("failed to decode response body")]
    Decode {
        /// Underlying serde error.
        source: serde_json::Error,
        /// Response envelope whose body failed to decode.
        response: Box<ApiResponse>,
    },
    /// A text response was not valid UTF-8.
    #[error("response body was not valid utf-8")]
    InvalidUtf8 {
        /// Underlying UTF-8 error.
        source: std::str::Utf8Error,
        /// Response envelope carrying the offending body.
        response: Box<ApiResponse>,
    },
}

impl ApiError {
    /// Wrap an arbitrary transport failure.
    pub fn transport(source: impl Into<BoxError>) -> Self {
        Self::Transport {
            source: source.into(),
        }
    }

    /// Map a `reqwest` failure, treating client-side timeouts as deadline expiry.
    #[must_use]
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::DeadlineExceeded
        } else {
            Self::transport(err)
        }
    }

    /// Response envelope obtained before the failure, if any.
    #[must_use]
    pub fn response(&self) -> Option<&ApiResponse> {
        match self {
            Self::Status { response, .. }
            | Self::Decode { response, .. }
            | Self::InvalidUtf8 { response, .. } => Some(response),
            _ => None,
        }
    }

    /// Status code of the obtained response, if any.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        self.response().map(ApiResponse::status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Version;
    use reqwest::header::HeaderMap;
    use std::error::Error as _;
    use std::io;

    fn not_found() -> ApiResponse {
        ApiResponse::new(
            StatusCode::NOT_FOUND,
            Version::HTTP_11,
            HeaderMap::new(),
            b"{}".to_vec(),
        )
    }

    #[test]
    fn display_messages_are_stable() {
        let cases = vec![
            (
                ApiError::InvalidHeader {
                    name: "bad name".into(),
                },
                "invalid header 'bad name'",
            ),
            (ApiError::Cancelled, "request cancelled"),
            (ApiError::DeadlineExceeded, "request deadline exceeded"),
            (
                ApiError::Status {
                    status: StatusCode::NOT_FOUND,
                    response: Box::new(not_found()),
                },
                "server responded with status 404 Not Found",
            ),
        ];

        for (err, message) in cases {
            assert_eq!(err.to_string(), message);
        }
    }

    #[test]
    fn transport_errors_keep_their_source() {
        let err = ApiError::transport(io::Error::new(
            io::ErrorKind::ConnectionRefused,
            "connection refused",
        ));
        let source = err.source().map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("connection refused"));
        assert!(err.response().is_none());
    }

    #[test]
    fn response_is_exposed_for_status_and_decode_errors() {
        let status = ApiError::Status {
            status: StatusCode::NOT_FOUND,
            response: Box::new(not_found()),
        };
        assert_eq!(status.status(), Some(StatusCode::NOT_FOUND));

        let decode_source = match serde_json::from_str::<u32>("\"nope\"") {
            Ok(_) => return,
            Err(err) => err,
        };
        let decode = ApiError::Decode {
            source: decode_source,
            response: Box::new(not_found()),
        };
        assert_eq!(
            decode.response().map(ApiResponse::body),
            Some(b"{}".as_slice())
        );
        assert!(ApiError::Cancelled.status().is_none());
    }
}
