//! Request-time error types for the SellAuth SDK.
//!
//! Every failure surfaced by [`SellAuthClient::request`](crate::SellAuthClient::request)
//! is a [`SellAuthError`]. The variants separate the three ways a call can go
//! wrong:
//!
//! - [`ApiError`]: the server answered with a non-2xx status
//! - [`TransportError`]: the call never produced a response (network failure,
//!   timeout, cancellation)
//! - [`InvalidRequestError`]: the request could not be built
//!
//! # Example
//!
//! ```rust,ignore
//! use sellauth::{ErrorCode, SellAuthError};
//!
//! match client.request::<serde_json::Value>(HttpMethod::Get, "/shops", RequestOptions::new()).await {
//!     Ok(shops) => println!("{shops}"),
//!     Err(SellAuthError::Api(e)) => println!("API error {}: {}", e.status, e.message),
//!     Err(e) if e.code() == Some(ErrorCode::Timeout) => println!("timed out"),
//!     Err(e) => println!("request failed: {e}"),
//! }
//! ```

use std::fmt;

use thiserror::Error;

use crate::error::ConfigError;

/// Machine-checkable classification of a [`SellAuthError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// The per-request deadline elapsed.
    Timeout,
    /// The caller cancelled the request.
    Aborted,
    /// Connection, TLS or protocol failure.
    Network,
    /// The request could not be constructed.
    InvalidRequest,
    /// A successful response could not be decoded into the requested type.
    Decode,
    /// Client configuration was rejected.
    Config,
}

impl ErrorCode {
    /// Returns the wire-style code string (e.g. `TIMEOUT`).
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "TIMEOUT",
            Self::Aborted => "ABORTED",
            Self::Network => "NETWORK",
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::Decode => "DECODE",
            Self::Config => "CONFIG",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when the API responds with a non-successful status.
///
/// The message is taken from the body's `message` field when present,
/// otherwise it reads `HTTP <status>`.
///
/// # Example
///
/// ```rust
/// use sellauth::clients::ApiError;
/// use serde_json::json;
///
/// let error = ApiError::from_body(404, Some(json!({"message": "not found"})));
/// assert_eq!(error.status, 404);
/// assert_eq!(error.to_string(), "not found");
/// ```
#[derive(Debug, Error, Clone, PartialEq)]
#[error("{message}")]
pub struct ApiError {
    /// The HTTP status code of the response.
    pub status: u16,
    /// Human-readable message.
    pub message: String,
    /// The decoded JSON body, or the raw body as a JSON string.
    pub details: Option<serde_json::Value>,
    /// The numeric `Retry-After` delay the server sent, if any.
    pub retry_after: Option<std::time::Duration>,
}

impl ApiError {
    /// Builds an error from a status code and the decoded body.
    #[must_use]
    pub fn from_body(status: u16, details: Option<serde_json::Value>) -> Self {
        let message = details
            .as_ref()
            .and_then(|body| body.get("message"))
            .and_then(serde_json::Value::as_str)
            .filter(|m| !m.is_empty())
            .map_or_else(|| format!("HTTP {status}"), String::from);

        Self {
            status,
            message,
            details,
            retry_after: None,
        }
    }

    /// Attaches the server's `Retry-After` delay.
    #[must_use]
    pub fn with_retry_after(mut self, delay: Option<std::time::Duration>) -> Self {
        self.retry_after = delay;
        self
    }
}

/// Error raised when a request never produced an HTTP response.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The per-request timeout fired before the response arrived.
    #[error("Request timeout after {timeout_ms}ms")]
    Timeout {
        /// The timeout that elapsed, in milliseconds.
        timeout_ms: u64,
    },

    /// The caller's cancellation token fired.
    #[error("Request aborted")]
    Aborted,

    /// Connection or protocol failure reported by reqwest.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Failure reported by a custom transport.
    #[error("Transport error: {0}")]
    Other(String),
}

/// Error returned when a request cannot be built.
#[derive(Debug, Error)]
pub enum InvalidRequestError {
    /// The HTTP method is not supported.
    #[error("Invalid Http method {method}.")]
    InvalidMethod {
        /// The method that was provided.
        method: String,
    },

    /// The resolved URL is not valid.
    #[error("Invalid request URL '{url}'.")]
    InvalidUrl {
        /// The URL that failed to parse.
        url: String,
    },

    /// A header name or value is not valid HTTP.
    #[error("Invalid header '{name}'.")]
    InvalidHeader {
        /// The offending header name.
        name: String,
    },

    /// The JSON body could not be serialized.
    #[error("Failed to serialize request body: {0}")]
    Body(#[source] serde_json::Error),

    /// The query parameters could not be serialized.
    #[error("Failed to serialize query parameters: {0}")]
    Query(#[source] serde_json::Error),
}

/// Unified error type for every SDK operation.
///
/// Use the accessors ([`status`](Self::status), [`code`](Self::code),
/// [`details`](Self::details)) for programmatic handling without matching
/// on individual variants.
#[derive(Debug, Error)]
pub enum SellAuthError {
    /// The API answered with a non-2xx status.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The request never produced a response.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The request could not be built.
    #[error(transparent)]
    InvalidRequest(#[from] InvalidRequestError),

    /// A successful body did not match the requested type.
    #[error("Failed to decode response data: {0}")]
    Decode(#[source] serde_json::Error),

    /// Client configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A foreign error raised by a hook, middleware, auth provider or transport.
    #[error("{message}")]
    Other {
        /// Message of the wrapped error.
        message: String,
        /// The original error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl SellAuthError {
    /// Wraps an arbitrary error, keeping it as the source.
    pub fn other<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Other {
            message: error.to_string(),
            source: Box::new(error),
        }
    }

    /// Returns the HTTP status for API errors.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api(e) => Some(e.status),
            _ => None,
        }
    }

    /// Returns the machine-checkable error code, if the error has one.
    ///
    /// API errors have no code; inspect [`status`](Self::status) instead.
    #[must_use]
    pub const fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Api(_) | Self::Other { .. } => None,
            Self::Transport(TransportError::Timeout { .. }) => Some(ErrorCode::Timeout),
            Self::Transport(TransportError::Aborted) => Some(ErrorCode::Aborted),
            Self::Transport(_) => Some(ErrorCode::Network),
            Self::InvalidRequest(_) => Some(ErrorCode::InvalidRequest),
            Self::Decode(_) => Some(ErrorCode::Decode),
            Self::Config(_) => Some(ErrorCode::Config),
        }
    }

    /// Returns the response body attached to API errors.
    #[must_use]
    pub const fn details(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Api(e) => e.details.as_ref(),
            _ => None,
        }
    }

    /// Returns `true` for failures below HTTP that are worth retrying.
    ///
    /// Caller cancellation is excluded.
    #[must_use]
    pub const fn is_retryable_transport(&self) -> bool {
        matches!(self, Self::Transport(e) if !matches!(e, TransportError::Aborted))
    }
}
