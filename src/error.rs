//! Error types for the CertFlow client.
//!
//! This module defines all error types that can occur while talking to a
//! certificate service, including transport errors, protocol violations,
//! and issuance-polling failures.

use std::time::Duration;

use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during CertFlow client operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Server answered with a status code outside the accepted set.
    ///
    /// Carries the original status, request URL, and raw body for
    /// diagnostics. Never retried internally.
    #[error("server returned {status} for {url}: {body}")]
    Connection {
        /// HTTP status code.
        status: u16,
        /// Request URL.
        url: String,
        /// Raw response body.
        body: String,
    },

    /// Accepted status code but unrecognized content-type.
    ///
    /// Treated as a protocol violation and surfaced immediately.
    #[error("unexpected server behavior: {0}")]
    UnexpectedServerBehavior(String),

    /// Referenced zone or certificate request does not exist server-side.
    #[error("not found: {0}")]
    NotFound(String),

    /// A policy id referenced by a zone could not be resolved.
    #[error("certificate policy not found: {0}")]
    PolicyNotFound(String),

    /// Transport failure during a status-check tick.
    ///
    /// Distinct from a terminal certificate status so callers never
    /// confuse a network failure with certificate rejection.
    #[error("status poll for request {request_id} failed: {source}")]
    Poll {
        /// The request identifier being polled.
        request_id: String,
        /// The underlying failure.
        #[source]
        source: Box<Error>,
    },

    /// Issuance polling exceeded its configured deadline or attempt bound.
    #[error("issuance polling timed out after {attempts} attempts ({}s)", .elapsed.as_secs())]
    Timeout {
        /// Number of status queries performed.
        attempts: usize,
        /// Wall-clock time spent polling.
        elapsed: Duration,
    },

    /// Server requires authentication before this operation.
    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    /// Operation not supported by this backend.
    #[error("operation not supported: {0}")]
    NotSupported(String),

    /// HTTP request or response error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON decoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// A response or configuration field is missing or malformed.
    #[error("invalid field: {0}")]
    Field(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a connection error from a rejected HTTP response.
    pub fn connection(status: u16, url: impl Into<String>, body: impl Into<String>) -> Self {
        Self::Connection {
            status,
            url: url.into(),
            body: body.into(),
        }
    }

    /// Create an unexpected-server-behavior error.
    pub fn unexpected(msg: impl Into<String>) -> Self {
        Self::UnexpectedServerBehavior(msg.into())
    }

    /// Create a not-found error.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Create a policy-not-found error.
    pub fn policy_not_found(id: impl Into<String>) -> Self {
        Self::PolicyNotFound(id.into())
    }

    /// Wrap a tick failure as a poll error.
    pub fn poll(request_id: impl Into<String>, source: Error) -> Self {
        Self::Poll {
            request_id: request_id.into(),
            source: Box::new(source),
        }
    }

    /// Create a polling timeout error.
    pub fn timeout(attempts: usize, elapsed: Duration) -> Self {
        Self::Timeout { attempts, elapsed }
    }

    /// Create an authentication-required error.
    pub fn authentication_required(msg: impl Into<String>) -> Self {
        Self::AuthenticationRequired(msg.into())
    }

    /// Create a not-supported error.
    pub fn not_supported(operation: impl Into<String>) -> Self {
        Self::NotSupported(operation.into())
    }

    /// Create an invalid-field error.
    pub fn field(msg: impl Into<String>) -> Self {
        Self::Field(msg.into())
    }

    /// Returns true if retrying the failed operation may succeed.
    ///
    /// Poll ticks and transport failures are retryable; protocol
    /// violations and server rejections are not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Poll { .. } | Self::Http(_))
    }

    /// Returns the HTTP status code if this is a connection error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Connection { status, .. } => Some(*status),
            _ => None,
        }
    }
}
