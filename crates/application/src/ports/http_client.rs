//! HTTP Client port

use std::future::Future;
use std::pin::Pin;

use probe_domain::{RequestSpec, ResponseSpec};
use thiserror::Error;

/// Boxed future returned by [`HttpClient::execute`].
pub type HttpClientFuture<'a> =
    Pin<Box<dyn Future<Output = Result<ResponseSpec, HttpClientError>> + Send + 'a>>;

/// Port for performing HTTP calls.
///
/// Implementations send the request, honour `RequestSpec::timeout`, and drain
/// the response body into memory before resolving.
pub trait HttpClient: Send + Sync {
    /// Executes an HTTP request and returns the response.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be built or sent, if it times
    /// out, or if the response body cannot be read.
    fn execute(&self, request: &RequestSpec) -> HttpClientFuture<'_>;
}

/// Errors produced by an [`HttpClient`].
///
/// Messages never include header values, so credentials cannot leak
/// through them.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HttpClientError {
    /// The URL could not be parsed.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The method is not a valid HTTP token.
    #[error("invalid HTTP method: {0}")]
    InvalidMethod(String),

    /// The request could not be built (e.g. an invalid header name).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The call did not finish in time.
    #[error("request timed out after {timeout_ms}ms")]
    Timeout {
        /// Configured timeout in milliseconds.
        timeout_ms: u64,
    },

    /// The remote host refused the connection.
    #[error("connection refused by {host}:{port}")]
    ConnectionRefused {
        /// Target host.
        host: String,
        /// Target port.
        port: u16,
    },

    /// The connection failed for another reason.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The redirect limit was exceeded.
    #[error("too many redirects (max {max})")]
    TooManyRedirects {
        /// Configured redirect limit.
        max: usize,
    },

    /// The response arrived but its body could not be read.
    #[error("failed to read response body: {0}")]
    BodyRead(String),

    /// Anything else.
    #[error("{0}")]
    Other(String),
}

impl HttpClientError {
    /// Returns true if the failure happened while reading the response body.
    #[must_use]
    pub const fn is_body_read(&self) -> bool {
        matches!(self, Self::BodyRead(_))
    }
}
