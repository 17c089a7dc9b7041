//! Request specification type

use std::time::Duration;

use super::Headers;

/// Everything the transport needs to perform one HTTP call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpec {
    /// Identifier of the request this call belongs to
    pub id: String,
    /// HTTP method token (e.g. "GET")
    pub method: String,
    /// Target URL
    pub url: String,
    /// HTTP headers, possibly several values per name
    pub headers: Headers,
    /// Request body; `None` sends no body at all
    pub body: Option<Vec<u8>>,
    /// Upper bound for the whole call
    pub timeout: Duration,
}

impl RequestSpec {
    /// Creates a request specification with no headers and no body.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        method: impl Into<String>,
        url: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            id: id.into(),
            method: method.into(),
            url: url.into(),
            headers: Headers::new(),
            body: None,
            timeout,
        }
    }
}
