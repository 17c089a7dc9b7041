//! Probe - fluent HTTP request test cases.
//!
//! Entry points that bind a [`Request`] to a shared reqwest-backed client:
//!
//! ```no_run
//! # async fn demo() {
//! let result = probe::get("https://api.example.com/health")
//!     .status_code(200)
//!     .body_is_json()
//!     .run()
//!     .await;
//! println!("{result}");
//! # }
//! ```

use std::sync::{Arc, OnceLock};

use probe_infrastructure::{ClientConfig, ReqwestHttpClient};
use tracing::warn;

pub use probe_application::{HttpClient, HttpClientError, Request, RequestGroup};
pub use probe_domain::{
    Assertion, Check, DownstreamArgs, HttpMethod, ResponseSpec, ResultKind, RunDefaults,
    TestResult, annotate_result,
};
pub use probe_infrastructure::{SuiteError, SuiteFile, load_suite};

static DEFAULT_CLIENT: OnceLock<Arc<dyn HttpClient>> = OnceLock::new();

/// Returns the process-wide client, configured from `PROBE_*` variables.
///
/// Invalid configuration is logged and replaced by the defaults.
pub fn default_client() -> Arc<dyn HttpClient> {
    Arc::clone(DEFAULT_CLIENT.get_or_init(build_default_client))
}

fn build_default_client() -> Arc<dyn HttpClient> {
    let config = ClientConfig::from_env().unwrap_or_else(|e| {
        warn!(error = %e, "ignoring invalid client configuration");
        ClientConfig::default()
    });
    match ReqwestHttpClient::from_config(&config) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            warn!(error = %e, "falling back to a default HTTP client");
            Arc::new(ReqwestHttpClient::default())
        }
    }
}

/// Starts a request with an arbitrary method.
#[must_use]
pub fn request(method: HttpMethod, url: impl Into<String>) -> Request {
    Request::new(default_client(), method, url)
}

/// Starts a GET request.
#[must_use]
pub fn get(url: impl Into<String>) -> Request {
    request(HttpMethod::Get, url)
}

/// Starts a POST request.
#[must_use]
pub fn post(url: impl Into<String>) -> Request {
    request(HttpMethod::Post, url)
}

/// Starts a PUT request.
#[must_use]
pub fn put(url: impl Into<String>) -> Request {
    request(HttpMethod::Put, url)
}

/// Starts a PATCH request.
#[must_use]
pub fn patch(url: impl Into<String>) -> Request {
    request(HttpMethod::Patch, url)
}

/// Starts a DELETE request.
#[must_use]
pub fn delete(url: impl Into<String>) -> Request {
    request(HttpMethod::Delete, url)
}

/// Maps a final result to a process exit status.
#[must_use]
pub const fn exit_status(kind: ResultKind) -> u8 {
    match kind {
        ResultKind::Success | ResultKind::NoTest => 0,
        ResultKind::Skip => 2,
        _ => 1,
    }
}
