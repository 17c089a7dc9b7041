//! Declarative suite files.
//!
//! A suite describes a request group in YAML or JSON:
//!
//! ```yaml
//! id: smoke
//! defaults:
//!   timeout_secs: 10
//! requests:
//!   - id: health
//!     url: http://localhost:8080/health
//!     assertions:
//!       - type: status_code
//!         expected: 200
//!   - id: job
//!     method: POST
//!     url: http://localhost:8080/jobs
//!     iterations: 5
//!     sleep_ms: 200
//!     until:
//!       type: body_contains
//!       text: done
//! ```
//!
//! `until` makes the request repeat while the check fails; `gate` turns a
//! failing check into `Skip`, which aborts the rest of the group.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use probe_application::{HttpClient, Request, RequestGroup};
use probe_domain::{
    Assertion, Check, DomainError, HttpMethod, ResponseSpec, RunDefaults, TestResult,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Errors raised while loading or building a suite.
#[derive(Debug, Error)]
pub enum SuiteError {
    /// The file could not be read.
    #[error("failed to read suite {}: {source}", path.display())]
    Io {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// YAML syntax or shape error.
    #[error("invalid YAML suite: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON syntax or shape error.
    #[error("invalid JSON suite: {0}")]
    Json(#[from] serde_json::Error),

    /// The file extension is neither YAML nor JSON.
    #[error("unsupported suite format: {0}")]
    UnsupportedFormat(String),

    /// A request definition names an unknown method.
    #[error("invalid request definition: {0}")]
    InvalidMethod(#[from] DomainError),
}

/// Serialization format of a suite file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuiteFormat {
    /// `.yaml` / `.yml`
    Yaml,
    /// `.json`
    Json,
}

impl SuiteFormat {
    /// Picks the format from a file extension.
    ///
    /// # Errors
    ///
    /// Returns `SuiteError::UnsupportedFormat` for any other extension.
    pub fn from_path(path: &Path) -> Result<Self, SuiteError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "yaml" | "yml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            other => Err(SuiteError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// One or several values for a header name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HeaderValues {
    /// A single value.
    One(String),
    /// Several values, sent in order.
    Many(Vec<String>),
}

impl HeaderValues {
    /// Returns the values as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        match self {
            Self::One(value) => std::slice::from_ref(value),
            Self::Many(values) => values,
        }
    }
}

/// Credentials for an `Authorization: Basic` header.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicAuth {
    /// User name.
    pub username: String,
    /// Password.
    pub password: String,
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

fn default_method() -> String {
    HttpMethod::Get.to_string()
}

/// A single request in a suite file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestDefinition {
    /// Request id; random when absent.
    #[serde(default)]
    pub id: Option<String>,
    /// HTTP method, `GET` when absent.
    #[serde(default = "default_method")]
    pub method: String,
    /// Target URL.
    pub url: String,
    /// Headers by name.
    #[serde(default)]
    pub headers: BTreeMap<String, HeaderValues>,
    /// Basic authentication credentials.
    #[serde(default)]
    pub basic_auth: Option<BasicAuth>,
    /// Request body as text.
    #[serde(default)]
    pub body: Option<String>,
    /// Overrides `defaults.timeout_secs`.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Overrides `defaults.iterations`.
    #[serde(default)]
    pub iterations: Option<u32>,
    /// Overrides `defaults.sleep_ms`.
    #[serde(default)]
    pub sleep_ms: Option<u64>,
    /// Checks run against every response.
    #[serde(default)]
    pub assertions: Vec<Assertion>,
    /// Repeat until this check passes.
    #[serde(default)]
    pub until: Option<Assertion>,
    /// Skip the rest of the group when this check fails.
    #[serde(default)]
    pub gate: Option<Assertion>,
}

impl RequestDefinition {
    /// Builds an executable request, filling gaps from `defaults`.
    ///
    /// # Errors
    ///
    /// Returns `SuiteError::InvalidMethod` if the method is unknown.
    pub fn to_request(
        &self,
        client: Arc<dyn HttpClient>,
        defaults: RunDefaults,
    ) -> Result<Request, SuiteError> {
        let method: HttpMethod = self.method.parse()?;
        let settings = RunDefaults {
            timeout_secs: self.timeout_secs.unwrap_or(defaults.timeout_secs),
            iterations: self.iterations.unwrap_or(defaults.iterations),
            sleep_ms: self.sleep_ms.unwrap_or(defaults.sleep_ms),
        };

        let mut request = Request::new(client, method, self.url.as_str()).with_defaults(settings);
        if let Some(id) = &self.id {
            request = request.id(id.as_str());
        }
        for (name, values) in &self.headers {
            for value in values.as_slice() {
                request = request.header(name.as_str(), value.as_str());
            }
        }
        if let Some(auth) = &self.basic_auth {
            request = request.basic_auth(&auth.username, &auth.password);
        }
        if let Some(body) = &self.body {
            request = request.body(body.as_bytes());
        }
        for assertion in &self.assertions {
            request = request.assert(assertion.clone());
        }
        if self.until.is_some() || self.gate.is_some() {
            let until = self.until.clone();
            let gate = self.gate.clone();
            request = request.test(move |response, _| {
                evaluate_conditions(until.as_ref(), gate.as_ref(), response)
            });
        }

        Ok(request)
    }
}

/// Test function behind `until` and `gate`.
fn evaluate_conditions(
    until: Option<&Assertion>,
    gate: Option<&Assertion>,
    response: &ResponseSpec,
) -> TestResult {
    if let Some(until) = until {
        let result = until.evaluate(response);
        if !result.is_success() {
            return TestResult::repeat().with_description(result.description());
        }
    }
    if let Some(gate) = gate {
        let result = gate.evaluate(response);
        if !result.is_success() {
            return TestResult::skip(result.description());
        }
    }
    TestResult::success()
}

/// A request group described in a file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SuiteFile {
    /// Group id; random when absent.
    #[serde(default)]
    pub id: Option<String>,
    /// Settings shared by all requests.
    #[serde(default)]
    pub defaults: RunDefaults,
    /// Requests in execution order.
    #[serde(default)]
    pub requests: Vec<RequestDefinition>,
}

impl SuiteFile {
    /// Parses suite text in the given format.
    ///
    /// # Errors
    ///
    /// Returns `SuiteError::Yaml` or `SuiteError::Json` on malformed input.
    pub fn parse(content: &str, format: SuiteFormat) -> Result<Self, SuiteError> {
        match format {
            SuiteFormat::Yaml => Ok(serde_yaml::from_str(content)?),
            SuiteFormat::Json => Ok(serde_json::from_str(content)?),
        }
    }

    /// Builds a request group that sends every request through `client`.
    ///
    /// # Errors
    ///
    /// Returns `SuiteError::InvalidMethod` if any request names an unknown method.
    pub fn to_group(&self, client: &Arc<dyn HttpClient>) -> Result<RequestGroup, SuiteError> {
        let mut group = RequestGroup::new();
        if let Some(id) = &self.id {
            group = group.id(id.as_str());
        }
        for definition in &self.requests {
            group.add_request(definition.to_request(Arc::clone(client), self.defaults)?);
        }
        Ok(group)
    }
}

/// Reads and parses a suite file; the format follows the extension.
///
/// # Errors
///
/// Returns an error if the file cannot be read, has an unknown extension or
/// does not parse.
pub async fn load_suite(path: impl AsRef<Path>) -> Result<SuiteFile, SuiteError> {
    let path = path.as_ref();
    let format = SuiteFormat::from_path(path)?;
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SuiteError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    let suite = SuiteFile::parse(&content, format)?;
    debug!(path = %path.display(), requests = suite.requests.len(), "suite loaded");
    Ok(suite)
}
