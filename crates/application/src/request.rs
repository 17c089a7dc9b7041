//! Request execution core.
//!
//! A [`Request`] is configured through a chain of builder calls and then
//! driven by [`Request::run`], which walks the stages
//!
//! ```text
//! Validating -> PreHook -> Performing -> BodyRead -> Asserting -> Testing -> {Retry | PostHook} -> Done
//! ```
//!
//! and always yields a [`TestResult`]. A `Repeat` from the test function
//! restarts the attempt at the pre-hook until the iteration budget runs out.
//!
//! # Example
//!
//! ```ignore
//! let result = Request::get(client, "https://api.example.com/health")
//!     .status_code(200)
//!     .body_is_json()
//!     .run()
//!     .await;
//! assert!(result.is_success());
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use probe_domain::{
    Assertion, Check, DownstreamArgs, FnCheck, Headers, HttpMethod, RequestSpec, ResponseSpec,
    ResultKind, RunDefaults, TestResult, annotate_result, generate_id,
};
use tracing::{debug, info, warn};

use crate::ports::HttpClient;

/// Hook run before every attempt's transport call.
pub type PreRequestFn = Box<dyn FnMut() -> TestResult + Send>;

/// Primary evaluation function, called with the response and the downstream
/// arguments of the previous attempt.
pub type TestFn = Box<dyn FnMut(&ResponseSpec, &DownstreamArgs) -> TestResult + Send>;

/// Hook run once with the final test result.
pub type PostRequestFn = Box<dyn FnMut(&TestResult) -> TestResult + Send>;

const PRE_REQUEST_FAILED: &str = "received non successful result from pre request func";
const POST_REQUEST_FAILED: &str = "received non successful result from post request func";
const ASSERTION_FAILED: &str = "assertion failed";
const PERFORM_FAILED: &str = "received an error while performing request";
const READ_BODY_FAILED: &str = "received an error while reading response body";
const OUT_OF_ITERATIONS: &str = "failed after running out of iterations";

/// What a single attempt produced.
enum Attempt {
    /// Terminal result that bypasses the post-request hook.
    Aborted(TestResult),
    /// Result of the test stage, still to be handed to the post-request hook.
    Evaluated(TestResult),
    /// The test function asked for another attempt.
    Repeat(DownstreamArgs),
}

/// A single HTTP test case.
///
/// Concurrent runs of the same `Request` are impossible: [`Request::run`]
/// borrows it mutably because hooks and the test function are `FnMut`.
pub struct Request {
    client: Arc<dyn HttpClient>,
    id: String,
    url: String,
    method: String,
    body: Option<Vec<u8>>,
    headers: Headers,
    timeout: Duration,
    iterations: u32,
    sleep: Duration,
    checks: Vec<Box<dyn Check>>,
    pre_request: Option<PreRequestFn>,
    test: Option<TestFn>,
    post_request: Option<PostRequestFn>,
}

impl Request {
    /// Creates a request with a random id and [`RunDefaults::default`].
    #[must_use]
    pub fn new(
        client: Arc<dyn HttpClient>,
        method: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        let defaults = RunDefaults::default();
        Self {
            client,
            id: generate_id(),
            url: url.into(),
            method: method.into(),
            body: None,
            headers: Headers::new(),
            timeout: defaults.timeout(),
            iterations: defaults.iterations,
            sleep: defaults.sleep(),
            checks: Vec::new(),
            pre_request: None,
            test: None,
            post_request: None,
        }
    }

    /// Creates a GET request.
    #[must_use]
    pub fn get(client: Arc<dyn HttpClient>, url: impl Into<String>) -> Self {
        Self::new(client, HttpMethod::Get, url)
    }

    /// Creates a POST request.
    #[must_use]
    pub fn post(client: Arc<dyn HttpClient>, url: impl Into<String>) -> Self {
        Self::new(client, HttpMethod::Post, url)
    }

    /// Applies timeout, iteration budget and sleep from `defaults`.
    #[must_use]
    pub fn with_defaults(self, defaults: RunDefaults) -> Self {
        self.timeout(defaults.timeout())
            .sleep(defaults.sleep())
            .iterations(defaults.iterations)
    }

    /// Overrides the random identifier.
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Sets the outgoing payload. Without a call no body is sent.
    #[must_use]
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets a JSON payload and appends `Content-Type: application/json`.
    #[must_use]
    pub fn json(self, value: &serde_json::Value) -> Self {
        self.header("Content-Type", "application/json")
            .body(value.to_string())
    }

    /// Appends a header value. Repeated keys accumulate.
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(key, value);
        self
    }

    /// Appends an `Authorization: Basic` header for the given credentials.
    #[must_use]
    pub fn basic_auth(self, username: &str, password: &str) -> Self {
        let credentials = format!("{username}:{password}");
        let encoded = base64::engine::general_purpose::STANDARD.encode(credentials.as_bytes());
        self.header("Authorization", format!("Basic {encoded}"))
    }

    /// Bounds each transport call. Exceeding it yields an `Error` result.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the delay between a `Repeat` and the next attempt.
    #[must_use]
    pub const fn sleep(mut self, sleep: Duration) -> Self {
        self.sleep = sleep;
        self
    }

    /// Sets the attempt budget. Zero is ignored and the current value kept.
    #[must_use]
    pub const fn iterations(mut self, iterations: u32) -> Self {
        if iterations >= 1 {
            self.iterations = iterations;
        }
        self
    }

    /// Appends a built-in assertion.
    #[must_use]
    pub fn assert(mut self, assertion: Assertion) -> Self {
        self.checks.push(Box::new(assertion));
        self
    }

    /// Appends a custom assertion.
    #[must_use]
    pub fn assert_with<F>(mut self, check: F) -> Self
    where
        F: Fn(&ResponseSpec) -> TestResult + Send + Sync + 'static,
    {
        self.checks.push(Box::new(FnCheck(check)));
        self
    }

    /// Asserts the response status equals `expected`.
    #[must_use]
    pub fn status_code(self, expected: u16) -> Self {
        self.assert(Assertion::StatusCode { expected })
    }

    /// Asserts the response body is empty.
    #[must_use]
    pub fn body_is_empty(self) -> Self {
        self.assert(Assertion::BodyIsEmpty)
    }

    /// Asserts the response body is valid JSON.
    #[must_use]
    pub fn body_is_json(self) -> Self {
        self.assert(Assertion::BodyIsJson)
    }

    /// Asserts the response body contains `text`.
    #[must_use]
    pub fn body_contains(self, text: impl Into<String>) -> Self {
        self.assert(Assertion::BodyContains { text: text.into() })
    }

    /// Sets the test function.
    #[must_use]
    pub fn test<F>(mut self, test: F) -> Self
    where
        F: FnMut(&ResponseSpec, &DownstreamArgs) -> TestResult + Send + 'static,
    {
        self.test = Some(Box::new(test));
        self
    }

    /// Sets the hook run before every transport call.
    #[must_use]
    pub fn pre_request<F>(mut self, hook: F) -> Self
    where
        F: FnMut() -> TestResult + Send + 'static,
    {
        self.pre_request = Some(Box::new(hook));
        self
    }

    /// Sets the hook run with the final test result.
    #[must_use]
    pub fn post_request<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&TestResult) -> TestResult + Send + 'static,
    {
        self.post_request = Some(Box::new(hook));
        self
    }

    /// Returns the request identifier.
    #[must_use]
    pub fn request_id(&self) -> &str {
        &self.id
    }

    /// Returns the configured attempt budget.
    #[must_use]
    pub const fn configured_iterations(&self) -> u32 {
        self.iterations
    }

    /// Runs the request with no downstream arguments.
    pub async fn run(&mut self) -> TestResult {
        self.run_with_args(DownstreamArgs::new()).await
    }

    /// Runs the request, handing `args` to the first attempt's test function.
    pub async fn run_with_args(&mut self, args: DownstreamArgs) -> TestResult {
        if let Some(invalid) = self.validate() {
            warn!(request_id = %self.id, reason = invalid.description(), "request is misconfigured");
            return invalid;
        }

        let mut remaining = self.iterations;
        let mut args = args;
        let mut attempt = 1_u32;

        let result = loop {
            debug!(request_id = %self.id, attempt, remaining, "starting attempt");
            match self.attempt(&args).await {
                Attempt::Aborted(result) => break result,
                Attempt::Evaluated(result) => break self.finish(result),
                Attempt::Repeat(next_args) => {
                    remaining -= 1;
                    if remaining == 0 {
                        break TestResult::failure(OUT_OF_ITERATIONS);
                    }
                    debug!(request_id = %self.id, attempt, remaining, sleep = ?self.sleep, "repeating");
                    tokio::time::sleep(self.sleep).await;
                    args = next_args;
                    attempt += 1;
                }
            }
        };

        info!(request_id = %self.id, kind = %result.kind(), attempts = attempt, "request finished");
        result
    }

    fn validate(&self) -> Option<TestResult> {
        if self.url.is_empty() {
            return Some(TestResult::error("url is required"));
        }
        if self.method.is_empty() {
            return Some(TestResult::error("method is required"));
        }
        None
    }

    fn to_spec(&self) -> RequestSpec {
        RequestSpec {
            id: self.id.clone(),
            method: self.method.clone(),
            url: self.url.clone(),
            headers: self.headers.clone(),
            body: self.body.clone(),
            timeout: self.timeout,
        }
    }

    async fn attempt(&mut self, args: &DownstreamArgs) -> Attempt {
        if let Some(hook) = self.pre_request.as_mut() {
            let result = hook();
            if !result.is_success() {
                return Attempt::Aborted(annotate_result(result, PRE_REQUEST_FAILED));
            }
        }

        let spec = self.to_spec();
        let response = match self.client.execute(&spec).await {
            Ok(response) => response,
            Err(e) => {
                warn!(request_id = %self.id, error = %e, "transport call failed");
                let prefix = if e.is_body_read() {
                    READ_BODY_FAILED
                } else {
                    PERFORM_FAILED
                };
                return Attempt::Aborted(TestResult::error(format!("{prefix}: {e}")));
            }
        };
        debug!(request_id = %self.id, status = response.status, bytes = response.body.len(), "response received");

        let mut result = if self.checks.is_empty() {
            TestResult::no_test()
        } else {
            TestResult::success()
        };

        let assertion = self.check_assertions(&response);
        if !assertion.is_success() {
            return Attempt::Aborted(annotate_result(assertion, ASSERTION_FAILED));
        }

        if let Some(test) = self.test.as_mut() {
            result = test(&response, args);
            if result.kind() == ResultKind::Repeat {
                return Attempt::Repeat(result.into_downstream_args());
            }
        }

        Attempt::Evaluated(result)
    }

    fn check_assertions(&self, response: &ResponseSpec) -> TestResult {
        for check in &self.checks {
            let result = check.evaluate(response);
            if !result.is_success() {
                debug!(request_id = %self.id, check = %check.describe(), "check failed");
                return result;
            }
        }
        TestResult::success()
    }

    fn finish(&mut self, result: TestResult) -> TestResult {
        let Some(hook) = self.post_request.as_mut() else {
            return result;
        };
        let post = hook(&result);
        if post.is_success() {
            result
        } else {
            annotate_result(post, POST_REQUEST_FAILED)
        }
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("id", &self.id)
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &self.headers)
            .field("body_len", &self.body.as_ref().map(Vec::len))
            .field("timeout", &self.timeout)
            .field("iterations", &self.iterations)
            .field("sleep", &self.sleep)
            .field("checks", &self.checks.len())
            .field("pre_request", &self.pre_request.is_some())
            .field("test", &self.test.is_some())
            .field("post_request", &self.post_request.is_some())
            .finish_non_exhaustive()
    }
}
