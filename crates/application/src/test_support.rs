//! Test doubles shared by the unit tests of this crate.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use probe_domain::{Headers, RequestSpec, ResponseSpec};

use crate::ports::{HttpClient, HttpClientError, HttpClientFuture};

/// Mock HTTP client that replays scripted outcomes.
///
/// Outcomes are consumed in order; once only one is left it is repeated for
/// every further call.
pub struct MockHttpClient {
    outcomes: Mutex<VecDeque<Result<ResponseSpec, HttpClientError>>>,
    requests: Mutex<Vec<RequestSpec>>,
    calls: AtomicUsize,
}

impl MockHttpClient {
    pub fn scripted(outcomes: Vec<Result<ResponseSpec, HttpClientError>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn ok(status: u16) -> Self {
        Self::with_body(status, "")
    }

    pub fn with_body(status: u16, body: &str) -> Self {
        Self::scripted(vec![Ok(response(status, body))])
    }

    pub fn failing(error: HttpClientError) -> Self {
        Self::scripted(vec![Err(error)])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<RequestSpec> {
        self.requests.lock().ok()?.last().cloned()
    }

    fn next_outcome(&self) -> Result<ResponseSpec, HttpClientError> {
        let Ok(mut outcomes) = self.outcomes.lock() else {
            return Err(HttpClientError::Other("mock poisoned".to_string()));
        };
        if outcomes.len() > 1 {
            outcomes
                .pop_front()
                .unwrap_or_else(|| Err(HttpClientError::Other("no outcome".to_string())))
        } else {
            outcomes
                .front()
                .cloned()
                .unwrap_or_else(|| Err(HttpClientError::Other("no outcome".to_string())))
        }
    }
}

pub fn response(status: u16, body: &str) -> ResponseSpec {
    ResponseSpec::new(
        status,
        Headers::new(),
        body.as_bytes().to_vec(),
        Duration::from_millis(5),
    )
}

impl HttpClient for MockHttpClient {
    fn execute(&self, request: &RequestSpec) -> HttpClientFuture<'_> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        let outcome = self.next_outcome();
        Box::pin(async move { outcome })
    }
}
