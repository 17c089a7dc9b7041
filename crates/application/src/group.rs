//! Request groups.
//!
//! A [`RequestGroup`] runs its requests one after another. The only result a
//! member can use to influence the group is `Skip`, which stops the group
//! before the remaining members run.

use probe_domain::{ResultKind, TestResult, annotate_result, generate_id};
use tracing::{info, warn};

use crate::request::Request;

/// An ordered batch of requests with early exit on `Skip`.
#[derive(Debug)]
pub struct RequestGroup {
    id: String,
    requests: Vec<Request>,
}

impl RequestGroup {
    /// Creates an empty group with a random id.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: generate_id(),
            requests: Vec::new(),
        }
    }

    /// Overrides the random identifier.
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Returns the group identifier.
    #[must_use]
    pub fn group_id(&self) -> &str {
        &self.id
    }

    /// Appends a request.
    pub fn add_request(&mut self, request: Request) {
        self.requests.push(request);
    }

    /// Appends a request (builder pattern).
    #[must_use]
    pub fn with_request(mut self, request: Request) -> Self {
        self.requests.push(request);
        self
    }

    /// Returns the number of requests.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Vec::len is not const in stable
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    /// Returns true if the group has no requests.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Vec::is_empty is not const in stable
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Runs every request in order.
    ///
    /// The first `Skip` aborts the group and is returned, annotated with the
    /// id of the request that produced it. Any other member result is logged
    /// and otherwise ignored, so the group reports `Success` unless it was
    /// skipped.
    pub async fn run(&mut self) -> TestResult {
        for request in &mut self.requests {
            let result = request.run().await;
            if result.kind() == ResultKind::Skip {
                warn!(group_id = %self.id, request_id = request.request_id(), "group skipped");
                let prefix = format!("skipped caused by request {}", request.request_id());
                return annotate_result(result, &prefix);
            }
            info!(
                group_id = %self.id,
                request_id = request.request_id(),
                kind = %result.kind(),
                description = result.description(),
                "group member finished"
            );
        }

        TestResult::success()
    }
}

impl Default for RequestGroup {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ports::HttpClientError;
    use crate::test_support::MockHttpClient;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    const URL: &str = "http://localhost/group";

    #[tokio::test]
    async fn test_empty_group_succeeds() {
        let mut group = RequestGroup::new();
        assert!(group.is_empty());
        assert_eq!(group.run().await.kind(), ResultKind::Success);
    }

    #[tokio::test]
    async fn test_runs_all_members_in_order() {
        let client = Arc::new(MockHttpClient::ok(200));
        let mut group = RequestGroup::new()
            .with_request(Request::get(client.clone(), URL).id("first"))
            .with_request(Request::get(client.clone(), URL).id("second"));
        group.add_request(Request::get(client.clone(), URL).id("third"));

        let result = group.run().await;

        assert_eq!(result.kind(), ResultKind::Success);
        assert_eq!(group.len(), 3);
        assert_eq!(client.calls(), 3);
        assert_eq!(client.last_request().unwrap().id, "third");
    }

    #[tokio::test]
    async fn test_skip_stops_remaining_requests() {
        let client = Arc::new(MockHttpClient::ok(200));
        let mut group = RequestGroup::new()
            .id("checkout")
            .with_request(Request::get(client.clone(), URL).id("login"))
            .with_request(
                Request::get(client.clone(), URL)
                    .id("feature-flag")
                    .test(|_, _| TestResult::skip("feature disabled")),
            )
            .with_request(Request::get(client.clone(), URL).id("never"));

        let result = group.run().await;

        assert_eq!(result.kind(), ResultKind::Skip);
        assert_eq!(
            result.description(),
            "skipped caused by request feature-flag: feature disabled"
        );
        assert_eq!(client.calls(), 2);
        assert_eq!(group.group_id(), "checkout");
    }

    #[tokio::test]
    async fn test_failures_are_not_aggregated() {
        let failing = Arc::new(MockHttpClient::failing(HttpClientError::ConnectionFailed(
            "down".to_string(),
        )));
        let ok = Arc::new(MockHttpClient::ok(500));
        let mut group = RequestGroup::new()
            .with_request(Request::get(failing, URL))
            .with_request(Request::get(ok.clone(), URL).status_code(200));

        let result = group.run().await;

        assert_eq!(result.kind(), ResultKind::Success);
        assert_eq!(ok.calls(), 1);
    }
}
