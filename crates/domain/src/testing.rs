//! Response assertions.
//!
//! An assertion is a check evaluated against a completed response. Built-in
//! checks are described by the serializable [`Assertion`] enum; arbitrary
//! closures can be used through [`FnCheck`].

use serde::{Deserialize, Serialize};

use crate::outcome::TestResult;
use crate::response::ResponseSpec;

/// Anything that can judge a completed response.
pub trait Check: Send + Sync {
    /// Evaluates the response and returns `Success` or a describing result.
    fn evaluate(&self, response: &ResponseSpec) -> TestResult;

    /// Short label used when logging a failed check.
    fn describe(&self) -> String {
        "custom check".to_string()
    }
}

/// A built-in assertion on the status or body of a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Assertion {
    /// Status code must equal `expected`.
    StatusCode {
        /// Expected status code.
        expected: u16,
    },
    /// Body must be zero bytes long.
    BodyIsEmpty,
    /// Body must parse as JSON.
    BodyIsJson,
    /// Body must contain `text`.
    BodyContains {
        /// Text to search for.
        text: String,
    },
}

impl Assertion {
    /// Get a human-readable description of this assertion.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::StatusCode { expected } => format!("Status code = {expected}"),
            Self::BodyIsEmpty => "Body is empty".to_string(),
            Self::BodyIsJson => "Body is valid JSON".to_string(),
            Self::BodyContains { text } => format!("Body contains '{text}'"),
        }
    }
}

impl Check for Assertion {
    fn describe(&self) -> String {
        self.description()
    }

    fn evaluate(&self, response: &ResponseSpec) -> TestResult {
        match self {
            Self::StatusCode { expected } => {
                if response.status == *expected {
                    TestResult::success()
                } else {
                    TestResult::failure(format!(
                        "received unexpected status code, expected {expected} but received {}",
                        response.status
                    ))
                }
            }
            Self::BodyIsEmpty => {
                if response.body.is_empty() {
                    TestResult::success()
                } else {
                    TestResult::failure(format!(
                        "received non empty body, body had length of: {}",
                        response.body.len()
                    ))
                }
            }
            Self::BodyIsJson => {
                match serde_json::from_slice::<serde_json::Value>(&response.body) {
                    Ok(_) => TestResult::success(),
                    Err(_) => TestResult::failure(format!(
                        "failed to parse the response body as json: '{}'",
                        response.body_text()
                    )),
                }
            }
            Self::BodyContains { text } => {
                if response.body_text().contains(text.as_str()) {
                    TestResult::success()
                } else {
                    TestResult::failure(format!("response body does not contain '{text}'"))
                }
            }
        }
    }
}

/// Adapts a closure into a [`Check`].
pub struct FnCheck<F>(pub F);

impl<F> Check for FnCheck<F>
where
    F: Fn(&ResponseSpec) -> TestResult + Send + Sync,
{
    fn evaluate(&self, response: &ResponseSpec) -> TestResult {
        (self.0)(response)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::outcome::ResultKind;
    use pretty_assertions::assert_eq;

    fn response(status: u16, body: &str) -> ResponseSpec {
        ResponseSpec {
            status,
            body: body.as_bytes().to_vec(),
            ..Default::default()
        }
    }

    #[test]
    fn test_status_code() {
        let assertion = Assertion::StatusCode { expected: 200 };
        assert!(assertion.evaluate(&response(200, "")).is_success());

        let result = assertion.evaluate(&response(500, ""));
        assert_eq!(result.kind(), ResultKind::Failure);
        assert_eq!(
            result.description(),
            "received unexpected status code, expected 200 but received 500"
        );
    }

    #[test]
    fn test_describe() {
        let assertion = Assertion::BodyContains {
            text: "ok".to_string(),
        };
        assert_eq!(assertion.describe(), "Body contains 'ok'");
        assert_eq!(
            FnCheck(|_: &ResponseSpec| TestResult::success()).describe(),
            "custom check"
        );
    }

    #[test]
    fn test_body_is_empty() {
        assert!(Assertion::BodyIsEmpty.evaluate(&response(200, "")).is_success());

        let result = Assertion::BodyIsEmpty.evaluate(&response(200, "abc"));
        assert_eq!(result.kind(), ResultKind::Failure);
        assert_eq!(
            result.description(),
            "received non empty body, body had length of: 3"
        );
    }

    #[test]
    fn test_body_is_json() {
        assert!(
            Assertion::BodyIsJson
                .evaluate(&response(200, r#"{"key":"value"}"#))
                .is_success()
        );

        let result = Assertion::BodyIsJson.evaluate(&response(200, "Non json response"));
        assert_eq!(result.kind(), ResultKind::Failure);
        assert!(result.description().contains("Non json response"));
    }

    #[test]
    fn test_empty_body_is_not_json() {
        let result = Assertion::BodyIsJson.evaluate(&response(200, ""));
        assert_eq!(result.kind(), ResultKind::Failure);
    }

    #[test]
    fn test_body_contains() {
        let assertion = Assertion::BodyContains {
            text: "ready".to_string(),
        };
        assert!(assertion.evaluate(&response(200, "status: ready")).is_success());
        assert_eq!(
            assertion.evaluate(&response(200, "pending")).kind(),
            ResultKind::Failure
        );
    }

    #[test]
    fn test_fn_check() {
        let check = FnCheck(|r: &ResponseSpec| {
            if r.status < 500 {
                TestResult::success()
            } else {
                TestResult::failure("server error")
            }
        });
        assert!(check.evaluate(&response(404, "")).is_success());
        assert!(!check.evaluate(&response(503, "")).is_success());
    }

    #[test]
    fn test_assertion_serde_tag() {
        let parsed: Assertion =
            serde_json::from_str(r#"{"type":"status_code","expected":201}"#).unwrap();
        assert_eq!(parsed, Assertion::StatusCode { expected: 201 });
        assert_eq!(parsed.description(), "Status code = 201");
    }
}
