//! Test outcome model.
//!
//! Every stage of a request run (hooks, assertions, the test function and the
//! run itself) reports a [`TestResult`]. Failures are values, never panics.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Key/value data handed from one attempt's test function to the next attempt.
pub type DownstreamArgs = HashMap<String, String>;

/// Describes the outcome of a test stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultKind {
    /// The test and its assertions passed.
    Success,
    /// An assertion or the test logic failed.
    Failure,
    /// Reserved terminal state.
    Stop,
    /// A configuration or transport fault, not a test failure.
    Error,
    /// Tells a request group to abort its remaining requests.
    Skip,
    /// The test function asks for another attempt.
    Repeat,
    /// The request ran but nothing evaluated it.
    NoTest,
}

impl ResultKind {
    /// Returns the kind as a static upper-case string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Failure => "FAILURE",
            Self::Stop => "STOP",
            Self::Error => "ERROR",
            Self::Skip => "SKIP",
            Self::Repeat => "REPEAT",
            Self::NoTest => "NO_TEST",
        }
    }
}

impl fmt::Display for ResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The outcome of a test stage.
///
/// A `TestResult` is immutable once built: the builder-style methods consume
/// the value and return a new one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    kind: ResultKind,
    #[serde(default)]
    description: String,
    #[serde(default)]
    downstream_args: DownstreamArgs,
}

impl TestResult {
    /// Creates a result of the given kind with no description.
    #[must_use]
    pub fn new(kind: ResultKind) -> Self {
        Self {
            kind,
            description: String::new(),
            downstream_args: DownstreamArgs::new(),
        }
    }

    /// Creates a `Success` result.
    #[must_use]
    pub fn success() -> Self {
        Self::new(ResultKind::Success)
    }

    /// Creates a `Failure` result with a description.
    #[must_use]
    pub fn failure(description: impl Into<String>) -> Self {
        Self::new(ResultKind::Failure).with_description(description)
    }

    /// Creates an `Error` result with a description.
    #[must_use]
    pub fn error(description: impl Into<String>) -> Self {
        Self::new(ResultKind::Error).with_description(description)
    }

    /// Creates a `Skip` result with a description.
    #[must_use]
    pub fn skip(description: impl Into<String>) -> Self {
        Self::new(ResultKind::Skip).with_description(description)
    }

    /// Creates a `Repeat` result.
    #[must_use]
    pub fn repeat() -> Self {
        Self::new(ResultKind::Repeat)
    }

    /// Creates a `NoTest` result.
    #[must_use]
    pub fn no_test() -> Self {
        Self::new(ResultKind::NoTest)
    }

    /// Replaces the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Adds a single downstream argument.
    #[must_use]
    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.downstream_args.insert(key.into(), value.into());
        self
    }

    /// Replaces all downstream arguments.
    #[must_use]
    pub fn with_downstream_args(mut self, args: DownstreamArgs) -> Self {
        self.downstream_args = args;
        self
    }

    /// Returns the kind of this result.
    #[must_use]
    pub const fn kind(&self) -> ResultKind {
        self.kind
    }

    /// Returns the description, whatever the kind.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the downstream arguments.
    #[must_use]
    pub const fn downstream_args(&self) -> &DownstreamArgs {
        &self.downstream_args
    }

    /// Consumes the result and returns its downstream arguments.
    #[must_use]
    pub fn into_downstream_args(self) -> DownstreamArgs {
        self.downstream_args
    }

    /// Returns true if the kind is `Success`.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.kind == ResultKind::Success
    }

    /// Returns the description when the kind is `Error`, otherwise an empty string.
    #[must_use]
    pub fn error_message(&self) -> &str {
        if self.kind == ResultKind::Error {
            &self.description
        } else {
            ""
        }
    }

    /// Returns a copy whose description is prefixed with `prefix`.
    #[must_use]
    pub fn annotate(self, prefix: &str) -> Self {
        let description = format!("{prefix}: {}", self.description);
        self.with_description(description)
    }
}

/// Wraps a result's description with the stage that produced it.
///
/// The kind and downstream arguments are kept; the description becomes
/// `"<prefix>: <original description>"`.
#[must_use]
pub fn annotate_result(result: TestResult, prefix: &str) -> TestResult {
    result.annotate(prefix)
}

impl fmt::Display for TestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.description.is_empty() {
            write!(f, "[{}]", self.kind)
        } else {
            write!(f, "[{}] {}", self.kind, self.description)
        }
    }
}
