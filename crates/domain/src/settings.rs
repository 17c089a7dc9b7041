//! Run defaults.
//!
//! Values a request starts from before its builder overrides them.

use std::time::Duration;

use serde::{Deserialize, Serialize};

const fn default_timeout_secs() -> u64 {
    100
}

const fn default_iterations() -> u32 {
    1
}

/// Default execution settings for requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunDefaults {
    /// Transport timeout per attempt, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Attempt budget for `Repeat` results.
    #[serde(default = "default_iterations")]
    pub iterations: u32,
    /// Delay between a `Repeat` and the next attempt, in milliseconds.
    #[serde(default)]
    pub sleep_ms: u64,
}

impl RunDefaults {
    /// Returns the timeout as a `Duration`.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Returns the retry delay as a `Duration`.
    #[must_use]
    pub const fn sleep(&self) -> Duration {
        Duration::from_millis(self.sleep_ms)
    }
}

impl Default for RunDefaults {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            iterations: default_iterations(),
            sleep_ms: 0,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let defaults = RunDefaults::default();
        assert_eq!(defaults.timeout(), Duration::from_secs(100));
        assert_eq!(defaults.iterations, 1);
        assert_eq!(defaults.sleep(), Duration::ZERO);
    }

    #[test]
    fn test_partial_deserialize() {
        let defaults: RunDefaults = serde_json::from_str(r#"{"iterations": 5}"#).unwrap();
        assert_eq!(defaults.iterations, 5);
        assert_eq!(defaults.timeout_secs, 100);
    }
}
