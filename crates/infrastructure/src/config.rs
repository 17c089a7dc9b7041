//! HTTP client configuration.
//!
//! Values come from serde (suite files, embedding applications) or from
//! `PROBE_*` environment variables.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable overriding the User-Agent header.
pub const ENV_USER_AGENT: &str = "PROBE_USER_AGENT";
/// Environment variable overriding the redirect limit.
pub const ENV_MAX_REDIRECTS: &str = "PROBE_MAX_REDIRECTS";
/// Environment variable setting a connect timeout in seconds.
pub const ENV_CONNECT_TIMEOUT_SECS: &str = "PROBE_CONNECT_TIMEOUT_SECS";

/// Errors raised while reading configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable held a value that could not be parsed.
    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        /// Variable name.
        key: String,
        /// Raw value.
        value: String,
        /// Parser message.
        reason: String,
    },
}

fn default_user_agent() -> String {
    concat!("probe/", env!("CARGO_PKG_VERSION")).to_string()
}

const fn default_max_redirects() -> usize {
    10
}

/// Settings for the underlying HTTP client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// User-Agent header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Maximum number of redirects to follow.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    /// Optional TCP connect timeout in seconds.
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,
}

impl ClientConfig {
    /// Reads overrides from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a numeric variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads overrides through `lookup`, starting from the defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a numeric variable does not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(user_agent) = lookup(ENV_USER_AGENT) {
            config.user_agent = user_agent;
        }
        if let Some(raw) = lookup(ENV_MAX_REDIRECTS) {
            config.max_redirects = parse_var(ENV_MAX_REDIRECTS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_CONNECT_TIMEOUT_SECS) {
            config.connect_timeout_secs = Some(parse_var(ENV_CONNECT_TIMEOUT_SECS, &raw)?);
        }

        Ok(config)
    }

    /// Returns the connect timeout, if any.
    #[must_use]
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_secs.map(Duration::from_secs)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            max_redirects: default_max_redirects(),
            connect_timeout_secs: None,
        }
    }
}

fn parse_var<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_variables() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert!(config.user_agent.starts_with("probe/"));
        assert_eq!(config.connect_timeout(), None);
    }

    #[test]
    fn test_overrides() {
        let config = ClientConfig::from_lookup(lookup(&[
            (ENV_USER_AGENT, "ci-smoke"),
            (ENV_MAX_REDIRECTS, "3"),
            (ENV_CONNECT_TIMEOUT_SECS, " 5 "),
        ]))
        .unwrap();

        assert_eq!(config.user_agent, "ci-smoke");
        assert_eq!(config.max_redirects, 3);
        assert_eq!(config.connect_timeout(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_invalid_number() {
        let err = ClientConfig::from_lookup(lookup(&[(ENV_MAX_REDIRECTS, "many")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { ref key, .. } if key == ENV_MAX_REDIRECTS
        ));
    }

    #[test]
    fn test_deserialize_partial() {
        let config: ClientConfig = serde_json::from_str(r#"{"max_redirects": 0}"#).unwrap();
        assert_eq!(config.max_redirects, 0);
        assert!(config.user_agent.starts_with("probe/"));
    }
}
