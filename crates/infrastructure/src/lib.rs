//! Probe Infrastructure - Adapters and implementations
//!
//! This crate provides the reqwest-backed `HttpClient`, client
//! configuration, and suite file loading.

pub mod adapters;
pub mod config;
pub mod suite;

pub use adapters::ReqwestHttpClient;
pub use config::{ClientConfig, ConfigError};
pub use suite::{
    BasicAuth, HeaderValues, RequestDefinition, SuiteError, SuiteFile, SuiteFormat, load_suite,
};
