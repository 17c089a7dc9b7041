//! Probe Application - Execution core and ports
//!
//! This crate defines:
//! - Port traits (interfaces for external dependencies)
//! - The request execution state machine
//! - Request groups

pub mod group;
pub mod ports;
pub mod request;

#[cfg(test)]
mod test_support;

pub use group::RequestGroup;
pub use ports::{HttpClient, HttpClientError, HttpClientFuture};
pub use request::{PostRequestFn, PreRequestFn, Request, TestFn};
