//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the execution core and external systems.
//! Each port is a trait implemented by adapters in the infrastructure layer.

mod http_client;

pub use http_client::{HttpClient, HttpClientError, HttpClientFuture};
