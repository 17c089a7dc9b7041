//! Probe Domain - Core types
//!
//! This crate defines the domain model for the Probe HTTP test builder.
//! All types here are pure Rust with no I/O dependencies.

pub mod error;
pub mod id;
pub mod outcome;
pub mod request;
pub mod response;
pub mod settings;
pub mod testing;

pub use error::{DomainError, DomainResult};
pub use id::generate_id;
pub use outcome::{DownstreamArgs, ResultKind, TestResult, annotate_result};
pub use request::{Header, Headers, HttpMethod, RequestSpec};
pub use response::ResponseSpec;
pub use settings::RunDefaults;
pub use testing::{Assertion, Check, FnCheck};
