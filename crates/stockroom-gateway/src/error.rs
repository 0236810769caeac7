use std::time::Duration;

use thiserror::Error;

use crate::validate::{describe_violations, Violation};

/// Convenient result alias for the Stockroom gateway library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Raised when a schema id has no registered definition. This is a
    /// configuration fault, never a client fault, and is checked at pipeline
    /// construction ahead of traffic.
    #[error("no schema registered under id '{id}'")]
    SchemaNotFound { id: String },

    /// Raised when the backend collaborator reports a fault.
    #[error("backend invocation failed: {message}")]
    BackendError { message: String },

    /// Raised when the backend invocation exceeds its wall-clock budget.
    #[error("backend invocation exceeded its {}ms budget", .budget.as_millis())]
    BackendTimeout { budget: Duration },

    /// Raised when the backend's success result fails the declared response
    /// schema. A defect in the backend or its schema, surfaced as a server
    /// fault rather than silently coerced to fit.
    #[error("backend result violated the response contract: {}", describe_violations(.violations))]
    ResponseContractViolation { violations: Vec<Violation> },

    /// Raised when the backend result does not match the collaborator shape.
    #[error("malformed backend result: {message}")]
    MalformedBackendResult { message: String },
}
