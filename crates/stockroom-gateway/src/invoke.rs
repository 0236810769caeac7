//! Contract with the backend collaborator.
//!
//! The backend is an external compute unit: it receives the transformed
//! invocation payload plus a per-call context and returns untyped structured
//! data in the agreed `{"statusCode": ..., "body": ...}` shape, or raises a
//! fault. Its internal logic is out of scope for this crate.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;

/// The structure handed to the backend collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationPayload(Value);

impl InvocationPayload {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_inner(self) -> Value {
        self.0
    }
}

/// Request-scoped context passed into every backend invocation.
///
/// Explicit per-call state instead of anything process-global, so the
/// pipeline stays safely concurrent.
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationContext {
    /// Logical invocation id, propagated from the inbound request.
    pub request_id: String,

    /// Version or revision identifier of the backend configuration.
    pub function_version: String,

    /// Remaining wall-clock budget for this invocation.
    pub remaining_budget: Duration,
}

impl InvocationContext {
    pub fn new(
        request_id: impl Into<String>,
        function_version: impl Into<String>,
        remaining_budget: Duration,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            function_version: function_version.into(),
            remaining_budget,
        }
    }
}

/// Typed view of the collaborator's result shape.
///
/// The collaborator returns untyped data; this view is how the gateway
/// enforces the agreed wrapper before response transformation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendResult {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: Value,
}

impl BackendResult {
    /// Parse a raw backend result into the agreed shape.
    pub fn from_value(value: &Value) -> Result<Self, Error> {
        serde_json::from_value(value.clone()).map_err(|e| Error::MalformedBackendResult {
            message: e.to_string(),
        })
    }
}

/// A fault raised by the backend collaborator itself, as opposed to a
/// timeout imposed by the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendFault {
    pub message: String,
}

impl BackendFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for BackendFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for BackendFault {}

/// A callable backend compute unit.
///
/// Implementations must be cooperative about cancellation: the pipeline
/// stops waiting once the invocation budget is exhausted but does not
/// forcibly interrupt an in-flight call.
pub trait BackendInvoker: Send + Sync {
    /// Invoke the backend with the transformed payload.
    fn invoke(
        &self,
        payload: InvocationPayload,
        ctx: InvocationContext,
    ) -> impl Future<Output = Result<Value, BackendFault>> + Send;
}
