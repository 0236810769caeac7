//! Stockroom gateway core.
//!
//! This crate implements the request-validating mediation layer that sits
//! between an HTTP front end and a backend collaborator:
//!
//! - [`SchemaRegistry`]: Named, immutable request/response schema definitions
//! - [`validate_request`]: Schema validation producing a complete violation list
//! - [`RequestTemplate`] / [`ResponseTemplate`]: Declarative payload reshaping
//! - [`BackendInvoker`]: Contract for the backend compute unit
//! - [`GatewayPipeline`]: Orchestrates validation, invocation, and response
//!   transformation with a fixed failure-to-status mapping
//!
//! Higher-level consumers (the HTTP service) should only depend on the types
//! exported here instead of reimplementing behavior.

#![deny(warnings)]

pub mod envelope;
pub mod error;
pub mod invoke;
pub mod pipeline;
pub mod schema;
pub mod transform;
pub mod validate;

pub use envelope::{ResponseEnvelope, ACCESS_CONTROL_ALLOW_HEADERS, CONTENT_TYPE_JSON};
pub use error::{Error, Result};
pub use invoke::{BackendFault, BackendInvoker, BackendResult, InvocationContext, InvocationPayload};
pub use pipeline::{GatewayPipeline, RouteConfig, StageOutcome, DEFAULT_BACKEND_TIMEOUT};
pub use schema::{PropertySpec, Schema, SchemaRegistry, SchemaType};
pub use transform::{
    apply_request_template, apply_response_template, transform_response, ParameterBinding,
    RequestTemplate, ResponseTemplate,
};
pub use validate::{
    describe_violations, validate_body, validate_parameters, validate_request, ParameterLocation,
    ParameterSpec, RequestParameters, ValidationResult, Violation,
};
