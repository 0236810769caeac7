//! The gateway pipeline: validation, invocation, response transformation.
//!
//! Each request traverses the stage machine exactly once:
//!
//! ```text
//! Received -> Validating -> Valid   -> Invoking -> Transforming -> Responded
//!                        \-> Invalid -> Rejected
//!                                       Invoking -> Faulted     -> Responded
//! ```
//!
//! No state is revisited and no retry loop exists inside this core. The
//! pipeline holds no mutable state across requests beyond the immutable
//! schema registry, so arbitrarily many requests may run concurrently.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{error, info, warn};

use crate::envelope::ResponseEnvelope;
use crate::error::{Error, Result};
use crate::invoke::{BackendInvoker, BackendResult, InvocationContext, InvocationPayload};
use crate::schema::SchemaRegistry;
use crate::transform::{
    apply_request_template, transform_response, RequestTemplate, ResponseTemplate,
};
use crate::validate::{
    describe_violations, validate_request, ParameterSpec, RequestParameters, ValidationResult,
};

/// Default wall-clock budget for a backend invocation.
pub const DEFAULT_BACKEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Terminal disposition of a request, recorded in the completion log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    /// Backend success transformed into the client envelope.
    Responded,
    /// Validation failure; the backend was never invoked.
    Rejected,
    /// Backend fault, timeout, or response contract violation.
    Faulted,
}

impl StageOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageOutcome::Responded => "responded",
            StageOutcome::Rejected => "rejected",
            StageOutcome::Faulted => "faulted",
        }
    }
}

/// Configuration-time description of the single mediated route.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteConfig {
    /// Registry id of the request body schema.
    pub request_schema: String,

    /// Registry id of the response body schema.
    pub response_schema: String,

    /// Declared optional request parameters.
    pub parameters: Vec<ParameterSpec>,

    /// How a validated request becomes the invocation payload.
    pub request_template: RequestTemplate,

    /// How the backend result becomes the client-facing body.
    pub response_template: ResponseTemplate,

    /// Version identifier handed to the backend per call.
    pub backend_revision: String,

    /// Wall-clock budget for the backend invocation.
    pub backend_timeout: Duration,
}

impl RouteConfig {
    pub fn new(request_schema: impl Into<String>, response_schema: impl Into<String>) -> Self {
        Self {
            request_schema: request_schema.into(),
            response_schema: response_schema.into(),
            parameters: Vec::new(),
            request_template: RequestTemplate::Passthrough,
            response_template: ResponseTemplate::Identity,
            backend_revision: env!("CARGO_PKG_VERSION").to_string(),
            backend_timeout: DEFAULT_BACKEND_TIMEOUT,
        }
    }

    /// Declare an optional request parameter.
    pub fn with_parameter(mut self, spec: ParameterSpec) -> Self {
        self.parameters.push(spec);
        self
    }

    pub fn with_request_template(mut self, template: RequestTemplate) -> Self {
        self.request_template = template;
        self
    }

    pub fn with_response_template(mut self, template: ResponseTemplate) -> Self {
        self.response_template = template;
        self
    }

    pub fn with_backend_revision(mut self, revision: impl Into<String>) -> Self {
        self.backend_revision = revision.into();
        self
    }

    pub fn with_backend_timeout(mut self, timeout: Duration) -> Self {
        self.backend_timeout = timeout;
        self
    }
}

/// Orchestrates schema validation, backend invocation, and response
/// transformation for one route.
pub struct GatewayPipeline<B: BackendInvoker> {
    registry: Arc<SchemaRegistry>,
    route: RouteConfig,
    backend: B,
}

impl<B: BackendInvoker> GatewayPipeline<B> {
    /// Build the pipeline, resolving both declared schema ids ahead of
    /// traffic. A missing schema is a configuration fault and fails fast
    /// here rather than surfacing per request.
    pub fn new(registry: Arc<SchemaRegistry>, route: RouteConfig, backend: B) -> Result<Self> {
        registry.lookup(&route.request_schema)?;
        registry.lookup(&route.response_schema)?;
        Ok(Self {
            registry,
            route,
            backend,
        })
    }

    /// Access the shared schema registry.
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Access the route configuration.
    pub fn route(&self) -> &RouteConfig {
        &self.route
    }

    /// Handle one inbound request end to end.
    ///
    /// Only the envelope crosses the boundary: validation failures become
    /// the fixed 400 rejection, backend faults and contract violations the
    /// fixed 502, with all internal detail going to the logs.
    pub async fn handle(
        &self,
        body: &Value,
        parameters: &RequestParameters,
        request_id: &str,
    ) -> ResponseEnvelope {
        // Validating
        let validation = match validate_request(
            &self.registry,
            &self.route.request_schema,
            body,
            &self.route.parameters,
            parameters,
        ) {
            Ok(result) => result,
            Err(e) => {
                // Unreachable after construction-time schema checks; still a
                // server fault if it ever happens, never a client fault.
                error!(request_id = %request_id, error = %e, "schema lookup failed during validation");
                return self.finish(request_id, StageOutcome::Faulted, ResponseEnvelope::faulted());
            }
        };

        let valid_body = match validation {
            ValidationResult::Valid(body) => body,
            ValidationResult::Invalid(violations) => {
                warn!(
                    request_id = %request_id,
                    violation_count = violations.len(),
                    violations = %describe_violations(&violations),
                    "request rejected by schema validation"
                );
                return self.finish(request_id, StageOutcome::Rejected, ResponseEnvelope::rejected());
            }
        };

        // Invoking
        let payload = apply_request_template(&valid_body, parameters, &self.route.request_template);
        let ctx = InvocationContext::new(
            request_id,
            self.route.backend_revision.clone(),
            self.route.backend_timeout,
        );

        let raw = match self.invoke_backend(payload, ctx).await {
            Ok(raw) => raw,
            Err(e) => {
                let cause = match &e {
                    Error::BackendTimeout { .. } => "backend_timeout",
                    _ => "backend_error",
                };
                error!(
                    request_id = %request_id,
                    cause = cause,
                    error = %e,
                    "backend invocation failed"
                );
                return self.finish(request_id, StageOutcome::Faulted, ResponseEnvelope::faulted());
            }
        };

        let summary = match BackendResult::from_value(&raw) {
            Ok(summary) => summary,
            Err(e) => {
                error!(request_id = %request_id, cause = "malformed_result", error = %e, "backend result did not match the collaborator shape");
                return self.finish(request_id, StageOutcome::Faulted, ResponseEnvelope::faulted());
            }
        };

        if !(200..300).contains(&summary.status_code) {
            error!(
                request_id = %request_id,
                cause = "backend_error",
                backend_status = summary.status_code,
                "backend reported a non-success status"
            );
            return self.finish(request_id, StageOutcome::Faulted, ResponseEnvelope::faulted());
        }

        // Transforming
        let response_schema = match self.registry.lookup(&self.route.response_schema) {
            Ok(schema) => schema,
            Err(e) => {
                error!(request_id = %request_id, error = %e, "response schema lookup failed");
                return self.finish(request_id, StageOutcome::Faulted, ResponseEnvelope::faulted());
            }
        };

        match transform_response(&raw, &self.route.response_template, response_schema) {
            Ok(body) => {
                self.finish(request_id, StageOutcome::Responded, ResponseEnvelope::success(body))
            }
            Err(e) => {
                let cause = match &e {
                    Error::ResponseContractViolation { .. } => "response_contract_violation",
                    _ => "malformed_result",
                };
                error!(request_id = %request_id, cause = cause, error = %e, "response transformation failed");
                self.finish(request_id, StageOutcome::Faulted, ResponseEnvelope::faulted())
            }
        }
    }

    /// Invoke the backend under the route's wall-clock budget, folding both
    /// handler faults and budget overruns into the typed error taxonomy.
    async fn invoke_backend(
        &self,
        payload: InvocationPayload,
        ctx: InvocationContext,
    ) -> Result<Value> {
        match tokio::time::timeout(
            self.route.backend_timeout,
            self.backend.invoke(payload, ctx),
        )
        .await
        {
            Ok(Ok(raw)) => Ok(raw),
            Ok(Err(fault)) => Err(Error::BackendError {
                message: fault.to_string(),
            }),
            Err(_) => Err(Error::BackendTimeout {
                budget: self.route.backend_timeout,
            }),
        }
    }

    fn finish(
        &self,
        request_id: &str,
        outcome: StageOutcome,
        envelope: ResponseEnvelope,
    ) -> ResponseEnvelope {
        info!(
            request_id = %request_id,
            outcome = outcome.as_str(),
            status = envelope.status.as_u16(),
            "request completed"
        );
        envelope
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoke::BackendFault;
    use crate::schema::{PropertySpec, Schema, SchemaType};
    use http::StatusCode;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    const REQUEST_SCHEMA: &str = "stationery-request";
    const RESPONSE_SCHEMA: &str = "stationery-response";

    fn registry() -> Arc<SchemaRegistry> {
        let mut registry = SchemaRegistry::new();
        registry.register(
            REQUEST_SCHEMA,
            Schema::object("StationeryRequest")
                .with_property(
                    "category",
                    PropertySpec::typed(SchemaType::String).with_enum([
                        json!("pens"),
                        json!("pencil"),
                        json!("eraser"),
                    ]),
                )
                .with_required("category"),
        );
        registry.register(
            RESPONSE_SCHEMA,
            Schema::object("StationeryResponse")
                .with_property("message", PropertySpec::typed(SchemaType::String))
                .with_required("message"),
        );
        Arc::new(registry)
    }

    fn route() -> RouteConfig {
        RouteConfig::new(REQUEST_SCHEMA, RESPONSE_SCHEMA)
            .with_response_template(ResponseTemplate::extract("body"))
    }

    /// Backend returning a fixed raw result and counting invocations.
    struct RecordingBackend {
        calls: AtomicUsize,
        payloads: Mutex<Vec<Value>>,
        result: Value,
    }

    impl RecordingBackend {
        fn returning(result: Value) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                payloads: Mutex::new(Vec::new()),
                result,
            }
        }

        fn greeting() -> Self {
            Self::returning(json!({
                "statusCode": 200,
                "body": "{\"message\": \"pens are available\"}"
            }))
        }
    }

    impl BackendInvoker for RecordingBackend {
        async fn invoke(
            &self,
            payload: InvocationPayload,
            _ctx: InvocationContext,
        ) -> std::result::Result<Value, BackendFault> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.payloads
                .lock()
                .expect("payload log")
                .push(payload.into_inner());
            Ok(self.result.clone())
        }
    }

    /// Backend that raises a handler-level fault.
    struct FaultyBackend;

    impl BackendInvoker for FaultyBackend {
        async fn invoke(
            &self,
            _payload: InvocationPayload,
            _ctx: InvocationContext,
        ) -> std::result::Result<Value, BackendFault> {
            Err(BackendFault::new("catalog unavailable"))
        }
    }

    /// Backend that never returns within any realistic budget.
    struct StuckBackend;

    impl BackendInvoker for StuckBackend {
        async fn invoke(
            &self,
            _payload: InvocationPayload,
            _ctx: InvocationContext,
        ) -> std::result::Result<Value, BackendFault> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(json!({"statusCode": 200, "body": "{}"}))
        }
    }

    #[test]
    fn construction_fails_fast_on_unregistered_schema() {
        let err = GatewayPipeline::new(
            registry(),
            RouteConfig::new("not-registered", RESPONSE_SCHEMA),
            RecordingBackend::greeting(),
        )
        .err()
        .expect("construction should fail");
        assert!(matches!(err, Error::SchemaNotFound { .. }));
    }

    #[tokio::test]
    async fn valid_request_is_invoked_once_and_responded() {
        let pipeline =
            GatewayPipeline::new(registry(), route(), RecordingBackend::greeting()).expect("config");

        let envelope = pipeline
            .handle(
                &json!({"category": "pens"}),
                &RequestParameters::default(),
                "req-1",
            )
            .await;

        assert_eq!(envelope.status, StatusCode::OK);
        assert_eq!(
            envelope.body,
            Some(json!({"message": "pens are available"}))
        );
        assert_eq!(pipeline.backend.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            pipeline.backend.payloads.lock().expect("payload log")[0],
            json!({"category": "pens"})
        );
    }

    #[tokio::test]
    async fn invalid_request_is_rejected_without_invocation() {
        let pipeline =
            GatewayPipeline::new(registry(), route(), RecordingBackend::greeting()).expect("config");

        let envelope = pipeline
            .handle(
                &json!({"category": "stapler"}),
                &RequestParameters::default(),
                "req-2",
            )
            .await;

        assert_eq!(envelope.status, StatusCode::BAD_REQUEST);
        assert!(envelope.body.is_none());
        assert_eq!(pipeline.backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_field_is_rejected_without_invocation() {
        let pipeline =
            GatewayPipeline::new(registry(), route(), RecordingBackend::greeting()).expect("config");

        let envelope = pipeline
            .handle(&json!({}), &RequestParameters::default(), "req-3")
            .await;

        assert_eq!(envelope.status, StatusCode::BAD_REQUEST);
        assert_eq!(pipeline.backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn backend_fault_becomes_an_empty_502() {
        let pipeline = GatewayPipeline::new(registry(), route(), FaultyBackend).expect("config");

        let envelope = pipeline
            .handle(
                &json!({"category": "pens"}),
                &RequestParameters::default(),
                "req-4",
            )
            .await;

        assert_eq!(envelope.status, StatusCode::BAD_GATEWAY);
        assert!(envelope.body.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn stuck_backend_faults_at_the_budget() {
        let pipeline = GatewayPipeline::new(
            registry(),
            route().with_backend_timeout(Duration::from_millis(50)),
            StuckBackend,
        )
        .expect("config");

        // Paused time auto-advances: the handle future resolves at the
        // budget instead of blocking for the backend's hour-long sleep.
        let envelope = pipeline
            .handle(
                &json!({"category": "pens"}),
                &RequestParameters::default(),
                "req-5",
            )
            .await;

        assert_eq!(envelope.status, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn handler_fault_surfaces_as_backend_error() {
        let pipeline = GatewayPipeline::new(registry(), route(), FaultyBackend).expect("config");

        let err = pipeline
            .invoke_backend(
                InvocationPayload::new(json!({"category": "pens"})),
                InvocationContext::new("req-err", "0.1.0", DEFAULT_BACKEND_TIMEOUT),
            )
            .await
            .err()
            .expect("fault should surface");

        assert!(matches!(err, Error::BackendError { .. }));
        assert!(err.to_string().contains("catalog unavailable"));
    }

    #[tokio::test(start_paused = true)]
    async fn budget_overrun_surfaces_as_backend_timeout() {
        let budget = Duration::from_millis(50);
        let pipeline = GatewayPipeline::new(
            registry(),
            route().with_backend_timeout(budget),
            StuckBackend,
        )
        .expect("config");

        let err = pipeline
            .invoke_backend(
                InvocationPayload::new(json!({"category": "pens"})),
                InvocationContext::new("req-slow", "0.1.0", budget),
            )
            .await
            .err()
            .expect("overrun should surface");

        assert!(matches!(err, Error::BackendTimeout { budget: b } if b == budget));
    }

    #[tokio::test]
    async fn contract_breaking_backend_result_faults() {
        let backend = RecordingBackend::returning(json!({
            "statusCode": 200,
            "body": "{\"message\": 42}"
        }));
        let pipeline = GatewayPipeline::new(registry(), route(), backend).expect("config");

        let envelope = pipeline
            .handle(
                &json!({"category": "pens"}),
                &RequestParameters::default(),
                "req-6",
            )
            .await;

        assert_eq!(envelope.status, StatusCode::BAD_GATEWAY);
        assert!(envelope.body.is_none());
    }

    #[tokio::test]
    async fn malformed_backend_result_faults() {
        let backend = RecordingBackend::returning(json!({"unexpected": true}));
        let pipeline = GatewayPipeline::new(registry(), route(), backend).expect("config");

        let envelope = pipeline
            .handle(
                &json!({"category": "pens"}),
                &RequestParameters::default(),
                "req-7",
            )
            .await;

        assert_eq!(envelope.status, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn backend_non_success_status_faults() {
        let backend = RecordingBackend::returning(json!({
            "statusCode": 500,
            "body": "{\"message\": \"boom\"}"
        }));
        let pipeline = GatewayPipeline::new(registry(), route(), backend).expect("config");

        let envelope = pipeline
            .handle(
                &json!({"category": "pens"}),
                &RequestParameters::default(),
                "req-8",
            )
            .await;

        assert_eq!(envelope.status, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn repeated_requests_are_independent() {
        let pipeline =
            GatewayPipeline::new(registry(), route(), RecordingBackend::greeting()).expect("config");
        let body = json!({"category": "pens"});

        let first = pipeline
            .handle(&body, &RequestParameters::default(), "req-9a")
            .await;
        let second = pipeline
            .handle(&body, &RequestParameters::default(), "req-9b")
            .await;

        assert_eq!(first, second);
        assert_eq!(pipeline.backend.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn rejection_does_not_leak_into_a_following_valid_request() {
        let pipeline =
            GatewayPipeline::new(registry(), route(), RecordingBackend::greeting()).expect("config");

        let rejected = pipeline
            .handle(&json!({}), &RequestParameters::default(), "req-10a")
            .await;
        assert_eq!(rejected.status, StatusCode::BAD_REQUEST);

        let accepted = pipeline
            .handle(
                &json!({"category": "pens"}),
                &RequestParameters::default(),
                "req-10b",
            )
            .await;
        assert_eq!(accepted.status, StatusCode::OK);
    }

    #[tokio::test]
    async fn bound_parameter_reaches_the_backend_payload() {
        let backend = RecordingBackend::greeting();
        let route = route()
            .with_parameter(ParameterSpec::path("category"))
            .with_request_template(RequestTemplate::BindParameters(vec![
                crate::transform::ParameterBinding::path("category", "category"),
            ]));
        let pipeline = GatewayPipeline::new(registry(), route, backend).expect("config");

        let parameters = RequestParameters::default().with_path("category", "eraser");
        let envelope = pipeline
            .handle(&json!({"category": "pens"}), &parameters, "req-11")
            .await;

        assert_eq!(envelope.status, StatusCode::OK);
        assert_eq!(
            pipeline.backend.payloads.lock().expect("payload log")[0],
            json!({"category": "eraser"})
        );
    }
}
