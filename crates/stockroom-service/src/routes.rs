//! Route wiring: schema registration, pipeline construction, and the
//! stationery handler.
//!
//! The handler is thin glue: parse the raw JSON body, collect declared
//! parameters, run the gateway pipeline, and map the resulting envelope onto
//! an HTTP response byte for byte.

use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};
use uuid::Uuid;

use stockroom_backend::StationeryBackend;
use stockroom_gateway::{
    GatewayPipeline, ParameterSpec, PropertySpec, RequestParameters, ResponseEnvelope,
    ResponseTemplate, RouteConfig, Schema, SchemaRegistry, SchemaType,
};

use crate::config::ServiceConfig;
use crate::health::{health_live, health_ready};

/// Registry id of the stationery request model.
pub const REQUEST_SCHEMA_ID: &str = "stationery-request";

/// Registry id of the stationery response model.
pub const RESPONSE_SCHEMA_ID: &str = "stationery-response";

/// Declared optional header parameter, validated for type when present.
const INVOCATION_TYPE_HEADER: &str = "InvocationType";

/// Request model: an object with a required, enum-constrained `category`.
pub fn request_schema() -> Schema {
    Schema::object("StationeryRequest")
        .with_property(
            "category",
            PropertySpec::typed(SchemaType::String).with_enum([
                json!("pens"),
                json!("pencil"),
                json!("eraser"),
            ]),
        )
        .with_required("category")
}

/// Response model: the client-facing body must carry a string `message`.
pub fn response_schema() -> Schema {
    Schema::object("StationeryResponse")
        .with_property("message", PropertySpec::typed(SchemaType::String))
        .with_required("message")
}

/// Shared application state for all axum handlers. Cheaply cloneable; the
/// pipeline and registry behind it are immutable.
#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<GatewayPipeline<StationeryBackend>>,
}

impl AppState {
    /// Access the gateway pipeline.
    pub fn pipeline(&self) -> &GatewayPipeline<StationeryBackend> {
        &self.pipeline
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("schemas_registered", &self.pipeline.registry().len())
            .finish()
    }
}

/// Register the schemas and build the pipeline. Fails fast on a schema id
/// mismatch, before any traffic is accepted.
pub fn build_state(config: &ServiceConfig) -> stockroom_gateway::Result<AppState> {
    let mut registry = SchemaRegistry::new();
    registry.register(REQUEST_SCHEMA_ID, request_schema());
    registry.register(RESPONSE_SCHEMA_ID, response_schema());

    let route = RouteConfig::new(REQUEST_SCHEMA_ID, RESPONSE_SCHEMA_ID)
        .with_parameter(ParameterSpec::header(INVOCATION_TYPE_HEADER))
        .with_parameter(ParameterSpec::path("category"))
        .with_response_template(ResponseTemplate::extract("body"))
        .with_backend_revision(env!("CARGO_PKG_VERSION"))
        .with_backend_timeout(config.backend_timeout);

    let mut backend = StationeryBackend::new();
    if let Some(delay) = config.backend_delay {
        backend = backend.with_artificial_delay(delay);
    }

    let pipeline = GatewayPipeline::new(Arc::new(registry), route, backend)?;
    Ok(AppState {
        pipeline: Arc::new(pipeline),
    })
}

/// Build the service router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/stationery", post(stationery_handler))
        .route("/health/live", get(health_live))
        .route("/health/ready", get(health_ready))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Handle POST /api/v1/stationery.
async fn stationery_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request_id = extract_or_generate_request_id(&headers);

    // The schema contract is enforced before anything else; a body that is
    // not even JSON gets the same fixed rejection as a schema violation.
    let parsed: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => {
            warn!(request_id = %request_id, error = %e, "request body is not valid JSON");
            return envelope_to_response(ResponseEnvelope::rejected());
        }
    };

    let parameters = declared_parameters(&headers);
    let envelope = state.pipeline().handle(&parsed, &parameters, &request_id).await;
    envelope_to_response(envelope)
}

/// Collect the declared optional parameters supplied with this request.
///
/// Only `InvocationType` is carried by this route; the declared `category`
/// path parameter has no segment on this fixed path and is therefore always
/// absent (and absence is always valid).
fn declared_parameters(headers: &HeaderMap) -> RequestParameters {
    let mut parameters = RequestParameters::default();
    if let Some(value) = headers
        .get(INVOCATION_TYPE_HEADER)
        .and_then(|v| v.to_str().ok())
    {
        parameters = parameters.with_header(INVOCATION_TYPE_HEADER, value);
    }
    parameters
}

/// Extract the `X-Request-ID` header or generate a UUID v7 (time-sortable).
fn extract_or_generate_request_id(headers: &HeaderMap) -> String {
    headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
        .unwrap_or_else(|| Uuid::now_v7().to_string())
}

/// Map a gateway envelope onto an HTTP response, preserving status, headers,
/// and body exactly.
fn envelope_to_response(envelope: ResponseEnvelope) -> Response {
    let mut builder = Response::builder().status(envelope.status);
    for (name, value) in &envelope.headers {
        builder = builder.header(name, value);
    }

    let payload = match &envelope.body {
        Some(value) => match serde_json::to_vec(value) {
            Ok(bytes) => bytes,
            Err(e) => {
                error!(error = %e, "failed to serialize response body");
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        },
        None => Vec::new(),
    };

    match builder.body(Body::from(payload)) {
        Ok(response) => response,
        Err(e) => {
            error!(error = %e, "failed to build response");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
