//! Health check handlers for liveness and readiness probes.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::routes::AppState;

/// Health status response for liveness and readiness probes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Status indicator: "ok" or "not_ready: <reason>".
    pub status: String,

    /// Service name for identification.
    pub service: String,

    /// Service version from build-time.
    pub version: String,

    /// Number of registered schemas (for readiness check).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schemas_registered: Option<usize>,
}

impl HealthStatus {
    /// Create a healthy liveness status.
    pub fn alive(service: &str, version: &str) -> Self {
        Self {
            status: "ok".to_string(),
            service: service.to_string(),
            version: version.to_string(),
            schemas_registered: None,
        }
    }

    /// Create a ready status with registry information.
    pub fn ready(service: &str, version: &str, schemas: usize) -> Self {
        Self {
            status: "ok".to_string(),
            service: service.to_string(),
            version: version.to_string(),
            schemas_registered: Some(schemas),
        }
    }

    /// Create a not-ready status.
    pub fn not_ready(service: &str, version: &str, reason: &str) -> Self {
        Self {
            status: format!("not_ready: {}", reason),
            service: service.to_string(),
            version: version.to_string(),
            schemas_registered: None,
        }
    }
}

/// Liveness probe handler. Returns 200 OK if the service is running.
pub async fn health_live() -> impl IntoResponse {
    let status = HealthStatus::alive(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    (StatusCode::OK, Json(status))
}

/// Readiness probe handler. Returns 200 OK once the schema registry is
/// populated and the pipeline can accept traffic.
pub async fn health_ready(State(state): State<AppState>) -> Response {
    let service = env!("CARGO_PKG_NAME");
    let version = env!("CARGO_PKG_VERSION");

    let schemas = state.pipeline().registry().len();
    if schemas == 0 {
        let status = HealthStatus::not_ready(service, version, "no schemas registered");
        return (StatusCode::SERVICE_UNAVAILABLE, Json(status)).into_response();
    }

    let status = HealthStatus::ready(service, version, schemas);
    (StatusCode::OK, Json(status)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_status_alive() {
        let status = HealthStatus::alive("stockroom-service", "0.1.0");
        assert_eq!(status.status, "ok");
        assert!(status.schemas_registered.is_none());
    }

    #[test]
    fn health_status_ready_counts_schemas() {
        let status = HealthStatus::ready("stockroom-service", "0.1.0", 2);
        assert_eq!(status.schemas_registered, Some(2));
    }

    #[test]
    fn health_status_not_ready_carries_reason() {
        let status = HealthStatus::not_ready("stockroom-service", "0.1.0", "no schemas registered");
        assert!(status.status.starts_with("not_ready:"));
        assert!(status.status.contains("no schemas registered"));
    }

    #[test]
    fn health_status_serialization_skips_absent_fields() {
        let status = HealthStatus::alive("stockroom-service", "0.1.0");
        let json = serde_json::to_string(&status).expect("serializable");
        assert!(json.contains("\"status\":\"ok\""));
        assert!(!json.contains("schemas_registered"));
    }
}
