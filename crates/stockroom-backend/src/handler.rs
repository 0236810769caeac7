//! The backend handler: category lookup wrapped in the collaborator shape.

use std::time::Duration;

use chrono::Utc;
use serde_json::{json, Value};
use tracing::info;

use stockroom_gateway::{BackendFault, BackendInvoker, InvocationContext, InvocationPayload};

use crate::catalog::StationeryCatalog;

/// Message returned when the payload carries no known category. The gateway
/// enforces the category enum before invocation, so this path is only
/// reachable when the backend is called directly.
pub const UNKNOWN_CATEGORY_MESSAGE: &str = "Unknown `category` provided";

/// The stationery lookup backend.
#[derive(Debug, Clone)]
pub struct StationeryBackend {
    catalog: StationeryCatalog,
    artificial_delay: Option<Duration>,
}

impl StationeryBackend {
    /// Backend over the seeded catalog.
    pub fn new() -> Self {
        Self {
            catalog: StationeryCatalog::seeded(),
            artificial_delay: None,
        }
    }

    /// Delay every invocation by a fixed duration. A chaos knob for
    /// exercising the gateway's timeout handling.
    pub fn with_artificial_delay(mut self, delay: Duration) -> Self {
        self.artificial_delay = Some(delay);
        self
    }

    fn respond(&self, payload: &Value, ctx: &InvocationContext) -> Result<Value, BackendFault> {
        let message = match payload
            .get("category")
            .and_then(Value::as_str)
            .and_then(|category| self.catalog.lookup(category))
        {
            Some(items) => serde_json::to_string(items)
                .map_err(|e| BackendFault::new(format!("failed to render catalog items: {}", e)))?,
            None => UNKNOWN_CATEGORY_MESSAGE.to_string(),
        };

        let body = json!({
            "message": message,
            "backend_version": ctx.function_version,
            "ts": Utc::now().to_rfc3339(),
        });
        let body = serde_json::to_string(&body)
            .map_err(|e| BackendFault::new(format!("failed to encode response body: {}", e)))?;

        Ok(json!({
            "statusCode": 200,
            "body": body,
        }))
    }
}

impl Default for StationeryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl BackendInvoker for StationeryBackend {
    async fn invoke(
        &self,
        payload: InvocationPayload,
        ctx: InvocationContext,
    ) -> Result<Value, BackendFault> {
        if let Some(delay) = self.artificial_delay {
            tokio::time::sleep(delay).await;
        }

        info!(
            request_id = %ctx.request_id,
            backend_version = %ctx.function_version,
            "handling stationery lookup"
        );

        self.respond(payload.as_value(), &ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use stockroom_gateway::BackendResult;

    fn ctx() -> InvocationContext {
        InvocationContext::new("test-request-1", "0.1.0", Duration::from_secs(5))
    }

    #[tokio::test]
    async fn known_category_yields_item_listing() {
        let backend = StationeryBackend::new();
        let raw = backend
            .invoke(InvocationPayload::new(json!({"category": "pens"})), ctx())
            .await
            .expect("invocation succeeds");

        let result = BackendResult::from_value(&raw).expect("collaborator shape");
        assert_eq!(result.status_code, 200);

        // The body is a JSON-encoded string carrying the message.
        let body: Value =
            serde_json::from_str(result.body.as_str().expect("string body")).expect("valid JSON");
        let message = body.get("message").and_then(Value::as_str).expect("message");
        assert!(message.contains("gel"));
        assert_eq!(body.get("backend_version"), Some(&json!("0.1.0")));
        assert!(body.get("ts").is_some());
    }

    #[tokio::test]
    async fn unknown_category_yields_the_fixed_message() {
        let backend = StationeryBackend::new();
        let raw = backend
            .invoke(InvocationPayload::new(json!({"category": "stapler"})), ctx())
            .await
            .expect("invocation succeeds");

        let result = BackendResult::from_value(&raw).expect("collaborator shape");
        let body: Value =
            serde_json::from_str(result.body.as_str().expect("string body")).expect("valid JSON");
        assert_eq!(body.get("message"), Some(&json!(UNKNOWN_CATEGORY_MESSAGE)));
    }

    #[tokio::test]
    async fn missing_category_yields_the_fixed_message() {
        let backend = StationeryBackend::new();
        let raw = backend
            .invoke(InvocationPayload::new(json!({})), ctx())
            .await
            .expect("invocation succeeds");

        let result = BackendResult::from_value(&raw).expect("collaborator shape");
        let body: Value =
            serde_json::from_str(result.body.as_str().expect("string body")).expect("valid JSON");
        assert_eq!(body.get("message"), Some(&json!(UNKNOWN_CATEGORY_MESSAGE)));
    }

    #[tokio::test(start_paused = true)]
    async fn artificial_delay_holds_the_invocation() {
        let backend =
            StationeryBackend::new().with_artificial_delay(Duration::from_millis(250));
        let started = tokio::time::Instant::now();

        backend
            .invoke(InvocationPayload::new(json!({"category": "pens"})), ctx())
            .await
            .expect("invocation succeeds");

        assert!(started.elapsed() >= Duration::from_millis(250));
    }
}
