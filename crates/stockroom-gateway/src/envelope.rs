//! The client-facing response envelope.
//!
//! The envelope is the only value that crosses the system boundary: status,
//! a fixed header set per status class, and an optional JSON body. Error
//! envelopes carry no internal fault detail; that stays in the logs.

use std::collections::BTreeMap;

use http::StatusCode;
use serde_json::Value;

/// Content type attached to success responses.
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Fixed allow-list attached to success responses.
pub const ACCESS_CONTROL_ALLOW_HEADERS: &str =
    "cache-control,content-type,authorization,x-api-key,x-request-id";

/// The final structured response returned across the system boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEnvelope {
    pub status: StatusCode,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Value>,
}

impl ResponseEnvelope {
    /// Success envelope: 200 with the fixed success header set.
    pub fn success(body: Value) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("content-type".to_string(), CONTENT_TYPE_JSON.to_string());
        headers.insert(
            "access-control-allow-headers".to_string(),
            ACCESS_CONTROL_ALLOW_HEADERS.to_string(),
        );
        Self {
            status: StatusCode::OK,
            headers,
            body: Some(body),
        }
    }

    /// Rejection envelope: fixed 400 with an empty body and a content-length
    /// header only. Per-field violation detail is never echoed to the client.
    pub fn rejected() -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            headers: minimal_headers(),
            body: None,
        }
    }

    /// Fault envelope: 502 with an empty body. Covers backend errors,
    /// timeouts, and response contract violations alike.
    pub fn faulted() -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            headers: minimal_headers(),
            body: None,
        }
    }
}

fn minimal_headers() -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();
    headers.insert("content-length".to_string(), "0".to_string());
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_envelope_carries_fixed_headers() {
        let envelope = ResponseEnvelope::success(json!({"message": "ok"}));
        assert_eq!(envelope.status, StatusCode::OK);
        assert_eq!(
            envelope.headers.get("content-type").map(String::as_str),
            Some(CONTENT_TYPE_JSON)
        );
        assert_eq!(
            envelope
                .headers
                .get("access-control-allow-headers")
                .map(String::as_str),
            Some(ACCESS_CONTROL_ALLOW_HEADERS)
        );
        assert!(envelope.body.is_some());
    }

    #[test]
    fn rejected_envelope_is_empty_400_with_content_length_only() {
        let envelope = ResponseEnvelope::rejected();
        assert_eq!(envelope.status, StatusCode::BAD_REQUEST);
        assert!(envelope.body.is_none());
        assert_eq!(envelope.headers.len(), 1);
        assert_eq!(
            envelope.headers.get("content-length").map(String::as_str),
            Some("0")
        );
    }

    #[test]
    fn faulted_envelope_is_empty_502() {
        let envelope = ResponseEnvelope::faulted();
        assert_eq!(envelope.status, StatusCode::BAD_GATEWAY);
        assert!(envelope.body.is_none());
    }
}
