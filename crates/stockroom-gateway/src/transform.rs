//! Declarative request and response transformation.
//!
//! Templates describe how to project one structured payload into another:
//! whole-body passthrough or parameter binding on the request side, and a
//! named field-extraction rule on the response side. Transformation is
//! deterministic and total over validated input; the pipeline guarantees it
//! is never applied to a rejected request.

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::invoke::InvocationPayload;
use crate::schema::Schema;
use crate::validate::{validate_body, ParameterLocation, RequestParameters, ValidationResult};

/// Binds a named path or header parameter into the invocation payload under
/// a declared key.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterBinding {
    pub location: ParameterLocation,
    pub name: String,
    pub target_key: String,
}

impl ParameterBinding {
    /// Bind a path parameter into the payload.
    pub fn path(name: impl Into<String>, target_key: impl Into<String>) -> Self {
        Self {
            location: ParameterLocation::Path,
            name: name.into(),
            target_key: target_key.into(),
        }
    }

    /// Bind a header parameter into the payload.
    pub fn header(name: impl Into<String>, target_key: impl Into<String>) -> Self {
        Self {
            location: ParameterLocation::Header,
            name: name.into(),
            target_key: target_key.into(),
        }
    }
}

/// How a validated request becomes an invocation payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestTemplate {
    /// The validated body is passed to the backend unmodified.
    #[default]
    Passthrough,

    /// Named parameters are merged into the body under their declared keys.
    /// An explicit binding wins over a body field of the same name.
    BindParameters(Vec<ParameterBinding>),
}

/// Project a validated body into the backend invocation payload.
pub fn apply_request_template(
    body: &Value,
    parameters: &RequestParameters,
    template: &RequestTemplate,
) -> InvocationPayload {
    match template {
        RequestTemplate::Passthrough => InvocationPayload::new(body.clone()),
        RequestTemplate::BindParameters(bindings) => {
            let mut object: Map<String, Value> = body.as_object().cloned().unwrap_or_default();
            for binding in bindings {
                if let Some(raw) = parameters.get(binding.location, &binding.name) {
                    object.insert(binding.target_key.clone(), Value::String(raw.to_string()));
                }
            }
            InvocationPayload::new(Value::Object(object))
        }
    }
}

/// How a raw backend result becomes the client-facing body.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseTemplate {
    /// The backend result is used as-is.
    Identity,

    /// A named extraction rule: pull the value at a dotted path out of the
    /// wrapped backend result. A string value at the path is treated as
    /// JSON-encoded and parsed back into structured data.
    ExtractField(String),
}

impl ResponseTemplate {
    /// Extraction rule for a dotted path, e.g. `extract("body")`.
    pub fn extract(path: impl Into<String>) -> Self {
        ResponseTemplate::ExtractField(path.into())
    }
}

/// Apply a response template to a raw backend result.
pub fn apply_response_template(result: &Value, template: &ResponseTemplate) -> Result<Value> {
    match template {
        ResponseTemplate::Identity => Ok(result.clone()),
        ResponseTemplate::ExtractField(path) => {
            let mut cursor = result;
            for segment in path.split('.') {
                cursor = cursor.get(segment).ok_or_else(|| Error::MalformedBackendResult {
                    message: format!("backend result has no '{}' field", path),
                })?;
            }

            match cursor {
                // The collaborator encodes its payload as a JSON string.
                Value::String(raw) => {
                    serde_json::from_str(raw).map_err(|e| Error::MalformedBackendResult {
                        message: format!("extracted '{}' is not valid JSON: {}", path, e),
                    })
                }
                other => Ok(other.clone()),
            }
        }
    }
}

/// Transform a raw backend result into the client-facing success body.
///
/// The extracted body must validate against the declared response schema;
/// a failure here is an internal contract violation, not something to pass
/// through silently.
pub fn transform_response(
    result: &Value,
    template: &ResponseTemplate,
    response_schema: &Schema,
) -> Result<Value> {
    let extracted = apply_response_template(result, template)?;
    match validate_body(response_schema, &extracted) {
        ValidationResult::Valid(body) => Ok(body),
        ValidationResult::Invalid(violations) => Err(Error::ResponseContractViolation { violations }),
    }
}
