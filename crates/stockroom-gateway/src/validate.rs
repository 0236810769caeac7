//! Request validation against registered schemas.
//!
//! Validation produces the complete ordered violation list rather than
//! short-circuiting on the first failure: callers need the full diagnostic
//! set for observability. Violation detail never reaches the client; the
//! pipeline maps any non-empty list to the fixed rejection envelope.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::Result;
use crate::schema::{Schema, SchemaRegistry, SchemaType};

/// A specific way a request failed to satisfy a schema.
#[derive(Debug, Clone, PartialEq)]
pub enum Violation {
    /// A required field is absent from the body. Distinct from a type
    /// mismatch on a present field.
    MissingField { field: String },

    /// A present field does not satisfy its declared type.
    TypeMismatch {
        field: String,
        expected: SchemaType,
        actual: SchemaType,
    },

    /// A present field is not a member of its declared enum set.
    EnumViolation {
        field: String,
        allowed: Vec<Value>,
        actual: Value,
    },
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Violation::MissingField { field } => {
                write!(f, "required field '{}' is missing", field)
            }
            Violation::TypeMismatch {
                field,
                expected,
                actual,
            } => write!(
                f,
                "field '{}' expected type {} but got {}",
                field, expected, actual
            ),
            Violation::EnumViolation {
                field,
                allowed,
                actual,
            } => write!(
                f,
                "field '{}' value {} is not one of {}",
                field,
                actual,
                allowed
                    .iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }
}

/// Render a violation list for log output.
pub fn describe_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Outcome of validating a request against a schema.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationResult {
    /// The body satisfied the schema; carries the body unchanged.
    Valid(Value),

    /// The body broke the schema; carries the complete ordered violation
    /// list.
    Invalid(Vec<Violation>),
}

impl ValidationResult {
    /// Whether the request passed validation.
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid(_))
    }
}

/// Where a declared request parameter is carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterLocation {
    Path,
    Header,
}

/// A declared optional request parameter.
///
/// Parameters in this system are never required: absence is always valid,
/// and the declared type is checked only when a value is present.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSpec {
    pub name: String,
    pub location: ParameterLocation,
    pub schema_type: SchemaType,
}

impl ParameterSpec {
    /// Declare an optional path parameter (string-typed by default).
    pub fn path(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: ParameterLocation::Path,
            schema_type: SchemaType::String,
        }
    }

    /// Declare an optional header parameter (string-typed by default).
    pub fn header(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: ParameterLocation::Header,
            schema_type: SchemaType::String,
        }
    }

    /// Override the declared parameter type.
    pub fn typed(mut self, schema_type: SchemaType) -> Self {
        self.schema_type = schema_type;
        self
    }
}

/// Path and header parameters supplied with a request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestParameters {
    pub path: BTreeMap<String, String>,
    pub header: BTreeMap<String, String>,
}

impl RequestParameters {
    /// Look up a supplied parameter by declared location and name.
    pub fn get(&self, location: ParameterLocation, name: &str) -> Option<&str> {
        let map = match location {
            ParameterLocation::Path => &self.path,
            ParameterLocation::Header => &self.header,
        };
        map.get(name).map(String::as_str)
    }

    /// Add a path parameter.
    pub fn with_path(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path.insert(name.into(), value.into());
        self
    }

    /// Add a header parameter.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.header.insert(name.into(), value.into());
        self
    }
}

/// Validate a body against a schema, returning the complete violation list.
///
/// Required-presence checks run first in declared order, then type and enum
/// checks per declared property. Undeclared properties are ignored: the
/// schema describes a minimum contract, not an exhaustive one.
pub fn validate_body(schema: &Schema, body: &Value) -> ValidationResult {
    let Some(object) = body.as_object() else {
        return ValidationResult::Invalid(vec![Violation::TypeMismatch {
            field: "$".to_string(),
            expected: schema.schema_type,
            actual: SchemaType::of(body),
        }]);
    };

    let mut violations = Vec::new();

    for name in &schema.required {
        if !object.contains_key(name) {
            violations.push(Violation::MissingField {
                field: name.clone(),
            });
        }
    }

    for (name, spec) in &schema.properties {
        let Some(value) = object.get(name) else {
            continue;
        };

        if !spec.schema_type.admits(value) {
            violations.push(Violation::TypeMismatch {
                field: name.clone(),
                expected: spec.schema_type,
                actual: SchemaType::of(value),
            });
        }

        if let Some(allowed) = &spec.enum_values {
            if !allowed.contains(value) {
                violations.push(Violation::EnumViolation {
                    field: name.clone(),
                    allowed: allowed.clone(),
                    actual: value.clone(),
                });
            }
        }
    }

    if violations.is_empty() {
        ValidationResult::Valid(body.clone())
    } else {
        ValidationResult::Invalid(violations)
    }
}

/// Validate supplied parameters against their declared specs.
///
/// Absent parameters are always valid; present parameters are checked for
/// type only. Raw parameter values are strings, so string-typed parameters
/// always pass and numeric or boolean types are checked by parse.
pub fn validate_parameters(
    specs: &[ParameterSpec],
    supplied: &RequestParameters,
) -> Vec<Violation> {
    let mut violations = Vec::new();

    for spec in specs {
        let Some(raw) = supplied.get(spec.location, &spec.name) else {
            continue;
        };

        if !parameter_admits(spec.schema_type, raw) {
            violations.push(Violation::TypeMismatch {
                field: spec.name.clone(),
                expected: spec.schema_type,
                actual: SchemaType::String,
            });
        }
    }

    violations
}

fn parameter_admits(schema_type: SchemaType, raw: &str) -> bool {
    match schema_type {
        SchemaType::Integer => raw.parse::<i64>().is_ok(),
        SchemaType::Number => raw.parse::<f64>().is_ok(),
        SchemaType::Boolean => matches!(raw, "true" | "false"),
        _ => true,
    }
}

/// Validate a full inbound request: body against the named schema plus any
/// declared parameters.
///
/// `SchemaNotFound` surfaces as an `Err`, distinct from validation failure:
/// a missing schema is a configuration fault, not a client fault.
pub fn validate_request(
    registry: &SchemaRegistry,
    schema_id: &str,
    body: &Value,
    specs: &[ParameterSpec],
    supplied: &RequestParameters,
) -> Result<ValidationResult> {
    let schema = registry.lookup(schema_id)?;

    let mut violations = match validate_body(schema, body) {
        ValidationResult::Valid(_) => Vec::new(),
        ValidationResult::Invalid(violations) => violations,
    };
    violations.extend(validate_parameters(specs, supplied));

    if violations.is_empty() {
        Ok(ValidationResult::Valid(body.clone()))
    } else {
        Ok(ValidationResult::Invalid(violations))
    }
}
