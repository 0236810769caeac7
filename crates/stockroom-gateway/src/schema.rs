//! Named schema definitions and the registry that serves them.
//!
//! Schemas follow a JSON-Schema-draft-style shape: a root type, declared
//! properties (type plus optional enum constraint), and a required set. They
//! describe a minimum contract: undeclared properties are permitted and
//! ignored by validation.
//!
//! The registry is populated once at startup and treated as immutable
//! afterwards; handlers share it behind an `Arc` with no locking.

use std::collections::{BTreeMap, HashMap};

use serde_json::Value;

use crate::error::{Error, Result};

/// Declared JSON type of a schema or property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaType {
    Object,
    Array,
    String,
    Number,
    Integer,
    Boolean,
    Null,
}

impl SchemaType {
    /// Classify a JSON value into its schema type.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Object(_) => SchemaType::Object,
            Value::Array(_) => SchemaType::Array,
            Value::String(_) => SchemaType::String,
            Value::Number(n) if n.is_i64() || n.is_u64() => SchemaType::Integer,
            Value::Number(_) => SchemaType::Number,
            Value::Bool(_) => SchemaType::Boolean,
            Value::Null => SchemaType::Null,
        }
    }

    /// Whether a JSON value satisfies this declared type.
    ///
    /// `Number` admits integers; `Integer` rejects fractional numbers.
    pub fn admits(&self, value: &Value) -> bool {
        match self {
            SchemaType::Number => value.is_number(),
            other => SchemaType::of(value) == *other,
        }
    }
}

impl std::fmt::Display for SchemaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SchemaType::Object => "object",
            SchemaType::Array => "array",
            SchemaType::String => "string",
            SchemaType::Number => "number",
            SchemaType::Integer => "integer",
            SchemaType::Boolean => "boolean",
            SchemaType::Null => "null",
        };
        write!(f, "{}", name)
    }
}

/// Declared constraints for a single schema property.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertySpec {
    /// Declared JSON type the property value must satisfy.
    pub schema_type: SchemaType,

    /// Optional closed set of permitted literal values. Membership is exact;
    /// no case normalization is applied.
    pub enum_values: Option<Vec<Value>>,
}

impl PropertySpec {
    /// Create a property constrained to the given type.
    pub fn typed(schema_type: SchemaType) -> Self {
        Self {
            schema_type,
            enum_values: None,
        }
    }

    /// Constrain the property to an enumerated set of literal values.
    pub fn with_enum(mut self, values: impl IntoIterator<Item = Value>) -> Self {
        self.enum_values = Some(values.into_iter().collect());
        self
    }
}

/// An immutable structural contract for a request or response body.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    /// Human-readable title for logs.
    pub title: String,

    /// Root type of the body (object for every model in this system).
    pub schema_type: SchemaType,

    /// Declared properties, keyed by field name. Deterministic iteration
    /// order keeps violation lists stable.
    pub properties: BTreeMap<String, PropertySpec>,

    /// Field names that must be present for a body to be valid.
    pub required: Vec<String>,
}

impl Schema {
    /// Create an object-rooted schema with no declared properties.
    pub fn object(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            schema_type: SchemaType::Object,
            properties: BTreeMap::new(),
            required: Vec::new(),
        }
    }

    /// Declare a property and its constraints.
    pub fn with_property(mut self, name: impl Into<String>, spec: PropertySpec) -> Self {
        self.properties.insert(name.into(), spec);
        self
    }

    /// Mark a declared property as required.
    pub fn with_required(mut self, name: impl Into<String>) -> Self {
        self.required.push(name.into());
        self
    }
}

/// Registry of named schema definitions.
///
/// Populated at configuration time and immutable thereafter. Re-registering
/// an id overwrites the previous definition (last write wins, no merge).
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, Schema>,
}

impl SchemaRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a schema under a unique identifier.
    pub fn register(&mut self, id: impl Into<String>, schema: Schema) {
        self.schemas.insert(id.into(), schema);
    }

    /// Resolve a schema by id.
    pub fn lookup(&self, id: &str) -> Result<&Schema> {
        self.schemas.get(id).ok_or_else(|| Error::SchemaNotFound {
            id: id.to_string(),
        })
    }

    /// Whether a schema is registered under the given id.
    pub fn contains(&self, id: &str) -> bool {
        self.schemas.contains_key(id)
    }

    /// Number of registered schemas.
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Whether the registry holds no schemas.
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}
