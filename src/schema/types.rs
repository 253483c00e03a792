//! Collection definition types
//!
//! Supported field types:
//! - string: UTF-8 text
//! - float (alias: number): any JSON number
//! - bool (alias: boolean): JSON boolean

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// One collection item: a flat map of field name to primitive value.
///
/// Items carry no type of their own; validity is only defined relative
/// to a [`CollectionDefinition`].
pub type Item = Map<String, Value>;

/// Declared type of a collection field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FieldType {
    /// UTF-8 string
    #[serde(rename = "string")]
    String,
    /// Any JSON number
    #[serde(rename = "float")]
    Number,
    /// Boolean
    #[serde(rename = "bool")]
    Bool,
}

impl FieldType {
    /// Resolves a manifest type tag, `None` if the tag is unsupported
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "string" => Some(FieldType::String),
            "float" | "number" => Some(FieldType::Number),
            "bool" | "boolean" => Some(FieldType::Bool),
            _ => None,
        }
    }

    /// Returns the canonical tag
    pub fn tag(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "float",
            FieldType::Bool => "bool",
        }
    }

    /// Whether a value of this kind satisfies the field type
    pub fn accepts(&self, value: &Value) -> bool {
        matches!(
            (self, ValueKind::of(value)),
            (FieldType::String, Some(ValueKind::String))
                | (FieldType::Number, Some(ValueKind::Number))
                | (FieldType::Bool, Some(ValueKind::Bool))
        )
    }
}

/// Runtime kind of a primitive item value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    String,
    Number,
    Bool,
}

impl ValueKind {
    /// Classifies a JSON value; null, arrays and objects are not primitive
    pub fn of(value: &Value) -> Option<Self> {
        match value {
            Value::String(_) => Some(ValueKind::String),
            Value::Number(_) => Some(ValueKind::Number),
            Value::Bool(_) => Some(ValueKind::Bool),
            _ => None,
        }
    }
}

/// Schema of one collection, immutable once the manifest is loaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionDefinition {
    /// Collection name, also its URL path segment
    pub name: String,
    /// Declared fields
    pub fields: HashMap<String, FieldType>,
}

impl CollectionDefinition {
    /// Create a new definition
    pub fn new(name: impl Into<String>, fields: HashMap<String, FieldType>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    /// Declared type of a field, if any
    pub fn field_type(&self, field: &str) -> Option<FieldType> {
        self.fields.get(field).copied()
    }
}

/// Manifest entry as written on disk, before type tags are resolved
#[derive(Debug, Deserialize)]
pub(crate) struct RawCollection {
    pub name: String,
    #[serde(default)]
    pub fields: HashMap<String, String>,
}
