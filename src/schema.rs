#![allow(non_snake_case)]

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Placeholder type for fields whose concrete shape cannot be known statically
pub const AMBIGUOUS_TYPE: &str = "Ambiguous Type: interface{}";

/// Target document flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// Swagger 2.0
    Swagger2,
    /// OpenAPI 3.0.3
    OpenApi3,
}

impl Dialect {
    pub fn ref_prefix(&self) -> &'static str {
        match self {
            Dialect::Swagger2 => "#/definitions/",
            Dialect::OpenApi3 => "#/components/schemas/",
        }
    }

    pub fn reference(&self, name: &str) -> String {
        format!("{}{}", self.ref_prefix(), name)
    }

    /// Definitions carry a `required` list
    pub fn tracks_required(&self) -> bool {
        matches!(self, Dialect::OpenApi3)
    }

    /// Fields without `omitempty` default to required
    pub fn required_by_default(&self) -> bool {
        matches!(self, Dialect::OpenApi3)
    }

    pub fn supports_nullable(&self) -> bool {
        matches!(self, Dialect::OpenApi3)
    }

    /// Revisiting an already defined type recomputes and overwrites it
    pub fn overwrites_definitions(&self) -> bool {
        matches!(self, Dialect::OpenApi3)
    }
}

/// Schema object shared by Swagger 2.0 definitions and OpenAPI 3.0 components.
///
/// A property sets either `type_` or `ref_`; a definition is an object
/// schema with `properties` and, in OpenAPI 3.0, a `required` list.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Schema {
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub ref_: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,
    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty", default)]
    pub enum_values: Vec<Value>,

    // Number validation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusiveMinimum: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusiveMaximum: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multipleOf: Option<f64>,

    // String validation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minLength: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maxLength: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    // Array validation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minItems: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maxItems: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uniqueItems: Option<bool>,

    // Object validation
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub properties: BTreeMap<String, Schema>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub required: Vec<String>,
}

impl Schema {
    pub fn typed(type_: &str) -> Self {
        Self {
            type_: Some(type_.to_string()),
            ..Default::default()
        }
    }

    pub fn reference(dialect: Dialect, name: &str) -> Self {
        Self {
            ref_: Some(dialect.reference(name)),
            ..Default::default()
        }
    }

    pub fn array_of(items: Schema) -> Self {
        Self {
            type_: Some("array".to_string()),
            items: Some(Box::new(items)),
            ..Default::default()
        }
    }

    pub fn object(properties: BTreeMap<String, Schema>, required: Vec<String>) -> Self {
        Self {
            type_: Some("object".to_string()),
            properties,
            required,
            ..Default::default()
        }
    }

    pub fn date_time() -> Self {
        Self {
            format: Some("date-time".to_string()),
            ..Self::typed("string")
        }
    }

    pub fn date() -> Self {
        Self {
            format: Some("date".to_string()),
            ..Self::typed("string")
        }
    }

    /// Uploaded file: a `file` type in Swagger 2.0, binary string in OpenAPI 3.0
    pub fn file(dialect: Dialect) -> Self {
        match dialect {
            Dialect::Swagger2 => Self::typed("file"),
            Dialect::OpenApi3 => Self {
                format: Some("binary".to_string()),
                ..Self::typed("string")
            },
        }
    }

    pub fn is_reference(&self) -> bool {
        self.ref_.is_some()
    }

    /// Name a `$ref` points to, stripped of its dialect prefix
    pub fn referenced_name(&self) -> Option<&str> {
        let reference = self.ref_.as_deref()?;
        reference
            .strip_prefix(Dialect::Swagger2.ref_prefix())
            .or_else(|| reference.strip_prefix(Dialect::OpenApi3.ref_prefix()))
    }

    pub fn with_example(mut self, example: Option<Value>) -> Self {
        self.example = example;
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_reference_prefix_per_dialect() {
        assert_eq!(
            Schema::reference(Dialect::Swagger2, "models.Product").ref_,
            Some("#/definitions/models.Product".to_string())
        );
        assert_eq!(
            Schema::reference(Dialect::OpenApi3, "models.Product").ref_,
            Some("#/components/schemas/models.Product".to_string())
        );
    }

    #[test]
    fn test_empty_fields_are_not_serialized() {
        let schema = Schema::array_of(Schema::typed("string"));
        assert_eq!(
            serde_json::to_value(&schema).unwrap(),
            json!({"type": "array", "items": {"type": "string"}})
        );
    }

    #[test]
    fn test_referenced_name() {
        let schema = Schema::reference(Dialect::OpenApi3, "models.Order");
        assert_eq!(schema.referenced_name(), Some("models.Order"));
        assert_eq!(Schema::typed("integer").referenced_name(), None);
    }
}
