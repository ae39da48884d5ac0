//! Field classification: turns one field descriptor plus its tags into the
//! normalized values schema generation works with.

use serde_json::{Number, Value};

use crate::{
    reflect::{FieldDescriptor, Kind},
    schema::Dialect,
};

/// Schema-level kind of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticKind {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
    Interface,
    File,
    // Dispatched one level up by the property builder
    Struct,
    Pointer,
    Map,
    Func,
    Chan,
}

impl SemanticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SemanticKind::String => "string",
            SemanticKind::Integer => "integer",
            SemanticKind::Number => "number",
            SemanticKind::Boolean => "boolean",
            SemanticKind::Array => "array",
            SemanticKind::Object => "object",
            SemanticKind::Interface => "interface",
            SemanticKind::File => "file",
            SemanticKind::Struct => "struct",
            SemanticKind::Pointer => "ptr",
            SemanticKind::Map => "map",
            SemanticKind::Func => "func",
            SemanticKind::Chan => "chan",
        }
    }

    /// Kinds that render as a plain `{type: ...}` schema
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            SemanticKind::String
                | SemanticKind::Integer
                | SemanticKind::Number
                | SemanticKind::Boolean
                | SemanticKind::File
        )
    }

    /// Never rendered into a schema
    pub fn is_omitted(&self) -> bool {
        matches!(self, SemanticKind::Func | SemanticKind::Chan)
    }
}

pub fn semantic_kind(kind: &Kind) -> SemanticKind {
    match kind {
        Kind::Primitive(p) if p.is_integer() => SemanticKind::Integer,
        Kind::Primitive(crate::reflect::Primitive::Bool) => SemanticKind::Boolean,
        Kind::Primitive(crate::reflect::Primitive::F32 | crate::reflect::Primitive::F64) => {
            SemanticKind::Number
        }
        Kind::Primitive(_) => SemanticKind::String,
        Kind::Slice(_) | Kind::Array(_, _) => SemanticKind::Array,
        Kind::Struct(_) => SemanticKind::Struct,
        Kind::Pointer(_) => SemanticKind::Pointer,
        Kind::Map { .. } => SemanticKind::Map,
        Kind::Interface => SemanticKind::Interface,
        Kind::File => SemanticKind::File,
        Kind::Func => SemanticKind::Func,
        Kind::Chan => SemanticKind::Chan,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedField {
    /// Property name; empty when the field is excluded
    pub name: String,
    pub kind: SemanticKind,
    pub example: Option<Value>,
    pub required: bool,
    pub description: Option<String>,
}

impl ClassifiedField {
    pub fn is_skipped(&self) -> bool {
        self.name.is_empty()
    }
}

pub fn classify_field(field: &FieldDescriptor, dialect: Dialect) -> ClassifiedField {
    let tags = &field.tags;
    let required =
        tags.is_required() || (dialect.required_by_default() && !tags.omitempty());

    ClassifiedField {
        name: json_name(field),
        kind: semantic_kind(&field.descriptor().kind),
        example: parse_example(tags.get("example")),
        required,
        description: tags.description().map(str::to_string),
    }
}

/// Property name of a field, or an empty string when tagged `json:"-"`
pub fn json_name(field: &FieldDescriptor) -> String {
    if field.tags.is_skipped() {
        return String::new();
    }
    field
        .tags
        .json_name()
        .map(str::to_string)
        .unwrap_or_else(|| field.name.clone())
}

/// Unsigned or floating point numerals become numbers, anything else stays text
pub fn parse_example(raw: Option<&str>) -> Option<Value> {
    let raw = raw.filter(|r| !r.is_empty())?;

    if let Ok(unsigned) = raw.parse::<u64>() {
        return Some(Value::from(unsigned));
    }
    if let Some(number) = raw.parse::<f64>().ok().and_then(Number::from_f64) {
        return Some(Value::Number(number));
    }
    Some(Value::String(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::{FieldDescriptor, TypeDescriptor};
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn test_semantic_kinds() {
        let kind = |d: TypeDescriptor| semantic_kind(&d.kind);
        assert_eq!(kind(TypeDescriptor::primitive(crate::reflect::Primitive::U64)), SemanticKind::Integer);
        assert_eq!(kind(TypeDescriptor::primitive(crate::reflect::Primitive::F32)), SemanticKind::Number);
        assert_eq!(kind(TypeDescriptor::primitive(crate::reflect::Primitive::Bool)), SemanticKind::Boolean);
        assert_eq!(kind(TypeDescriptor::slice::<String>()), SemanticKind::Array);
        assert_eq!(kind(TypeDescriptor::map::<String, u8>()), SemanticKind::Map);
        assert_eq!(kind(TypeDescriptor::pointer::<u8>()), SemanticKind::Pointer);
        assert_eq!(SemanticKind::Pointer.as_str(), "ptr");
    }

    #[test]
    fn test_json_name_rules() {
        let plain = FieldDescriptor::of::<String>("Name");
        assert_eq!(json_name(&plain), "Name");

        let renamed = FieldDescriptor::of::<String>("Name").tag(r#"json:"name,omitempty""#);
        assert_eq!(json_name(&renamed), "name");

        let skipped = FieldDescriptor::of::<String>("Secret").tag(r#"json:"-""#);
        assert_eq!(json_name(&skipped), "");
    }

    #[test]
    fn test_parse_example() {
        assert_eq!(parse_example(Some("42")), Some(json!(42)));
        assert_eq!(parse_example(Some("1.5")), Some(json!(1.5)));
        assert_eq!(parse_example(Some("-3")), Some(json!(-3.0)));
        assert_eq!(parse_example(Some("Jane")), Some(json!("Jane")));
        assert_eq!(parse_example(Some("")), None);
        assert_eq!(parse_example(None), None);
    }

    #[test]
    fn test_required_per_dialect() {
        let bare = FieldDescriptor::of::<String>("Name").tag(r#"json:"name""#);
        let optional = FieldDescriptor::of::<String>("Nick").tag(r#"json:"nick,omitempty""#);
        let forced = FieldDescriptor::of::<String>("Code").tag(r#"json:"code,omitempty" required:"true""#);

        assert!(!classify_field(&bare, Dialect::Swagger2).required);
        assert!(classify_field(&bare, Dialect::OpenApi3).required);
        assert!(!classify_field(&optional, Dialect::OpenApi3).required);
        assert!(classify_field(&forced, Dialect::Swagger2).required);
        assert!(classify_field(&forced, Dialect::OpenApi3).required);
    }

    #[test]
    fn test_classify_collects_description_and_kind() {
        let field = FieldDescriptor::of::<HashMap<String, i32>>("Stock")
            .tag(r#"json:"stock" desc:"Units per warehouse""#);
        let classified = classify_field(&field, Dialect::Swagger2);
        assert_eq!(classified.name, "stock");
        assert_eq!(classified.kind, SemanticKind::Map);
        assert_eq!(classified.description.as_deref(), Some("Units per warehouse"));
        assert_eq!(classified.example, None);
    }
}
