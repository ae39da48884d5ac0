//! Payload models attached to endpoints and the naming rules for their
//! definitions.

use serde_json::Value;
use xxhash_rust::xxh64::xxh64;

use crate::reflect::{qualified_name, FieldDescriptor, Kind, Reflect, TypeDescriptor};

/// Body or response payload of an endpoint.
///
/// Most payloads are typed and described through [`Reflect`]. Ad hoc JSON
/// values (the `map[string]any` style of response) are carried as
/// [`Model::Dynamic`] and described by walking their content.
#[derive(Debug, Clone)]
pub enum Model {
    Typed(TypeDescriptor),
    Dynamic(Value),
}

impl Model {
    pub fn of<T: Reflect>() -> Self {
        Model::Typed(T::type_descriptor())
    }

    pub fn json(value: Value) -> Self {
        Model::Dynamic(value)
    }

    pub fn descriptor(&self) -> Option<&TypeDescriptor> {
        match self {
            Model::Typed(descriptor) => Some(descriptor),
            Model::Dynamic(_) => None,
        }
    }

    /// Name of the top-level definition this payload produces, if any.
    ///
    /// Slices name their element, response wrappers name their inner model.
    pub fn defining_name(&self) -> Option<String> {
        match self {
            Model::Typed(descriptor) => type_defining_name(descriptor.clone()),
            Model::Dynamic(value) => json_defining_name(value),
        }
    }
}

fn type_defining_name(descriptor: TypeDescriptor) -> Option<String> {
    let descriptor = descriptor.deref();
    match &descriptor.kind {
        Kind::Slice(elem) | Kind::Array(elem, _) => type_defining_name(elem()),
        Kind::Struct(_) => match descriptor.wrapped_model() {
            Some(inner) => type_defining_name(inner),
            None if descriptor.is_plain_struct() => Some(definition_name(&descriptor)),
            None => None,
        },
        Kind::Map { .. } => Some(definition_name(&descriptor)),
        _ => None,
    }
}

fn json_defining_name(value: &Value) -> Option<String> {
    match value {
        Value::Object(_) => Some(json_map_name(value)),
        Value::Array(items) => items.first().and_then(json_defining_name),
        _ => None,
    }
}

/// Wraps a payload together with a description of the outcome
#[derive(Debug, Clone, Default)]
pub struct CustomResponse<T> {
    pub model: T,
    pub description: String,
}

impl<T> CustomResponse<T> {
    pub fn new(model: T, description: impl Into<String>) -> Self {
        Self {
            model,
            description: description.into(),
        }
    }
}

impl<T: Reflect> Reflect for CustomResponse<T> {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::wrapper(
            qualified_name::<Self>(),
            vec![
                FieldDescriptor::of::<T>("Model").tag(r#"json:"model""#),
                FieldDescriptor::of::<String>("Description").tag(r#"json:"description""#),
            ],
        )
    }
}

/// Deterministic hash used to tell apart anonymous definitions
pub fn content_hash(content: &str) -> u64 {
    xxh64(content.as_bytes(), 0)
}

/// Definition key for a type: its defining name, or a hashed name for
/// anonymous maps and structs
pub fn definition_name(descriptor: &TypeDescriptor) -> String {
    if let Some(name) = &descriptor.name {
        return name.clone();
    }
    let signature = descriptor.display_name();
    match descriptor.kind {
        Kind::Map { .. } => format!("map.{:016x}", content_hash(&signature)),
        Kind::Struct(_) => format!("struct.{:016x}", content_hash(&signature)),
        _ => signature,
    }
}

/// Definition key for a JSON object literal, hashed over its content
pub fn json_map_name(value: &Value) -> String {
    format!("map.{:016x}", content_hash(&value.to_string()))
}

/// `<Owner>.<field>` name for a map-typed field, suffixed with a hash when
/// the map's value type is anonymous
pub fn map_property_name(owner: &str, field: &str, value: &TypeDescriptor) -> String {
    let base = format!("{}.{}", owner, field);
    if value.name.is_some() {
        return base;
    }
    format!("{}.{:016x}", base, content_hash(&value.display_name()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    struct Product;

    impl Reflect for Product {
        fn type_descriptor() -> TypeDescriptor {
            TypeDescriptor::structure(
                "models.Product",
                vec![FieldDescriptor::of::<u64>("ID").tag(r#"json:"id""#)],
            )
        }
    }

    #[test]
    fn test_defining_name_strips_containers() {
        assert_eq!(Model::of::<Product>().defining_name().as_deref(), Some("models.Product"));
        assert_eq!(Model::of::<Vec<Product>>().defining_name().as_deref(), Some("models.Product"));
        assert_eq!(
            Model::of::<Option<Vec<Box<Product>>>>().defining_name().as_deref(),
            Some("models.Product")
        );
        assert_eq!(
            Model::of::<CustomResponse<Product>>().defining_name().as_deref(),
            Some("models.Product")
        );
        assert_eq!(Model::of::<String>().defining_name(), None);
        assert_eq!(Model::of::<Vec<u32>>().defining_name(), None);
    }

    #[test]
    fn test_json_map_names_follow_content() {
        let a = json!({"code": 200, "data": {"id": 1}});
        let same = json!({"data": {"id": 1}, "code": 200});
        let other = json!({"code": 404, "data": {"id": 1}});

        assert_eq!(json_map_name(&a), json_map_name(&same));
        assert_ne!(json_map_name(&a), json_map_name(&other));
        assert!(json_map_name(&a).starts_with("map."));
        assert_eq!(Model::json(a.clone()).defining_name(), Some(json_map_name(&a)));
        assert_eq!(Model::json(json!([a.clone()])).defining_name(), Some(json_map_name(&a)));
        assert_eq!(Model::json(json!("text")).defining_name(), None);
    }

    #[test]
    fn test_typed_map_names() {
        let counts = <HashMap<String, u32>>::type_descriptor();
        let prices = <HashMap<String, f64>>::type_descriptor();
        assert_ne!(definition_name(&counts), definition_name(&prices));
        assert_eq!(definition_name(&counts), definition_name(&counts.clone()));

        let named = counts.clone().named("models.Inventory");
        assert_eq!(definition_name(&named), "models.Inventory");
    }

    #[test]
    fn test_map_property_name() {
        let scalar = u32::type_descriptor();
        assert_eq!(map_property_name("models.Store", "stock", &scalar), "models.Store.stock");

        let nested = <Vec<u32>>::type_descriptor();
        let name = map_property_name("models.Store", "batches", &nested);
        assert!(name.starts_with("models.Store.batches."));
        assert_eq!(name.len(), "models.Store.batches.".len() + 16);
    }
}
