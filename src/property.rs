//! Schema property building for single struct fields.

use log::{debug, warn};
use serde_json::Value;

use crate::{
    classify::{parse_example, semantic_kind, ClassifiedField},
    config::RecursivePointer,
    definition::DefinitionGenerator,
    model::{definition_name, map_property_name},
    reflect::{FieldDescriptor, Kind, TypeDescriptor, WellKnown},
    schema::{Schema, AMBIGUOUS_TYPE},
    tags::FieldTags,
};

impl<'a> DefinitionGenerator<'a> {
    /// Property schema for one classified field of `owner`; `None` when the
    /// field's type has no schema form
    pub(crate) fn build_property(
        &mut self,
        owner: &str,
        field: &FieldDescriptor,
        classified: &ClassifiedField,
    ) -> Option<Schema> {
        let mut schema = self.type_schema(
            owner,
            &classified.name,
            field.descriptor(),
            classified.example.clone(),
        )?;

        if !schema.is_reference() {
            if classified.description.is_some() {
                schema.description = classified.description.clone();
            }
            apply_constraint_tags(&mut schema, &field.tags, owner, &classified.name);
        }
        Some(schema)
    }

    /// Schema for a value of `descriptor` held by field `field` of `owner`
    pub(crate) fn type_schema(
        &mut self,
        owner: &str,
        field: &str,
        descriptor: TypeDescriptor,
        example: Option<Value>,
    ) -> Option<Schema> {
        match &descriptor.kind {
            Kind::Func | Kind::Chan => None,
            Kind::Primitive(_) => Some(
                Schema::typed(semantic_kind(&descriptor.kind).as_str()).with_example(example),
            ),
            Kind::File => Some(Schema::file(self.dialect)),
            Kind::Interface => Some(Schema::typed(AMBIGUOUS_TYPE).with_example(example)),
            Kind::Slice(elem) => {
                let items = self.type_schema(owner, field, elem().deref(), None)?;
                Some(Schema::array_of(items))
            }
            Kind::Array(elem, len) => {
                let items = self.type_schema(owner, field, elem().deref(), None)?;
                Some(Schema {
                    minItems: Some(*len as u64),
                    maxItems: Some(*len as u64),
                    ..Schema::array_of(items)
                })
            }
            Kind::Struct(_) => Some(self.struct_schema(owner, &descriptor)),
            Kind::Pointer(_) => self.pointer_schema(owner, field, descriptor.clone(), example),
            Kind::Map { key, value } => {
                let value = value();
                let name = map_property_name(owner, field, &value);
                self.define_map(&name, &key(), value);
                Some(Schema::reference(self.dialect, &name))
            }
        }
    }

    fn struct_schema(&mut self, owner: &str, descriptor: &TypeDescriptor) -> Schema {
        match descriptor.well_known_kind() {
            Some(WellKnown::Timestamp) => Schema::date_time(),
            Some(WellKnown::Date) => Schema::date(),
            Some(WellKnown::Duration) => Schema::typed("integer"),
            Some(WellKnown::ResponseWrapper) | None => {
                let name = definition_name(descriptor);
                if name == owner {
                    debug!("{} refers to itself, not recursing", name);
                } else {
                    self.define_struct(descriptor);
                }
                Schema::reference(self.dialect, &name)
            }
        }
    }

    fn pointer_schema(
        &mut self,
        owner: &str,
        field: &str,
        descriptor: TypeDescriptor,
        example: Option<Value>,
    ) -> Option<Schema> {
        let pointee = descriptor.deref();

        if pointee.is_plain_struct() && definition_name(&pointee) == owner {
            let schema = match self.recursive_pointer {
                RecursivePointer::Placeholder => Schema {
                    example: Some(Value::String(format!("Recursive Type: {}", owner))),
                    ..Default::default()
                },
                RecursivePointer::Reference => self.nullable(Schema::reference(self.dialect, owner)),
            };
            return Some(schema);
        }

        let schema = self.type_schema(owner, field, pointee, example)?;
        Some(self.nullable(schema))
    }

    fn nullable(&self, mut schema: Schema) -> Schema {
        if self.dialect.supports_nullable() {
            schema.nullable = Some(true);
        }
        schema
    }
}

/// Copy validation tags (`enum`, `format`, `min`, `max`, `minLength`,
/// `maxLength`, `pattern`, `default`) onto a property
fn apply_constraint_tags(schema: &mut Schema, tags: &FieldTags, owner: &str, field: &str) {
    let numeric = matches!(schema.type_.as_deref(), Some("integer") | Some("number"));
    let typed_value = |raw: &str| -> Option<Value> {
        if numeric {
            parse_example(Some(raw))
        } else {
            Some(Value::String(raw.to_string()))
        }
    };

    if let Some(values) = tags.get("enum") {
        schema.enum_values = values
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .filter_map(typed_value)
            .collect();
    }
    if let Some(format) = tags.get("format").filter(|f| !f.is_empty()) {
        schema.format = Some(format.to_string());
    }
    if let Some(pattern) = tags.get("pattern").filter(|p| !p.is_empty()) {
        schema.pattern = Some(pattern.to_string());
    }
    if let Some(default) = tags.get("default") {
        schema.default = typed_value(default);
    }

    let number = |key: &str| -> Option<f64> {
        let raw = tags.get(key)?;
        match raw.parse::<f64>() {
            Ok(n) => Some(n),
            Err(_) => {
                warn!("Ignoring {}:{:?} on {}.{}, not a number", key, raw, owner, field);
                None
            }
        }
    };
    let length = |key: &str| -> Option<u64> {
        let raw = tags.get(key)?;
        match raw.parse::<u64>() {
            Ok(n) => Some(n),
            Err(_) => {
                warn!("Ignoring {}:{:?} on {}.{}, not a length", key, raw, owner, field);
                None
            }
        }
    };

    if let Some(min) = number("min") {
        schema.minimum = Some(min);
    }
    if let Some(max) = number("max") {
        schema.maximum = Some(max);
    }
    if let Some(min) = length("minLength") {
        schema.minLength = Some(min);
    }
    if let Some(max) = length("maxLength") {
        schema.maxLength = Some(max);
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        config::RecursivePointer,
        definition::{DefinitionGenerator, DefinitionTable},
        model::map_property_name,
        reflect::{FieldDescriptor, Reflect, TypeDescriptor},
        schema::{Dialect, Schema, AMBIGUOUS_TYPE},
    };
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::collections::HashMap;
    use std::time::{Duration, SystemTime};

    struct Category;

    impl Reflect for Category {
        fn type_descriptor() -> TypeDescriptor {
            TypeDescriptor::structure(
                "models.Category",
                vec![FieldDescriptor::of::<String>("Name").tag(r#"json:"name""#)],
            )
        }
    }

    struct Pet;

    impl Reflect for Pet {
        fn type_descriptor() -> TypeDescriptor {
            TypeDescriptor::structure(
                "models.Pet",
                vec![
                    FieldDescriptor::of::<String>("Name")
                        .tag(r#"json:"name" example:"Rex" desc:"Pet name" minLength:"1" maxLength:"40""#),
                    FieldDescriptor::of::<String>("Status")
                        .tag(r#"json:"status" enum:"available,sold" default:"available""#),
                    FieldDescriptor::of::<i32>("Age").tag(r#"json:"age" min:"0" max:"40" enum:"1,2""#),
                    FieldDescriptor::of::<Vec<String>>("Tags").tag(r#"json:"tags""#),
                    FieldDescriptor::of::<Vec<Category>>("Categories").tag(r#"json:"categories""#),
                    FieldDescriptor::of::<Category>("Main").tag(r#"json:"main""#),
                    FieldDescriptor::of::<SystemTime>("Born").tag(r#"json:"born""#),
                    FieldDescriptor::of::<Duration>("Nap").tag(r#"json:"nap""#),
                    FieldDescriptor::of::<serde_json::Value>("Extra").tag(r#"json:"extra" example:"x""#),
                    FieldDescriptor::of::<Option<u8>>("Weight").tag(r#"json:"weight,omitempty""#),
                    FieldDescriptor::of::<HashMap<String, u32>>("Stock").tag(r#"json:"stock""#),
                    FieldDescriptor::of::<[f32; 2]>("Position").tag(r#"json:"position""#),
                    FieldDescriptor::of::<std::sync::mpsc::Sender<u8>>("Events"),
                ],
            )
        }
    }

    struct Node;

    impl Reflect for Node {
        fn type_descriptor() -> TypeDescriptor {
            TypeDescriptor::structure(
                "models.Node",
                vec![
                    FieldDescriptor::of::<Vec<Node>>("Children").tag(r#"json:"children""#),
                    FieldDescriptor::of::<Option<Box<Node>>>("Parent").tag(r#"json:"parent""#),
                ],
            )
        }
    }

    fn pet_properties(dialect: Dialect) -> (DefinitionTable, Schema) {
        let mut table = DefinitionTable::new();
        DefinitionGenerator::new(dialect, &mut table).create_type_definition(Pet::type_descriptor());
        let pet = table.get("models.Pet").cloned().unwrap();
        (table, pet)
    }

    #[test]
    fn test_primitive_properties_carry_tags() {
        let (_, pet) = pet_properties(Dialect::Swagger2);

        let name = &pet.properties["name"];
        assert_eq!(name.type_.as_deref(), Some("string"));
        assert_eq!(name.example, Some(json!("Rex")));
        assert_eq!(name.description.as_deref(), Some("Pet name"));
        assert_eq!((name.minLength, name.maxLength), (Some(1), Some(40)));

        let status = &pet.properties["status"];
        assert_eq!(status.enum_values, vec![json!("available"), json!("sold")]);
        assert_eq!(status.default, Some(json!("available")));

        let age = &pet.properties["age"];
        assert_eq!(age.type_.as_deref(), Some("integer"));
        assert_eq!((age.minimum, age.maximum), (Some(0.0), Some(40.0)));
        assert_eq!(age.enum_values, vec![json!(1), json!(2)]);
    }

    #[test]
    fn test_container_and_struct_properties() {
        let (table, pet) = pet_properties(Dialect::Swagger2);

        assert_eq!(pet.properties["tags"], Schema::array_of(Schema::typed("string")));
        assert_eq!(
            pet.properties["categories"],
            Schema::array_of(Schema::reference(Dialect::Swagger2, "models.Category"))
        );
        assert_eq!(pet.properties["main"], Schema::reference(Dialect::Swagger2, "models.Category"));
        assert!(table.contains("models.Category"));

        assert_eq!(pet.properties["born"], Schema::date_time());
        assert_eq!(pet.properties["nap"], Schema::typed("integer"));
        assert_eq!(
            pet.properties["extra"],
            Schema::typed(AMBIGUOUS_TYPE).with_example(Some(json!("x")))
        );
        assert_eq!(pet.properties["position"].minItems, Some(2));
        assert!(!pet.properties.contains_key("Events"));
    }

    #[test]
    fn test_pointer_is_nullable_only_in_openapi3() {
        let (_, v2) = pet_properties(Dialect::Swagger2);
        assert_eq!(v2.properties["weight"], Schema::typed("integer"));

        let (_, v3) = pet_properties(Dialect::OpenApi3);
        assert_eq!(v3.properties["weight"].nullable, Some(true));
        assert!(!v3.required.contains(&"weight".to_string()));
    }

    #[test]
    fn test_map_property_registers_synthetic_definition() {
        let (table, pet) = pet_properties(Dialect::Swagger2);
        let name = map_property_name("models.Pet", "stock", &u32::type_descriptor());
        assert_eq!(name, "models.Pet.stock");
        assert_eq!(pet.properties["stock"], Schema::reference(Dialect::Swagger2, &name));

        let stock = table.get(&name).unwrap();
        assert_eq!(stock.type_.as_deref(), Some("object"));
        assert_eq!(stock.properties["string"], Schema::typed("integer"));
    }

    #[test]
    fn test_self_reference_placeholder() {
        let mut table = DefinitionTable::new();
        DefinitionGenerator::new(Dialect::Swagger2, &mut table)
            .create_type_definition(Node::type_descriptor());

        let node = table.get("models.Node").unwrap();
        assert_eq!(
            serde_json::to_value(&node.properties["children"]).unwrap(),
            json!({"type": "array", "items": {"$ref": "#/definitions/models.Node"}})
        );
        assert_eq!(
            serde_json::to_value(&node.properties["parent"]).unwrap(),
            json!({"example": "Recursive Type: models.Node"})
        );
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_self_reference_as_ref() {
        let mut table = DefinitionTable::new();
        DefinitionGenerator::new(Dialect::OpenApi3, &mut table)
            .with_recursive_pointer(RecursivePointer::Reference)
            .create_type_definition(Node::type_descriptor());

        assert_eq!(
            serde_json::to_value(&table.get("models.Node").unwrap().properties["parent"]).unwrap(),
            json!({"$ref": "#/components/schemas/models.Node", "nullable": true})
        );
    }
}
