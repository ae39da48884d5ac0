use log::debug;
use serde_json::Value;

use crate::{
    classify::semantic_kind,
    model::{definition_name, json_map_name, Model},
    reflect::{Kind, TypeDescriptor, WellKnown},
    schema::{Dialect, Schema, AMBIGUOUS_TYPE},
};

/// Computes inline or `$ref` schemas for response and body payloads.
///
/// Definitions are not registered here; the document generators run the
/// [`DefinitionGenerator`](crate::definition::DefinitionGenerator) on every
/// payload so that the references resolve.
#[derive(Debug, Clone, Copy)]
pub struct ResponseGenerator {
    dialect: Dialect,
}

impl ResponseGenerator {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    /// Schema for a payload, `None` when it has no schema form
    pub fn generate(&self, model: &Model) -> Option<Schema> {
        let schema = match model {
            Model::Typed(descriptor) => self.type_schema(descriptor.clone()),
            Model::Dynamic(value) => self.json_schema(value),
        };
        if schema.is_none() {
            debug!("Payload has no schema, description only");
        }
        schema
    }

    fn type_schema(&self, descriptor: TypeDescriptor) -> Option<Schema> {
        let descriptor = descriptor.deref();
        match &descriptor.kind {
            Kind::Primitive(_) => Some(Schema::typed(semantic_kind(&descriptor.kind).as_str())),
            Kind::File => Some(Schema::file(self.dialect)),
            Kind::Slice(elem) | Kind::Array(elem, _) => {
                self.type_schema(elem()).map(Schema::array_of)
            }
            Kind::Struct(shape) => match shape.well_known {
                Some(WellKnown::Timestamp) => Some(Schema::date_time()),
                Some(WellKnown::Date) => Some(Schema::date()),
                Some(WellKnown::Duration) => Some(Schema::typed("integer")),
                Some(WellKnown::ResponseWrapper) => {
                    descriptor.wrapped_model().and_then(|m| self.type_schema(m))
                }
                None if shape.fields.is_empty() => None,
                None => Some(Schema::reference(self.dialect, &definition_name(&descriptor))),
            },
            Kind::Map { .. } => Some(Schema::reference(self.dialect, &definition_name(&descriptor))),
            Kind::Pointer(_) | Kind::Interface | Kind::Func | Kind::Chan => None,
        }
    }

    fn json_schema(&self, value: &Value) -> Option<Schema> {
        match value {
            Value::Null => None,
            Value::Bool(_) => Some(Schema::typed("boolean")),
            Value::Number(n) if n.is_f64() => Some(Schema::typed("number")),
            Value::Number(_) => Some(Schema::typed("integer")),
            Value::String(_) => Some(Schema::typed("string")),
            Value::Array(items) => {
                let item = match items.first() {
                    Some(first) => self.json_schema(first)?,
                    None => Schema::typed(AMBIGUOUS_TYPE),
                };
                Some(Schema::array_of(item))
            }
            Value::Object(_) => Some(Schema::reference(self.dialect, &json_map_name(value))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::CustomResponse,
        reflect::{FieldDescriptor, Reflect},
    };
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::collections::HashMap;

    struct Order;

    impl Reflect for Order {
        fn type_descriptor() -> TypeDescriptor {
            TypeDescriptor::structure(
                "models.Order",
                vec![FieldDescriptor::of::<u64>("ID").tag(r#"json:"id""#)],
            )
        }
    }

    struct Empty;

    impl Reflect for Empty {
        fn type_descriptor() -> TypeDescriptor {
            TypeDescriptor::structure("models.Empty", Vec::new())
        }
    }

    #[test]
    fn test_struct_and_slice_responses() {
        let v2 = ResponseGenerator::new(Dialect::Swagger2);
        assert_eq!(
            v2.generate(&Model::of::<Order>()),
            Some(Schema::reference(Dialect::Swagger2, "models.Order"))
        );
        assert_eq!(
            v2.generate(&Model::of::<Vec<Order>>()),
            Some(Schema::array_of(Schema::reference(Dialect::Swagger2, "models.Order")))
        );
        assert_eq!(
            v2.generate(&Model::of::<Vec<String>>()),
            Some(Schema::array_of(Schema::typed("string")))
        );

        let v3 = ResponseGenerator::new(Dialect::OpenApi3);
        assert_eq!(
            v3.generate(&Model::of::<Option<Order>>()),
            Some(Schema::reference(Dialect::OpenApi3, "models.Order"))
        );
    }

    #[test]
    fn test_payloads_without_schema() {
        let generator = ResponseGenerator::new(Dialect::Swagger2);
        assert_eq!(generator.generate(&Model::of::<Empty>()), None);
        assert_eq!(generator.generate(&Model::of::<serde_json::Value>()), None);
        assert_eq!(generator.generate(&Model::json(Value::Null)), None);
    }

    #[test]
    fn test_wrapper_and_scalars() {
        let generator = ResponseGenerator::new(Dialect::OpenApi3);
        assert_eq!(
            generator.generate(&Model::of::<CustomResponse<Vec<Order>>>()),
            Some(Schema::array_of(Schema::reference(Dialect::OpenApi3, "models.Order")))
        );
        assert_eq!(generator.generate(&Model::of::<bool>()), Some(Schema::typed("boolean")));
        assert_eq!(
            generator.generate(&Model::of::<chrono::NaiveDate>()),
            Some(Schema::date())
        );
    }

    #[test]
    fn test_map_responses_are_hashed_references() {
        let generator = ResponseGenerator::new(Dialect::Swagger2);

        let typed = Model::of::<HashMap<String, Order>>();
        let expected = definition_name(&<HashMap<String, Order>>::type_descriptor());
        assert_eq!(generator.generate(&typed), Some(Schema::reference(Dialect::Swagger2, &expected)));

        let first = generator.generate(&Model::json(json!({"code": 200}))).unwrap();
        let again = generator.generate(&Model::json(json!({"code": 200}))).unwrap();
        let other = generator.generate(&Model::json(json!({"code": 500}))).unwrap();
        assert_eq!(first, again);
        assert_ne!(first, other);

        assert_eq!(
            generator.generate(&Model::json(json!([{"code": 200}]))),
            Some(Schema::array_of(first))
        );
    }
}
