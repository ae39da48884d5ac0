//! Definition generation: walks a payload's shape and writes named object
//! schemas into a [`DefinitionTable`].

use log::{debug, warn};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::{
    classify::classify_field,
    config::RecursivePointer,
    model::{definition_name, json_map_name, Model},
    reflect::{Kind, StructShape, TypeDescriptor, WellKnown},
    schema::{Dialect, Schema, AMBIGUOUS_TYPE},
};

/// Two writes of one definition name that disagreed on their `required` list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionConflict {
    pub name: String,
    pub previous: Vec<String>,
    pub current: Vec<String>,
}

/// Named definitions collected during one generation pass
#[derive(Debug, Default)]
pub struct DefinitionTable {
    definitions: HashMap<String, Schema>,
    in_progress: HashSet<String>,
    conflicts: Vec<DefinitionConflict>,
}

impl DefinitionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.definitions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn definitions(&self) -> &HashMap<String, Schema> {
        &self.definitions
    }

    pub fn into_definitions(self) -> HashMap<String, Schema> {
        self.definitions
    }

    /// Names written more than once with differing required lists
    pub fn conflicts(&self) -> &[DefinitionConflict] {
        &self.conflicts
    }

    pub fn is_in_progress(&self, name: &str) -> bool {
        self.in_progress.contains(name)
    }

    /// Last write wins; a changed required list is logged and recorded
    pub fn insert(&mut self, name: String, schema: Schema) {
        if let Some(previous) = self.definitions.get(&name) {
            if previous.required != schema.required {
                warn!(
                    "Definition {} rewritten with a different required list: {:?} -> {:?}",
                    name, previous.required, schema.required
                );
                self.conflicts.push(DefinitionConflict {
                    name: name.clone(),
                    previous: previous.required.clone(),
                    current: schema.required.clone(),
                });
            }
        }
        self.definitions.insert(name, schema);
    }

    fn begin(&mut self, name: &str) {
        self.in_progress.insert(name.to_string());
    }

    fn finish(&mut self, name: &str) {
        self.in_progress.remove(name);
    }
}

/// Recursive walker that registers definitions for one dialect
pub struct DefinitionGenerator<'a> {
    pub(crate) dialect: Dialect,
    pub(crate) recursive_pointer: RecursivePointer,
    pub(crate) table: &'a mut DefinitionTable,
}

impl<'a> DefinitionGenerator<'a> {
    pub fn new(dialect: Dialect, table: &'a mut DefinitionTable) -> Self {
        Self {
            dialect,
            recursive_pointer: RecursivePointer::default(),
            table,
        }
    }

    pub fn with_recursive_pointer(mut self, mode: RecursivePointer) -> Self {
        self.recursive_pointer = mode;
        self
    }

    /// Register the definitions a body or response payload needs
    pub fn create_definition(&mut self, model: &Model) {
        match model {
            Model::Typed(descriptor) => self.create_type_definition(descriptor.clone()),
            Model::Dynamic(value) => self.create_json_definition(value),
        }
    }

    pub fn create_type_definition(&mut self, descriptor: TypeDescriptor) {
        let descriptor = descriptor.deref();
        match &descriptor.kind {
            Kind::Slice(elem) | Kind::Array(elem, _) => self.create_type_definition(elem()),
            Kind::Struct(shape) => match shape.well_known {
                None => self.define_struct(&descriptor),
                Some(WellKnown::ResponseWrapper) => match descriptor.wrapped_model() {
                    Some(inner) => self.create_type_definition(inner),
                    None => warn!(
                        "Response wrapper {} has no Model field",
                        descriptor.display_name()
                    ),
                },
                Some(_) => debug!("{} renders inline", descriptor.display_name()),
            },
            Kind::Map { key, value } => {
                let name = definition_name(&descriptor);
                self.define_map(&name, &key(), value());
            }
            _ => debug!("No definition needed for {}", descriptor.display_name()),
        }
    }

    fn create_json_definition(&mut self, value: &Value) {
        match value {
            Value::Object(entries) => {
                let name = json_map_name(value);
                self.define_json(&name, entries);
            }
            Value::Array(items) => match items.first() {
                Some(first) => self.create_json_definition(first),
                None => debug!("Empty JSON array payload has no definition"),
            },
            _ => debug!("JSON scalar payload has no definition"),
        }
    }

    /// Whether a definition should be (re)built; false while it is under
    /// construction or, for Swagger 2.0, once it exists
    fn should_define(&self, name: &str) -> bool {
        if self.table.is_in_progress(name) {
            debug!("{} is under construction, referencing only", name);
            return false;
        }
        if self.table.contains(name) && !self.dialect.overwrites_definitions() {
            return false;
        }
        true
    }

    pub(crate) fn define_struct(&mut self, descriptor: &TypeDescriptor) {
        let Some(shape) = descriptor.struct_shape() else {
            return;
        };
        let name = definition_name(descriptor);
        if !self.should_define(&name) {
            return;
        }

        debug!("Building definition {}", name);
        self.table.begin(&name);
        let (properties, required) = self.struct_properties(&name, shape, true);
        self.table.finish(&name);

        let required = if self.dialect.tracks_required() {
            required
        } else {
            Vec::new()
        };
        self.table.insert(name, Schema::object(properties, required));
    }

    /// Properties and required names of a struct, with embedded members
    /// flattened one level when `flatten` is set
    fn struct_properties(
        &mut self,
        owner: &str,
        shape: &StructShape,
        flatten: bool,
    ) -> (BTreeMap<String, Schema>, Vec<String>) {
        let mut properties = BTreeMap::new();
        let mut required = Vec::new();
        let mut embedded = Vec::new();

        for field in &shape.fields {
            if flatten && field.embedded && field.tags.json_name().is_none() && !field.tags.is_skipped() {
                embedded.push(field);
                continue;
            }

            let classified = classify_field(field, self.dialect);
            if classified.is_skipped() || classified.kind.is_omitted() {
                debug!("Omitting field {} of {}", field.name, owner);
                continue;
            }
            let Some(property) = self.build_property(owner, field, &classified) else {
                continue;
            };
            if classified.required && !required.contains(&classified.name) {
                required.push(classified.name.clone());
            }
            properties.insert(classified.name, property);
        }

        // Declared fields win over promoted ones
        for field in embedded {
            let inner = field.descriptor().deref();
            let Some(inner_shape) = inner.struct_shape().filter(|_| inner.is_plain_struct()) else {
                warn!("Embedded field {} of {} is not a struct", field.name, owner);
                continue;
            };
            let (promoted, promoted_required) = self.struct_properties(owner, inner_shape, false);
            for (name, property) in promoted {
                if properties.contains_key(&name) {
                    continue;
                }
                if promoted_required.contains(&name) {
                    required.push(name.clone());
                }
                properties.insert(name, property);
            }
        }

        (properties, required)
    }

    /// One-entry object definition keyed by the map's key type
    pub(crate) fn define_map(&mut self, name: &str, key: &TypeDescriptor, value: TypeDescriptor) {
        if !self.should_define(name) {
            return;
        }

        debug!("Building map definition {}", name);
        self.table.begin(name);
        let key_name = key.display_name();
        let value_schema = self.type_schema(name, &key_name, value, None);
        self.table.finish(name);

        let mut properties = BTreeMap::new();
        if let Some(schema) = value_schema {
            properties.insert(key_name, schema);
        }
        self.table
            .insert(name.to_string(), Schema::object(properties, Vec::new()));
    }

    fn define_json(&mut self, name: &str, entries: &Map<String, Value>) {
        if !self.should_define(name) {
            return;
        }

        debug!("Building definition {} from a JSON payload", name);
        let properties = entries
            .iter()
            .map(|(key, value)| (key.clone(), self.json_property(value)))
            .collect();
        self.table
            .insert(name.to_string(), Schema::object(properties, Vec::new()));
    }

    fn json_property(&mut self, value: &Value) -> Schema {
        match value {
            Value::Null => Schema::typed(AMBIGUOUS_TYPE),
            Value::Bool(_) => Schema::typed("boolean").with_example(Some(value.clone())),
            Value::Number(n) if n.is_f64() => {
                Schema::typed("number").with_example(Some(value.clone()))
            }
            Value::Number(_) => Schema::typed("integer").with_example(Some(value.clone())),
            Value::String(_) => Schema::typed("string").with_example(Some(value.clone())),
            Value::Array(items) => {
                let item = match items.first() {
                    Some(first) => self.json_property(first),
                    None => Schema::typed(AMBIGUOUS_TYPE),
                };
                Schema::array_of(Schema {
                    example: None,
                    ..item
                })
            }
            Value::Object(entries) => {
                let name = json_map_name(value);
                self.define_json(&name, entries);
                Schema::reference(self.dialect, &name)
            }
        }
    }
}
