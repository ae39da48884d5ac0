#![allow(non_snake_case)]

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::{
    models::{ExternalDocs, Info, Tag},
    schema::Schema,
    security::{SecurityDefinition, SecurityRequirement},
};

/// Represents a complete Swagger 2.0 document
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Swagger {
    pub swagger: String,
    pub info: Info,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub basePath: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub schemes: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub consumes: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub produces: Vec<String>,
    #[serde(default)]
    pub paths: BTreeMap<String, BTreeMap<String, Operation>>,
    #[serde(skip_serializing_if = "HashMap::is_empty", default)]
    pub definitions: HashMap<String, Schema>,
    #[serde(skip_serializing_if = "HashMap::is_empty", default)]
    pub securityDefinitions: HashMap<String, SecurityDefinition>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub security: Vec<SecurityRequirement>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tags: Vec<Tag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub externalDocs: Option<ExternalDocs>,
}

impl Swagger {
    /// Operation stored under `path` and lower-case `method`
    pub fn operation(&self, path: &str, method: &str) -> Option<&Operation> {
        self.paths.get(path).and_then(|item| item.get(method))
    }
}

/// An operation (endpoint) of the API
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Operation {
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operationId: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub consumes: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub produces: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub parameters: Vec<Parameter>,
    pub responses: BTreeMap<String, Response>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub security: Vec<SecurityRequirement>,
}

/// Parameter for an operation.
///
/// Non-body parameters describe their value inline through the flattened
/// `value` schema (`type`, `format`, `items`, constraints); the body
/// parameter carries `schema` instead.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "in")]
    pub in_type: String, // path, query, header, formData, body
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowEmptyValue: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collectionFormat: Option<String>,
    #[serde(flatten)]
    pub value: Schema,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
}

/// API response
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Response {
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub headers: BTreeMap<String, Header>,
}

/// Response header
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Header {
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
