#![allow(non_snake_case)]

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::{
    endpoint::{Link, Method},
    models::{ExternalDocs, Info, Server, Tag},
    schema::Schema,
    security::{SecurityRequirement, SecurityScheme},
};

/// Represents a complete OpenAPI 3.0.3 document
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct OpenAPI {
    pub openapi: String,
    pub info: Info,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub servers: Vec<Server>,
    #[serde(default)]
    pub paths: BTreeMap<String, PathItem>,
    #[serde(default)]
    pub components: Components,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub security: Vec<SecurityRequirement>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tags: Vec<Tag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub externalDocs: Option<ExternalDocs>,
}

impl OpenAPI {
    pub fn operation(&self, path: &str, method: Method) -> Option<&Operation> {
        self.paths.get(path).and_then(|item| item.operation(method))
    }
}

/// Reusable schemas and security schemes
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Components {
    /// Always present, even when empty
    #[serde(default)]
    pub schemas: HashMap<String, Schema>,
    #[serde(skip_serializing_if = "HashMap::is_empty", default)]
    pub securitySchemes: HashMap<String, SecurityScheme>,
}

/// Operations available on a single path
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct PathItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<Operation>,
}

impl PathItem {
    fn slot(&mut self, method: Method) -> &mut Option<Operation> {
        match method {
            Method::Get => &mut self.get,
            Method::Put => &mut self.put,
            Method::Post => &mut self.post,
            Method::Delete => &mut self.delete,
            Method::Options => &mut self.options,
            Method::Head => &mut self.head,
            Method::Patch => &mut self.patch,
            Method::Trace => &mut self.trace,
        }
    }

    /// Store `operation` under `method`, returning the one it replaced
    pub fn set(&mut self, method: Method, operation: Operation) -> Option<Operation> {
        self.slot(method).replace(operation)
    }

    pub fn operation(&self, method: Method) -> Option<&Operation> {
        match method {
            Method::Get => self.get.as_ref(),
            Method::Put => self.put.as_ref(),
            Method::Post => self.post.as_ref(),
            Method::Delete => self.delete.as_ref(),
            Method::Options => self.options.as_ref(),
            Method::Head => self.head.as_ref(),
            Method::Patch => self.patch.as_ref(),
            Method::Trace => self.trace.as_ref(),
        }
    }
}

/// Callback name to runtime-expression URL to path item
pub type Callbacks = BTreeMap<String, BTreeMap<String, PathItem>>;

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
    pub parameters: Vec<Parameter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requestBody: Option<RequestBody>,
    pub responses: BTreeMap<String, Response>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub callbacks: Callbacks,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub security: Vec<SecurityRequirement>,
}

/// Parameter for an operation
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "in")]
    pub in_type: String, // query, header, path, cookie
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowEmptyValue: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explode: Option<bool>,
    pub schema: Schema,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<serde_json::Value>,
}

/// Request body of an operation
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct RequestBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub content: BTreeMap<String, MediaType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
}

/// Schema carried under one MIME type
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct MediaType {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
}

/// API response
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Response {
    pub description: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub headers: BTreeMap<String, Header>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub content: BTreeMap<String, MediaType>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub links: BTreeMap<String, Link>,
}

/// Response header
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Header {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub schema: Schema,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_item_set_replaces() {
        let mut item = PathItem::default();
        assert!(item.set(Method::Get, Operation::default()).is_none());
        let replaced = item.set(
            Method::Get,
            Operation {
                summary: Some("second".to_string()),
                ..Default::default()
            },
        );
        assert!(replaced.is_some());
        assert_eq!(item.operation(Method::Get).unwrap().summary.as_deref(), Some("second"));
        assert!(item.operation(Method::Post).is_none());
    }

    #[test]
    fn test_empty_components_keep_schemas() {
        let value = serde_json::to_value(OpenAPI::default()).unwrap();
        assert_eq!(value["components"], serde_json::json!({"schemas": {}}));
        assert_eq!(value["paths"], serde_json::json!({}));
    }
}
