//! Endpoint descriptions supplied by the host application.
//!
//! ```
//! use swagdoc::endpoint::{Endpoint, Parameter, ParamType};
//!
//! let endpoint = Endpoint::get("/product/{id}")
//!     .summary("Get a product")
//!     .tag("products")
//!     .parameter(Parameter::path("id", ParamType::Integer))
//!     .success::<String>(200, "product name");
//! assert_eq!(endpoint.path_variables(), vec!["id"]);
//! ```

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{collections::BTreeMap, fmt, str::FromStr};

use crate::{
    error::{SwagError, SwagResult},
    expression::{ExpressionError, ExpressionTemplate, RuntimeExpression},
    model::Model,
    reflect::Reflect,
    schema::Schema,
    security::SecurityRequirement,
};

static PATH_VARIABLE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{([^{}/]+)\}").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    Trace,
}

impl Method {
    /// Lower-case operation key used in `paths`
    pub fn key(&self) -> &'static str {
        match self {
            Method::Get => "get",
            Method::Post => "post",
            Method::Put => "put",
            Method::Patch => "patch",
            Method::Delete => "delete",
            Method::Head => "head",
            Method::Options => "options",
            Method::Trace => "trace",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key().to_uppercase())
    }
}

impl FromStr for Method {
    type Err = SwagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "get" => Ok(Method::Get),
            "post" => Ok(Method::Post),
            "put" => Ok(Method::Put),
            "patch" => Ok(Method::Patch),
            "delete" => Ok(Method::Delete),
            "head" => Ok(Method::Head),
            "options" => Ok(Method::Options),
            "trace" => Ok(Method::Trace),
            _ => Err(SwagError::InvalidEndpoint {
                method: s.to_string(),
                path: String::new(),
                reason: "unknown HTTP method".to_string(),
            }),
        }
    }
}

/// Where a parameter is carried
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Location {
    Query,
    Header,
    Path,
    Cookie,
    /// Form field; `formData` in Swagger 2.0, a request body property in OpenAPI 3.0
    Form,
}

impl Location {
    pub fn as_str(&self) -> &'static str {
        match self {
            Location::Query => "query",
            Location::Header => "header",
            Location::Path => "path",
            Location::Cookie => "cookie",
            Location::Form => "formData",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    File,
}

impl ParamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
            ParamType::Array => "array",
            ParamType::File => "file",
        }
    }
}

/// Serialization of array parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionFormat {
    Csv,
    Ssv,
    Tsv,
    Pipes,
    Multi,
}

impl CollectionFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionFormat::Csv => "csv",
            CollectionFormat::Ssv => "ssv",
            CollectionFormat::Tsv => "tsv",
            CollectionFormat::Pipes => "pipes",
            CollectionFormat::Multi => "multi",
        }
    }

    /// OpenAPI 3.0 `style` and `explode`; tab separation has no equivalent
    pub fn style(&self) -> Option<(&'static str, bool)> {
        match self {
            CollectionFormat::Csv => Some(("form", false)),
            CollectionFormat::Ssv => Some(("spaceDelimited", false)),
            CollectionFormat::Pipes => Some(("pipeDelimited", false)),
            CollectionFormat::Multi => Some(("form", true)),
            CollectionFormat::Tsv => None,
        }
    }
}

/// One operation parameter with its validation constraints
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub location: Location,
    pub param_type: ParamType,
    /// Element type of an array parameter
    pub items: Option<ParamType>,
    pub description: Option<String>,
    /// Explicit required flag; path parameters are always required
    pub required: Option<bool>,
    pub format: Option<String>,
    pub default: Option<Value>,
    pub example: Option<Value>,
    pub enum_values: Vec<Value>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub exclusive_minimum: bool,
    pub exclusive_maximum: bool,
    pub multiple_of: Option<f64>,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub pattern: Option<String>,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    pub unique_items: bool,
    pub collection_format: Option<CollectionFormat>,
    pub allow_empty_value: bool,
    pub deprecated: bool,
}

impl Parameter {
    pub fn new(name: &str, location: Location, param_type: ParamType) -> Self {
        Self {
            name: name.to_string(),
            location,
            param_type,
            items: None,
            description: None,
            required: None,
            format: None,
            default: None,
            example: None,
            enum_values: Vec::new(),
            minimum: None,
            maximum: None,
            exclusive_minimum: false,
            exclusive_maximum: false,
            multiple_of: None,
            min_length: None,
            max_length: None,
            pattern: None,
            min_items: None,
            max_items: None,
            unique_items: false,
            collection_format: None,
            allow_empty_value: false,
            deprecated: false,
        }
    }

    pub fn path(name: &str, param_type: ParamType) -> Self {
        Self::new(name, Location::Path, param_type)
    }

    pub fn query(name: &str, param_type: ParamType) -> Self {
        Self::new(name, Location::Query, param_type)
    }

    pub fn header(name: &str, param_type: ParamType) -> Self {
        Self::new(name, Location::Header, param_type)
    }

    pub fn cookie(name: &str, param_type: ParamType) -> Self {
        Self::new(name, Location::Cookie, param_type)
    }

    pub fn form(name: &str, param_type: ParamType) -> Self {
        Self::new(name, Location::Form, param_type)
    }

    /// Uploaded file form field
    pub fn file(name: &str) -> Self {
        Self::new(name, Location::Form, ParamType::File)
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    pub fn format(mut self, format: &str) -> Self {
        self.format = Some(format.to_string());
        self
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn example(mut self, value: Value) -> Self {
        self.example = Some(value);
        self
    }

    pub fn enum_values(mut self, values: Vec<Value>) -> Self {
        self.enum_values = values;
        self
    }

    pub fn minimum(mut self, minimum: f64, exclusive: bool) -> Self {
        self.minimum = Some(minimum);
        self.exclusive_minimum = exclusive;
        self
    }

    pub fn maximum(mut self, maximum: f64, exclusive: bool) -> Self {
        self.maximum = Some(maximum);
        self.exclusive_maximum = exclusive;
        self
    }

    pub fn multiple_of(mut self, factor: f64) -> Self {
        self.multiple_of = Some(factor);
        self
    }

    pub fn length(mut self, min: Option<u64>, max: Option<u64>) -> Self {
        self.min_length = min;
        self.max_length = max;
        self
    }

    pub fn pattern(mut self, pattern: &str) -> Self {
        self.pattern = Some(pattern.to_string());
        self
    }

    /// Make this an array parameter of `items`
    pub fn array_of(mut self, items: ParamType, format: CollectionFormat) -> Self {
        self.param_type = ParamType::Array;
        self.items = Some(items);
        self.collection_format = Some(format);
        self
    }

    pub fn item_count(mut self, min: Option<u64>, max: Option<u64>, unique: bool) -> Self {
        self.min_items = min;
        self.max_items = max;
        self.unique_items = unique;
        self
    }

    pub fn allow_empty_value(mut self) -> Self {
        self.allow_empty_value = true;
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    pub fn is_required(&self) -> bool {
        self.location == Location::Path || self.required.unwrap_or(false)
    }

    /// Value schema of the parameter, constraints included
    pub fn schema(&self) -> Schema {
        Schema {
            type_: Some(self.param_type.as_str().to_string()),
            format: self.format.clone(),
            default: self.default.clone(),
            example: self.example.clone(),
            enum_values: self.enum_values.clone(),
            minimum: self.minimum,
            maximum: self.maximum,
            exclusiveMinimum: self.exclusive_minimum.then_some(true),
            exclusiveMaximum: self.exclusive_maximum.then_some(true),
            multipleOf: self.multiple_of,
            minLength: self.min_length,
            maxLength: self.max_length,
            pattern: self.pattern.clone(),
            items: self.items.map(|t| Box::new(Schema::typed(t.as_str()))),
            minItems: self.min_items,
            maxItems: self.max_items,
            uniqueItems: self.unique_items.then_some(true),
            ..Default::default()
        }
    }
}

/// Response header declared on an outcome
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseHeader {
    pub param_type: ParamType,
    pub description: Option<String>,
}

/// Design-time link from a response to another operation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_ref: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub parameters: BTreeMap<String, RuntimeExpression>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RuntimeExpression>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Link {
    fn targeting(operation_id: Option<&str>, operation_ref: Option<&str>) -> Result<Self, ExpressionError> {
        let blank = |s: &Option<&str>| s.map(str::is_empty).unwrap_or(true);
        if blank(&operation_id) == blank(&operation_ref) {
            return Err(ExpressionError::LinkTarget);
        }
        Ok(Self {
            operation_id: operation_id.map(str::to_string),
            operation_ref: operation_ref.map(str::to_string),
            parameters: BTreeMap::new(),
            request_body: None,
            description: None,
        })
    }

    pub fn to_operation(operation_id: &str) -> Result<Self, ExpressionError> {
        Self::targeting(Some(operation_id), None)
    }

    pub fn to_reference(operation_ref: &str) -> Result<Self, ExpressionError> {
        Self::targeting(None, Some(operation_ref))
    }

    /// Pass a value read by a runtime expression as a parameter of the target
    pub fn parameter(mut self, name: &str, expression: &str) -> Result<Self, ExpressionError> {
        self.parameters
            .insert(name.to_string(), RuntimeExpression::parse(expression)?);
        Ok(self)
    }

    pub fn request_body(mut self, expression: &str) -> Result<Self, ExpressionError> {
        self.request_body = Some(RuntimeExpression::parse(expression)?);
        Ok(self)
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

/// Out-of-band requests the API makes, keyed by a templated URL
#[derive(Debug, Clone)]
pub struct Callback {
    pub name: String,
    pub url: ExpressionTemplate,
    pub endpoints: Vec<Endpoint>,
}

impl Callback {
    pub fn new(name: &str, url: &str) -> Result<Self, ExpressionError> {
        if name.is_empty() {
            return Err(ExpressionError::EmptyCallbackName);
        }
        Ok(Self {
            name: name.to_string(),
            url: ExpressionTemplate::parse(url)?,
            endpoints: Vec::new(),
        })
    }

    pub fn endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoints.push(endpoint);
        self
    }
}

/// One outcome of an endpoint
#[derive(Debug, Clone)]
pub struct ResponseSpec {
    pub code: u16,
    pub description: String,
    pub model: Option<Model>,
    pub headers: BTreeMap<String, ResponseHeader>,
    pub links: BTreeMap<String, Link>,
}

impl ResponseSpec {
    pub fn new(code: u16, description: &str) -> Self {
        Self {
            code,
            description: description.to_string(),
            model: None,
            headers: BTreeMap::new(),
            links: BTreeMap::new(),
        }
    }

    pub fn model<T: Reflect>(self) -> Self {
        self.with_model(Model::of::<T>())
    }

    pub fn with_model(mut self, model: Model) -> Self {
        self.model = Some(model);
        self
    }

    pub fn header(mut self, name: &str, param_type: ParamType, description: Option<&str>) -> Self {
        self.headers.insert(
            name.to_string(),
            ResponseHeader {
                param_type,
                description: description.map(str::to_string),
            },
        );
        self
    }

    pub fn link(mut self, name: &str, link: Link) -> Self {
        self.links.insert(name.to_string(), link);
        self
    }

    pub fn is_error(&self) -> bool {
        self.code >= 400
    }
}

/// One method on one path, with everything needed to render its operation
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub method: Method,
    pub path: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub operation_id: Option<String>,
    pub tags: Vec<String>,
    pub parameters: Vec<Parameter>,
    pub body: Option<Model>,
    pub body_description: Option<String>,
    pub success: Vec<ResponseSpec>,
    pub errors: Vec<ResponseSpec>,
    pub consumes: Vec<String>,
    pub produces: Vec<String>,
    pub security: Vec<SecurityRequirement>,
    pub deprecated: bool,
    pub callbacks: Vec<Callback>,
}

impl Endpoint {
    pub fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            path: path.to_string(),
            summary: None,
            description: None,
            operation_id: None,
            tags: Vec::new(),
            parameters: Vec::new(),
            body: None,
            body_description: None,
            success: Vec::new(),
            errors: Vec::new(),
            consumes: Vec::new(),
            produces: Vec::new(),
            security: Vec::new(),
            deprecated: false,
            callbacks: Vec::new(),
        }
    }

    pub fn get(path: &str) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: &str) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: &str) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn patch(path: &str) -> Self {
        Self::new(Method::Patch, path)
    }

    pub fn delete(path: &str) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn summary(mut self, summary: &str) -> Self {
        self.summary = Some(summary.to_string());
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn operation_id(mut self, operation_id: &str) -> Self {
        self.operation_id = Some(operation_id.to_string());
        self
    }

    pub fn tag(mut self, tag: &str) -> Self {
        self.tags.push(tag.to_string());
        self
    }

    pub fn parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn body<T: Reflect>(self, description: &str) -> Self {
        self.body_model(Model::of::<T>(), description)
    }

    pub fn body_model(mut self, model: Model, description: &str) -> Self {
        self.body = Some(model);
        self.body_description = Some(description.to_string()).filter(|d| !d.is_empty());
        self
    }

    pub fn success<T: Reflect>(self, code: u16, description: &str) -> Self {
        self.response(ResponseSpec::new(code, description).model::<T>())
    }

    pub fn error<T: Reflect>(self, code: u16, description: &str) -> Self {
        self.response(ResponseSpec::new(code, description).model::<T>())
    }

    /// Success payload given as an ad hoc JSON value
    pub fn success_json(self, code: u16, description: &str, value: Value) -> Self {
        self.response(ResponseSpec::new(code, description).with_model(Model::json(value)))
    }

    /// Add an outcome; codes from 400 up are errors
    pub fn response(mut self, response: ResponseSpec) -> Self {
        if response.is_error() {
            self.errors.push(response);
        } else {
            self.success.push(response);
        }
        self
    }

    pub fn consumes(mut self, mimes: &[&str]) -> Self {
        self.consumes = mimes.iter().map(|m| m.to_string()).collect();
        self
    }

    pub fn produces(mut self, mimes: &[&str]) -> Self {
        self.produces = mimes.iter().map(|m| m.to_string()).collect();
        self
    }

    pub fn security(mut self, scheme: &str, scopes: &[&str]) -> Self {
        let mut requirement = SecurityRequirement::new();
        requirement.insert(
            scheme.to_string(),
            scopes.iter().map(|s| s.to_string()).collect(),
        );
        self.security.push(requirement);
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    pub fn callback(mut self, callback: Callback) -> Self {
        self.callbacks.push(callback);
        self
    }

    /// Names of the `{variable}` segments of the path template
    pub fn path_variables(&self) -> Vec<&str> {
        PATH_VARIABLE_REGEX
            .captures_iter(&self.path)
            .filter_map(|c| c.get(1).map(|m| m.as_str()))
            .collect()
    }

    /// All success and error outcomes, successes first
    pub fn responses(&self) -> impl Iterator<Item = &ResponseSpec> {
        self.success.iter().chain(self.errors.iter())
    }

    /// Body and response payloads that need definitions
    pub fn models(&self) -> impl Iterator<Item = &Model> {
        self.body
            .iter()
            .chain(self.responses().filter_map(|r| r.model.as_ref()))
    }

    /// Structural checks on the path template and its parameters
    pub fn validate(&self) -> SwagResult<()> {
        let invalid = |reason: String| SwagError::InvalidEndpoint {
            method: self.method.to_string(),
            path: self.path.clone(),
            reason,
        };

        if !self.path.starts_with('/') {
            return Err(invalid("path must start with '/'".to_string()));
        }

        let variables = self.path_variables();
        for variable in &variables {
            let declared = self
                .parameters
                .iter()
                .any(|p| p.location == Location::Path && p.name == *variable);
            if !declared {
                return Err(invalid(format!("path variable {{{}}} has no path parameter", variable)));
            }
        }

        for (i, parameter) in self.parameters.iter().enumerate() {
            if parameter.location == Location::Path && !variables.contains(&parameter.name.as_str()) {
                return Err(invalid(format!("path parameter {} is not in the path", parameter.name)));
            }
            let duplicate = self.parameters[..i]
                .iter()
                .any(|p| p.name == parameter.name && p.location == parameter.location);
            if duplicate {
                return Err(invalid(format!(
                    "duplicate {} parameter {}",
                    parameter.location.as_str(),
                    parameter.name
                )));
            }
        }

        debug!("Endpoint {} {} is valid", self.method, self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_method_parsing() {
        assert_eq!("GET".parse::<Method>().unwrap(), Method::Get);
        assert_eq!(Method::Patch.key(), "patch");
        assert_eq!(Method::Delete.to_string(), "DELETE");
        assert!("fetch".parse::<Method>().is_err());
    }

    #[test]
    fn test_path_parameters_are_required() {
        assert!(Parameter::path("id", ParamType::Integer).is_required());
        assert!(Parameter::path("id", ParamType::Integer).required(false).is_required());
        assert!(!Parameter::query("q", ParamType::String).is_required());
        assert!(Parameter::query("q", ParamType::String).required(true).is_required());
    }

    #[test]
    fn test_parameter_schema_constraints() {
        let parameter = Parameter::query("ids", ParamType::Integer)
            .array_of(ParamType::Integer, CollectionFormat::Multi)
            .item_count(Some(1), Some(10), true);
        assert_eq!(
            serde_json::to_value(parameter.schema()).unwrap(),
            json!({"type": "array", "items": {"type": "integer"}, "minItems": 1, "maxItems": 10, "uniqueItems": true})
        );

        let limit = Parameter::query("limit", ParamType::Integer).minimum(1.0, false).maximum(100.0, true);
        assert_eq!(limit.schema().exclusiveMaximum, Some(true));
        assert_eq!(limit.schema().exclusiveMinimum, None);
    }

    #[test]
    fn test_responses_are_split_by_code() {
        let endpoint = Endpoint::get("/ping")
            .success::<String>(200, "pong")
            .error::<String>(503, "unavailable")
            .response(ResponseSpec::new(204, "no content"));

        let codes: Vec<u16> = endpoint.responses().map(|r| r.code).collect();
        assert_eq!(codes, vec![200, 204, 503]);
        assert_eq!(endpoint.models().count(), 2);
    }

    #[test]
    fn test_validate_path_template() {
        let ok = Endpoint::get("/stores/{store}/items/{id}")
            .parameter(Parameter::path("store", ParamType::String))
            .parameter(Parameter::path("id", ParamType::Integer));
        assert_eq!(ok.path_variables(), vec!["store", "id"]);
        assert!(ok.validate().is_ok());

        let missing = Endpoint::get("/items/{id}");
        assert!(matches!(missing.validate(), Err(SwagError::InvalidEndpoint { .. })));

        let duplicate = Endpoint::get("/items")
            .parameter(Parameter::query("q", ParamType::String))
            .parameter(Parameter::query("q", ParamType::String));
        assert!(duplicate.validate().is_err());

        assert!(Endpoint::get("items").validate().is_err());
    }

    #[test]
    fn test_link_and_callback_validation() {
        let link = Link::to_operation("getUser")
            .unwrap()
            .parameter("userId", "$response.body#/id")
            .unwrap();
        assert_eq!(
            serde_json::to_value(&link).unwrap(),
            json!({"operationId": "getUser", "parameters": {"userId": "$response.body#/id"}})
        );

        assert_eq!(Link::to_operation(""), Err(ExpressionError::LinkTarget));
        assert!(Link::to_operation("getUser").unwrap().parameter("id", "response.id").is_err());

        assert!(Callback::new("onEvent", "{$request.body#/callbackUrl}").is_ok());
        assert_eq!(Callback::new("", "{$url}").err(), Some(ExpressionError::EmptyCallbackName));
        assert!(Callback::new("onEvent", "{$request.nope}").is_err());
    }
}
