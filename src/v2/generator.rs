use log::{debug, info, warn};
use std::collections::{BTreeMap, HashMap};

use crate::{
    config::{DocumentConfig, GenerateOptions},
    definition::{DefinitionGenerator, DefinitionTable},
    endpoint::{Endpoint, Location, ParamType, Parameter as EndpointParameter},
    error::SwagResult,
    response::ResponseGenerator,
    schema::{Dialect, Schema},
    security::{validate_requirement, SecurityDefinition, SecurityRequirement},
    v2::models::{Header, Operation, Parameter, Response, Swagger},
};

pub const SWAGGER_VERSION: &str = "2.0";
const MULTIPART_FORM: &str = "multipart/form-data";
const DIALECT: Dialect = Dialect::Swagger2;

/// Assembles a Swagger 2.0 document from registered endpoints
pub struct Generator {
    config: DocumentConfig,
    options: GenerateOptions,
    endpoints: Vec<Endpoint>,
    security_definitions: HashMap<String, SecurityDefinition>,
    security: Vec<SecurityRequirement>,
}

impl Generator {
    /// Create a new Generator instance
    pub fn new(config: DocumentConfig) -> Self {
        Self {
            config,
            options: GenerateOptions::default(),
            endpoints: Vec::new(),
            security_definitions: HashMap::new(),
            security: Vec::new(),
        }
    }

    pub fn with_options(mut self, options: GenerateOptions) -> Self {
        self.options = options;
        self
    }

    pub fn add_endpoint(&mut self, endpoint: Endpoint) -> &mut Self {
        self.endpoints.push(endpoint);
        self
    }

    pub fn add_endpoints(&mut self, endpoints: impl IntoIterator<Item = Endpoint>) -> &mut Self {
        self.endpoints.extend(endpoints);
        self
    }

    pub fn add_security_definition(&mut self, name: &str, definition: SecurityDefinition) -> &mut Self {
        self.security_definitions.insert(name.to_string(), definition);
        self
    }

    /// Add a document-wide security requirement; it must name declared schemes and scopes
    pub fn add_security_requirement(&mut self, requirement: SecurityRequirement) -> SwagResult<&mut Self> {
        validate_requirement(&requirement, &self.security_definitions)?;
        self.security.push(requirement);
        Ok(self)
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    /// Build the document with a fresh definition table
    pub fn generate(&self) -> Swagger {
        let mut table = DefinitionTable::new();
        self.generate_with(&mut table)
    }

    /// Build the document, collecting definitions into `table`
    pub fn generate_with(&self, table: &mut DefinitionTable) -> Swagger {
        let mut swagger = Swagger {
            swagger: SWAGGER_VERSION.to_string(),
            info: self.config.info.clone(),
            host: self.config.host.clone(),
            basePath: self.config.base_path.clone(),
            schemes: self.config.schemes.clone(),
            consumes: self.config.consumes.clone(),
            produces: self.config.produces.clone(),
            securityDefinitions: self.security_definitions.clone(),
            security: self.security.clone(),
            tags: self.config.tags.clone(),
            externalDocs: self.config.external_docs.clone(),
            ..Default::default()
        };

        if self.endpoints.is_empty() {
            warn!("No endpoints registered, generating a document without paths");
            return swagger;
        }

        let responses = ResponseGenerator::new(DIALECT);
        for endpoint in &self.endpoints {
            if let Err(e) = endpoint.validate() {
                warn!("{}", e);
            }
            for requirement in &endpoint.security {
                if let Err(e) = validate_requirement(requirement, &self.security_definitions) {
                    warn!("{} {}: {}", endpoint.method, endpoint.path, e);
                }
            }

            // Definitions first so every reference below resolves
            let mut definitions = DefinitionGenerator::new(DIALECT, table)
                .with_recursive_pointer(self.options.recursive_pointer);
            for model in endpoint.models() {
                definitions.create_definition(model);
            }

            let operation = self.build_operation(endpoint, &responses);
            let item = swagger.paths.entry(endpoint.path.clone()).or_default();
            if item.insert(endpoint.method.key().to_string(), operation).is_some() {
                warn!("Duplicate operation {} {}, keeping the last one", endpoint.method, endpoint.path);
            }
            debug!("Added operation {} {}", endpoint.method, endpoint.path);
        }

        swagger.definitions = table.definitions().clone();
        info!(
            "Generated Swagger {} document with {} path(s) and {} definition(s)",
            SWAGGER_VERSION,
            swagger.paths.len(),
            swagger.definitions.len()
        );
        swagger
    }

    fn build_operation(&self, endpoint: &Endpoint, responses: &ResponseGenerator) -> Operation {
        let mut consumes = endpoint.consumes.clone();
        let has_form = endpoint.parameters.iter().any(|p| p.location == Location::Form);
        if has_form && !consumes.iter().any(|c| c == MULTIPART_FORM) {
            consumes.push(MULTIPART_FORM.to_string());
        }

        let mut parameters: Vec<Parameter> =
            endpoint.parameters.iter().map(render_parameter).collect();

        if let Some(body) = &endpoint.body {
            let schema = responses
                .generate(body)
                .unwrap_or_else(|| Schema::typed("object"));
            parameters.push(Parameter {
                name: "body".to_string(),
                in_type: "body".to_string(),
                description: endpoint.body_description.clone(),
                required: Some(true),
                schema: Some(schema),
                ..Default::default()
            });
        }

        let mut rendered = BTreeMap::new();
        for spec in endpoint.responses() {
            let response = Response {
                description: spec.description.clone(),
                schema: spec.model.as_ref().and_then(|m| responses.generate(m)),
                headers: spec
                    .headers
                    .iter()
                    .map(|(name, header)| {
                        (
                            name.clone(),
                            Header {
                                type_: header.param_type.as_str().to_string(),
                                description: header.description.clone(),
                            },
                        )
                    })
                    .collect(),
            };
            if rendered.insert(spec.code.to_string(), response).is_some() {
                warn!("{} {} declares status {} twice", endpoint.method, endpoint.path, spec.code);
            }
        }
        if rendered.is_empty() {
            warn!("{} {} declares no responses", endpoint.method, endpoint.path);
        }

        Operation {
            tags: endpoint.tags.clone(),
            summary: endpoint.summary.clone(),
            description: endpoint.description.clone(),
            operationId: endpoint.operation_id.clone(),
            consumes,
            produces: endpoint.produces.clone(),
            parameters,
            responses: rendered,
            deprecated: endpoint.deprecated.then_some(true),
            security: endpoint.security.clone(),
        }
    }
}

/// Wire form of a non-body parameter; the value is described inline
fn render_parameter(parameter: &EndpointParameter) -> Parameter {
    if parameter.location == Location::Cookie {
        warn!("Swagger 2.0 has no cookie parameters, rendering {} anyway", parameter.name);
    }
    if parameter.param_type == ParamType::File && parameter.location != Location::Form {
        warn!("File parameter {} must be a form field", parameter.name);
    }

    let mut value = parameter.schema();
    // Swagger 2.0 parameters have no `example`
    value.example = None;

    Parameter {
        name: parameter.name.clone(),
        in_type: parameter.location.as_str().to_string(),
        description: parameter.description.clone(),
        required: parameter.is_required().then_some(true),
        allowEmptyValue: parameter.allow_empty_value.then_some(true),
        collectionFormat: parameter.collection_format.map(|f| f.as_str().to_string()),
        value,
        schema: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        endpoint::CollectionFormat,
        reflect::{FieldDescriptor, Reflect, TypeDescriptor},
    };
    use pretty_assertions::assert_eq;
    use serde_json::json;

    struct Pet;

    impl Reflect for Pet {
        fn type_descriptor() -> TypeDescriptor {
            TypeDescriptor::structure(
                "models.Pet",
                vec![FieldDescriptor::of::<String>("Name").tag(r#"json:"name""#)],
            )
        }
    }

    fn to_json<T: serde::Serialize>(value: &T) -> serde_json::Value {
        serde_json::to_value(value).unwrap()
    }

    #[test]
    fn test_form_parameters_force_multipart() {
        let mut generator = Generator::new(DocumentConfig::default());
        generator.add_endpoint(
            Endpoint::post("/pets/{id}/photo")
                .parameter(EndpointParameter::path("id", ParamType::Integer))
                .parameter(EndpointParameter::file("photo").required(true))
                .consumes(&["application/json"])
                .success::<String>(200, "uploaded"),
        );

        let swagger = generator.generate();
        let operation = swagger.operation("/pets/{id}/photo", "post").unwrap();
        assert_eq!(operation.consumes, vec!["application/json", MULTIPART_FORM]);
        assert_eq!(
            to_json(&operation.parameters[1]),
            json!({"name": "photo", "in": "formData", "required": true, "type": "file"})
        );
        assert_eq!(to_json(&operation.responses["200"]), json!({"description": "uploaded", "schema": {"type": "string"}}));
    }

    #[test]
    fn test_body_parameter_carries_schema() {
        let mut generator = Generator::new(DocumentConfig::default());
        generator.add_endpoint(
            Endpoint::post("/pets")
                .body::<Vec<Pet>>("pets to add")
                .parameter(
                    EndpointParameter::query("tags", ParamType::String)
                        .array_of(ParamType::String, CollectionFormat::Csv),
                )
                .response(crate::endpoint::ResponseSpec::new(201, "created")),
        );

        let swagger = generator.generate();
        let operation = swagger.operation("/pets", "post").unwrap();
        assert_eq!(
            to_json(&operation.parameters),
            json!([
                {"name": "tags", "in": "query", "collectionFormat": "csv", "type": "array", "items": {"type": "string"}},
                {
                    "name": "body",
                    "in": "body",
                    "description": "pets to add",
                    "required": true,
                    "schema": {"type": "array", "items": {"$ref": "#/definitions/models.Pet"}}
                }
            ])
        );
        assert_eq!(to_json(&operation.responses["201"]), json!({"description": "created"}));
        assert!(swagger.definitions.contains_key("models.Pet"));
    }

    #[test]
    fn test_document_level_fields() {
        let config = DocumentConfig::new("Pets", "1.0")
            .with_host("pets.example.com")
            .with_base_path("/api")
            .with_schemes(&["https"]);
        let mut generator = Generator::new(config);
        generator.add_security_definition("basicAuth", SecurityDefinition::basic());
        let requirement: SecurityRequirement = [("basicAuth".to_string(), vec![])].into_iter().collect();
        generator.add_security_requirement(requirement).unwrap();
        let unknown: SecurityRequirement = [("jwt".to_string(), vec![])].into_iter().collect();
        assert!(generator.add_security_requirement(unknown).is_err());

        let value = to_json(&generator.generate());
        assert_eq!(value["swagger"], json!("2.0"));
        assert_eq!(value["host"], json!("pets.example.com"));
        assert_eq!(value["basePath"], json!("/api"));
        assert_eq!(value["schemes"], json!(["https"]));
        assert_eq!(value["paths"], json!({}));
        assert_eq!(value["securityDefinitions"], json!({"basicAuth": {"type": "basic"}}));
        assert_eq!(value["security"], json!([{"basicAuth": []}]));
        assert!(value.get("definitions").is_none());
    }
}
