use log::{debug, info, warn};
use std::collections::{BTreeMap, HashMap};

use crate::{
    config::{DocumentConfig, GenerateOptions},
    definition::{DefinitionGenerator, DefinitionTable},
    endpoint::{Endpoint, Location, ParamType, Parameter as EndpointParameter, ResponseSpec},
    error::SwagResult,
    response::ResponseGenerator,
    schema::{Dialect, Schema},
    security::{validate_requirement, SecurityRequirement, SecurityScheme},
    v3::models::{
        Callbacks, Components, Header, MediaType, OpenAPI, Operation, Parameter, PathItem,
        RequestBody, Response,
    },
};

pub const OPENAPI_VERSION: &str = "3.0.3";
const MULTIPART_FORM: &str = "multipart/form-data";
const URLENCODED_FORM: &str = "application/x-www-form-urlencoded";
const DIALECT: Dialect = Dialect::OpenApi3;

fn is_form_mime(mime: &str) -> bool {
    mime == MULTIPART_FORM || mime == URLENCODED_FORM
}

/// Assembles an OpenAPI 3.0.3 document from registered endpoints
pub struct Generator {
    config: DocumentConfig,
    options: GenerateOptions,
    endpoints: Vec<Endpoint>,
    security_schemes: HashMap<String, SecurityScheme>,
    security: Vec<SecurityRequirement>,
}

impl Generator {
    /// Create a new Generator instance
    pub fn new(config: DocumentConfig) -> Self {
        Self {
            config,
            options: GenerateOptions::default(),
            endpoints: Vec::new(),
            security_schemes: HashMap::new(),
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

    pub fn add_security_scheme(&mut self, name: &str, scheme: SecurityScheme) -> &mut Self {
        self.security_schemes.insert(name.to_string(), scheme);
        self
    }

    /// Add a document-wide security requirement; it must name declared schemes and scopes
    pub fn add_security_requirement(&mut self, requirement: SecurityRequirement) -> SwagResult<&mut Self> {
        validate_requirement(&requirement, &self.security_schemes)?;
        self.security.push(requirement);
        Ok(self)
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    /// Build the document with a fresh schema table
    pub fn generate(&self) -> OpenAPI {
        let mut table = DefinitionTable::new();
        self.generate_with(&mut table)
    }

    /// Build the document, collecting component schemas into `table`
    pub fn generate_with(&self, table: &mut DefinitionTable) -> OpenAPI {
        let servers = if self.config.servers.is_empty() {
            self.config.derived_servers()
        } else {
            self.config.servers.clone()
        };

        let mut openapi = OpenAPI {
            openapi: OPENAPI_VERSION.to_string(),
            info: self.config.info.clone(),
            servers,
            security: self.security.clone(),
            tags: self.config.tags.clone(),
            externalDocs: self.config.external_docs.clone(),
            ..Default::default()
        };

        if self.endpoints.is_empty() {
            warn!("No endpoints registered, generating a document without paths");
        }

        let responses = ResponseGenerator::new(DIALECT);
        for endpoint in &self.endpoints {
            if let Err(e) = endpoint.validate() {
                warn!("{}", e);
            }
            for requirement in &endpoint.security {
                if let Err(e) = validate_requirement(requirement, &self.security_schemes) {
                    warn!("{} {}: {}", endpoint.method, endpoint.path, e);
                }
            }

            let mut definitions = DefinitionGenerator::new(DIALECT, table)
                .with_recursive_pointer(self.options.recursive_pointer);
            register_models(&mut definitions, endpoint);

            let operation = self.build_operation(endpoint, &responses);
            let item = openapi.paths.entry(endpoint.path.clone()).or_default();
            if item.set(endpoint.method, operation).is_some() {
                warn!("Duplicate operation {} {}, keeping the last one", endpoint.method, endpoint.path);
            }
            debug!("Added operation {} {}", endpoint.method, endpoint.path);
        }

        openapi.components = Components {
            schemas: table.definitions().clone(),
            securitySchemes: self.security_schemes.clone(),
        };
        info!(
            "Generated OpenAPI {} document with {} path(s) and {} schema(s)",
            OPENAPI_VERSION,
            openapi.paths.len(),
            openapi.components.schemas.len()
        );
        openapi
    }

    fn build_operation(&self, endpoint: &Endpoint, responses: &ResponseGenerator) -> Operation {
        let parameters = endpoint
            .parameters
            .iter()
            .filter(|p| p.location != Location::Form)
            .map(render_parameter)
            .collect();

        let mut rendered = BTreeMap::new();
        for spec in endpoint.responses() {
            let response = self.build_response(endpoint, spec, responses);
            if rendered.insert(spec.code.to_string(), response).is_some() {
                warn!("{} {} declares status {} twice", endpoint.method, endpoint.path, spec.code);
            }
        }
        if rendered.is_empty() {
            warn!("{} {} declares no responses", endpoint.method, endpoint.path);
        }

        let mut callbacks = Callbacks::new();
        for callback in &endpoint.callbacks {
            let mut item = PathItem::default();
            for inner in &callback.endpoints {
                item.set(inner.method, self.build_operation(inner, responses));
            }
            callbacks
                .entry(callback.name.clone())
                .or_default()
                .insert(callback.url.to_string(), item);
        }

        Operation {
            tags: endpoint.tags.clone(),
            summary: endpoint.summary.clone(),
            description: endpoint.description.clone(),
            operationId: endpoint.operation_id.clone(),
            parameters,
            requestBody: self.build_request_body(endpoint, responses),
            responses: rendered,
            callbacks,
            deprecated: endpoint.deprecated.then_some(true),
            security: endpoint.security.clone(),
        }
    }

    /// Body payload under each non-form MIME type, form fields folded into an
    /// object schema under the form MIME type
    fn build_request_body(&self, endpoint: &Endpoint, responses: &ResponseGenerator) -> Option<RequestBody> {
        let mut content = BTreeMap::new();

        if let Some(body) = &endpoint.body {
            let schema = responses
                .generate(body)
                .unwrap_or_else(|| Schema::typed("object"));
            let declared = if endpoint.consumes.is_empty() {
                &self.config.consumes
            } else {
                &endpoint.consumes
            };
            let mut mimes: Vec<&str> = declared
                .iter()
                .map(String::as_str)
                .filter(|m| !is_form_mime(m))
                .collect();
            if mimes.is_empty() {
                mimes.push(&self.options.default_mime);
            }
            for mime in mimes {
                content.insert(
                    mime.to_string(),
                    MediaType {
                        schema: Some(schema.clone()),
                    },
                );
            }
        }

        let fields: Vec<&EndpointParameter> = endpoint
            .parameters
            .iter()
            .filter(|p| p.location == Location::Form)
            .collect();
        if !fields.is_empty() {
            let has_file = fields.iter().any(|p| p.param_type == ParamType::File);
            let urlencoded = endpoint.consumes.iter().any(|m| m == URLENCODED_FORM);
            let mime = if urlencoded && !has_file {
                URLENCODED_FORM
            } else {
                MULTIPART_FORM
            };
            content.insert(
                mime.to_string(),
                MediaType {
                    schema: Some(form_schema(&fields)),
                },
            );
        }

        if content.is_empty() {
            return None;
        }
        Some(RequestBody {
            description: endpoint.body_description.clone(),
            content,
            required: Some(true),
        })
    }

    fn build_response(&self, endpoint: &Endpoint, spec: &ResponseSpec, responses: &ResponseGenerator) -> Response {
        let mut content = BTreeMap::new();
        if let Some(schema) = spec.model.as_ref().and_then(|m| responses.generate(m)) {
            let declared = if endpoint.produces.is_empty() {
                &self.config.produces
            } else {
                &endpoint.produces
            };
            if declared.is_empty() {
                content.insert(
                    self.options.default_mime.clone(),
                    MediaType { schema: Some(schema) },
                );
            } else {
                for mime in declared {
                    content.insert(
                        mime.clone(),
                        MediaType {
                            schema: Some(schema.clone()),
                        },
                    );
                }
            }
        }

        Response {
            description: spec.description.clone(),
            headers: spec
                .headers
                .iter()
                .map(|(name, header)| {
                    (
                        name.clone(),
                        Header {
                            description: header.description.clone(),
                            schema: Schema::typed(header.param_type.as_str()),
                        },
                    )
                })
                .collect(),
            content,
            links: spec.links.clone(),
        }
    }
}

/// Register the definitions of an endpoint's payloads and of its callbacks' payloads
fn register_models(definitions: &mut DefinitionGenerator<'_>, endpoint: &Endpoint) {
    for model in endpoint.models() {
        definitions.create_definition(model);
    }
    for callback in &endpoint.callbacks {
        for inner in &callback.endpoints {
            register_models(definitions, inner);
        }
    }
}

fn render_parameter(parameter: &EndpointParameter) -> Parameter {
    let mut schema = parameter.schema();
    let example = schema.example.take();

    let (style, explode) = match parameter.collection_format {
        Some(format) => match format.style() {
            Some((style, explode)) => (Some(style.to_string()), Some(explode)),
            None => {
                warn!(
                    "Collection format {} of {} has no OpenAPI 3.0 style",
                    format.as_str(),
                    parameter.name
                );
                (None, None)
            }
        },
        None => (None, None),
    };

    Parameter {
        name: parameter.name.clone(),
        in_type: parameter.location.as_str().to_string(),
        description: parameter.description.clone(),
        required: parameter.is_required().then_some(true),
        deprecated: parameter.deprecated.then_some(true),
        allowEmptyValue: parameter.allow_empty_value.then_some(true),
        style,
        explode,
        schema,
        example,
    }
}

fn form_schema(fields: &[&EndpointParameter]) -> Schema {
    let mut properties = BTreeMap::new();
    let mut required = Vec::new();
    for field in fields {
        let schema = if field.param_type == ParamType::File {
            Schema::file(DIALECT).with_description(field.description.clone())
        } else {
            field.schema().with_description(field.description.clone())
        };
        properties.insert(field.name.clone(), schema);
        if field.is_required() {
            required.push(field.name.clone());
        }
    }
    Schema::object(properties, required)
}
