use log::debug;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::{
    error::{SwagError, SwagResult},
    models::{Contact, ExternalDocs, Info, Server, Tag},
};

/// Default MIME type for request and response bodies
pub const DEFAULT_MIME: &str = "application/json";

/// Document-level settings shared by both dialects
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DocumentConfig {
    /// API information
    pub info: Info,

    /// Host (name or ip) serving the API, Swagger 2.0 only
    pub host: Option<String>,

    /// Base path relative to the host, Swagger 2.0 only
    pub base_path: Option<String>,

    /// Transfer protocols, e.g. `http`, `https`
    pub schemes: Vec<String>,

    /// Explicit servers for OpenAPI 3.0; derived from host/basePath/schemes when empty
    pub servers: Vec<Server>,

    /// Global tags for grouping operations
    pub tags: Vec<Tag>,

    /// External documentation
    pub external_docs: Option<ExternalDocs>,

    /// Default MIME types consumed by all operations
    pub consumes: Vec<String>,

    /// Default MIME types produced by all operations
    pub produces: Vec<String>,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            info: Info::new("API Documentation", "1.0.0"),
            host: None,
            base_path: None,
            schemes: Vec::new(),
            servers: Vec::new(),
            tags: Vec::new(),
            external_docs: None,
            consumes: Vec::new(),
            produces: Vec::new(),
        }
    }
}

impl DocumentConfig {
    /// Create a new configuration with custom API info
    pub fn new(title: &str, version: &str) -> Self {
        Self {
            info: Info::new(title, version),
            ..Default::default()
        }
    }

    /// Load a configuration from a `.json`, `.yaml` or `.yml` file
    pub fn from_file(path: impl AsRef<Path>) -> SwagResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        debug!("Loading document config from {:?}", path);

        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content),
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content),
            other => Err(SwagError::config(format!(
                "unsupported config extension {:?} for {:?}",
                other.unwrap_or(""),
                path
            ))),
        }
    }

    pub fn from_json_str(content: &str) -> SwagResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_yaml_str(content: &str) -> SwagResult<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.info.description = Some(description.to_string());
        self
    }

    pub fn with_contact(mut self, name: &str, url: Option<&str>, email: Option<&str>) -> Self {
        self.info.contact = Some(Contact {
            name: Some(name.to_string()),
            url: url.map(|s| s.to_string()),
            email: email.map(|s| s.to_string()),
        });
        self
    }

    pub fn with_host(mut self, host: &str) -> Self {
        self.host = Some(host.to_string());
        self
    }

    pub fn with_base_path(mut self, base_path: &str) -> Self {
        self.base_path = Some(base_path.to_string());
        self
    }

    pub fn with_schemes(mut self, schemes: &[&str]) -> Self {
        self.schemes = schemes.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Add a server configuration
    pub fn add_server(mut self, url: &str, description: Option<&str>) -> Self {
        let mut server = Server::new(url);
        server.description = description.map(|s| s.to_string());
        self.servers.push(server);
        self
    }

    /// Add a tag
    pub fn add_tag(mut self, name: &str, description: Option<&str>) -> Self {
        self.tags
            .push(Tag::new(name, description.map(|s| s.to_string())));
        self
    }

    pub fn with_external_docs(mut self, url: &str, description: Option<&str>) -> Self {
        self.external_docs = Some(ExternalDocs {
            url: url.to_string(),
            description: description.map(|s| s.to_string()),
        });
        self
    }

    pub fn with_consumes(mut self, mimes: &[&str]) -> Self {
        self.consumes = mimes.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_produces(mut self, mimes: &[&str]) -> Self {
        self.produces = mimes.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Servers derived from host, base path and schemes
    pub fn derived_servers(&self) -> Vec<Server> {
        let Some(host) = &self.host else {
            return Vec::new();
        };
        let base_path = self.base_path.as_deref().unwrap_or("");
        let schemes: Vec<&str> = if self.schemes.is_empty() {
            vec!["http"]
        } else {
            self.schemes.iter().map(String::as_str).collect()
        };

        schemes
            .into_iter()
            .map(|scheme| Server::new(format!("{}://{}{}", scheme, host, base_path)))
            .collect()
    }
}

/// How a pointer field that refers back to its owning type is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecursivePointer {
    /// `{example: "Recursive Type: <Name>"}`
    #[default]
    Placeholder,
    /// `$ref` to the owning definition
    Reference,
}

/// Knobs for one document-generation pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateOptions {
    pub recursive_pointer: RecursivePointer,
    /// MIME type used when an endpoint declares none
    pub default_mime: String,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            recursive_pointer: RecursivePointer::default(),
            default_mime: DEFAULT_MIME.to_string(),
        }
    }
}

impl GenerateOptions {
    pub fn with_recursive_pointer(mut self, mode: RecursivePointer) -> Self {
        self.recursive_pointer = mode;
        self
    }

    pub fn with_default_mime(mut self, mime: &str) -> Self {
        self.default_mime = mime.to_string();
        self
    }
}
