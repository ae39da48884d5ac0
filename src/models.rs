#![allow(non_snake_case)]

//! Document pieces shared by the Swagger 2.0 and OpenAPI 3.0.3 models.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Information about the API
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Info {
    pub title: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub termsOfService: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<License>,
}

impl Info {
    pub fn new(title: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            version: version.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_terms_of_service(mut self, url: impl Into<String>) -> Self {
        self.termsOfService = Some(url.into());
        self
    }

    pub fn with_contact(mut self, contact: Contact) -> Self {
        self.contact = Some(contact);
        self
    }

    pub fn with_license(mut self, name: impl Into<String>, url: Option<String>) -> Self {
        self.license = Some(License {
            name: name.into(),
            url,
        });
        self
    }
}

/// Contact information for the API
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Contact {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// License information for the API
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct License {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// External documentation for the API
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct ExternalDocs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub url: String,
}

/// Tag used to group operations
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Tag {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub externalDocs: Option<ExternalDocs>,
}

impl Tag {
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        Self {
            name: name.into(),
            description,
            externalDocs: None,
        }
    }
}

/// Server entry of an OpenAPI 3.0 document
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Server {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "HashMap::is_empty", default)]
    pub variables: HashMap<String, ServerVariable>,
}

impl Server {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add a substitution variable for a `{name}` segment of the URL
    pub fn with_variable(mut self, name: impl Into<String>, variable: ServerVariable) -> Self {
        self.variables.insert(name.into(), variable);
        self
    }
}

/// Server variable for templated server URLs
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct ServerVariable {
    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty", default)]
    pub enum_values: Vec<String>,
    pub default: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ServerVariable {
    pub fn new(default: impl Into<String>) -> Self {
        Self {
            default: default.into(),
            ..Default::default()
        }
    }

    pub fn with_enum(mut self, values: &[&str]) -> Self {
        self.enum_values = values.iter().map(|v| v.to_string()).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_info_serializes_camel_case_fields() {
        let info = Info::new("Pet Store", "1.0.0")
            .with_terms_of_service("https://example.com/terms")
            .with_license("MIT", None);

        assert_eq!(
            serde_json::to_value(&info).unwrap(),
            json!({
                "title": "Pet Store",
                "version": "1.0.0",
                "termsOfService": "https://example.com/terms",
                "license": {"name": "MIT"}
            })
        );
    }

    #[test]
    fn test_server_variables() {
        let server = Server::new("https://{env}.example.com")
            .with_variable("env", ServerVariable::new("api").with_enum(&["api", "staging"]));

        assert_eq!(
            serde_json::to_value(&server).unwrap(),
            json!({
                "url": "https://{env}.example.com",
                "variables": {"env": {"enum": ["api", "staging"], "default": "api"}}
            })
        );
    }
}
