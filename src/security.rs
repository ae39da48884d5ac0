#![allow(non_snake_case)]

//! Security vocabularies of both dialects.
//!
//! Swagger 2.0 knows `basic`, `apiKey` and `oauth2` with a single flow name;
//! OpenAPI 3.0 knows `http` (basic, bearer, ...), `apiKey`, `oauth2` with
//! structured flows, and `openIdConnect`. Constructors validate their input.

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use url::Url;

/// Scheme name to the scopes an operation requires from it
pub type SecurityRequirement = HashMap<String, Vec<String>>;

/// RFC 7230 token, the syntax of an HTTP authentication scheme name
static AUTH_SCHEME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[!#$%&'*+\-.^_`|~0-9A-Za-z]+$").unwrap());

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SecurityError {
    #[error("Invalid HTTP authentication scheme {0:?}")]
    InvalidHttpScheme(String),

    #[error("Invalid API key location {0:?}")]
    InvalidApiKeyLocation(String),

    #[error("API key name must not be empty")]
    EmptyApiKeyName,

    #[error("OAuth2 flow {flow} requires {field}")]
    MissingUrl { flow: String, field: &'static str },

    #[error("Invalid URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Unknown OAuth2 flow {0:?}")]
    InvalidFlow(String),

    #[error("OAuth2 scheme must declare at least one flow")]
    EmptyFlows,

    #[error("Security requirement names unknown scheme {0:?}")]
    UnknownScheme(String),

    #[error("Scope {scope:?} is not declared by scheme {scheme:?}")]
    UndeclaredScope { scheme: String, scope: String },
}

fn checked_url(url: &str) -> Result<String, SecurityError> {
    Url::parse(url)
        .map(|_| url.to_string())
        .map_err(|e| SecurityError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })
}

fn required_url(url: Option<&str>, flow: &str, field: &'static str) -> Result<String, SecurityError> {
    match url {
        Some(url) => checked_url(url),
        None => Err(SecurityError::MissingUrl {
            flow: flow.to_string(),
            field,
        }),
    }
}

fn scope_map(scopes: &[(&str, &str)]) -> BTreeMap<String, String> {
    scopes
        .iter()
        .map(|(name, description)| (name.to_string(), description.to_string()))
        .collect()
}

/// A scheme that can tell whether a requirement may ask it for a scope
pub trait DeclaresScopes {
    fn declares_scope(&self, scope: &str) -> bool;
}

/// Check every scheme and scope named by `requirement` against the declared schemes
pub fn validate_requirement<S: DeclaresScopes>(
    requirement: &SecurityRequirement,
    schemes: &HashMap<String, S>,
) -> Result<(), SecurityError> {
    for (name, scopes) in requirement {
        let scheme = schemes
            .get(name)
            .ok_or_else(|| SecurityError::UnknownScheme(name.clone()))?;
        if let Some(scope) = scopes.iter().find(|s| !scheme.declares_scope(s)) {
            return Err(SecurityError::UndeclaredScope {
                scheme: name.clone(),
                scope: scope.clone(),
            });
        }
    }
    debug!("Security requirement {:?} is valid", requirement);
    Ok(())
}

/// Swagger 2.0 security definition
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SecurityDefinition {
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "in")]
    pub in_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorizationUrl: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokenUrl: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub scopes: BTreeMap<String, String>,
}

impl SecurityDefinition {
    fn of_type(type_: &str) -> Self {
        Self {
            type_: type_.to_string(),
            description: None,
            name: None,
            in_type: None,
            flow: None,
            authorizationUrl: None,
            tokenUrl: None,
            scopes: BTreeMap::new(),
        }
    }

    pub fn basic() -> Self {
        Self::of_type("basic")
    }

    /// API key sent in a `header` or `query` parameter
    pub fn api_key(name: &str, location: &str) -> Result<Self, SecurityError> {
        if name.is_empty() {
            return Err(SecurityError::EmptyApiKeyName);
        }
        if !matches!(location, "header" | "query") {
            return Err(SecurityError::InvalidApiKeyLocation(location.to_string()));
        }
        Ok(Self {
            name: Some(name.to_string()),
            in_type: Some(location.to_string()),
            ..Self::of_type("apiKey")
        })
    }

    /// OAuth2 with one of the `implicit`, `password`, `application` or
    /// `accessCode` flows, each requiring its own URLs
    pub fn oauth2(
        flow: &str,
        authorization_url: Option<&str>,
        token_url: Option<&str>,
        scopes: &[(&str, &str)],
    ) -> Result<Self, SecurityError> {
        let (authorizationUrl, tokenUrl) = match flow {
            "implicit" => (Some(required_url(authorization_url, flow, "authorizationUrl")?), None),
            "password" | "application" => (None, Some(required_url(token_url, flow, "tokenUrl")?)),
            "accessCode" => (
                Some(required_url(authorization_url, flow, "authorizationUrl")?),
                Some(required_url(token_url, flow, "tokenUrl")?),
            ),
            other => return Err(SecurityError::InvalidFlow(other.to_string())),
        };

        Ok(Self {
            flow: Some(flow.to_string()),
            authorizationUrl,
            tokenUrl,
            scopes: scope_map(scopes),
            ..Self::of_type("oauth2")
        })
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

impl DeclaresScopes for SecurityDefinition {
    fn declares_scope(&self, scope: &str) -> bool {
        self.type_ == "oauth2" && self.scopes.contains_key(scope)
    }
}

/// OpenAPI 3.0 security scheme
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SecurityScheme {
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "in")]
    pub in_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bearerFormat: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flows: Option<OAuthFlows>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openIdConnectUrl: Option<String>,
}

/// OAuth Flows Object
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct OAuthFlows {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub implicit: Option<OAuthFlow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<OAuthFlow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clientCredentials: Option<OAuthFlow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorizationCode: Option<OAuthFlow>,
}

impl OAuthFlows {
    pub fn is_empty(&self) -> bool {
        self.implicit.is_none()
            && self.password.is_none()
            && self.clientCredentials.is_none()
            && self.authorizationCode.is_none()
    }

    fn all(&self) -> impl Iterator<Item = &OAuthFlow> {
        [
            &self.implicit,
            &self.password,
            &self.clientCredentials,
            &self.authorizationCode,
        ]
        .into_iter()
        .flatten()
    }
}

/// OAuth Flow Object
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct OAuthFlow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorizationUrl: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokenUrl: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refreshUrl: Option<String>,
    pub scopes: BTreeMap<String, String>,
}

impl OAuthFlow {
    pub fn implicit(authorization_url: &str, scopes: &[(&str, &str)]) -> Result<Self, SecurityError> {
        Ok(Self {
            authorizationUrl: Some(checked_url(authorization_url)?),
            scopes: scope_map(scopes),
            ..Default::default()
        })
    }

    pub fn password(token_url: &str, scopes: &[(&str, &str)]) -> Result<Self, SecurityError> {
        Ok(Self {
            tokenUrl: Some(checked_url(token_url)?),
            scopes: scope_map(scopes),
            ..Default::default()
        })
    }

    pub fn client_credentials(token_url: &str, scopes: &[(&str, &str)]) -> Result<Self, SecurityError> {
        Self::password(token_url, scopes)
    }

    pub fn authorization_code(
        authorization_url: &str,
        token_url: &str,
        scopes: &[(&str, &str)],
    ) -> Result<Self, SecurityError> {
        Ok(Self {
            authorizationUrl: Some(checked_url(authorization_url)?),
            tokenUrl: Some(checked_url(token_url)?),
            scopes: scope_map(scopes),
            ..Default::default()
        })
    }

    pub fn with_refresh_url(mut self, refresh_url: &str) -> Result<Self, SecurityError> {
        self.refreshUrl = Some(checked_url(refresh_url)?);
        Ok(self)
    }
}

impl SecurityScheme {
    fn of_type(type_: &str) -> Self {
        Self {
            type_: type_.to_string(),
            description: None,
            name: None,
            in_type: None,
            scheme: None,
            bearerFormat: None,
            flows: None,
            openIdConnectUrl: None,
        }
    }

    pub fn basic() -> Self {
        Self {
            scheme: Some("basic".to_string()),
            ..Self::of_type("http")
        }
    }

    pub fn bearer(bearer_format: Option<&str>) -> Self {
        Self {
            scheme: Some("bearer".to_string()),
            bearerFormat: bearer_format.map(str::to_string),
            ..Self::of_type("http")
        }
    }

    /// Any HTTP authentication scheme registered with IANA, e.g. `digest`
    pub fn http(scheme: &str) -> Result<Self, SecurityError> {
        if !AUTH_SCHEME_REGEX.is_match(scheme) {
            return Err(SecurityError::InvalidHttpScheme(scheme.to_string()));
        }
        Ok(Self {
            scheme: Some(scheme.to_lowercase()),
            ..Self::of_type("http")
        })
    }

    /// API key sent in a `header`, `query` or `cookie` parameter
    pub fn api_key(name: &str, location: &str) -> Result<Self, SecurityError> {
        if name.is_empty() {
            return Err(SecurityError::EmptyApiKeyName);
        }
        if !matches!(location, "header" | "query" | "cookie") {
            return Err(SecurityError::InvalidApiKeyLocation(location.to_string()));
        }
        Ok(Self {
            name: Some(name.to_string()),
            in_type: Some(location.to_string()),
            ..Self::of_type("apiKey")
        })
    }

    pub fn oauth2(flows: OAuthFlows) -> Result<Self, SecurityError> {
        if flows.is_empty() {
            return Err(SecurityError::EmptyFlows);
        }
        Ok(Self {
            flows: Some(flows),
            ..Self::of_type("oauth2")
        })
    }

    pub fn open_id_connect(url: &str) -> Result<Self, SecurityError> {
        Ok(Self {
            openIdConnectUrl: Some(checked_url(url)?),
            ..Self::of_type("openIdConnect")
        })
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

impl DeclaresScopes for SecurityScheme {
    fn declares_scope(&self, scope: &str) -> bool {
        match self.type_.as_str() {
            "oauth2" => self
                .flows
                .as_ref()
                .map(|flows| flows.all().any(|flow| flow.scopes.contains_key(scope)))
                .unwrap_or(false),
            // Scopes come from the discovery document
            "openIdConnect" => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_v2_oauth2_flow_requirements() {
        let implicit = SecurityDefinition::oauth2(
            "implicit",
            Some("https://auth.example.com/authorize"),
            None,
            &[("read:pets", "read your pets")],
        )
        .unwrap();
        assert_eq!(
            serde_json::to_value(&implicit).unwrap(),
            json!({
                "type": "oauth2",
                "flow": "implicit",
                "authorizationUrl": "https://auth.example.com/authorize",
                "scopes": {"read:pets": "read your pets"}
            })
        );

        assert_eq!(
            SecurityDefinition::oauth2("accessCode", Some("https://a.example.com"), None, &[]),
            Err(SecurityError::MissingUrl {
                flow: "accessCode".into(),
                field: "tokenUrl"
            })
        );
        assert!(matches!(
            SecurityDefinition::oauth2("clientCredentials", None, Some("https://t.example.com"), &[]),
            Err(SecurityError::InvalidFlow(_))
        ));
        assert!(matches!(
            SecurityDefinition::oauth2("password", None, Some("not a url"), &[]),
            Err(SecurityError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_api_key_locations_per_dialect() {
        assert!(SecurityDefinition::api_key("X-API-Key", "header").is_ok());
        assert_eq!(
            SecurityDefinition::api_key("session", "cookie"),
            Err(SecurityError::InvalidApiKeyLocation("cookie".into()))
        );
        assert!(SecurityScheme::api_key("session", "cookie").is_ok());
        assert_eq!(SecurityScheme::api_key("", "header"), Err(SecurityError::EmptyApiKeyName));
    }

    #[test]
    fn test_http_schemes() {
        assert_eq!(
            serde_json::to_value(SecurityScheme::bearer(Some("JWT"))).unwrap(),
            json!({"type": "http", "scheme": "bearer", "bearerFormat": "JWT"})
        );
        assert_eq!(SecurityScheme::http("Digest").unwrap().scheme.as_deref(), Some("digest"));
        assert_eq!(
            SecurityScheme::http("not valid"),
            Err(SecurityError::InvalidHttpScheme("not valid".into()))
        );
    }

    #[test]
    fn test_v3_oauth2_and_openid() {
        assert_eq!(SecurityScheme::oauth2(OAuthFlows::default()), Err(SecurityError::EmptyFlows));

        let flows = OAuthFlows {
            clientCredentials: Some(
                OAuthFlow::client_credentials("https://auth.example.com/token", &[("admin", "admin access")])
                    .unwrap(),
            ),
            ..Default::default()
        };
        let scheme = SecurityScheme::oauth2(flows).unwrap();
        assert!(scheme.declares_scope("admin"));
        assert!(!scheme.declares_scope("write"));

        assert!(SecurityScheme::open_id_connect("https://auth.example.com/.well-known/openid-configuration").is_ok());
        assert!(SecurityScheme::open_id_connect("relative/path").is_err());
    }

    #[test]
    fn test_validate_requirement() {
        let mut schemes = HashMap::new();
        schemes.insert("basicAuth".to_string(), SecurityDefinition::basic());
        schemes.insert(
            "petAuth".to_string(),
            SecurityDefinition::oauth2("password", None, Some("https://t.example.com"), &[("read", "")]).unwrap(),
        );

        let ok: SecurityRequirement =
            [("petAuth".to_string(), vec!["read".to_string()])].into_iter().collect();
        assert_eq!(validate_requirement(&ok, &schemes), Ok(()));

        let unknown: SecurityRequirement = [("jwt".to_string(), vec![])].into_iter().collect();
        assert_eq!(
            validate_requirement(&unknown, &schemes),
            Err(SecurityError::UnknownScheme("jwt".into()))
        );

        let scoped_basic: SecurityRequirement =
            [("basicAuth".to_string(), vec!["read".to_string()])].into_iter().collect();
        assert!(matches!(
            validate_requirement(&scoped_basic, &schemes),
            Err(SecurityError::UndeclaredScope { .. })
        ));
    }
}
