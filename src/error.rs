use thiserror::Error;

use crate::{expression::ExpressionError, security::SecurityError};

/// Result type for document generation and export
pub type SwagResult<T> = Result<T, SwagError>;

#[derive(Error, Debug)]
pub enum SwagError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid field tag: {0}")]
    Tag(String),

    #[error(transparent)]
    Expression(#[from] ExpressionError),

    #[error(transparent)]
    Security(#[from] SecurityError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid endpoint {method} {path}: {reason}")]
    InvalidEndpoint {
        method: String,
        path: String,
        reason: String,
    },
}

impl SwagError {
    pub fn tag<T: ToString>(msg: T) -> Self {
        Self::Tag(msg.to_string())
    }

    pub fn config<T: ToString>(msg: T) -> Self {
        Self::Config(msg.to_string())
    }
}
