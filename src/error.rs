//! Error types for casting and serializing models

use serde_json::Value;
use thiserror::Error;

use crate::scalar::ScalarError;

/// Result type for model operations
pub type Result<T> = std::result::Result<T, ModelError>;

/// Model casting and registry errors
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Cast error: cannot cast {value} into {target}; accepted inputs are {accepted}")]
    Cast {
        value: Value,
        target: String,
        accepted: &'static str,
    },

    #[error("Resolution error: resolver returned {value}, which does not denote a registered schema")]
    Resolution { value: Value },

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Scalar(#[from] ScalarError),

    #[error("Schema not found: {name}")]
    NotFound { name: String },

    #[error("Schema already exists: {name}")]
    AlreadyExists { name: String },

    #[error("Invalid schema format: {0}")]
    InvalidFormat(String),

    #[error("Unknown attribute: {schema} does not declare {attribute}")]
    UnknownAttribute { schema: String, attribute: String },
}

impl ModelError {
    /// Whether this error came out of scalar coercion
    pub fn is_scalar(&self) -> bool {
        matches!(self, ModelError::Scalar(_))
    }
}
