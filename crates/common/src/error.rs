//! Error types for gatecheck

use thiserror::Error;

use crate::assertions::AssertionFailure;

/// Result type alias using the gatecheck Error
pub type Result<T> = std::result::Result<T, Error>;

/// gatecheck error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("Unexpected response shape: {0}")]
    Shape(String),

    #[error("Expected status code {expected}, got {actual}. Response: {body}")]
    StatusMismatch {
        expected: u16,
        actual: u16,
        body: String,
    },

    #[error("Response body is not a JSON object: found {found}")]
    MalformedBody { found: String },

    #[error("Missing required keys in response: {missing:?}. Available keys: {available:?}")]
    MissingKeys {
        missing: Vec<String>,
        available: Vec<String>,
    },

    #[error("Missing distance fields: {missing:?}")]
    MissingDistanceFields { missing: Vec<String> },

    #[error("Field '{field}' is not numeric: {value}")]
    Coercion { field: String, value: String },

    #[error(transparent)]
    Assertion(#[from] AssertionFailure),

    #[error("Missing required entities: {missing:?}. Available: {available:?}")]
    MissingEntities {
        missing: Vec<String>,
        available: Vec<String>,
    },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    #[error("Fixture key '{key}' not found in {file}. Available: {available:?}")]
    MissingFixture {
        file: String,
        key: String,
        available: Vec<String>,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Coarse category used in diagnostics and logs
    pub fn category(&self) -> &'static str {
        match self {
            Error::Shape(_)
            | Error::StatusMismatch { .. }
            | Error::MalformedBody { .. }
            | Error::MissingKeys { .. } => "ShapeError",
            Error::MissingDistanceFields { .. } | Error::Coercion { .. } => "FieldError",
            Error::Assertion(_) | Error::MissingEntities { .. } => "ComparisonFailure",
            Error::Transport(_) | Error::UnsupportedMethod(_) => "TransportError",
            Error::MissingFixture { .. }
            | Error::InvalidConfig(_)
            | Error::Io(_)
            | Error::Json(_)
            | Error::Yaml(_)
            | Error::Toml(_) => "ConfigError",
        }
    }

    /// Whether this error is a failed verification rather than a broken run
    pub fn is_verification_failure(&self) -> bool {
        matches!(
            self.category(),
            "ShapeError" | "FieldError" | "ComparisonFailure"
        )
    }
}
