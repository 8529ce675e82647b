//! Error types for the suite runner

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SuiteError {
    #[error("Scenario spec parse error: {0}")]
    SpecParse(String),

    #[error("Scenario not found: {0}")]
    ScenarioNotFound(String),

    #[error("Scenario directory not found: {0}")]
    ScenarioDirMissing(String),

    #[error(transparent)]
    Check(#[from] gatecheck_common::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, SuiteError>;
