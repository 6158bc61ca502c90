use crate::models::ModelStage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Registry returned {status} ({error_code}): {message}")]
    Api {
        status: u16,
        error_code: String,
        message: String,
    },

    #[error("Malformed response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("No version of model '{name}' in stage '{stage}'")]
    NoVersionInStage { name: String, stage: ModelStage },

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Invalid tracking URI: {0}")]
    InvalidUri(String),

    #[error("Unsupported artifact URI: {0}")]
    UnsupportedArtifactUri(String),
}

impl RegistryError {
    /// MLflow error code for API failures, e.g. `RESOURCE_DOES_NOT_EXIST`.
    pub fn error_code(&self) -> Option<&str> {
        match self {
            RegistryError::Api { error_code, .. } => Some(error_code),
            _ => None,
        }
    }
}
