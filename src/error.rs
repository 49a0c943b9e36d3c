//! Error types for embedding_compare

use thiserror::Error;

/// Result type alias for embedding_compare operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while embedding or comparing texts
///
/// The `Display` output is the flat message shown to the user.
#[derive(Error, Debug)]
pub enum Error {
    #[error("{provider} API key is missing. Please set your API key in the model settings.")]
    ApiKey { provider: String },

    #[error("Error from {provider}: {message}")]
    Embedding { provider: String, message: String },

    #[error("Model not loaded: {0}")]
    ModelNotLoaded(String),

    #[error("Failed to load model: {0}")]
    ModelLoad(String),

    #[error("Vectors must have same dimension: {left} != {right}")]
    DimensionMismatch { left: usize, right: usize },

    #[error("Vectors must not be empty")]
    EmptyVector,

    #[error("Unknown model: {0}")]
    UnknownModel(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn api_key(provider: impl Into<String>) -> Self {
        Error::ApiKey {
            provider: provider.into(),
        }
    }

    pub fn embedding(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Embedding {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Provider the error came from, if it is provider-specific
    pub fn provider(&self) -> Option<&str> {
        match self {
            Error::ApiKey { provider } | Error::Embedding { provider, .. } => Some(provider),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_message() {
        let err = Error::api_key("Cohere");
        assert_eq!(
            err.to_string(),
            "Cohere API key is missing. Please set your API key in the model settings."
        );
        assert_eq!(err.provider(), Some("Cohere"));
    }

    #[test]
    fn test_embedding_message() {
        let err = Error::embedding("OpenAI", "rate limited");
        assert_eq!(err.to_string(), "Error from OpenAI: rate limited");
    }

    #[test]
    fn test_generic_errors_have_no_provider() {
        assert_eq!(Error::EmptyVector.provider(), None);
        assert_eq!(Error::UnknownModel("x".into()).provider(), None);
    }
}
