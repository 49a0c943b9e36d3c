//! API-based embedder for external providers
//!
//! Supports OpenAI and Cohere embedding APIs. Keys are read from the shared
//! [`CredentialSet`] on every call, so a key set mid-session takes effect
//! immediately.

use super::Embedder;
use crate::credentials::CredentialSet;
use crate::{Error, Result};
use async_trait::async_trait;

#[cfg(feature = "api-embeddings")]
use {
    reqwest::{Client, StatusCode},
    serde::{Deserialize, Serialize},
};

/// API provider type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiProvider {
    /// OpenAI (text-embedding-3-small, text-embedding-3-large, text-embedding-ada-002)
    OpenAI,
    /// Cohere (embed-multilingual-v3.0)
    Cohere,
}

impl ApiProvider {
    /// Get the default API base URL for this provider
    pub fn default_base_url(&self) -> &'static str {
        match self {
            ApiProvider::OpenAI => "https://api.openai.com/v1",
            ApiProvider::Cohere => "https://api.cohere.com/v1",
        }
    }

    /// Get the default environment variable name for API key
    pub fn env_var_name(&self) -> &'static str {
        match self {
            ApiProvider::OpenAI => "OPENAI_API_KEY",
            ApiProvider::Cohere => "COHERE_API_KEY",
        }
    }

    /// Key under which the credential is stored in a [`CredentialSet`]
    pub fn credential_key(&self) -> &'static str {
        match self {
            ApiProvider::OpenAI => "openai",
            ApiProvider::Cohere => "cohere",
        }
    }

    /// Human-readable provider name used in error messages
    pub fn display_name(&self) -> &'static str {
        match self {
            ApiProvider::OpenAI => "OpenAI",
            ApiProvider::Cohere => "Cohere",
        }
    }

    pub fn all() -> [ApiProvider; 2] {
        [ApiProvider::OpenAI, ApiProvider::Cohere]
    }
}

/// API embedder that calls external embedding services
///
/// # Example
/// ```no_run
/// use embedding_compare::credentials::CredentialSet;
/// use embedding_compare::embedding::{ApiEmbedder, ApiProvider, Embedder};
///
/// # async fn run() -> embedding_compare::Result<()> {
/// let credentials = CredentialSet::new();
/// credentials.set("openai", "sk-...");
///
/// let embedder = ApiEmbedder::new(
///     ApiProvider::OpenAI,
///     "text-embedding-3-small",
///     1536,
///     credentials,
/// );
/// let vector = embedder.embed("Hello, world!").await?;
/// assert_eq!(vector.len(), 1536);
/// # Ok(())
/// # }
/// ```
pub struct ApiEmbedder {
    provider: ApiProvider,
    model_name: String,
    dimension: usize,
    credentials: CredentialSet,
    #[cfg_attr(not(feature = "api-embeddings"), allow(dead_code))]
    base_url: String,
    #[cfg(feature = "api-embeddings")]
    client: Client,
}

#[cfg(feature = "api-embeddings")]
#[derive(Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    input: &'a str,
    encoding_format: &'static str,
}

#[cfg(feature = "api-embeddings")]
#[derive(Deserialize)]
struct OpenAIResponse {
    data: Vec<OpenAIEmbedding>,
}

#[cfg(feature = "api-embeddings")]
#[derive(Deserialize)]
struct OpenAIEmbedding {
    embedding: Vec<f32>,
}

#[cfg(feature = "api-embeddings")]
#[derive(Serialize)]
struct CohereRequest<'a> {
    texts: [&'a str; 1],
    model: &'a str,
    input_type: &'static str,
}

#[cfg(feature = "api-embeddings")]
#[derive(Deserialize)]
struct CohereResponse {
    #[serde(default)]
    embeddings: Vec<Vec<f32>>,
}

/// Error payload shape shared by both providers
#[cfg(feature = "api-embeddings")]
#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<ErrorDetail>,
}

#[cfg(feature = "api-embeddings")]
#[derive(Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}

impl ApiEmbedder {
    /// Create a new API embedder for the provider's default endpoint
    pub fn new(
        provider: ApiProvider,
        model_name: &str,
        dimension: usize,
        credentials: CredentialSet,
    ) -> Self {
        Self::with_base_url(
            provider,
            model_name,
            dimension,
            credentials,
            provider.default_base_url(),
        )
    }

    /// Create a new API embedder against a custom base URL (proxies, tests)
    pub fn with_base_url(
        provider: ApiProvider,
        model_name: &str,
        dimension: usize,
        credentials: CredentialSet,
        base_url: &str,
    ) -> Self {
        ApiEmbedder {
            provider,
            model_name: model_name.to_string(),
            dimension,
            credentials,
            base_url: base_url.trim_end_matches('/').to_string(),
            #[cfg(feature = "api-embeddings")]
            client: Client::new(),
        }
    }

    pub fn provider(&self) -> ApiProvider {
        self.provider
    }

    fn api_key(&self) -> Result<String> {
        self.credentials
            .get(self.provider.credential_key())
            .ok_or_else(|| Error::api_key(self.provider.display_name()))
    }

    #[cfg(feature = "api-embeddings")]
    fn fail(&self, message: impl Into<String>) -> Error {
        Error::embedding(self.provider.display_name(), message)
    }

    #[cfg(feature = "api-embeddings")]
    async fn post<T: Serialize + ?Sized>(
        &self,
        path: &str,
        api_key: &str,
        body: &T,
    ) -> Result<reqwest::Response> {
        let url = format!("{}/{}", self.base_url, path);
        tracing::debug!(provider = self.provider.display_name(), model = %self.model_name, %url, "embedding request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| self.fail(format!("API request failed: {}", e)))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(Error::api_key(self.provider.display_name()));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.message.or_else(|| b.error.and_then(|d| d.message)))
                .unwrap_or_else(|| format!("HTTP error! status: {}", status.as_u16()));
            tracing::warn!(provider = self.provider.display_name(), status = status.as_u16(), "embedding request rejected");
            return Err(self.fail(message));
        }

        Ok(response)
    }

    /// Call OpenAI embeddings API
    #[cfg(feature = "api-embeddings")]
    async fn call_openai_api(&self, api_key: &str, text: &str) -> Result<Vec<f32>> {
        let request = OpenAIRequest {
            model: &self.model_name,
            input: text,
            encoding_format: "float",
        };

        let response: OpenAIResponse = self
            .post("embeddings", api_key, &request)
            .await?
            .json()
            .await
            .map_err(|e| self.fail(format!("Failed to parse response: {}", e)))?;

        response
            .data
            .into_iter()
            .next()
            .map(|e| e.embedding)
            .ok_or_else(|| self.fail("No embedding returned from API"))
    }

    /// Call Cohere embed API
    #[cfg(feature = "api-embeddings")]
    async fn call_cohere_api(&self, api_key: &str, text: &str) -> Result<Vec<f32>> {
        let request = CohereRequest {
            texts: [text],
            model: &self.model_name,
            input_type: "search_document",
        };

        let response: CohereResponse = self
            .post("embed", api_key, &request)
            .await?
            .json()
            .await
            .map_err(|e| self.fail(format!("Failed to parse response: {}", e)))?;

        response
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| self.fail("Invalid response format from Cohere API"))
    }
}

#[async_trait]
impl Embedder for ApiEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    #[cfg(feature = "api-embeddings")]
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let api_key = self.api_key()?;
        match self.provider {
            ApiProvider::OpenAI => self.call_openai_api(&api_key, text).await,
            ApiProvider::Cohere => self.call_cohere_api(&api_key, text).await,
        }
    }

    #[cfg(not(feature = "api-embeddings"))]
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        self.api_key()?;
        Err(Error::embedding(
            self.provider.display_name(),
            "API embeddings feature not enabled. Compile with --features api-embeddings",
        ))
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
