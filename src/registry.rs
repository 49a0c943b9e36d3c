//! Static table of comparable embedding models

use crate::config::Settings;
use crate::credentials::CredentialSet;
use crate::embedding::{ApiEmbedder, ApiProvider, Embedder, LocalEncoder, DEFAULT_LOCAL_MODEL};
use crate::{Error, Result};
use serde::Serialize;
use std::cmp::Ordering;
use std::sync::Arc;

/// Identifier of the in-process encoder entry
pub const LOCAL_MODEL_ID: &str = "local";

/// Descriptive metadata for one model
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ModelDescriptor {
    pub id: String,
    pub name: String,
    pub description: String,
    pub dimensions: usize,
    pub provider: String,
    pub is_open_source: bool,
    pub requires_api_key: bool,
    pub mteb_score: Option<f32>,
    pub max_tokens: Option<usize>,
    pub languages: Vec<String>,
    pub cost_per_million: Option<f32>,
    pub specialties: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// A descriptor paired with the embedder that serves it
#[derive(Clone)]
pub struct RegisteredModel {
    pub descriptor: ModelDescriptor,
    pub embedder: Arc<dyn Embedder>,
}

impl RegisteredModel {
    /// Descriptor with the dimension reported by the live embedder
    pub fn current_descriptor(&self) -> ModelDescriptor {
        ModelDescriptor {
            dimensions: self.embedder.dimension(),
            ..self.descriptor.clone()
        }
    }
}

/// Ordered collection of models, looked up by id
#[derive(Clone, Default)]
pub struct Registry {
    models: Vec<RegisteredModel>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stock registry: the local encoder plus the OpenAI and Cohere models
    pub fn standard(
        settings: &Settings,
        credentials: &CredentialSet,
        local: Arc<LocalEncoder>,
    ) -> Self {
        let mut registry = Registry::new();
        registry.register(local_descriptor(&settings.local_model), local);

        for (descriptor, provider, api_model) in remote_models() {
            let embedder = ApiEmbedder::with_base_url(
                provider,
                api_model,
                descriptor.dimensions,
                credentials.clone(),
                settings.base_url(provider),
            );
            registry.register(descriptor, Arc::new(embedder));
        }

        registry
    }

    /// Add a model; an existing entry with the same id is replaced in place
    pub fn register(&mut self, descriptor: ModelDescriptor, embedder: Arc<dyn Embedder>) {
        let entry = RegisteredModel {
            descriptor,
            embedder,
        };
        match self
            .models
            .iter_mut()
            .find(|m| m.descriptor.id == entry.descriptor.id)
        {
            Some(existing) => *existing = entry,
            None => self.models.push(entry),
        }
    }

    pub fn get(&self, id: &str) -> Option<&RegisteredModel> {
        self.models.iter().find(|m| m.descriptor.id == id)
    }

    pub fn resolve(&self, id: &str) -> Result<&RegisteredModel> {
        self.get(id).ok_or_else(|| Error::UnknownModel(id.to_string()))
    }

    pub fn ids(&self) -> Vec<&str> {
        self.models.iter().map(|m| m.descriptor.id.as_str()).collect()
    }

    pub fn descriptors(&self) -> Vec<ModelDescriptor> {
        self.models.iter().map(|m| m.current_descriptor()).collect()
    }

    /// Descriptors sorted by MTEB score, best first; unscored models last
    pub fn leaderboard(&self) -> Vec<ModelDescriptor> {
        let mut descriptors = self.descriptors();
        descriptors.sort_by(|a, b| {
            let a = a.mteb_score.unwrap_or(0.0);
            let b = b.mteb_score.unwrap_or(0.0);
            b.partial_cmp(&a).unwrap_or(Ordering::Equal)
        });
        descriptors
    }
}

/// Descriptor for the in-process encoder running `model_name`
pub fn local_descriptor(model_name: &str) -> ModelDescriptor {
    let known = model_name == DEFAULT_LOCAL_MODEL;
    ModelDescriptor {
        id: LOCAL_MODEL_ID.to_string(),
        name: format!("Local encoder ({})", model_name),
        description: "Sentence encoder run in-process with candle; no API key needed".to_string(),
        dimensions: if known { 384 } else { 0 },
        provider: "Local".to_string(),
        is_open_source: true,
        requires_api_key: false,
        mteb_score: known.then_some(56.26),
        max_tokens: Some(512),
        languages: strings(&["English"]),
        cost_per_million: None,
        specialties: strings(&["General Purpose", "Semantic Similarity", "Offline"]),
    }
}

fn remote_models() -> Vec<(ModelDescriptor, ApiProvider, &'static str)> {
    vec![
        (
            ModelDescriptor {
                id: "text-embedding-3-small".to_string(),
                name: "OpenAI text-embedding-3-small".to_string(),
                description: "OpenAI's small text embedding model with 1536-dimensional vectors"
                    .to_string(),
                dimensions: 1536,
                provider: "OpenAI".to_string(),
                is_open_source: false,
                requires_api_key: true,
                mteb_score: Some(63.5),
                max_tokens: Some(8191),
                languages: strings(&["Multilingual"]),
                cost_per_million: Some(0.02),
                specialties: strings(&["General Purpose", "Cross-lingual Understanding"]),
            },
            ApiProvider::OpenAI,
            "text-embedding-3-small",
        ),
        (
            ModelDescriptor {
                id: "text-embedding-3-large".to_string(),
                name: "OpenAI text-embedding-3-large".to_string(),
                description: "OpenAI's large text embedding model with 3072-dimensional vectors"
                    .to_string(),
                dimensions: 3072,
                provider: "OpenAI".to_string(),
                is_open_source: false,
                requires_api_key: true,
                mteb_score: Some(64.2),
                max_tokens: Some(8191),
                languages: strings(&["Multilingual"]),
                cost_per_million: Some(0.13),
                specialties: strings(&[
                    "General Purpose",
                    "High Accuracy",
                    "Cross-lingual Understanding",
                ]),
            },
            ApiProvider::OpenAI,
            "text-embedding-3-large",
        ),
        (
            ModelDescriptor {
                id: "text-embedding-ada-002".to_string(),
                name: "OpenAI text-embedding-ada-002".to_string(),
                description: "OpenAI's legacy text embedding model with 1536-dimensional vectors"
                    .to_string(),
                dimensions: 1536,
                provider: "OpenAI".to_string(),
                is_open_source: false,
                requires_api_key: true,
                mteb_score: Some(60.9),
                max_tokens: Some(8191),
                languages: strings(&["Multilingual"]),
                cost_per_million: Some(0.1),
                specialties: strings(&["General Purpose", "Legacy Support"]),
            },
            ApiProvider::OpenAI,
            "text-embedding-ada-002",
        ),
        (
            ModelDescriptor {
                id: "cohere-embed-v3".to_string(),
                name: "Cohere Embed v3".to_string(),
                description: "Cohere's multilingual embedding model".to_string(),
                dimensions: 1024,
                provider: "Cohere".to_string(),
                is_open_source: false,
                requires_api_key: true,
                mteb_score: Some(65.8),
                max_tokens: Some(512),
                languages: strings(&["Multilingual (100+ languages)"]),
                cost_per_million: Some(0.15),
                specialties: strings(&[
                    "Multilingual",
                    "Cross-lingual Understanding",
                    "Technical Documentation",
                ]),
            },
            ApiProvider::Cohere,
            "embed-multilingual-v3.0",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::MockEmbedder;

    fn standard() -> Registry {
        let local = Arc::new(LocalEncoder::new(DEFAULT_LOCAL_MODEL, 384));
        Registry::standard(&Settings::default(), &CredentialSet::new(), local)
    }

    #[test]
    fn test_standard_registry_order() {
        let registry = standard();
        assert_eq!(
            registry.ids(),
            vec![
                "local",
                "text-embedding-3-small",
                "text-embedding-3-large",
                "text-embedding-ada-002",
                "cohere-embed-v3"
            ]
        );
    }

    #[test]
    fn test_resolve_unknown() {
        let registry = standard();
        assert!(registry.resolve("cohere-embed-v3").is_ok());
        assert!(matches!(
            registry.resolve("nope"),
            Err(Error::UnknownModel(ref id)) if id == "nope"
        ));
    }

    #[test]
    fn test_leaderboard_sorted_by_mteb() {
        let leaderboard = standard().leaderboard();
        assert_eq!(leaderboard[0].id, "cohere-embed-v3");
        assert_eq!(leaderboard.last().unwrap().id, LOCAL_MODEL_ID);
        for pair in leaderboard.windows(2) {
            assert!(pair[0].mteb_score.unwrap_or(0.0) >= pair[1].mteb_score.unwrap_or(0.0));
        }
    }

    #[test]
    fn test_register_replaces_existing_id() {
        let mut registry = standard();
        let count = registry.ids().len();
        registry.register(
            local_descriptor("mock"),
            Arc::new(MockEmbedder::new(512)),
        );
        assert_eq!(registry.ids().len(), count);
        let local = registry.get(LOCAL_MODEL_ID).unwrap();
        assert_eq!(local.current_descriptor().dimensions, 512);
        assert_eq!(local.descriptor.mteb_score, None);
    }

    #[test]
    fn test_remote_models_require_keys() {
        for descriptor in standard().descriptors() {
            assert_eq!(descriptor.requires_api_key, descriptor.provider != "Local");
        }
    }
}
