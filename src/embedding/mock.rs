//! Mock embedder for testing

use super::Embedder;
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

/// A mock embedder that generates deterministic embeddings based on text hash
///
/// Useful for testing without requiring an actual embedding model.
/// The embeddings are deterministic: same text → same embedding.
/// Builder methods inject failures, fixed vectors, or latency.
#[derive(Clone, Debug)]
pub struct MockEmbedder {
    name: String,
    dimension: usize,
    failure: Option<(String, String)>,
    fixed: HashMap<String, Vec<f32>>,
    delay: Option<Duration>,
}

impl MockEmbedder {
    /// Create a new mock embedder with the specified dimension
    pub fn new(dimension: usize) -> Self {
        MockEmbedder {
            name: "mock-embedder".to_string(),
            dimension,
            failure: None,
            fixed: HashMap::new(),
            delay: None,
        }
    }

    /// Create a mock embedder with default dimension (512)
    pub fn default_dimension() -> Self {
        Self::new(512)
    }

    /// Make every embed call fail with an `Embedding` error from `provider`
    pub fn failing(mut self, provider: impl Into<String>, message: impl Into<String>) -> Self {
        self.failure = Some((provider.into(), message.into()));
        self
    }

    /// Return `vector` verbatim whenever `text` is embedded
    pub fn with_vector(mut self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        self.fixed.insert(text.into(), vector);
        self
    }

    /// Sleep before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn hashed_embedding(&self, text: &str) -> Vec<f32> {
        // Use BLAKE3 to generate deterministic pseudo-random values
        let mut block = *blake3::hash(text.as_bytes()).as_bytes();
        let mut embedding = Vec::with_capacity(self.dimension);

        for i in 0..self.dimension {
            let byte_index = i % 32;
            if byte_index == 0 && i > 0 {
                block = *blake3::hash(&block).as_bytes();
            }
            // Map byte to [-1, 1]
            embedding.push((block[byte_index] as f32 / 127.5) - 1.0);
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            embedding.iter_mut().for_each(|v| *v /= norm);
        }

        embedding
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::default_dimension()
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some((provider, message)) = &self.failure {
            return Err(Error::embedding(provider.as_str(), message.as_str()));
        }

        if let Some(vector) = self.fixed.get(text) {
            return Ok(vector.clone());
        }

        Ok(self.hashed_embedding(text))
    }

    fn model_name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::cosine_similarity;

    #[tokio::test]
    async fn test_mock_embedder_dimension() {
        let embedder = MockEmbedder::new(128);
        assert_eq!(embedder.dimension(), 128);

        let embedding = embedder.embed("test").await.unwrap();
        assert_eq!(embedding.len(), 128);
    }

    #[tokio::test]
    async fn test_mock_embedder_deterministic() {
        let embedder = MockEmbedder::default();

        let e1 = embedder.embed("hello world").await.unwrap();
        let e2 = embedder.embed("hello world").await.unwrap();

        assert_eq!(e1, e2);
        assert!((cosine_similarity(&e1, &e2).unwrap() - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_mock_embedder_different_texts() {
        let embedder = MockEmbedder::default();

        let e1 = embedder.embed("hello").await.unwrap();
        let e2 = embedder.embed("world").await.unwrap();

        assert_ne!(e1, e2);
    }

    #[tokio::test]
    async fn test_mock_embedder_normalized() {
        let embedder = MockEmbedder::default();
        let embedding = embedder.embed("test").await.unwrap();

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_mock_embedder_failure() {
        let embedder = MockEmbedder::new(8).failing("OpenAI", "boom");
        let err = embedder.embed("anything").await.unwrap_err();
        assert_eq!(err.to_string(), "Error from OpenAI: boom");
    }

    #[tokio::test]
    async fn test_mock_embedder_fixed_vector() {
        let embedder = MockEmbedder::new(3).with_vector("short", vec![1.0, 0.0]);
        assert_eq!(embedder.embed("short").await.unwrap(), vec![1.0, 0.0]);
        assert_eq!(embedder.embed("other").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_embed_timed_measures() {
        let embedder = MockEmbedder::new(4).with_delay(Duration::from_millis(20));
        let timed = embedder.embed_timed("x").await.unwrap();
        assert_eq!(timed.vector.len(), 4);
        assert!(timed.elapsed >= Duration::from_millis(20));
    }
}
