//! Embedding trait definition

use crate::Result;
use async_trait::async_trait;
use std::time::{Duration, Instant};

/// An embedding together with how long it took to produce
#[derive(Clone, Debug, PartialEq)]
pub struct TimedEmbedding {
    pub vector: Vec<f32>,
    pub elapsed: Duration,
}

/// Trait for generating embeddings from text
///
/// Implementations can use:
/// - Local models run in-process with candle
/// - Remote APIs (OpenAI, Cohere)
/// - Mock implementations for testing
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Declared embedding dimension
    fn dimension(&self) -> usize;

    /// Generate an embedding for the given text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate an embedding and measure the wall-clock time of the call
    async fn embed_timed(&self, text: &str) -> Result<TimedEmbedding> {
        let start = Instant::now();
        let vector = self.embed(text).await?;
        Ok(TimedEmbedding {
            vector,
            elapsed: start.elapsed(),
        })
    }

    /// Get the model name/identifier
    fn model_name(&self) -> &str;

    /// True while the model is still being loaded and cannot answer yet
    fn is_loading(&self) -> bool {
        false
    }
}
