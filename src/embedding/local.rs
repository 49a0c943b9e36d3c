//! Lifecycle wrapper around the in-process encoder
//!
//! The encoder starts `NotLoaded`, and a single `initialize` call moves it to
//! `Ready` or `Failed`. There is no way back: a failed load stays failed for
//! the rest of the session.

use super::Embedder;
use crate::{Error, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::future::Future;
use std::sync::Arc;

/// Observable load state of the local encoder
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EncoderStatus {
    NotLoaded,
    Loading,
    Ready,
    Failed(String),
}

enum EncoderState {
    NotLoaded,
    Loading,
    Ready(Arc<dyn Embedder>),
    Failed(String),
}

/// Local encoder slot shared between the registry and whoever loads it
pub struct LocalEncoder {
    name: String,
    declared_dimension: usize,
    state: RwLock<EncoderState>,
}

impl LocalEncoder {
    pub fn new(name: impl Into<String>, declared_dimension: usize) -> Self {
        LocalEncoder {
            name: name.into(),
            declared_dimension,
            state: RwLock::new(EncoderState::NotLoaded),
        }
    }

    pub fn status(&self) -> EncoderStatus {
        match &*self.state.read() {
            EncoderState::NotLoaded => EncoderStatus::NotLoaded,
            EncoderState::Loading => EncoderStatus::Loading,
            EncoderState::Ready(_) => EncoderStatus::Ready,
            EncoderState::Failed(message) => EncoderStatus::Failed(message.clone()),
        }
    }

    /// True once loading has finished, successfully or not
    pub fn is_settled(&self) -> bool {
        matches!(
            &*self.state.read(),
            EncoderState::Ready(_) | EncoderState::Failed(_)
        )
    }

    /// Run `loader` if and only if nothing has been loaded yet
    ///
    /// Subsequent calls return the current status without reloading.
    pub async fn initialize<F, Fut, E>(&self, loader: F) -> EncoderStatus
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<E>>,
        E: Embedder + 'static,
    {
        {
            let mut state = self.state.write();
            if !matches!(*state, EncoderState::NotLoaded) {
                drop(state);
                return self.status();
            }
            *state = EncoderState::Loading;
        }

        let next = match loader().await {
            Ok(embedder) => {
                if embedder.dimension() != self.declared_dimension {
                    tracing::warn!(
                        model = %self.name,
                        declared = self.declared_dimension,
                        actual = embedder.dimension(),
                        "local encoder dimension differs from declared dimension"
                    );
                }
                tracing::info!(model = %self.name, "local encoder ready");
                EncoderState::Ready(Arc::new(embedder))
            }
            Err(e) => {
                tracing::error!(model = %self.name, error = %e, "local encoder failed to load");
                EncoderState::Failed(e.to_string())
            }
        };

        *self.state.write() = next;
        self.status()
    }

    fn ready(&self) -> Result<Arc<dyn Embedder>> {
        match &*self.state.read() {
            EncoderState::Ready(embedder) => Ok(Arc::clone(embedder)),
            EncoderState::Failed(message) => Err(Error::ModelLoad(message.clone())),
            EncoderState::NotLoaded | EncoderState::Loading => {
                Err(Error::ModelNotLoaded(self.name.clone()))
            }
        }
    }
}

#[async_trait]
impl Embedder for LocalEncoder {
    fn dimension(&self) -> usize {
        match &*self.state.read() {
            EncoderState::Ready(embedder) => embedder.dimension(),
            _ => self.declared_dimension,
        }
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        // Clone the Arc so the lock is not held across the await
        let embedder = self.ready()?;
        embedder.embed(text).await
    }

    fn model_name(&self) -> &str {
        &self.name
    }

    fn is_loading(&self) -> bool {
        !self.is_settled()
    }
}
