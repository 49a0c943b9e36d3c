//! A comparison session: the single owner of credentials, the registry,
//! the local encoder and the latest result list.
//!
//! Each `compare` call takes a run token. When a newer run starts before an
//! older one finishes, the older run's results are discarded on arrival.

use crate::config::Settings;
use crate::credentials::CredentialSet;
use crate::embedding::{ApiProvider, EncoderStatus, HFEmbedder, LocalEncoder};
use crate::pipeline::{self, ComparisonRequest, ComparisonResult, ModelOutcome, Skipped};
use crate::registry::{local_descriptor, ModelDescriptor, Registry};
use crate::Result;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// What happened to a comparison request
#[derive(Debug)]
pub enum RunOutcome<T> {
    /// Preconditions were not met; nothing ran
    Skipped(Skipped),
    /// The run finished and its results are now the session's latest
    Completed(T),
    /// A newer run started while this one was in flight
    Superseded,
}

impl<T> RunOutcome<T> {
    pub fn completed(self) -> Option<T> {
        match self {
            RunOutcome::Completed(value) => Some(value),
            _ => None,
        }
    }
}

pub struct Session {
    settings: Settings,
    credentials: CredentialSet,
    local: Arc<LocalEncoder>,
    registry: Registry,
    generation: AtomicU64,
    results: Mutex<Vec<ComparisonResult>>,
}

impl Session {
    /// Build the standard registry; keys from `settings` seed the credentials
    pub fn new(settings: Settings) -> Self {
        let credentials = CredentialSet::new();
        for provider in ApiProvider::all() {
            if let Some(key) = settings.api_key(provider) {
                credentials.set(provider.credential_key(), key);
            }
        }

        let local = Arc::new(LocalEncoder::new(
            settings.local_model.clone(),
            local_descriptor(&settings.local_model).dimensions,
        ));
        let registry = Registry::standard(&settings, &credentials, Arc::clone(&local));
        tracing::debug!(models = ?registry.ids(), "registry ready");

        Session {
            settings,
            credentials,
            local,
            registry,
            generation: AtomicU64::new(0),
            results: Mutex::new(Vec::new()),
        }
    }

    /// Session over a caller-built registry
    pub fn with_registry(
        settings: Settings,
        credentials: CredentialSet,
        local: Arc<LocalEncoder>,
        registry: Registry,
    ) -> Self {
        Session {
            settings,
            credentials,
            local,
            registry,
            generation: AtomicU64::new(0),
            results: Mutex::new(Vec::new()),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn credentials(&self) -> &CredentialSet {
        &self.credentials
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Mutable registry access, e.g. to swap in a different local model
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn set_api_key(&self, provider: &str, key: &str) {
        self.credentials.set(provider, key);
    }

    pub fn encoder_status(&self) -> EncoderStatus {
        self.local.status()
    }

    /// Load the configured local model through candle/hf-hub
    pub async fn load_local_encoder(&self) -> EncoderStatus {
        let model = self.settings.local_model.clone();
        let cache_dir = self.settings.hf_cache_dir.clone();
        self.local
            .initialize(|| HFEmbedder::load(&model, cache_dir))
            .await
    }

    /// Handle to the local encoder slot
    pub fn local_encoder(&self) -> &Arc<LocalEncoder> {
        &self.local
    }

    /// Results of the most recent completed run
    pub fn results(&self) -> Vec<ComparisonResult> {
        self.results.lock().clone()
    }

    pub fn models(&self) -> Vec<ModelDescriptor> {
        self.registry.descriptors()
    }

    /// Input checks, then skip while any selected model is still loading
    ///
    /// Goes through the registry so a replaced `local` entry is the one gated.
    fn precheck(&self, request: &ComparisonRequest) -> Option<Skipped> {
        request.check().or_else(|| {
            let loading = request
                .models
                .iter()
                .filter_map(|id| self.registry.get(id))
                .any(|model| model.embedder.is_loading());
            loading.then_some(Skipped::EncoderLoading)
        })
    }

    fn begin(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, token: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == token
    }

    /// Run the pipeline; the first model failure fails the whole run
    pub async fn compare(
        &self,
        request: &ComparisonRequest,
    ) -> Result<RunOutcome<Vec<ComparisonResult>>> {
        if let Some(skipped) = self.precheck(request) {
            tracing::debug!(reason = skipped.reason(), "comparison skipped");
            return Ok(RunOutcome::Skipped(skipped));
        }

        let token = self.begin();
        let results = pipeline::compare(&self.registry, request).await;

        if !self.is_current(token) {
            tracing::debug!(token, "discarding superseded run");
            return Ok(RunOutcome::Superseded);
        }

        let results = results?;
        *self.results.lock() = results.clone();
        Ok(RunOutcome::Completed(results))
    }

    /// Run the pipeline keeping each model's failure separate
    pub async fn compare_isolated(
        &self,
        request: &ComparisonRequest,
    ) -> RunOutcome<Vec<ModelOutcome>> {
        if let Some(skipped) = self.precheck(request) {
            return RunOutcome::Skipped(skipped);
        }

        let token = self.begin();
        let outcomes = pipeline::compare_isolated(&self.registry, request).await;

        if !self.is_current(token) {
            return RunOutcome::Superseded;
        }

        *self.results.lock() = outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok().cloned())
            .collect();
        RunOutcome::Completed(outcomes)
    }
}
