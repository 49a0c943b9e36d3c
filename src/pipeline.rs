//! Embed two texts with each selected model and compare them

use crate::metrics::{Metrics, SimilarityBand};
use crate::registry::{RegisteredModel, Registry};
use crate::Result;
use serde::Serialize;
use std::time::Duration;

/// Two texts and the models to compare them with, in order
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComparisonRequest {
    pub text1: String,
    pub text2: String,
    pub models: Vec<String>,
}

/// Why a request was not run
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Skipped {
    EmptyText,
    NoModels,
    EncoderLoading,
}

impl Skipped {
    pub fn reason(&self) -> &'static str {
        match self {
            Skipped::EmptyText => "both texts must be non-empty",
            Skipped::NoModels => "no models selected",
            Skipped::EncoderLoading => "local encoder is still loading",
        }
    }
}

impl ComparisonRequest {
    pub fn new(
        text1: impl Into<String>,
        text2: impl Into<String>,
        models: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        ComparisonRequest {
            text1: text1.into(),
            text2: text2.into(),
            models: models.into_iter().map(Into::into).collect(),
        }
    }

    /// Input preconditions; `None` means the request may run
    pub fn check(&self) -> Option<Skipped> {
        if self.text1.is_empty() || self.text2.is_empty() {
            Some(Skipped::EmptyText)
        } else if self.models.is_empty() {
            Some(Skipped::NoModels)
        } else {
            None
        }
    }
}

/// Metrics for one model over one pair of texts
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ComparisonResult {
    pub text1: String,
    pub text2: String,
    pub model_id: String,
    pub model: String,
    pub cosine_similarity: f32,
    pub euclidean_distance: f32,
    pub manhattan_distance: f32,
    #[serde(rename = "time_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
    pub dimensions: usize,
}

fn serialize_millis<S: serde::Serializer>(
    elapsed: &Duration,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_f64(elapsed.as_secs_f64() * 1000.0)
}

impl ComparisonResult {
    pub fn band(&self) -> SimilarityBand {
        SimilarityBand::from_cosine(self.cosine_similarity)
    }

    pub fn euclidean_band(&self) -> SimilarityBand {
        SimilarityBand::from_euclidean(self.euclidean_distance)
    }

    pub fn manhattan_band(&self) -> SimilarityBand {
        SimilarityBand::from_manhattan(self.manhattan_distance)
    }
}

/// Outcome of one model when failures are isolated per model
#[derive(Debug)]
pub struct ModelOutcome {
    pub model_id: String,
    pub result: Result<ComparisonResult>,
}

async fn compare_one(
    model: &RegisteredModel,
    text1: &str,
    text2: &str,
) -> Result<ComparisonResult> {
    let embedder = &model.embedder;
    let (first, second) = tokio::join!(embedder.embed_timed(text1), embedder.embed_timed(text2));
    let (first, second) = (first?, second?);

    let metrics = Metrics::compute(&first.vector, &second.vector)?;
    let dimensions = first.vector.len();
    if dimensions != embedder.dimension() {
        tracing::warn!(
            model = %model.descriptor.id,
            declared = embedder.dimension(),
            actual = dimensions,
            "embedding length differs from declared dimension"
        );
    }

    tracing::debug!(model = %model.descriptor.id, similarity = metrics.cosine_similarity, "compared");

    Ok(ComparisonResult {
        text1: text1.to_string(),
        text2: text2.to_string(),
        model_id: model.descriptor.id.clone(),
        model: model.descriptor.name.clone(),
        cosine_similarity: metrics.cosine_similarity,
        euclidean_distance: metrics.euclidean_distance,
        manhattan_distance: metrics.manhattan_distance,
        elapsed: first.elapsed + second.elapsed,
        dimensions,
    })
}

/// Compare with every requested model, in request order
///
/// The first failure aborts the run and is returned; results of models
/// already processed are dropped.
pub async fn compare(
    registry: &Registry,
    request: &ComparisonRequest,
) -> Result<Vec<ComparisonResult>> {
    let mut results = Vec::with_capacity(request.models.len());

    for id in &request.models {
        let model = registry.resolve(id)?;
        let result = compare_one(model, &request.text1, &request.text2)
            .await
            .inspect_err(|e| tracing::warn!(model = %id, error = %e, "comparison aborted"))?;
        results.push(result);
    }

    Ok(results)
}

/// Like [`compare`], but every model runs and reports its own outcome
pub async fn compare_isolated(
    registry: &Registry,
    request: &ComparisonRequest,
) -> Vec<ModelOutcome> {
    let mut outcomes = Vec::with_capacity(request.models.len());

    for id in &request.models {
        let result = match registry.resolve(id) {
            Ok(model) => compare_one(model, &request.text1, &request.text2).await,
            Err(e) => Err(e),
        };
        if let Err(e) = &result {
            tracing::warn!(model = %id, error = %e, "model failed");
        }
        outcomes.push(ModelOutcome {
            model_id: id.clone(),
            result,
        });
    }

    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::{Embedder, MockEmbedder};
    use crate::registry::ModelDescriptor;
    use crate::Error;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::time::Instant;

    /// Does its work on the blocking pool, like the candle encoder
    struct BlockingEmbedder {
        work: Duration,
    }

    #[async_trait]
    impl Embedder for BlockingEmbedder {
        fn dimension(&self) -> usize {
            4
        }

        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let work = self.work;
            let seed = text.len() as f32;
            tokio::task::spawn_blocking(move || {
                std::thread::sleep(work);
                vec![seed, 1.0, 0.0, 1.0]
            })
            .await
            .map_err(|e| Error::embedding("Local", e.to_string()))
        }

        fn model_name(&self) -> &str {
            "blocking"
        }
    }

    fn descriptor(id: &str, dimensions: usize) -> ModelDescriptor {
        ModelDescriptor {
            id: id.to_string(),
            name: format!("Model {}", id),
            description: String::new(),
            dimensions,
            provider: "Test".to_string(),
            is_open_source: true,
            requires_api_key: false,
            mteb_score: None,
            max_tokens: None,
            languages: vec![],
            cost_per_million: None,
            specialties: vec![],
        }
    }

    fn registry(models: Vec<(&str, MockEmbedder)>) -> Registry {
        let mut registry = Registry::new();
        for (id, embedder) in models {
            registry.register(descriptor(id, embedder.dimension()), Arc::new(embedder));
        }
        registry
    }

    #[test]
    fn test_preconditions() {
        assert_eq!(
            ComparisonRequest::new("", "b", ["m"]).check(),
            Some(Skipped::EmptyText)
        );
        assert_eq!(
            ComparisonRequest::new("a", "b", Vec::<String>::new()).check(),
            Some(Skipped::NoModels)
        );
        assert_eq!(ComparisonRequest::new("a", "b", ["m"]).check(), None);
    }

    #[tokio::test]
    async fn test_single_model_dimensions() {
        let registry = registry(vec![("m1", MockEmbedder::new(512))]);
        let request = ComparisonRequest::new("the cat sat", "a dog ran", ["m1"]);

        let results = compare(&registry, &request).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].dimensions, 512);
        assert_eq!(results[0].model_id, "m1");
        assert_eq!(results[0].model, "Model m1");
        assert_eq!(results[0].text1, "the cat sat");
    }

    #[tokio::test]
    async fn test_results_in_request_order() {
        let registry = registry(vec![
            ("a", MockEmbedder::new(16)),
            ("b", MockEmbedder::new(32)),
        ]);
        let request = ComparisonRequest::new("x", "y", ["b", "a"]);

        let results = compare(&registry, &request).await.unwrap();
        let ids: Vec<_> = results.iter().map(|r| r.model_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(results[0].dimensions, 32);
    }

    #[tokio::test]
    async fn test_identical_texts() {
        let registry = registry(vec![("m", MockEmbedder::new(64))]);
        let request = ComparisonRequest::new("same", "same", ["m"]);

        let result = &compare(&registry, &request).await.unwrap()[0];
        assert!((result.cosine_similarity - 1.0).abs() < 1e-5);
        assert!(result.euclidean_distance.abs() < 1e-5);
        assert!(result.manhattan_distance.abs() < 1e-5);
        assert_eq!(result.band(), SimilarityBand::VerySimilar);
        assert_eq!(result.euclidean_band(), SimilarityBand::VerySimilar);
        assert_eq!(result.manhattan_band(), SimilarityBand::VerySimilar);
    }

    #[tokio::test]
    async fn test_first_failure_aborts_run() {
        let registry = registry(vec![
            ("m1", MockEmbedder::new(8).failing("Cohere", "rate limited")),
            ("m2", MockEmbedder::new(8)),
        ]);
        let request = ComparisonRequest::new("x", "y", ["m1", "m2"]);

        let err = compare(&registry, &request).await.unwrap_err();
        assert_eq!(err.to_string(), "Error from Cohere: rate limited");
    }

    #[tokio::test]
    async fn test_later_failure_discards_earlier_results() {
        let registry = registry(vec![
            ("ok", MockEmbedder::new(8)),
            ("bad", MockEmbedder::new(8).failing("OpenAI", "boom")),
        ]);
        let request = ComparisonRequest::new("x", "y", ["ok", "bad"]);

        assert!(compare(&registry, &request).await.is_err());
    }

    #[tokio::test]
    async fn test_unknown_model() {
        let registry = registry(vec![("m", MockEmbedder::new(8))]);
        let request = ComparisonRequest::new("x", "y", ["m", "ghost"]);
        assert!(matches!(
            compare(&registry, &request).await,
            Err(Error::UnknownModel(_))
        ));
    }

    #[tokio::test]
    async fn test_mismatched_lengths() {
        let embedder = MockEmbedder::new(4).with_vector("short", vec![1.0, 2.0]);
        let registry = registry(vec![("m", embedder)]);
        let request = ComparisonRequest::new("short", "long enough", ["m"]);

        let err = compare(&registry, &request).await.unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { left: 2, right: 4 }));
    }

    #[tokio::test]
    async fn test_both_texts_embedded_concurrently() {
        let delay = Duration::from_millis(200);
        let registry = registry(vec![("m", MockEmbedder::new(8).with_delay(delay))]);
        let request = ComparisonRequest::new("x", "y", ["m"]);

        let start = Instant::now();
        let results = compare(&registry, &request).await.unwrap();
        let wall = start.elapsed();

        assert!(wall < delay * 2, "embeds ran back to back: {:?}", wall);
        // Reported time is the sum of both calls
        assert!(results[0].elapsed >= delay * 2);
    }

    #[tokio::test]
    async fn test_blocking_embedder_runs_concurrently() {
        let work = Duration::from_millis(200);
        let mut registry = Registry::new();
        registry.register(descriptor("local", 4), Arc::new(BlockingEmbedder { work }));
        let request = ComparisonRequest::new("short", "a longer text", ["local"]);

        let start = Instant::now();
        let results = compare(&registry, &request).await.unwrap();
        let wall = start.elapsed();

        assert!(wall < work * 2, "embeds ran back to back: {:?}", wall);
        assert_eq!(results[0].dimensions, 4);
    }

    #[tokio::test]
    async fn test_isolated_keeps_successes() {
        let registry = registry(vec![
            ("m1", MockEmbedder::new(8).failing("Cohere", "down")),
            ("m2", MockEmbedder::new(8)),
        ]);
        let request = ComparisonRequest::new("x", "y", ["m1", "m2"]);

        let outcomes = compare_isolated(&registry, &request).await;
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes[0].result.is_err());
        assert_eq!(outcomes[1].model_id, "m2");
        assert_eq!(outcomes[1].result.as_ref().unwrap().dimensions, 8);
    }

    #[tokio::test]
    async fn test_result_serializes_time_ms() {
        let registry = registry(vec![("m", MockEmbedder::new(4))]);
        let request = ComparisonRequest::new("x", "y", ["m"]);
        let result = &compare(&registry, &request).await.unwrap()[0];

        let json = serde_json::to_value(result).unwrap();
        assert!(json["time_ms"].is_number());
        assert_eq!(json["dimensions"], 4);
        assert_eq!(json["model_id"], "m");
    }
}
