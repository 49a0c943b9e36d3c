//! HuggingFace local model embedder using Candle
//!
//! Loads a BERT-family sentence encoder from the HuggingFace Hub and runs it
//! in-process. Prefers a CUDA device and falls back to CPU when none is
//! available.

use super::Embedder;
use crate::{Error, Result};
use async_trait::async_trait;
use std::path::PathBuf;
#[cfg(feature = "hf-embeddings")]
use std::sync::Arc;

#[cfg(feature = "hf-embeddings")]
use {
    candle_core::{Device, Tensor},
    candle_nn::VarBuilder,
    candle_transformers::models::bert::{BertModel, Config, DTYPE},
    hf_hub::{api::tokio::ApiBuilder, Repo, RepoType},
    tokenizers::{Tokenizer, TruncationParams},
};

/// Model used when nothing else is configured
pub const DEFAULT_LOCAL_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";

#[cfg(feature = "hf-embeddings")]
const MAX_SEQUENCE_TOKENS: usize = 512;

/// HuggingFace embedder that runs models locally using Candle
///
/// Supports any BERT-compatible model from HuggingFace Hub, e.g.
/// - `sentence-transformers/all-MiniLM-L6-v2` (384 dim, fast)
/// - `sentence-transformers/all-mpnet-base-v2` (768 dim, higher quality)
/// - `BAAI/bge-small-en-v1.5` (384 dim)
///
/// Environment variables:
/// - `HF_HOME`: HuggingFace home; models are cached under `$HF_HOME/hub`
/// - `HF_ENDPOINT`: alternative hub endpoint
/// - `HF_TOKEN`: HuggingFace API token for private models (optional)
///
/// Inference runs on tokio's blocking pool, so two embeds of the same model
/// proceed in parallel and never stall the runtime.
pub struct HFEmbedder {
    #[cfg(feature = "hf-embeddings")]
    encoder: Arc<BertEncoder>,
    model_name: String,
    dimension: usize,
}

#[cfg(feature = "hf-embeddings")]
struct BertEncoder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
}

#[cfg(feature = "hf-embeddings")]
fn candle_err(context: &'static str) -> impl Fn(candle_core::Error) -> Error {
    move |e| Error::embedding("Local", format!("{}: {}", context, e))
}

#[cfg(feature = "hf-embeddings")]
fn load_err(context: &'static str) -> impl Fn(String) -> Error {
    move |e| Error::ModelLoad(format!("{}: {}", context, e))
}

#[cfg(feature = "hf-embeddings")]
impl HFEmbedder {
    /// Download (if needed) and load `model_name`
    ///
    /// `cache_dir` is the hub cache itself (the directory holding
    /// `models--*`). If None, the hub's own default is used (`$HF_HOME/hub`
    /// or ~/.cache/huggingface/hub).
    pub async fn load(model_name: &str, cache_dir: Option<PathBuf>) -> Result<Self> {
        // from_env also picks up HF_ENDPOINT and a token saved by `huggingface-cli login`
        let mut builder = ApiBuilder::from_env().with_progress(false);
        if let Ok(token) = std::env::var("HF_TOKEN") {
            builder = builder.with_token(Some(token));
        }
        if let Some(dir) = cache_dir {
            builder = builder.with_cache_dir(dir);
        }
        let api = builder
            .build()
            .map_err(|e| load_err("Failed to initialize HF Hub API")(e.to_string()))?;

        let repo = api.repo(Repo::new(model_name.to_string(), RepoType::Model));

        tracing::info!(model = model_name, "fetching model files");
        let config_path = repo
            .get("config.json")
            .await
            .map_err(|e| load_err("Failed to download config.json")(e.to_string()))?;
        let tokenizer_path = repo
            .get("tokenizer.json")
            .await
            .map_err(|e| load_err("Failed to download tokenizer.json")(e.to_string()))?;
        let weights_path = repo
            .get("model.safetensors")
            .await
            .map_err(|e| load_err("Failed to download model.safetensors")(e.to_string()))?;

        let config: Config = serde_json::from_str(&std::fs::read_to_string(&config_path)?)?;
        let dimension = config.hidden_size;

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| load_err("Failed to load tokenizer")(e.to_string()))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_SEQUENCE_TOKENS,
                ..Default::default()
            }))
            .map_err(|e| load_err("Failed to configure truncation")(e.to_string()))?;

        let device = Self::select_device();

        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[weights_path], DTYPE, &device) }
            .map_err(|e| load_err("Failed to load weights")(e.to_string()))?;
        let model = BertModel::load(vb, &config)
            .map_err(|e| load_err("Failed to create model")(e.to_string()))?;

        tracing::info!(model = model_name, dimension, device = ?device, "local encoder loaded");

        Ok(HFEmbedder {
            encoder: Arc::new(BertEncoder {
                model,
                tokenizer,
                device,
            }),
            model_name: model_name.to_string(),
            dimension,
        })
    }

    /// Preferred backend first, CPU otherwise
    fn select_device() -> Device {
        match Device::cuda_if_available(0) {
            Ok(device) => device,
            Err(e) => {
                tracing::warn!(error = %e, "accelerated backend unavailable, falling back to CPU");
                Device::Cpu
            }
        }
    }
}

#[cfg(feature = "hf-embeddings")]
impl BertEncoder {
    /// Average token embeddings, weighted by the attention mask
    fn mean_pooling(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let mask = attention_mask
            .unsqueeze(2)
            .and_then(|m| m.to_dtype(hidden.dtype()))
            .and_then(|m| m.broadcast_as(hidden.shape()))
            .map_err(candle_err("Failed to expand attention mask"))?;

        let summed = (hidden * &mask)
            .and_then(|t| t.sum(1))
            .map_err(candle_err("Failed to sum embeddings"))?;
        let counts = mask
            .sum(1)
            .and_then(|c| c.clamp(1e-9, f32::MAX))
            .map_err(candle_err("Failed to count tokens"))?;

        summed
            .broadcast_div(&counts)
            .map_err(candle_err("Failed to average embeddings"))
    }

    /// Scale each row to unit length
    fn normalize(tensor: &Tensor) -> Result<Tensor> {
        let norm = tensor
            .sqr()
            .and_then(|t| t.sum_keepdim(1))
            .and_then(|t| t.sqrt())
            .and_then(|t| t.clamp(1e-12, f32::MAX))
            .map_err(candle_err("Failed to compute norm"))?;

        tensor
            .broadcast_div(&norm)
            .map_err(candle_err("Failed to normalize"))
    }

    /// Tokenize, run the forward pass and pool; blocks the calling thread
    fn encode(&self, text: &str) -> Result<Vec<f32>> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| Error::embedding("Local", format!("Tokenization failed: {}", e)))?;

        let token_ids = Tensor::new(encoding.get_ids(), &self.device)
            .and_then(|t| t.unsqueeze(0))
            .map_err(candle_err("Failed to create token tensor"))?;
        let attention_mask = Tensor::new(encoding.get_attention_mask(), &self.device)
            .and_then(|t| t.unsqueeze(0))
            .map_err(candle_err("Failed to create mask tensor"))?;
        let token_type_ids = token_ids
            .zeros_like()
            .map_err(candle_err("Failed to create token type tensor"))?;

        let hidden = self
            .model
            .forward(&token_ids, &token_type_ids, Some(&attention_mask))
            .map_err(candle_err("Model forward failed"))?;

        let pooled = Self::mean_pooling(&hidden, &attention_mask)?;
        Self::normalize(&pooled)?
            .squeeze(0)
            .and_then(|t| t.to_vec1::<f32>())
            .map_err(candle_err("Failed to convert to vec"))
    }
}

#[cfg(not(feature = "hf-embeddings"))]
impl HFEmbedder {
    pub async fn load(_model_name: &str, _cache_dir: Option<PathBuf>) -> Result<Self> {
        Err(Error::ModelLoad(
            "HF embeddings feature not enabled. Compile with --features hf-embeddings".to_string(),
        ))
    }
}

#[async_trait]
impl Embedder for HFEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    #[cfg(feature = "hf-embeddings")]
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let encoder = Arc::clone(&self.encoder);
        let text = text.to_string();
        tokio::task::spawn_blocking(move || encoder.encode(&text))
            .await
            .map_err(|e| Error::embedding("Local", format!("Encoder task failed: {}", e)))?
    }

    #[cfg(not(feature = "hf-embeddings"))]
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(Error::ModelLoad("HF embeddings feature not enabled".to_string()))
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(all(test, feature = "hf-embeddings"))]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // downloads the model
    async fn test_hf_embedder_embed() {
        let embedder = HFEmbedder::load(DEFAULT_LOCAL_MODEL, None).await.unwrap();
        assert_eq!(embedder.dimension(), 384);

        let embedding = embedder.embed("Hello, world!").await.unwrap();
        assert_eq!(embedding.len(), 384);

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }
}

#[cfg(all(test, not(feature = "hf-embeddings")))]
mod stub_tests {
    use super::*;

    #[tokio::test]
    async fn test_load_without_feature_fails() {
        let err = HFEmbedder::load(DEFAULT_LOCAL_MODEL, None)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, Error::ModelLoad(ref m) if m.contains("not enabled")));
    }
}
