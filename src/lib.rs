//! # embedding_compare
//!
//! Compare two texts across several embedding models.
//!
//! Each selected model embeds both texts; the pair is then scored with
//! cosine similarity, Euclidean distance and Manhattan distance. Models are
//! either run in-process (a candle BERT encoder) or called over HTTP
//! (OpenAI, Cohere).
//!
//! ## Core Concepts
//!
//! - **Embedder**: anything that turns text into a vector
//! - **Registry**: the table of models with their static metadata
//! - **Pipeline**: the per-model embed-and-score loop
//! - **Session**: owner of credentials, the local encoder and the latest results
//!
//! ## Example
//!
//! ```ignore
//! use embedding_compare::{ComparisonRequest, Session, Settings};
//!
//! let session = Session::new(Settings::from_env());
//! session.load_local_encoder().await;
//! let request = ComparisonRequest::new("The cat sat", "A cat was sitting", ["local"]);
//! let outcome = session.compare(&request).await?;
//! ```

pub mod config;
pub mod credentials;
pub mod embedding;
pub mod metrics;
pub mod pipeline;
pub mod registry;

mod error;
mod session;

pub use config::Settings;
pub use credentials::CredentialSet;
pub use embedding::{Embedder, MockEmbedder};
pub use error::{Error, Result};
pub use metrics::{cosine_similarity, euclidean_distance, manhattan_distance, Metrics};
pub use pipeline::{ComparisonRequest, ComparisonResult, ModelOutcome, Skipped};
pub use registry::{ModelDescriptor, Registry, LOCAL_MODEL_ID};
pub use session::{RunOutcome, Session};
