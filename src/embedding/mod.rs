//! Pluggable embedding system

mod api;
mod hf;
mod local;
mod mock;
mod traits;

pub use api::{ApiEmbedder, ApiProvider};
pub use hf::{HFEmbedder, DEFAULT_LOCAL_MODEL};
pub use local::{EncoderStatus, LocalEncoder};
pub use mock::MockEmbedder;
pub use traits::{Embedder, TimedEmbedding};
