//! Example: comparing two sentences with different embedders
//!
//! Run examples:
//! ```bash
//! # Mock embedder only (always works)
//! cargo run --example compare
//!
//! # Add the local candle encoder (downloads ~90MB on first run)
//! EMBCMP_DEMO_LOCAL=1 cargo run --example compare
//!
//! # Add OpenAI
//! export OPENAI_API_KEY=sk-...
//! cargo run --example compare
//! ```

use embedding_compare::embedding::{EncoderStatus, MockEmbedder};
use embedding_compare::registry::local_descriptor;
use embedding_compare::{ComparisonRequest, RunOutcome, Session, Settings, LOCAL_MODEL_ID};
use std::sync::Arc;

const TEXT1: &str = "Rust is a systems programming language focused on safety";
const TEXT2: &str = "Rust lets you write fast programs without memory bugs";

#[tokio::main]
async fn main() -> embedding_compare::Result<()> {
    let mut session = Session::new(Settings::from_env());
    let mut models = vec![LOCAL_MODEL_ID.to_string()];

    if std::env::var("EMBCMP_DEMO_LOCAL").is_ok() {
        println!("Loading local encoder: {}", session.settings().local_model);
        if let EncoderStatus::Failed(message) = session.load_local_encoder().await {
            println!("  local encoder unavailable: {}", message);
            models.clear();
        }
    } else {
        println!("Using the mock embedder in place of the local encoder");
        let local = Arc::clone(session.local_encoder());
        local.initialize(|| async { Ok(MockEmbedder::default()) }).await;
        session
            .registry_mut()
            .register(local_descriptor("mock-embedder"), local);
    }

    if session.credentials().has("openai") {
        models.push("text-embedding-3-small".to_string());
    }

    let request = ComparisonRequest::new(TEXT1, TEXT2, models);
    match session.compare(&request).await? {
        RunOutcome::Completed(results) => {
            for r in results {
                println!(
                    "\n{} ({} dims, {:.0}ms)\n  cosine {:.4} ({})\n  euclidean {:.4}\n  manhattan {:.4}",
                    r.model,
                    r.dimensions,
                    r.elapsed.as_secs_f64() * 1000.0,
                    r.cosine_similarity,
                    r.band().label(),
                    r.euclidean_distance,
                    r.manhattan_distance
                );
            }
        }
        RunOutcome::Skipped(skipped) => println!("Nothing to compare: {}", skipped.reason()),
        RunOutcome::Superseded => {}
    }

    Ok(())
}
