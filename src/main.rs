//! embcmp CLI - compare two texts across embedding models
//!
//! Prints JSON by default so it can be wrapped by other tools; `-f text`
//! gives a human-readable report.

use clap::{Parser, Subcommand};
use embedding_compare::embedding::{EncoderStatus, MockEmbedder};
use embedding_compare::registry::local_descriptor;
use embedding_compare::{
    ComparisonRequest, ComparisonResult, Error, ModelDescriptor, RunOutcome, Session, Settings,
    LOCAL_MODEL_ID,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "embcmp")]
#[command(about = "Compare two texts across local and API-based embedding models")]
#[command(version)]
struct Cli {
    /// Output format (json or text)
    #[arg(short, long, default_value = "json")]
    format: OutputFormat,

    /// Backend for the local model entry
    #[arg(long, default_value = "local")]
    embedder: EmbedderKind,

    /// OpenAI API key (overrides OPENAI_API_KEY for this run)
    #[arg(long)]
    openai_key: Option<String>,

    /// Cohere API key (overrides COHERE_API_KEY for this run)
    #[arg(long)]
    cohere_key: Option<String>,

    /// Read settings from this dotenv file instead of the environment
    #[arg(long)]
    env_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum EmbedderKind {
    /// Candle encoder downloaded from the HuggingFace Hub
    Local,
    /// Deterministic hash-based vectors, for testing
    Mock,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two texts
    Compare {
        /// First text
        text1: String,
        /// Second text
        text2: String,
        /// Model id to compare with (repeatable, order is kept)
        #[arg(short, long = "model", default_values_t = [LOCAL_MODEL_ID.to_string()])]
        models: Vec<String>,
        /// Report each model separately instead of stopping at the first failure
        #[arg(long)]
        keep_going: bool,
    },

    /// List available models
    Models,

    /// Models ranked by MTEB score
    Leaderboard,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    let settings = match &cli.env_file {
        Some(path) => Settings::from_file(path)?,
        None => Settings::from_env(),
    };
    let mut session = Session::new(settings);
    if let Some(key) = &cli.openai_key {
        session.set_api_key("openai", key);
    }
    if let Some(key) = &cli.cohere_key {
        session.set_api_key("cohere", key);
    }

    if cli.embedder == EmbedderKind::Mock {
        let local = Arc::clone(session.local_encoder());
        local
            .initialize(|| async { Ok(MockEmbedder::default()) })
            .await;
        session
            .registry_mut()
            .register(local_descriptor("mock-embedder"), local);
    }

    match cli.command {
        Commands::Compare {
            text1,
            text2,
            models,
            keep_going,
        } => {
            let request = ComparisonRequest::new(text1, text2, models);

            if request.models.iter().any(|id| id == LOCAL_MODEL_ID) {
                if let EncoderStatus::Failed(message) = session.load_local_encoder().await {
                    eprintln!("warning: local encoder unavailable: {}", message);
                }
            }

            if keep_going {
                run_isolated(&cli.format, &session, &request).await;
            } else {
                run(&cli.format, &session, &request).await;
            }
        }

        Commands::Models => {
            let models = session.models();
            output_models(&cli.format, &models);
        }

        Commands::Leaderboard => {
            let models = session.registry().leaderboard();
            output_models(&cli.format, &models);
        }
    }

    Ok(())
}

async fn run(format: &OutputFormat, session: &Session, request: &ComparisonRequest) {
    match session.compare(request).await {
        Ok(RunOutcome::Completed(results)) => match format {
            OutputFormat::Json => output(
                format,
                &serde_json::json!({
                    "status": "ok",
                    "count": results.len(),
                    "results": results
                }),
            ),
            OutputFormat::Text => results.iter().for_each(print_result),
        },
        Ok(RunOutcome::Skipped(skipped)) => output(
            format,
            &serde_json::json!({
                "status": "skipped",
                "reason": skipped.reason()
            }),
        ),
        Ok(RunOutcome::Superseded) => {}
        Err(e) => fail(format, &e),
    }
}

async fn run_isolated(format: &OutputFormat, session: &Session, request: &ComparisonRequest) {
    let outcomes = match session.compare_isolated(request).await {
        RunOutcome::Completed(outcomes) => outcomes,
        RunOutcome::Skipped(skipped) => {
            return output(
                format,
                &serde_json::json!({
                    "status": "skipped",
                    "reason": skipped.reason()
                }),
            );
        }
        RunOutcome::Superseded => return,
    };

    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
    match format {
        OutputFormat::Json => {
            let items: Vec<_> = outcomes
                .iter()
                .map(|o| match &o.result {
                    Ok(result) => serde_json::json!({
                        "model_id": o.model_id,
                        "status": "ok",
                        "result": result
                    }),
                    Err(e) => serde_json::json!({
                        "model_id": o.model_id,
                        "status": "error",
                        "provider": e.provider(),
                        "message": e.to_string()
                    }),
                })
                .collect();
            output(
                format,
                &serde_json::json!({
                    "status": if failed == 0 { "ok" } else { "partial" },
                    "count": items.len(),
                    "failed": failed,
                    "results": items
                }),
            );
        }
        OutputFormat::Text => {
            for outcome in &outcomes {
                match &outcome.result {
                    Ok(result) => print_result(result),
                    Err(e) => println!("{}\n  error: {}\n", outcome.model_id, e),
                }
            }
        }
    }
}

fn print_result(result: &ComparisonResult) {
    println!(
        "{}\n  {} dimensions | {:.0}ms",
        result.model,
        result.dimensions,
        result.elapsed.as_secs_f64() * 1000.0
    );
    println!(
        "  cosine similarity   {:.4} ({})",
        result.cosine_similarity,
        result.band().label()
    );
    println!(
        "  euclidean distance  {:.4} ({})",
        result.euclidean_distance,
        result.euclidean_band().label()
    );
    println!(
        "  manhattan distance  {:.4} ({})\n",
        result.manhattan_distance,
        result.manhattan_band().label()
    );
}

fn output_models(format: &OutputFormat, models: &[ModelDescriptor]) {
    match format {
        OutputFormat::Json => output(
            format,
            &serde_json::json!({
                "count": models.len(),
                "models": models
            }),
        ),
        OutputFormat::Text => {
            println!(
                "{:<24} {:>6} {:>6}  {:<8} {:<5} {}",
                "ID", "MTEB", "DIMS", "PROVIDER", "OPEN", "COST/M"
            );
            for m in models {
                println!(
                    "{:<24} {:>6} {:>6}  {:<8} {:<5} {}",
                    m.id,
                    m.mteb_score
                        .map(|s| format!("{:.2}", s))
                        .unwrap_or_else(|| "N/A".into()),
                    m.dimensions,
                    m.provider,
                    if m.is_open_source { "yes" } else { "no" },
                    m.cost_per_million
                        .map(|c| format!("${}", c))
                        .unwrap_or_else(|| "N/A".into()),
                );
            }
        }
    }
}

fn fail(format: &OutputFormat, error: &Error) -> ! {
    match format {
        OutputFormat::Json => output(
            format,
            &serde_json::json!({
                "status": "error",
                "provider": error.provider(),
                "message": error.to_string()
            }),
        ),
        OutputFormat::Text => eprintln!("error: {}", error),
    }
    std::process::exit(1);
}

fn output(format: &OutputFormat, value: &serde_json::Value) {
    match format {
        OutputFormat::Json => println!("{}", value),
        OutputFormat::Text => {
            println!(
                "{}",
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            );
        }
    }
}
