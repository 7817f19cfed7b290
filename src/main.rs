use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use docsim::compare::{Algorithm, Comparator};
use docsim::config::{Config, EmbedderBackend};
use docsim::embeddings::traits::{EmbeddingProvider, NarrativeJudge};
use docsim::semantic::engine::SemanticEngine;

/// docsim: score how similar two documents are.
///
/// Lexical algorithms work offline on word overlap. Semantic algorithms use
/// sentence embeddings from a local model, a hosted API or AWS Bedrock.
#[derive(Parser)]
#[command(name = "docsim", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the available similarity algorithms
    Algorithms,

    /// Compare two text files
    Compare {
        /// First document
        file1: String,

        /// Second document
        file2: String,

        /// Algorithm id (see `docsim algorithms`), case-insensitive with
        /// surrounding whitespace ignored. Unknown ids fall back to jaccard,
        /// or to semantic-combined for semantic-* ids.
        #[arg(long, short, default_value = "jaccard")]
        algorithm: String,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Download the local sentence embedding model (~90 MB)
    DownloadModel,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("docsim=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Algorithms => {
            docsim::output::terminal::display_algorithms(docsim::list_algorithms());
        }

        Commands::Compare {
            file1,
            file2,
            algorithm,
            json,
        } => {
            let doc1 = read_document(&file1)?;
            let doc2 = read_document(&file2)?;

            let comparator = match Algorithm::resolve(&algorithm) {
                Algorithm::Lexical(_) => Comparator::lexical_only(),
                Algorithm::Semantic(strategy) => {
                    let config = Config::load()?;
                    config.require_embedder()?;
                    info!(strategy = strategy.id(), backend = ?config.embedder, "Semantic comparison");
                    Comparator::new(create_engine(&config)?)
                }
            };

            let result = comparator.compare(&doc1, &doc2, &algorithm).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                docsim::output::terminal::display_result(&result);
            }
        }

        Commands::DownloadModel => {
            let config = Config::load()?;
            let model_dir = &config.model_dir;

            println!("Downloading embedding model...");
            println!("  Destination: {}", model_dir.display());

            docsim::embeddings::download::download_model(model_dir).await?;

            println!("\n{}", "Model downloaded successfully.".bold());
            println!("You can now run `docsim compare a.txt b.txt --algorithm semantic-embedding`.");
        }
    }

    Ok(())
}

fn read_document(path: &str) -> Result<String> {
    std::fs::read_to_string(Path::new(path)).with_context(|| format!("Failed to read {path}"))
}

/// Build the semantic engine for the configured backend, attaching a chat
/// judge when an API key is present.
fn create_engine(config: &Config) -> Result<SemanticEngine> {
    let mut engine = SemanticEngine::new(create_provider(config))
        .with_chunking(config.chunk_config()?)
        .with_top_k(config.top_k);

    if let Some(judge) = create_judge(config) {
        engine = engine.with_judge(judge);
    }
    Ok(engine)
}

fn create_provider(config: &Config) -> Arc<dyn EmbeddingProvider> {
    match config.embedder {
        EmbedderBackend::Local => {
            info!("Using local ONNX embedding model");
            let dir = docsim::embeddings::download::embedding_model_dir(&config.model_dir);
            Arc::new(docsim::embeddings::local::LocalEmbedder::new(&dir))
        }
        EmbedderBackend::Hosted => {
            info!(model = %config.hf_model, "Using hosted embedding API");
            Arc::new(docsim::embeddings::hosted::HostedEmbedder::new(
                &config.hf_api_url,
                &config.hf_model,
                config.hf_api_token.clone(),
                config.rate_limiter(),
            ))
        }
        EmbedderBackend::Bedrock => {
            info!(model = %config.bedrock_model_id, region = %config.aws_region, "Using Bedrock embeddings");
            Arc::new(docsim::embeddings::bedrock::BedrockEmbedder::new(
                &config.aws_region,
                &config.bedrock_model_id,
                config.aws_credentials(),
                config.rate_limiter(),
            ))
        }
    }
}

fn create_judge(config: &Config) -> Option<Arc<dyn NarrativeJudge>> {
    if !config.chat_enabled() {
        info!("OPENAI_API_KEY not set; LLM analysis will use embedding-derived narratives");
        return None;
    }
    info!(model = %config.chat_model, "Using chat model for LLM analysis");
    Some(Arc::new(docsim::embeddings::chat::ChatJudge::new(
        &config.chat_base_url,
        &config.chat_model,
        config.openai_api_key.clone(),
        config.rate_limiter(),
    )))
}
