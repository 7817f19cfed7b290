use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::chunking::{ChunkConfig, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use crate::embeddings::bedrock::{AwsCredentials, DEFAULT_BEDROCK_MODEL, DEFAULT_REGION};
use crate::embeddings::chat::{DEFAULT_CHAT_BASE_URL, DEFAULT_CHAT_MODEL};
use crate::embeddings::hosted::{DEFAULT_HOSTED_API_URL, DEFAULT_HOSTED_MODEL};
use crate::embeddings::rate_limiter::RateLimiter;
use crate::semantic::engine::DEFAULT_TOP_K;

/// Default request rate for remote backends.
pub const DEFAULT_PROVIDER_RPS: f64 = 5.0;

/// Which embedding backend the semantic engine uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedderBackend {
    /// Local ONNX sentence model (default). No key, no rate limit.
    Local,
    /// Hosted feature-extraction API. Requires HF_API_TOKEN.
    Hosted,
    /// Cloud model service (AWS Bedrock). Requires AWS credentials.
    Bedrock,
}

impl EmbedderBackend {
    fn parse(value: Option<&str>) -> Result<Self> {
        match value.map(|v| v.trim().to_lowercase()).as_deref() {
            None | Some("") | Some("local") => Ok(Self::Local),
            Some("hosted") => Ok(Self::Hosted),
            Some("bedrock") => Ok(Self::Bedrock),
            Some(other) => anyhow::bail!(
                "Unknown DOCSIM_EMBEDDER '{other}'. Expected one of: local, hosted, bedrock."
            ),
        }
    }
}

/// Central configuration loaded from environment variables.
///
/// Secrets only ever come from the environment. A .env file is loaded at
/// startup via dotenvy.
pub struct Config {
    pub embedder: EmbedderBackend,
    /// Root directory for local model files.
    pub model_dir: PathBuf,
    pub hf_api_token: String,
    pub hf_api_url: String,
    pub hf_model: String,
    pub aws_region: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub aws_session_token: Option<String>,
    pub bedrock_model_id: String,
    /// Empty means no chat judge; the LLM strategy then falls back to an
    /// embedding-derived narrative.
    pub openai_api_key: String,
    pub chat_base_url: String,
    pub chat_model: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
    pub provider_rps: f64,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup. Unset and empty
    /// values take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let embedder = EmbedderBackend::parse(get("DOCSIM_EMBEDDER").as_deref())?;

        let model_dir = get("DOCSIM_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(crate::embeddings::download::default_model_dir);

        Ok(Self {
            embedder,
            model_dir,
            hf_api_token: or("HF_API_TOKEN", ""),
            hf_api_url: or("HF_API_URL", DEFAULT_HOSTED_API_URL),
            hf_model: or("HF_MODEL", DEFAULT_HOSTED_MODEL),
            aws_region: or("AWS_REGION", DEFAULT_REGION),
            aws_access_key_id: or("AWS_ACCESS_KEY_ID", ""),
            aws_secret_access_key: or("AWS_SECRET_ACCESS_KEY", ""),
            aws_session_token: get("AWS_SESSION_TOKEN"),
            bedrock_model_id: or("BEDROCK_MODEL_ID", DEFAULT_BEDROCK_MODEL),
            openai_api_key: or("OPENAI_API_KEY", ""),
            chat_base_url: or("OPENAI_BASE_URL", DEFAULT_CHAT_BASE_URL),
            chat_model: or("DOCSIM_CHAT_MODEL", DEFAULT_CHAT_MODEL),
            chunk_size: parse_number(
                get("DOCSIM_CHUNK_SIZE"),
                "DOCSIM_CHUNK_SIZE",
                DEFAULT_CHUNK_SIZE,
            )?,
            chunk_overlap: parse_number(
                get("DOCSIM_CHUNK_OVERLAP"),
                "DOCSIM_CHUNK_OVERLAP",
                DEFAULT_CHUNK_OVERLAP,
            )?,
            top_k: parse_number(get("DOCSIM_TOP_K"), "DOCSIM_TOP_K", DEFAULT_TOP_K)?,
            provider_rps: parse_number(
                get("DOCSIM_PROVIDER_RPS"),
                "DOCSIM_PROVIDER_RPS",
                DEFAULT_PROVIDER_RPS,
            )?,
        })
    }

    /// Validated chunking settings.
    pub fn chunk_config(&self) -> Result<ChunkConfig> {
        ChunkConfig::new(self.chunk_size, self.chunk_overlap)
            .context("DOCSIM_CHUNK_SIZE / DOCSIM_CHUNK_OVERLAP")
    }

    /// Rate limiter shared by one remote backend.
    pub fn rate_limiter(&self) -> RateLimiter {
        RateLimiter::new(self.provider_rps)
    }

    pub fn aws_credentials(&self) -> AwsCredentials {
        AwsCredentials {
            access_key_id: self.aws_access_key_id.clone(),
            secret_access_key: self.aws_secret_access_key.clone(),
            session_token: self.aws_session_token.clone(),
        }
    }

    /// Whether a chat judge should be attached to the semantic engine.
    pub fn chat_enabled(&self) -> bool {
        !self.openai_api_key.is_empty()
    }

    /// Check that the hosted API token is configured.
    pub fn require_hosted(&self) -> Result<()> {
        if self.hf_api_token.is_empty() {
            anyhow::bail!(
                "HF_API_TOKEN not set. Add it to your .env file,\n\
                 or set DOCSIM_EMBEDDER=local to use the local model instead."
            );
        }
        Ok(())
    }

    /// Check that Bedrock credentials are configured.
    pub fn require_bedrock(&self) -> Result<()> {
        if self.aws_access_key_id.is_empty() || self.aws_secret_access_key.is_empty() {
            anyhow::bail!(
                "AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY must both be set \
                 to use DOCSIM_EMBEDDER=bedrock."
            );
        }
        Ok(())
    }

    /// Validate that the chosen embedding backend has what it needs.
    /// For local: model files must exist (or the user should run download-model).
    pub fn require_embedder(&self) -> Result<()> {
        match self.embedder {
            EmbedderBackend::Local => {
                if !crate::embeddings::download::embedding_files_present(&self.model_dir) {
                    anyhow::bail!(
                        "Embedding model files not found in {}\n\
                         Run `docsim download-model` to download them.\n\
                         Or set DOCSIM_EMBEDDER=hosted to use the hosted API instead.",
                        self.model_dir.display()
                    );
                }
                Ok(())
            }
            EmbedderBackend::Hosted => self.require_hosted(),
            EmbedderBackend::Bedrock => self.require_bedrock(),
        }
    }
}

fn parse_number<T>(value: Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} must be a number, got '{raw}'")),
    }
}
