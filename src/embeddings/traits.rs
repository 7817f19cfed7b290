// Embedding provider trait: the swap-ready abstraction.
//
// The semantic engine only ever sees `dyn EmbeddingProvider`. Concrete
// backends (local ONNX model, hosted inference API, Bedrock) live in sibling
// modules and are chosen from configuration in one place.
//
// Chat-completion backends are not embedders: they implement
// `NarrativeJudge` instead and return a qualitative judgment.

use async_trait::async_trait;
use thiserror::Error;

use crate::semantic::narrative::Narrative;

/// Failure talking to an embedding or chat backend.
///
/// Every variant fails the comparison it happened in. Nothing here is
/// retried or converted to a zero vector by the caller.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider} request failed: {source}")]
    Http {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} rejected the credentials (HTTP {status})")]
    Auth { provider: &'static str, status: u16 },

    #[error("{provider} returned HTTP {status}: {body}")]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("{provider} returned an unexpected response: {message}")]
    MalformedResponse {
        provider: &'static str,
        message: String,
    },

    #[error("embedding model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("{provider} is not configured: {message}")]
    NotConfigured {
        provider: &'static str,
        message: String,
    },
}

/// Turns text into a fixed-length vector.
///
/// Implementations may call the network, so latency and cost vary per
/// backend; callers must not assume anything beyond the returned vector.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f64>, ProviderError>;

    /// Embed several texts, returning vectors in input order.
    /// Default implementation calls `embed` sequentially; backends with a
    /// batch endpoint can override.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f64>>, ProviderError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }

    /// Model identifier reported in result details.
    fn model_id(&self) -> &str;
}

/// Produces a qualitative similarity judgment for a document pair.
#[async_trait]
pub trait NarrativeJudge: Send + Sync {
    async fn judge(&self, doc1: &str, doc2: &str) -> Result<Narrative, ProviderError>;

    fn model_id(&self) -> &str;
}

/// Map a non-2xx response to the matching `ProviderError`, passing
/// successful responses through untouched.
pub(crate) async fn check_status(
    provider: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Err(ProviderError::Auth {
            provider,
            status: status.as_u16(),
        });
    }

    let body = response.text().await.unwrap_or_default();
    Err(ProviderError::Status {
        provider,
        status: status.as_u16(),
        body,
    })
}
