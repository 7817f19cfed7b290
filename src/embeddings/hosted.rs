// Hosted inference API backend (HuggingFace feature-extraction pipeline).
//
// POST {base}/pipeline/feature-extraction/{model} with a bearer token.
// Sentence-transformer models answer with one pooled vector; raw encoder
// models answer with one row per token, which is column-averaged here.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::rate_limiter::RateLimiter;
use super::traits::{check_status, EmbeddingProvider, ProviderError};
use crate::output::truncate_chars;
use crate::semantic::vectors::column_mean;

pub const DEFAULT_HOSTED_API_URL: &str = "https://api-inference.huggingface.co";
pub const DEFAULT_HOSTED_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";

const PROVIDER: &str = "hosted inference API";

pub struct HostedEmbedder {
    client: Client,
    base_url: String,
    model: String,
    api_token: String,
    rate_limiter: RateLimiter,
}

impl HostedEmbedder {
    pub fn new(base_url: &str, model: &str, api_token: String, rate_limiter: RateLimiter) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_token,
            rate_limiter,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/pipeline/feature-extraction/{}",
            self.base_url, self.model
        )
    }
}

#[async_trait]
impl EmbeddingProvider for HostedEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f64>, ProviderError> {
        self.rate_limiter.acquire().await;

        let request = FeatureExtractionRequest {
            inputs: text,
            options: RequestOptions {
                wait_for_model: true,
            },
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_token)
            .json(&request)
            .send()
            .await
            .map_err(|source| ProviderError::Http {
                provider: PROVIDER,
                source,
            })?;

        let response = check_status(PROVIDER, response).await?;

        let body: FeatureExtractionResponse =
            response
                .json()
                .await
                .map_err(|e| ProviderError::MalformedResponse {
                    provider: PROVIDER,
                    message: e.to_string(),
                })?;

        let vector = body.into_vector().ok_or_else(|| ProviderError::MalformedResponse {
            provider: PROVIDER,
            message: "empty embedding".to_string(),
        })?;

        debug!(
            model = %self.model,
            dim = vector.len(),
            text_preview = %truncate_chars(text, 50),
            "Hosted embedding"
        );

        Ok(vector)
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

#[derive(Serialize)]
struct FeatureExtractionRequest<'a> {
    inputs: &'a str,
    options: RequestOptions,
}

#[derive(Serialize)]
struct RequestOptions {
    wait_for_model: bool,
}

/// The pipeline returns either a pooled vector or a token-by-dimension matrix.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum FeatureExtractionResponse {
    Vector(Vec<f64>),
    Matrix(Vec<Vec<f64>>),
}

impl FeatureExtractionResponse {
    /// Collapse to a single vector, column-averaging matrix rows.
    /// Returns None for an empty or ragged response.
    pub fn into_vector(self) -> Option<Vec<f64>> {
        match self {
            Self::Vector(v) if !v.is_empty() => Some(v),
            Self::Vector(_) => None,
            Self::Matrix(rows) => column_mean(&rows),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flat_vector() {
        let resp: FeatureExtractionResponse = serde_json::from_str("[0.1, 0.2, 0.3]").unwrap();
        assert_eq!(resp.into_vector(), Some(vec![0.1, 0.2, 0.3]));
    }

    #[test]
    fn test_parse_matrix_column_averages() {
        let resp: FeatureExtractionResponse =
            serde_json::from_str("[[1.0, 2.0], [3.0, 4.0]]").unwrap();
        assert_eq!(resp.into_vector(), Some(vec![2.0, 3.0]));
    }

    #[test]
    fn test_empty_and_ragged_rejected() {
        let empty: FeatureExtractionResponse = serde_json::from_str("[]").unwrap();
        assert_eq!(empty.into_vector(), None);

        let ragged: FeatureExtractionResponse =
            serde_json::from_str("[[1.0, 2.0], [3.0]]").unwrap();
        assert_eq!(ragged.into_vector(), None);
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let embedder = HostedEmbedder::new(
            "https://example.test/",
            "org/model",
            "token".to_string(),
            RateLimiter::unlimited(),
        );
        assert_eq!(
            embedder.endpoint(),
            "https://example.test/pipeline/feature-extraction/org/model"
        );
        assert_eq!(embedder.model_id(), "org/model");
    }
}
