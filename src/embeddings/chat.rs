// Chat-completion backend for narrative similarity judgments.
//
// Sends both documents, each cut to `MAX_DOCUMENT_CHARS`, to an
// OpenAI-compatible /chat/completions endpoint with a fixed prompt asking
// for a JSON verdict. Transport, auth, and status failures propagate; a
// reply that is not the requested JSON becomes a neutral score (see
// `semantic::narrative::parse_chat_judgment`).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::rate_limiter::RateLimiter;
use super::traits::{check_status, NarrativeJudge, ProviderError};
use crate::semantic::narrative::{parse_chat_judgment, Narrative};

pub const DEFAULT_CHAT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";

/// Per-document character budget in the prompt.
pub const MAX_DOCUMENT_CHARS: usize = 2000;

const PROVIDER: &str = "chat completion API";

const SYSTEM_PROMPT: &str =
    "You are an expert at comparing documents. Respond only with a JSON object.";

pub struct ChatJudge {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
    rate_limiter: RateLimiter,
}

impl ChatJudge {
    pub fn new(base_url: &str, model: &str, api_key: String, rate_limiter: RateLimiter) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
            rate_limiter,
        }
    }
}

/// Fill the comparison prompt template.
pub fn build_prompt(doc1: &str, doc2: &str) -> String {
    let doc1: String = doc1.chars().take(MAX_DOCUMENT_CHARS).collect();
    let doc2: String = doc2.chars().take(MAX_DOCUMENT_CHARS).collect();

    format!(
        "Compare the following two documents and rate their semantic similarity.\n\n\
         Document 1:\n{doc1}\n\n\
         Document 2:\n{doc2}\n\n\
         Respond with a JSON object with exactly these fields:\n\
         {{\n  \"similarity_score\": <number between 0 and 1>,\n  \
         \"reasoning\": \"<short explanation>\",\n  \
         \"key_similarities\": [\"<similarity>\", ...],\n  \
         \"key_differences\": [\"<difference>\", ...]\n}}"
    )
}

#[async_trait]
impl NarrativeJudge for ChatJudge {
    async fn judge(&self, doc1: &str, doc2: &str) -> Result<Narrative, ProviderError> {
        self.rate_limiter.acquire().await;

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: build_prompt(doc1, doc2),
                },
            ],
            temperature: 0.0,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|source| ProviderError::Http {
                provider: PROVIDER,
                source,
            })?;

        let response = check_status(PROVIDER, response).await?;

        let body: ChatResponse =
            response
                .json()
                .await
                .map_err(|e| ProviderError::MalformedResponse {
                    provider: PROVIDER,
                    message: e.to_string(),
                })?;

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ProviderError::MalformedResponse {
                provider: PROVIDER,
                message: "no choices in response".to_string(),
            })?;

        let narrative = parse_chat_judgment(&content);

        debug!(
            model = %self.model,
            score = narrative.score,
            parsed = narrative.note.is_none(),
            "Chat similarity judgment"
        );

        Ok(narrative)
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_truncates_each_document() {
        let long = "z".repeat(5000);
        let prompt = build_prompt(&long, "short doc");
        let z_count = prompt.chars().filter(|&c| c == 'z').count();
        assert_eq!(z_count, MAX_DOCUMENT_CHARS);
        assert!(prompt.contains("short doc"));
    }

    #[test]
    fn test_prompt_names_required_fields() {
        let prompt = build_prompt("a", "b");
        for field in [
            "similarity_score",
            "reasoning",
            "key_similarities",
            "key_differences",
        ] {
            assert!(prompt.contains(field), "prompt missing {field}");
        }
    }

    #[test]
    fn test_response_deserializes_null_content() {
        let json = r#"{"choices": [{"message": {"role": "assistant", "content": null}}]}"#;
        let body: ChatResponse = serde_json::from_str(json).unwrap();
        assert!(body.choices[0].message.content.is_none());
    }
}
