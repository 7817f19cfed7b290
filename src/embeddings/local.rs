// Local embedding backend with a lazily loaded, process-wide model.
//
// The model is loaded on the first `embed` call, not at construction.
// `tokio::sync::OnceCell` serializes initialization, so concurrent first
// requests wait on a single load and then share the same read-only model.
// Clones of a `LocalEmbedder` share the cell.
//
// Input is cut to 256 words and 1000 characters before inference. If
// inference fails for one text, that text gets a zero vector and the
// comparison continues; a model that cannot be loaded still fails the call.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use super::onnx::{SentenceModel, EMBEDDING_DIM, LOCAL_MODEL_ID};
use super::traits::{EmbeddingProvider, ProviderError};
use crate::output::truncate_chars;

/// Maximum words passed to the local model per text.
pub const MAX_INPUT_WORDS: usize = 256;
/// Maximum characters passed to the local model per text.
pub const MAX_INPUT_CHARS: usize = 1000;

/// Blocking single-text encoder held by a `LocalEmbedder` once loaded.
pub trait SentenceEncoder: Send + Sync {
    fn encode(&self, text: &str) -> Result<Vec<f64>, ProviderError>;
}

type Loader = dyn Fn() -> Result<Arc<dyn SentenceEncoder>, ProviderError> + Send + Sync;

#[derive(Clone)]
pub struct LocalEmbedder {
    loader: Arc<Loader>,
    model: Arc<OnceCell<Arc<dyn SentenceEncoder>>>,
}

impl LocalEmbedder {
    /// Create an embedder for the ONNX model in `model_dir`. Nothing is loaded yet.
    pub fn new(model_dir: &Path) -> Self {
        let dir = model_dir.to_path_buf();
        Self::with_loader(move || {
            let model = SentenceModel::load(&dir)?;
            info!(dir = %dir.display(), "Loaded local embedding model");
            Ok(Arc::new(model) as Arc<dyn SentenceEncoder>)
        })
    }

    /// Create an embedder whose model comes from `loader`. The loader runs
    /// on a blocking thread, at most once per successful load.
    pub fn with_loader<F>(loader: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn SentenceEncoder>, ProviderError> + Send + Sync + 'static,
    {
        Self {
            loader: Arc::new(loader),
            model: Arc::new(OnceCell::new()),
        }
    }

    /// Whether the model has been loaded by an earlier call.
    pub fn is_loaded(&self) -> bool {
        self.model.initialized()
    }

    async fn model(&self) -> Result<Arc<dyn SentenceEncoder>, ProviderError> {
        let model = self
            .model
            .get_or_try_init(|| async {
                let loader = Arc::clone(&self.loader);
                match tokio::task::spawn_blocking(move || loader()).await {
                    Ok(loaded) => loaded,
                    Err(e) => Err(ProviderError::ModelUnavailable(format!(
                        "model load task panicked: {e}"
                    ))),
                }
            })
            .await?;
        Ok(Arc::clone(model))
    }
}

#[async_trait]
impl EmbeddingProvider for LocalEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f64>, ProviderError> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| ProviderError::Inference("model returned no vector".to_string()))
    }

    /// Embeds texts one at a time so a failure only zeroes the text that
    /// caused it.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f64>>, ProviderError> {
        let model = self.model().await?;

        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            let encoder = Arc::clone(&model);
            let input = truncate_input(text);
            let encoded = tokio::task::spawn_blocking(move || encoder.encode(&input))
                .await
                .unwrap_or_else(|e| {
                    Err(ProviderError::Inference(format!("embedding task panicked: {e}")))
                });

            match encoded {
                Ok(vector) => vectors.push(vector),
                Err(e) => {
                    warn!(
                        error = %e,
                        text_preview = %truncate_chars(text, 50),
                        "Local embedding failed, using zero vector"
                    );
                    vectors.push(vec![0.0; EMBEDDING_DIM]);
                }
            }
        }

        Ok(vectors)
    }

    fn model_id(&self) -> &str {
        LOCAL_MODEL_ID
    }
}

/// Cut text to the local model's input budget: first `MAX_INPUT_WORDS`
/// words, then at most `MAX_INPUT_CHARS` characters.
pub fn truncate_input(text: &str) -> String {
    let words: Vec<&str> = text.split_whitespace().take(MAX_INPUT_WORDS).collect();
    words.join(" ").chars().take(MAX_INPUT_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Encodes every text to ones, except texts containing "corrupt".
    struct FlakyEncoder;

    impl SentenceEncoder for FlakyEncoder {
        fn encode(&self, text: &str) -> Result<Vec<f64>, ProviderError> {
            if text.contains("corrupt") {
                Err(ProviderError::Inference("bad chunk".to_string()))
            } else {
                Ok(vec![1.0; EMBEDDING_DIM])
            }
        }
    }

    fn flaky_embedder() -> LocalEmbedder {
        LocalEmbedder::with_loader(|| Ok(Arc::new(FlakyEncoder) as Arc<dyn SentenceEncoder>))
    }

    #[test]
    fn test_truncate_input_word_limit() {
        let text = vec!["w"; 400].join(" ");
        let cut = truncate_input(&text);
        assert_eq!(cut.split_whitespace().count(), MAX_INPUT_WORDS);
    }

    #[test]
    fn test_truncate_input_char_limit() {
        let text = vec!["abcdefghij"; 200].join(" ");
        let cut = truncate_input(&text);
        assert_eq!(cut.chars().count(), MAX_INPUT_CHARS);
    }

    #[test]
    fn test_truncate_input_short_text_unchanged() {
        assert_eq!(truncate_input("  hello   world "), "hello world");
    }

    #[tokio::test]
    async fn test_missing_model_propagates_error() {
        let dir = std::env::temp_dir().join("docsim-local-test-missing");
        let embedder = LocalEmbedder::new(&dir);
        let result = embedder.embed("some text").await;
        assert!(matches!(result, Err(ProviderError::ModelUnavailable(_))));
        assert!(!embedder.is_loaded());
    }

    #[test]
    fn test_not_loaded_at_construction() {
        let embedder = LocalEmbedder::new(Path::new("/nonexistent"));
        assert!(!embedder.is_loaded());
        assert_eq!(embedder.model_id(), LOCAL_MODEL_ID);
    }

    #[tokio::test]
    async fn test_failing_text_gets_zero_vector() {
        let texts = vec![
            "first fine chunk".to_string(),
            "a corrupt chunk".to_string(),
            "second fine chunk".to_string(),
        ];
        let vectors = flaky_embedder().embed_batch(&texts).await.unwrap();

        assert_eq!(vectors.len(), 3);
        assert_eq!(vectors[0], vec![1.0; EMBEDDING_DIM]);
        assert_eq!(vectors[1], vec![0.0; EMBEDDING_DIM]);
        assert_eq!(vectors[2], vec![1.0; EMBEDDING_DIM]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_requests_load_once() {
        let loads = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&loads);
        let embedder = LocalEmbedder::with_loader(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(50));
            Ok(Arc::new(FlakyEncoder) as Arc<dyn SentenceEncoder>)
        });

        let calls: Vec<_> = (0..8)
            .map(|i| {
                let embedder = embedder.clone();
                tokio::spawn(async move { embedder.embed(&format!("text {i}")).await })
            })
            .collect();

        for call in futures::future::join_all(calls).await {
            assert_eq!(call.unwrap().unwrap(), vec![1.0; EMBEDDING_DIM]);
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert!(embedder.is_loaded());
    }

    #[tokio::test]
    async fn test_failed_load_is_retried_on_next_call() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);
        let embedder = LocalEmbedder::with_loader(move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(ProviderError::ModelUnavailable("not yet".to_string()))
            } else {
                Ok(Arc::new(FlakyEncoder) as Arc<dyn SentenceEncoder>)
            }
        });

        assert!(embedder.embed("x").await.is_err());
        assert!(embedder.embed("x").await.is_ok());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }
}
