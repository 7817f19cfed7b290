// Sentence embedding model (all-MiniLM-L6-v2) running locally via ONNX.
//
// One text at a time: tokenize, run the BERT encoder, then take the column
// average of the attended token rows of `last_hidden_state`. The result is
// one 384-dimensional vector per text. Inference is blocking; callers move
// it onto `spawn_blocking`.

use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;
use tracing::debug;

use super::local::SentenceEncoder;
use super::traits::ProviderError;
use crate::semantic::vectors::column_mean;

/// Embedding dimension for all-MiniLM-L6-v2.
pub const EMBEDDING_DIM: usize = 384;

/// Model identifier reported in result details.
pub const LOCAL_MODEL_ID: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Loaded ONNX session plus tokenizer. `Session::run` takes `&mut self`.
pub struct SentenceModel {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
}

impl SentenceModel {
    /// Load `model.onnx` and `tokenizer.json` from `model_dir`.
    pub fn load(model_dir: &Path) -> Result<Self, ProviderError> {
        load_model(model_dir).map_err(|e| ProviderError::ModelUnavailable(format!("{e:#}")))
    }

    /// Embed a single text. Blocking.
    pub fn embed_one(&self, text: &str) -> Result<Vec<f64>> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow::anyhow!("Tokenization failed: {e}"))?;

        let ids: Vec<i64> = encoding.get_ids().iter().map(|&id| i64::from(id)).collect();
        let mask: Vec<i64> = encoding
            .get_attention_mask()
            .iter()
            .map(|&m| i64::from(m))
            .collect();
        let seq_len = ids.len();
        if seq_len == 0 {
            return Ok(vec![0.0; EMBEDDING_DIM]);
        }

        let shape = [1_i64, seq_len as i64];
        let input_ids = Tensor::from_array((shape, ids)).context("input_ids tensor")?;
        let attention_mask =
            Tensor::from_array((shape, mask.clone())).context("attention_mask tensor")?;
        let token_type_ids =
            Tensor::from_array((shape, vec![0_i64; seq_len])).context("token_type_ids tensor")?;

        // One row per token of last_hidden_state, padding rows dropped.
        let token_rows: Vec<Vec<f64>> = {
            let mut session = self
                .session
                .lock()
                .map_err(|e| anyhow::anyhow!("Session lock poisoned: {e}"))?;

            let outputs = session
                .run(ort::inputs! {
                    "input_ids" => input_ids,
                    "attention_mask" => attention_mask,
                    "token_type_ids" => token_type_ids
                })
                .context("Embedding ONNX inference failed")?;

            let (_shape, hidden) = outputs[0]
                .try_extract_tensor::<f32>()
                .context("Failed to extract last_hidden_state")?;

            if hidden.len() != seq_len * EMBEDDING_DIM {
                anyhow::bail!(
                    "Unexpected embedding output size {} for {} tokens",
                    hidden.len(),
                    seq_len
                );
            }

            let rows: Vec<Vec<f64>> = hidden
                .chunks(EMBEDDING_DIM)
                .zip(&mask)
                .filter(|(_, m)| **m > 0)
                .map(|(row, _)| row.iter().map(|&x| f64::from(x)).collect())
                .collect();
            rows
        };

        debug!(tokens = token_rows.len(), "Computed sentence embedding");

        column_mean(&token_rows).context("No attended tokens in embedding output")
    }
}

impl SentenceEncoder for SentenceModel {
    fn encode(&self, text: &str) -> Result<Vec<f64>, ProviderError> {
        self.embed_one(text)
            .map_err(|e| ProviderError::Inference(format!("{e:#}")))
    }
}

fn load_model(model_dir: &Path) -> Result<SentenceModel> {
    let model_path = model_dir.join("model.onnx");
    let tokenizer_path = model_dir.join("tokenizer.json");

    for path in [&model_path, &tokenizer_path] {
        if !path.exists() {
            anyhow::bail!(
                "Missing {}\nRun `docsim download-model` to download the embedding model.",
                path.display()
            );
        }
    }

    let session = Session::builder()
        .context("ONNX session builder")?
        .commit_from_file(&model_path)
        .with_context(|| format!("Loading {}", model_path.display()))?;

    let tokenizer = Tokenizer::from_file(&tokenizer_path)
        .map_err(|e| anyhow::anyhow!("Loading {}: {e}", tokenizer_path.display()))?;

    Ok(SentenceModel {
        session: Mutex::new(session),
        tokenizer,
    })
}
