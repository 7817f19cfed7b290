// Dispatcher and result normalizer.
//
// `Comparator::compare` resolves an algorithm id, runs the lexical engine
// (synchronous) or the semantic engine (async, may call a provider), and
// flattens the engine's native outcome into the one `SimilarityResult`
// shape. Engines never build `SimilarityResult` themselves.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::error::CompareError;
use crate::lexical::{LexicalAlgorithm, LexicalOutcome};
use crate::semantic::engine::{SemanticEngine, SemanticOutcome, SemanticStrategy};

/// Ids starting with this prefix route to the semantic engine.
pub const SEMANTIC_PREFIX: &str = "semantic";

/// One entry of the algorithm catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AlgorithmInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

static CATALOG: [AlgorithmInfo; 7] = [
    AlgorithmInfo {
        id: "jaccard",
        name: "Jaccard Similarity",
        description: "Shared vocabulary divided by combined vocabulary",
    },
    AlgorithmInfo {
        id: "cosine",
        name: "Cosine Similarity (TF-IDF)",
        description: "Angle between TF-IDF weighted term vectors",
    },
    AlgorithmInfo {
        id: "ngram",
        name: "N-gram Similarity",
        description: "Overlap of three-word phrases",
    },
    AlgorithmInfo {
        id: "semantic-embedding",
        name: "Semantic Embedding Similarity",
        description: "Mean cosine similarity between all chunk embeddings",
    },
    AlgorithmInfo {
        id: "semantic-rag",
        name: "Semantic RAG Similarity",
        description: "Each chunk of document 2 retrieves its closest chunks in document 1",
    },
    AlgorithmInfo {
        id: "semantic-llm",
        name: "Semantic LLM Analysis",
        description: "Qualitative judgment with key similarities and differences",
    },
    AlgorithmInfo {
        id: "semantic-combined",
        name: "Semantic Combined Analysis",
        description: "Weighted blend of embedding, RAG and LLM scores",
    },
];

/// The static algorithm catalog, in display order.
pub fn list_algorithms() -> &'static [AlgorithmInfo] {
    &CATALOG
}

/// Normalized output of every comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityResult {
    #[serde(rename = "similarity")]
    pub score: f64,
    #[serde(rename = "algorithm")]
    pub algorithm_name: String,
    pub details: Value,
}

/// A resolved algorithm id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Lexical(LexicalAlgorithm),
    Semantic(SemanticStrategy),
}

impl Algorithm {
    /// Resolve an id (case-insensitive, surrounding whitespace ignored).
    /// Never fails: unknown lexical ids become Jaccard, unknown semantic
    /// ids become the combined strategy.
    pub fn resolve(id: &str) -> Self {
        let id = id.trim().to_lowercase();
        if id.starts_with(SEMANTIC_PREFIX) {
            Self::Semantic(SemanticStrategy::from_id(&id))
        } else {
            Self::Lexical(LexicalAlgorithm::from_id(&id))
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Lexical(a) => a.display_name(),
            Self::Semantic(s) => s.display_name(),
        }
    }
}

/// Run a lexical comparison and normalize it. Pure and synchronous.
pub fn compare_lexical(doc1: &str, doc2: &str, algorithm: LexicalAlgorithm) -> SimilarityResult {
    SimilarityResult::from(algorithm.run(doc1, doc2))
}

/// Entry point for comparisons. Holds the optional semantic engine.
pub struct Comparator {
    semantic: Option<SemanticEngine>,
}

impl Comparator {
    /// Comparator with an embedding-backed semantic engine.
    pub fn new(semantic: SemanticEngine) -> Self {
        Self {
            semantic: Some(semantic),
        }
    }

    /// Comparator without a semantic engine; semantic ids fail with
    /// `CompareError::InvalidConfig`.
    pub fn lexical_only() -> Self {
        Self { semantic: None }
    }

    pub fn has_semantic(&self) -> bool {
        self.semantic.is_some()
    }

    pub async fn compare(
        &self,
        doc1: &str,
        doc2: &str,
        algorithm_id: &str,
    ) -> Result<SimilarityResult, CompareError> {
        let result = match Algorithm::resolve(algorithm_id) {
            Algorithm::Lexical(algorithm) => compare_lexical(doc1, doc2, algorithm),
            Algorithm::Semantic(strategy) => {
                let engine = self.semantic.as_ref().ok_or_else(|| {
                    CompareError::InvalidConfig(format!(
                        "'{algorithm_id}' needs an embedding provider, but none is configured"
                    ))
                })?;
                SimilarityResult::from(engine.run(strategy, doc1, doc2).await?)
            }
        };

        info!(
            requested = algorithm_id,
            algorithm = %result.algorithm_name,
            score = result.score,
            "Comparison complete"
        );

        Ok(result)
    }
}

impl From<LexicalOutcome> for SimilarityResult {
    fn from(outcome: LexicalOutcome) -> Self {
        let algorithm_name = outcome.algorithm().display_name().to_string();
        let score = outcome.score();

        let details = match outcome {
            LexicalOutcome::Jaccard(r) => json!({
                "doc1Words": r.doc1_words,
                "doc2Words": r.doc2_words,
                "intersection": r.intersection,
                "union": r.union,
            }),
            LexicalOutcome::Cosine(r) => json!({
                "doc1Words": r.doc1_words,
                "doc2Words": r.doc2_words,
                "vocabularySize": r.vocabulary_size,
            }),
            LexicalOutcome::Ngram(r) => json!({
                "doc1Words": r.doc1_words,
                "doc2Words": r.doc2_words,
                "n": r.n,
                "doc1Ngrams": r.doc1_ngrams,
                "doc2Ngrams": r.doc2_ngrams,
                "sharedNgrams": r.shared_ngrams,
            }),
        };

        Self {
            score,
            algorithm_name,
            details,
        }
    }
}

impl From<SemanticOutcome> for SimilarityResult {
    fn from(outcome: SemanticOutcome) -> Self {
        let algorithm_name = outcome.strategy().display_name().to_string();
        let score = outcome.score();

        let details = match outcome {
            SemanticOutcome::Embedding(s) => json!({
                "method": "embedding",
                "model": s.model,
                "doc1Chunks": s.doc1_chunks,
                "doc2Chunks": s.doc2_chunks,
                "comparisons": s.comparisons,
            }),
            SemanticOutcome::Rag(s) => json!({
                "method": "rag",
                "model": s.model,
                "doc1Chunks": s.doc1_chunks,
                "doc2Chunks": s.doc2_chunks,
                "topK": s.top_k,
                "retrieved": s.retrieved,
            }),
            SemanticOutcome::Llm(s) => {
                let mut details = json!({
                    "method": "llm",
                    "model": s.model,
                    "doc1Chunks": s.doc1_chunks,
                    "doc2Chunks": s.doc2_chunks,
                });
                merge_narrative(&mut details, &s.narrative);
                details
            }
            SemanticOutcome::Combined(s) => {
                let mut details = json!({
                    "method": "combined",
                    "model": s.embedding.model,
                    "doc1Chunks": s.embedding.doc1_chunks,
                    "doc2Chunks": s.embedding.doc2_chunks,
                    "embeddingScore": s.embedding.score,
                    "ragScore": s.rag.score,
                    "llmScore": s.llm.narrative.score,
                    "llmModel": s.llm.model,
                    "topK": s.rag.top_k,
                    "weights": s.weights,
                });
                merge_narrative(&mut details, &s.llm.narrative);
                details
            }
        };

        Self {
            score,
            algorithm_name,
            details,
        }
    }
}

/// Copy the narrative's descriptive fields (not its score) into `details`.
fn merge_narrative(details: &mut Value, narrative: &crate::semantic::narrative::Narrative) {
    let (Value::Object(target), Ok(Value::Object(fields))) =
        (details, serde_json::to_value(narrative))
    else {
        return;
    };
    for (key, value) in fields {
        if key != "score" {
            target.insert(key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_routes_by_prefix() {
        assert_eq!(
            Algorithm::resolve("cosine"),
            Algorithm::Lexical(LexicalAlgorithm::Cosine)
        );
        assert_eq!(
            Algorithm::resolve("  NGRAM "),
            Algorithm::Lexical(LexicalAlgorithm::Ngram)
        );
        assert_eq!(
            Algorithm::resolve("semantic-rag"),
            Algorithm::Semantic(SemanticStrategy::Rag)
        );
        assert_eq!(
            Algorithm::resolve("Semantic-LLM"),
            Algorithm::Semantic(SemanticStrategy::Llm)
        );
        assert_eq!(
            Algorithm::resolve("bogus"),
            Algorithm::Lexical(LexicalAlgorithm::Jaccard)
        );
    }

    #[test]
    fn test_catalog_ids_resolve_to_their_names() {
        for info in list_algorithms() {
            assert_eq!(Algorithm::resolve(info.id).display_name(), info.name);
        }
    }

    #[test]
    fn test_result_serializes_contract_field_names() {
        let result = compare_lexical("a b", "a c", LexicalAlgorithm::Jaccard);
        let value = serde_json::to_value(&result).unwrap();
        assert!(value.get("similarity").is_some());
        assert_eq!(value["algorithm"], "Jaccard Similarity");
        assert_eq!(value["details"]["doc1Words"], 2);
    }

    #[tokio::test]
    async fn test_semantic_without_engine_is_config_error() {
        let comparator = Comparator::lexical_only();
        let err = comparator
            .compare("a", "b", "semantic-embedding")
            .await
            .unwrap_err();
        assert!(matches!(err, CompareError::InvalidConfig(_)));
        assert!(!err.is_provider_error());
    }
}
