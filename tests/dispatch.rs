// Dispatcher tests: routing, fallback ids, and the normalized result shape.

use std::sync::Arc;

use async_trait::async_trait;

use docsim::compare::{list_algorithms, Comparator};
use docsim::embeddings::traits::{EmbeddingProvider, ProviderError};
use docsim::lexical::tokenize::tokenize;
use docsim::semantic::engine::SemanticEngine;
use docsim::CompareError;

/// Letter-frequency embedder: cheap and deterministic.
struct LetterEmbedder;

#[async_trait]
impl EmbeddingProvider for LetterEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f64>, ProviderError> {
        let mut v = vec![0.0; 26];
        for token in tokenize(text) {
            for b in token.bytes().filter(u8::is_ascii_lowercase) {
                v[(b - b'a') as usize] += 1.0;
            }
        }
        Ok(v)
    }

    fn model_id(&self) -> &str {
        "test/letters"
    }
}

struct DownEmbedder;

#[async_trait]
impl EmbeddingProvider for DownEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f64>, ProviderError> {
        Err(ProviderError::Status {
            provider: "test",
            status: 503,
            body: "unavailable".to_string(),
        })
    }

    fn model_id(&self) -> &str {
        "test/down"
    }
}

fn comparator() -> Comparator {
    Comparator::new(SemanticEngine::new(Arc::new(LetterEmbedder)))
}

const DOC1: &str = "the cat sat on the mat";
const DOC2: &str = "the cat sat on the rug";

// ============================================================
// Catalog
// ============================================================

#[test]
fn catalog_lists_lexical_then_semantic() {
    let ids: Vec<&str> = list_algorithms().iter().map(|a| a.id).collect();
    assert_eq!(
        ids,
        [
            "jaccard",
            "cosine",
            "ngram",
            "semantic-embedding",
            "semantic-rag",
            "semantic-llm",
            "semantic-combined",
        ]
    );
    assert!(list_algorithms().iter().all(|a| !a.description.is_empty()));
}

// ============================================================
// Lexical routing
// ============================================================

#[tokio::test]
async fn jaccard_example_through_dispatcher() {
    let result = comparator().compare(DOC1, DOC2, "jaccard").await.unwrap();
    assert_eq!(result.algorithm_name, "Jaccard Similarity");
    assert!((result.score - 4.0 / 6.0).abs() < 1e-12);
    assert_eq!(result.details["intersection"], 4);
    assert_eq!(result.details["union"], 6);
}

#[tokio::test]
async fn unknown_id_falls_back_to_jaccard() {
    let result = comparator().compare(DOC1, DOC2, "word2vec").await.unwrap();
    assert_eq!(result.algorithm_name, "Jaccard Similarity");
}

#[tokio::test]
async fn every_lexical_result_reports_word_counts() {
    for id in ["jaccard", "cosine", "ngram"] {
        let result = Comparator::lexical_only()
            .compare(DOC1, "a much longer second document here", id)
            .await
            .unwrap();
        assert_eq!(result.details["doc1Words"], 6, "{id}");
        assert_eq!(result.details["doc2Words"], 6, "{id}");
    }
}

#[tokio::test]
async fn ids_are_trimmed_and_case_insensitive() {
    let result = comparator().compare(DOC1, DOC2, "  Cosine ").await.unwrap();
    assert_eq!(result.algorithm_name, "Cosine Similarity (TF-IDF)");
    assert!(result.details.get("vocabularySize").is_some());
}

// ============================================================
// Semantic routing
// ============================================================

#[tokio::test]
async fn semantic_results_report_method_model_and_chunks() {
    for (id, method) in [
        ("semantic-embedding", "embedding"),
        ("semantic-rag", "rag"),
        ("semantic-llm", "llm"),
        ("semantic-combined", "combined"),
    ] {
        let result = comparator().compare(DOC1, DOC2, id).await.unwrap();
        assert_eq!(result.details["method"], method, "{id}");
        assert_eq!(result.details["model"], "test/letters", "{id}");
        assert_eq!(result.details["doc1Chunks"], 1, "{id}");
        assert_eq!(result.details["doc2Chunks"], 1, "{id}");
        assert!((0.0..=1.0).contains(&result.score), "{id}");
    }
}

#[tokio::test]
async fn combined_details_carry_sub_scores_and_weights() {
    let result = comparator()
        .compare(DOC1, DOC2, "semantic-combined")
        .await
        .unwrap();
    let d = &result.details;

    let e = d["embeddingScore"].as_f64().unwrap();
    let r = d["ragScore"].as_f64().unwrap();
    let l = d["llmScore"].as_f64().unwrap();
    assert_eq!(result.score, 0.4 * e + 0.3 * r + 0.3 * l);

    assert_eq!(d["weights"]["embedding"], 0.4);
    assert_eq!(d["weights"]["rag"], 0.3);
    assert_eq!(d["weights"]["llm"], 0.3);
    assert_eq!(result.algorithm_name, "Semantic Combined Analysis");
}

#[tokio::test]
async fn unknown_semantic_id_runs_combined() {
    let result = comparator()
        .compare(DOC1, DOC2, "semantic-quantum")
        .await
        .unwrap();
    assert_eq!(result.algorithm_name, "Semantic Combined Analysis");
}

#[tokio::test]
async fn llm_details_include_narrative_fields() {
    let result = comparator().compare(DOC1, DOC2, "semantic-llm").await.unwrap();
    let d = &result.details;
    assert_eq!(d["source"], "embedding");
    assert!(d["reasoning"].as_str().unwrap().contains("cosine similarity"));
    assert!(d["keySimilarities"].is_array());
    assert!(d["keyDifferences"].is_array());
    assert!(d.get("score").is_none());
    assert_eq!(d["llmScore"], serde_json::Value::Null);
}

#[tokio::test]
async fn provider_failure_fails_the_comparison() {
    let comparator = Comparator::new(SemanticEngine::new(Arc::new(DownEmbedder)));
    let err = comparator
        .compare(DOC1, DOC2, "semantic-embedding")
        .await
        .unwrap_err();
    assert!(err.is_provider_error());
    assert!(matches!(
        err,
        CompareError::Provider(ProviderError::Status { status: 503, .. })
    ));

    // lexical ids never touch the provider
    assert!(comparator.compare(DOC1, DOC2, "jaccard").await.is_ok());
}

#[tokio::test]
async fn result_serializes_with_contract_names() {
    let result = comparator().compare(DOC1, DOC2, "ngram").await.unwrap();
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["algorithm"], "N-gram Similarity");
    assert!(json["similarity"].is_f64());
    assert!(json["details"].is_object());
}
