// Semantic similarity engine.
//
// Four strategies built on an `EmbeddingProvider` and word-window chunking:
//
// - embedding: mean cosine over the full doc1-chunks x doc2-chunks product
// - rag:       each doc2 chunk retrieves its top-K doc1 chunks; all retrieved
//              scores are averaged (asymmetric: doc2 queries doc1)
// - llm:       a chat judge's verdict, or a canned narrative derived from the
//              cosine of the two mean chunk embeddings when no judge is set
// - combined:  0.4 * embedding + 0.3 * rag + 0.3 * llm. Both documents are
//              embedded once and all three scores read the same vectors;
//              the judge call (if any) runs concurrently with embedding.
//              Any provider failure fails the whole call.
//
// Each chunk is embedded once per call. Nothing is cached between calls.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use super::narrative::{narrative_from_score, Narrative};
use super::vectors::{cosine_similarity, mean_pairwise_cosine, mean_vector, top_k_scores};
use crate::chunking::{chunk_words, ChunkConfig};
use crate::embeddings::traits::{EmbeddingProvider, NarrativeJudge};
use crate::error::CompareError;

pub const DEFAULT_TOP_K: usize = 3;

/// Fixed weights of the combined strategy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CombinedWeights {
    pub embedding: f64,
    pub rag: f64,
    pub llm: f64,
}

pub const COMBINED_WEIGHTS: CombinedWeights = CombinedWeights {
    embedding: 0.4,
    rag: 0.3,
    llm: 0.3,
};

impl CombinedWeights {
    pub fn combine(&self, embedding: f64, rag: f64, llm: f64) -> f64 {
        self.embedding * embedding + self.rag * rag + self.llm * llm
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticStrategy {
    Embedding,
    Rag,
    Llm,
    Combined,
}

impl SemanticStrategy {
    /// Resolve a `semantic*` identifier. Unknown suffixes run the combined
    /// strategy.
    pub fn from_id(id: &str) -> Self {
        match id {
            "semantic-embedding" => Self::Embedding,
            "semantic-rag" => Self::Rag,
            "semantic-llm" => Self::Llm,
            _ => Self::Combined,
        }
    }

    pub fn id(self) -> &'static str {
        match self {
            Self::Embedding => "semantic-embedding",
            Self::Rag => "semantic-rag",
            Self::Llm => "semantic-llm",
            Self::Combined => "semantic-combined",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Embedding => "Semantic Embedding Similarity",
            Self::Rag => "Semantic RAG Similarity",
            Self::Llm => "Semantic LLM Analysis",
            Self::Combined => "Semantic Combined Analysis",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingScore {
    pub score: f64,
    pub model: String,
    pub doc1_chunks: usize,
    pub doc2_chunks: usize,
    pub comparisons: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RagScore {
    pub score: f64,
    pub model: String,
    pub doc1_chunks: usize,
    pub doc2_chunks: usize,
    pub top_k: usize,
    pub retrieved: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LlmScore {
    pub narrative: Narrative,
    pub model: String,
    pub doc1_chunks: usize,
    pub doc2_chunks: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CombinedScore {
    pub score: f64,
    pub embedding: EmbeddingScore,
    pub rag: RagScore,
    pub llm: LlmScore,
    pub weights: CombinedWeights,
}

/// Native result of a semantic comparison, one variant per strategy.
#[derive(Debug, Clone, PartialEq)]
pub enum SemanticOutcome {
    Embedding(EmbeddingScore),
    Rag(RagScore),
    Llm(LlmScore),
    Combined(CombinedScore),
}

impl SemanticOutcome {
    pub fn strategy(&self) -> SemanticStrategy {
        match self {
            Self::Embedding(_) => SemanticStrategy::Embedding,
            Self::Rag(_) => SemanticStrategy::Rag,
            Self::Llm(_) => SemanticStrategy::Llm,
            Self::Combined(_) => SemanticStrategy::Combined,
        }
    }

    pub fn score(&self) -> f64 {
        match self {
            Self::Embedding(s) => s.score,
            Self::Rag(s) => s.score,
            Self::Llm(s) => s.narrative.score,
            Self::Combined(s) => s.score,
        }
    }
}

/// Chunked document with one vector per chunk.
struct EmbeddedDoc {
    vectors: Vec<Vec<f64>>,
}

impl EmbeddedDoc {
    fn chunks(&self) -> usize {
        self.vectors.len()
    }
}

pub struct SemanticEngine {
    provider: Arc<dyn EmbeddingProvider>,
    judge: Option<Arc<dyn NarrativeJudge>>,
    chunking: ChunkConfig,
    top_k: usize,
}

impl SemanticEngine {
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            provider,
            judge: None,
            chunking: ChunkConfig::default(),
            top_k: DEFAULT_TOP_K,
        }
    }

    /// Use a chat backend for the narrative strategy instead of the
    /// embedding-derived narrative.
    pub fn with_judge(mut self, judge: Arc<dyn NarrativeJudge>) -> Self {
        self.judge = Some(judge);
        self
    }

    pub fn with_chunking(mut self, chunking: ChunkConfig) -> Self {
        self.chunking = chunking;
        self
    }

    /// Set retrieval K; zero is raised to one.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    pub fn model_id(&self) -> &str {
        self.provider.model_id()
    }

    /// Run one strategy.
    pub async fn run(
        &self,
        strategy: SemanticStrategy,
        doc1: &str,
        doc2: &str,
    ) -> Result<SemanticOutcome, CompareError> {
        let outcome = match strategy {
            SemanticStrategy::Embedding => {
                SemanticOutcome::Embedding(self.embedding_similarity(doc1, doc2).await?)
            }
            SemanticStrategy::Rag => SemanticOutcome::Rag(self.rag_similarity(doc1, doc2).await?),
            SemanticStrategy::Llm => SemanticOutcome::Llm(self.llm_similarity(doc1, doc2).await?),
            SemanticStrategy::Combined => {
                SemanticOutcome::Combined(self.combined_similarity(doc1, doc2).await?)
            }
        };

        info!(
            strategy = strategy.id(),
            model = self.model_id(),
            score = outcome.score(),
            "Semantic comparison complete"
        );

        Ok(outcome)
    }

    /// Mean pairwise cosine across all chunk pairs.
    pub async fn embedding_similarity(
        &self,
        doc1: &str,
        doc2: &str,
    ) -> Result<EmbeddingScore, CompareError> {
        let (e1, e2) = self.embed_pair(doc1, doc2).await?;
        Ok(self.score_embedding(&e1, &e2))
    }

    /// Top-K retrieval of doc1 chunks for every doc2 chunk.
    pub async fn rag_similarity(&self, doc1: &str, doc2: &str) -> Result<RagScore, CompareError> {
        let (index, queries) = self.embed_pair(doc1, doc2).await?;
        Ok(self.score_rag(&index, &queries))
    }

    /// Narrative judgment from the chat judge, or from mean embeddings.
    pub async fn llm_similarity(&self, doc1: &str, doc2: &str) -> Result<LlmScore, CompareError> {
        if let Some(judge) = &self.judge {
            let narrative = judge.judge(doc1, doc2).await?;
            return Ok(LlmScore {
                narrative,
                model: judge.model_id().to_string(),
                doc1_chunks: chunk_words(doc1, &self.chunking).len(),
                doc2_chunks: chunk_words(doc2, &self.chunking).len(),
            });
        }

        let (e1, e2) = self.embed_pair(doc1, doc2).await?;
        Ok(self.score_narrative(&e1, &e2))
    }

    /// All three strategies over one embedding pass, weighted together.
    pub async fn combined_similarity(
        &self,
        doc1: &str,
        doc2: &str,
    ) -> Result<CombinedScore, CompareError> {
        let judged = async {
            match &self.judge {
                Some(judge) => {
                    let narrative = judge.judge(doc1, doc2).await?;
                    Ok::<_, CompareError>(Some((narrative, judge.model_id().to_string())))
                }
                None => Ok(None),
            }
        };

        let ((e1, e2), judged) = futures::try_join!(self.embed_pair(doc1, doc2), judged)?;

        let embedding = self.score_embedding(&e1, &e2);
        let rag = self.score_rag(&e1, &e2);
        let llm = match judged {
            Some((narrative, model)) => LlmScore {
                narrative,
                model,
                doc1_chunks: e1.chunks(),
                doc2_chunks: e2.chunks(),
            },
            None => self.score_narrative(&e1, &e2),
        };

        let weights = COMBINED_WEIGHTS;
        let score = weights.combine(embedding.score, rag.score, llm.narrative.score);

        Ok(CombinedScore {
            score,
            embedding,
            rag,
            llm,
            weights,
        })
    }

    fn score_embedding(&self, e1: &EmbeddedDoc, e2: &EmbeddedDoc) -> EmbeddingScore {
        let (score, comparisons) = mean_pairwise_cosine(&e1.vectors, &e2.vectors);

        EmbeddingScore {
            score,
            model: self.model_id().to_string(),
            doc1_chunks: e1.chunks(),
            doc2_chunks: e2.chunks(),
            comparisons,
        }
    }

    fn score_rag(&self, index: &EmbeddedDoc, queries: &EmbeddedDoc) -> RagScore {
        let retrieved: Vec<f64> = queries
            .vectors
            .iter()
            .flat_map(|q| top_k_scores(q, &index.vectors, self.top_k))
            .collect();

        let score = if retrieved.is_empty() {
            0.0
        } else {
            retrieved.iter().sum::<f64>() / retrieved.len() as f64
        };

        RagScore {
            score,
            model: self.model_id().to_string(),
            doc1_chunks: index.chunks(),
            doc2_chunks: queries.chunks(),
            top_k: self.top_k,
            retrieved: retrieved.len(),
        }
    }

    /// Canned narrative from the cosine of the two mean chunk vectors.
    fn score_narrative(&self, e1: &EmbeddedDoc, e2: &EmbeddedDoc) -> LlmScore {
        let score = cosine_similarity(&mean_vector(&e1.vectors), &mean_vector(&e2.vectors));

        LlmScore {
            narrative: narrative_from_score(score),
            model: self.model_id().to_string(),
            doc1_chunks: e1.chunks(),
            doc2_chunks: e2.chunks(),
        }
    }

    async fn embed_pair(
        &self,
        doc1: &str,
        doc2: &str,
    ) -> Result<(EmbeddedDoc, EmbeddedDoc), CompareError> {
        futures::try_join!(self.embed_document(doc1), self.embed_document(doc2))
    }

    async fn embed_document(&self, text: &str) -> Result<EmbeddedDoc, CompareError> {
        let chunks = chunk_words(text, &self.chunking);
        if chunks.is_empty() {
            return Ok(EmbeddedDoc {
                vectors: Vec::new(),
            });
        }

        let vectors = self.provider.embed_batch(&chunks).await?;
        debug!(
            chunks = chunks.len(),
            model = self.model_id(),
            "Embedded document chunks"
        );

        Ok(EmbeddedDoc { vectors })
    }
}
