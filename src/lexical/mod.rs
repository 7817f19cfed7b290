// Lexical similarity: tokenization plus three pure, synchronous scorers.
//
// None of these hold state between calls. Each returns its own score type;
// the dispatcher in `crate::compare` flattens them into the shared result.

pub mod jaccard;
pub mod ngram;
pub mod tfidf;
pub mod tokenize;

use jaccard::JaccardScore;
use ngram::{NgramScore, DEFAULT_NGRAM_SIZE};
use tfidf::CosineScore;

/// The lexical algorithms the dispatcher can route to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexicalAlgorithm {
    Jaccard,
    Cosine,
    Ngram,
}

impl LexicalAlgorithm {
    /// Resolve an identifier, defaulting to Jaccard for anything unrecognized.
    pub fn from_id(id: &str) -> Self {
        match id {
            "cosine" => Self::Cosine,
            "ngram" => Self::Ngram,
            _ => Self::Jaccard,
        }
    }

    pub fn id(self) -> &'static str {
        match self {
            Self::Jaccard => "jaccard",
            Self::Cosine => "cosine",
            Self::Ngram => "ngram",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Jaccard => "Jaccard Similarity",
            Self::Cosine => "Cosine Similarity (TF-IDF)",
            Self::Ngram => "N-gram Similarity",
        }
    }

    /// Score two documents with this algorithm.
    pub fn run(self, doc1: &str, doc2: &str) -> LexicalOutcome {
        match self {
            Self::Jaccard => LexicalOutcome::Jaccard(jaccard::jaccard(doc1, doc2)),
            Self::Cosine => LexicalOutcome::Cosine(tfidf::tfidf_cosine(doc1, doc2)),
            Self::Ngram => {
                LexicalOutcome::Ngram(ngram::ngram_similarity(doc1, doc2, DEFAULT_NGRAM_SIZE))
            }
        }
    }
}

/// Native result of a lexical comparison, one variant per algorithm.
#[derive(Debug, Clone, PartialEq)]
pub enum LexicalOutcome {
    Jaccard(JaccardScore),
    Cosine(CosineScore),
    Ngram(NgramScore),
}

impl LexicalOutcome {
    pub fn algorithm(&self) -> LexicalAlgorithm {
        match self {
            Self::Jaccard(_) => LexicalAlgorithm::Jaccard,
            Self::Cosine(_) => LexicalAlgorithm::Cosine,
            Self::Ngram(_) => LexicalAlgorithm::Ngram,
        }
    }

    pub fn score(&self) -> f64 {
        match self {
            Self::Jaccard(r) => r.score,
            Self::Cosine(r) => r.score,
            Self::Ngram(r) => r.score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_id_defaults_to_jaccard() {
        assert_eq!(LexicalAlgorithm::from_id("cosine"), LexicalAlgorithm::Cosine);
        assert_eq!(LexicalAlgorithm::from_id("ngram"), LexicalAlgorithm::Ngram);
        assert_eq!(LexicalAlgorithm::from_id("levenshtein"), LexicalAlgorithm::Jaccard);
        assert_eq!(LexicalAlgorithm::from_id(""), LexicalAlgorithm::Jaccard);
    }

    #[test]
    fn test_run_tags_outcome_with_algorithm() {
        for algo in [
            LexicalAlgorithm::Jaccard,
            LexicalAlgorithm::Cosine,
            LexicalAlgorithm::Ngram,
        ] {
            let outcome = algo.run("one two three four", "one two three five");
            assert_eq!(outcome.algorithm(), algo);
            assert!((0.0..=1.0).contains(&outcome.score()));
        }
    }
}
