// Phrase-overlap similarity: Jaccard index over word n-gram sets.
//
// A document with fewer than `n` tokens has no n-grams, so comparing two
// short documents scores 0.0 even when they are identical.

use std::collections::HashSet;

use super::jaccard::jaccard_index;
use super::tokenize::tokenize;

/// Default phrase length.
pub const DEFAULT_NGRAM_SIZE: usize = 3;

/// N-gram comparison of two documents.
#[derive(Debug, Clone, PartialEq)]
pub struct NgramScore {
    pub score: f64,
    pub n: usize,
    pub doc1_ngrams: usize,
    pub doc2_ngrams: usize,
    pub shared_ngrams: usize,
    pub doc1_words: usize,
    pub doc2_words: usize,
}

/// Compare the distinct n-token phrases of two documents.
pub fn ngram_similarity(doc1: &str, doc2: &str, n: usize) -> NgramScore {
    let tokens1 = tokenize(doc1);
    let tokens2 = tokenize(doc2);

    let grams1 = ngrams(&tokens1, n);
    let grams2 = ngrams(&tokens2, n);

    let (score, shared, _union) = jaccard_index(&grams1, &grams2);

    NgramScore {
        score,
        n,
        doc1_ngrams: grams1.len(),
        doc2_ngrams: grams2.len(),
        shared_ngrams: shared,
        doc1_words: tokens1.len(),
        doc2_words: tokens2.len(),
    }
}

/// Distinct contiguous `n`-token windows, joined with single spaces.
pub fn ngrams(tokens: &[String], n: usize) -> HashSet<String> {
    if n == 0 || tokens.len() < n {
        return HashSet::new();
    }
    tokens.windows(n).map(|w| w.join(" ")).collect()
}
