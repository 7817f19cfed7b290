// TF-IDF cosine similarity between two documents.
//
// The "corpus" is exactly the two documents being compared, so document
// frequency is 1 or 2 and the smoothed IDF is
//
//   idf(term) = ln(2 / (df + 1)) + 1
//
// Terms shared by both documents get ln(2/3) + 1 ≈ 0.595, terms unique to one
// get exactly 1.0. This is not a general corpus IDF and only applies to
// pairwise comparison.
//
// Term frequency is count / total tokens in that document. The vocabulary is
// iterated in sorted order so both orientations of a comparison sum in the
// same order and produce bit-identical scores.

use std::collections::{BTreeSet, HashMap};

use super::tokenize::tokenize;

/// Cosine comparison of two documents' TF-IDF vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct CosineScore {
    pub score: f64,
    pub vocabulary_size: usize,
    pub doc1_words: usize,
    pub doc2_words: usize,
}

/// Tokenize both documents, weight their terms, and compare the vectors.
pub fn tfidf_cosine(doc1: &str, doc2: &str) -> CosineScore {
    let tokens1 = tokenize(doc1);
    let tokens2 = tokenize(doc2);

    let tf1 = term_frequencies(&tokens1);
    let tf2 = term_frequencies(&tokens2);

    let vocabulary: BTreeSet<&str> = tf1.keys().chain(tf2.keys()).copied().collect();

    let mut dot = 0.0_f64;
    let mut norm1_sq = 0.0_f64;
    let mut norm2_sq = 0.0_f64;

    for term in &vocabulary {
        let a = tf1.get(term).copied().unwrap_or(0.0);
        let b = tf2.get(term).copied().unwrap_or(0.0);

        let df = u32::from(a > 0.0) + u32::from(b > 0.0);
        let idf = pairwise_idf(df);

        let w1 = a * idf;
        let w2 = b * idf;

        dot += w1 * w2;
        norm1_sq += w1 * w1;
        norm2_sq += w2 * w2;
    }

    // sqrt(x * x) == x in IEEE arithmetic, so identical documents land on
    // exactly 1.0 instead of 0.9999...
    let denom = (norm1_sq * norm2_sq).sqrt();
    let score = if denom == 0.0 {
        0.0
    } else {
        (dot / denom).clamp(0.0, 1.0)
    };

    CosineScore {
        score,
        vocabulary_size: vocabulary.len(),
        doc1_words: tokens1.len(),
        doc2_words: tokens2.len(),
    }
}

/// Smoothed inverse document frequency for a two-document corpus.
pub fn pairwise_idf(df: u32) -> f64 {
    (2.0 / (df as f64 + 1.0)).ln() + 1.0
}

/// Relative term frequency: occurrences / total tokens.
fn term_frequencies(tokens: &[String]) -> HashMap<&str, f64> {
    let mut counts: HashMap<&str, f64> = HashMap::new();
    for token in tokens {
        *counts.entry(token.as_str()).or_insert(0.0) += 1.0;
    }

    let total = tokens.len() as f64;
    for value in counts.values_mut() {
        *value /= total;
    }

    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idf_values() {
        assert!((pairwise_idf(1) - 1.0).abs() < 1e-12);
        assert!((pairwise_idf(2) - ((2.0_f64 / 3.0).ln() + 1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_term_frequencies_sum_to_one() {
        let tokens: Vec<String> = ["a", "b", "a", "c"].iter().map(|s| s.to_string()).collect();
        let tf = term_frequencies(&tokens);
        assert!((tf["a"] - 0.5).abs() < 1e-12);
        assert!((tf["b"] - 0.25).abs() < 1e-12);
        let sum: f64 = tf.values().sum();
        assert!((sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_identical_documents_exactly_one() {
        let text = "the quick brown fox jumps over the lazy dog the end";
        assert_eq!(tfidf_cosine(text, text).score, 1.0);
    }

    #[test]
    fn test_disjoint_documents_zero() {
        let result = tfidf_cosine("apples oranges", "trains planes");
        assert_eq!(result.score, 0.0);
        assert_eq!(result.vocabulary_size, 4);
    }

    #[test]
    fn test_one_empty_document_zero() {
        let result = tfidf_cosine("...", "some actual words");
        assert_eq!(result.score, 0.0);
        assert_eq!(result.doc1_words, 0);
    }

    #[test]
    fn test_known_value() {
        // doc1 = {a:1/2, b:1/2}, doc2 = {a:1/2, c:1/2}
        // shared a: idf = ln(2/3)+1 = s; unique b, c: idf = 1
        // cos = (0.5s)^2 / ((0.5s)^2 + 0.25)
        let s = (2.0_f64 / 3.0).ln() + 1.0;
        let expected = (0.25 * s * s) / (0.25 * s * s + 0.25);
        let result = tfidf_cosine("a b", "a c");
        assert!((result.score - expected).abs() < 1e-12);
    }
}
