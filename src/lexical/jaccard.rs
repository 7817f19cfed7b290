// Set-overlap (Jaccard) similarity over document vocabularies.
//
//   |tokens_a ∩ tokens_b| / |tokens_a ∪ tokens_b|
//
// Word order and repetition are ignored. An empty union scores 0.0.

use std::collections::HashSet;
use std::hash::Hash;

use super::tokenize::tokenize;

/// Jaccard comparison of two documents, with the set sizes behind the score.
#[derive(Debug, Clone, PartialEq)]
pub struct JaccardScore {
    pub score: f64,
    pub intersection: usize,
    pub union: usize,
    pub doc1_words: usize,
    pub doc2_words: usize,
}

/// Tokenize both documents and compare their vocabularies.
pub fn jaccard(doc1: &str, doc2: &str) -> JaccardScore {
    let tokens1 = tokenize(doc1);
    let tokens2 = tokenize(doc2);

    let set1: HashSet<&str> = tokens1.iter().map(String::as_str).collect();
    let set2: HashSet<&str> = tokens2.iter().map(String::as_str).collect();

    let (score, intersection, union) = jaccard_index(&set1, &set2);

    JaccardScore {
        score,
        intersection,
        union,
        doc1_words: tokens1.len(),
        doc2_words: tokens2.len(),
    }
}

/// Jaccard index of two sets: (score, |A ∩ B|, |A ∪ B|).
///
/// Shared with the n-gram comparison, which applies the same index to
/// phrase sets instead of word sets.
pub fn jaccard_index<T: Eq + Hash>(a: &HashSet<T>, b: &HashSet<T>) -> (f64, usize, usize) {
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;

    if union == 0 {
        (0.0, 0, 0)
    } else {
        (intersection as f64 / union as f64, intersection, union)
    }
}
