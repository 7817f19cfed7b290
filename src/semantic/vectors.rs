// Vector math for embedding comparisons.
//
// Cosine scores are clamped to [0, 1]: opposite-direction vectors count as
// "not similar" rather than negatively similar. Mismatched dimensions, empty
// vectors, and zero vectors all score 0.0.

/// Cosine similarity between two embedding vectors, clamped to [0, 1].
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let mag_b: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();

    let denom = mag_a * mag_b;
    if denom < f64::EPSILON {
        0.0
    } else {
        (dot / denom).clamp(0.0, 1.0)
    }
}

/// Column average of equally sized rows.
///
/// None for no rows, zero-width rows, or rows of differing length.
pub fn column_mean(rows: &[Vec<f64>]) -> Option<Vec<f64>> {
    let width = rows.first()?.len();
    if width == 0 || rows.iter().any(|r| r.len() != width) {
        return None;
    }

    let mut mean = vec![0.0_f64; width];
    for row in rows {
        for (acc, &v) in mean.iter_mut().zip(row) {
            *acc += v;
        }
    }
    let n = rows.len() as f64;
    for v in &mut mean {
        *v /= n;
    }
    Some(mean)
}

/// Mean of a document's chunk vectors; empty when they cannot be averaged.
pub fn mean_vector(vectors: &[Vec<f64>]) -> Vec<f64> {
    column_mean(vectors).unwrap_or_default()
}

/// Mean cosine similarity over every (a, b) pair of the cross product.
/// Returns (score, number of pairs compared).
pub fn mean_pairwise_cosine(a: &[Vec<f64>], b: &[Vec<f64>]) -> (f64, usize) {
    let pairs = a.len() * b.len();
    if pairs == 0 {
        return (0.0, 0);
    }

    let total: f64 = a
        .iter()
        .flat_map(|x| b.iter().map(move |y| cosine_similarity(x, y)))
        .sum();

    (total / pairs as f64, pairs)
}

/// The `k` highest cosine scores of `query` against `index`, best first.
pub fn top_k_scores(query: &[f64], index: &[Vec<f64>], k: usize) -> Vec<f64> {
    let mut scores: Vec<f64> = index.iter().map(|v| cosine_similarity(query, v)).collect();
    scores.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
    scores.truncate(k);
    scores
}
