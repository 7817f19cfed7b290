// Word tokenizer shared by every lexical algorithm.
//
// Lower-cases the input, strips everything that is not an ASCII letter,
// digit, or whitespace, then splits on runs of whitespace. Punctuation is
// removed rather than treated as a separator, so "don't" becomes "dont".
// Whitespace means Unicode whitespace: a non-breaking or em space separates
// words exactly like an ASCII space.

/// Split text into an ordered sequence of lowercase alphanumeric tokens.
///
/// Empty or punctuation-only input yields an empty vector.
pub fn tokenize(text: &str) -> Vec<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .filter(|&c| is_kept(c))
        .collect();
    cleaned.split_whitespace().map(str::to_string).collect()
}

fn is_kept(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace()
}
