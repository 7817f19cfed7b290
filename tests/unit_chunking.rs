// Unit tests for word-window chunking.

use docsim::chunking::{chunk_words, expected_chunk_count, ChunkConfig};

fn numbered_words(n: usize) -> String {
    (0..n).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ")
}

/// Rebuild the word sequence by dropping each later chunk's overlap prefix.
fn reconstruct(chunks: &[String], overlap: usize) -> Vec<String> {
    let mut words = Vec::new();
    for (i, chunk) in chunks.iter().enumerate() {
        let skip = if i == 0 { 0 } else { overlap };
        words.extend(chunk.split_whitespace().skip(skip).map(String::from));
    }
    words
}

#[test]
fn chunks_reconstruct_original_words() {
    let config = ChunkConfig::new(10, 3).unwrap();
    for n in [1, 9, 10, 11, 17, 24, 50] {
        let text = numbered_words(n);
        let chunks = chunk_words(&text, &config);
        let original: Vec<String> = text.split_whitespace().map(String::from).collect();
        assert_eq!(reconstruct(&chunks, config.overlap()), original, "n = {n}");
    }
}

#[test]
fn chunk_count_matches_formula() {
    let config = ChunkConfig::new(10, 3).unwrap();
    for n in [0, 1, 10, 11, 17, 18, 24, 100] {
        let chunks = chunk_words(&numbered_words(n), &config);
        assert_eq!(chunks.len(), expected_chunk_count(n, &config), "n = {n}");
    }
    // ceil((24 - 3) / 7) = 3
    assert_eq!(expected_chunk_count(24, &config), 3);
}

#[test]
fn whitespace_only_text_has_no_chunks() {
    let config = ChunkConfig::default();
    assert!(chunk_words("   \n\t  ", &config).is_empty());
}

#[test]
fn default_config_is_thousand_by_two_hundred() {
    let config = ChunkConfig::default();
    assert_eq!(config.size(), 1000);
    assert_eq!(config.overlap(), 200);
    assert_eq!(config.step(), 800);
}

#[test]
fn overlap_not_below_size_is_rejected() {
    assert!(ChunkConfig::new(100, 100).is_err());
    assert!(ChunkConfig::new(100, 150).is_err());
    assert!(ChunkConfig::new(0, 0).is_err());
    assert!(ChunkConfig::new(100, 0).is_ok());
}
