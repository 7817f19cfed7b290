// Word-window chunking for embedding backends with input-length limits.
//
// A document is split on whitespace into words, then cut into windows of
// `size` words that advance by `size - overlap` words, so consecutive chunks
// share `overlap` words of context. The final window may be shorter. The
// window stops advancing once it reaches the end of the document, so no
// chunk is a pure suffix of its predecessor.

use crate::error::CompareError;

pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Validated chunk window settings. `overlap < size` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkConfig {
    size: usize,
    overlap: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

impl ChunkConfig {
    /// Build a config, rejecting windows that would never advance.
    pub fn new(size: usize, overlap: usize) -> Result<Self, CompareError> {
        if size == 0 {
            return Err(CompareError::InvalidConfig(
                "chunk size must be at least 1 word".to_string(),
            ));
        }
        if overlap >= size {
            return Err(CompareError::InvalidConfig(format!(
                "chunk overlap ({overlap}) must be smaller than chunk size ({size})"
            )));
        }
        Ok(Self { size, overlap })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Words the window advances per chunk.
    pub fn step(&self) -> usize {
        self.size - self.overlap
    }
}

/// Split `text` into overlapping word windows, each re-joined with single spaces.
///
/// Empty or whitespace-only text yields no chunks.
pub fn chunk_words(text: &str, config: &ChunkConfig) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    loop {
        let end = (start + config.size).min(words.len());
        chunks.push(words[start..end].join(" "));
        if end == words.len() {
            break;
        }
        start += config.step();
    }

    chunks
}

/// Number of chunks `chunk_words` produces for a document of `words` words.
pub fn expected_chunk_count(words: usize, config: &ChunkConfig) -> usize {
    if words == 0 {
        0
    } else if words <= config.size {
        1
    } else {
        (words - config.overlap).div_ceil(config.step())
    }
}
