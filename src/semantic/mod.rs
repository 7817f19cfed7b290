// Semantic similarity: embedding-based strategies and narrative scoring.

pub mod engine;
pub mod narrative;
pub mod vectors;
