// docsim: pairwise document similarity
//
// This is the library root. The lexical engine is pure and synchronous;
// the semantic engine goes through a swappable embedding provider. Both
// are reached through `compare::Comparator`, which normalizes every result
// into one shape.

pub mod chunking;
pub mod compare;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod lexical;
pub mod output;
pub mod semantic;

pub use compare::{list_algorithms, AlgorithmInfo, Comparator, SimilarityResult};
pub use error::CompareError;
