// Embedding backends: one trait, several interchangeable providers.
//
// `EmbeddingProvider` is what the semantic engine consumes. Local inference
// runs the ONNX model in-process; `hosted` and `bedrock` call remote
// services; `chat` is the narrative judge rather than an embedder.

pub mod bedrock;
pub mod chat;
pub mod download;
pub mod hosted;
pub mod local;
pub mod onnx;
pub mod rate_limiter;
pub mod traits;
