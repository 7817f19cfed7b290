// Error types for the comparison core.
//
// Degenerate numeric inputs (empty vocabulary, zero vectors, short
// documents) never produce an error; they score 0.0. What does fail a
// comparison is a provider failure or an invalid configuration.

use thiserror::Error;

use crate::embeddings::traits::ProviderError;

#[derive(Debug, Error)]
pub enum CompareError {
    /// An embedding or chat backend failed. Not retried.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Settings that can never produce a result, e.g. chunk overlap >= size.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CompareError {
    /// True when the failure came from an external backend rather than
    /// from local configuration.
    pub fn is_provider_error(&self) -> bool {
        matches!(self, Self::Provider(_))
    }
}
