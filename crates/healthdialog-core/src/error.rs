use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Index not ready: build() must complete before search()")]
    NotReady,

    #[error("Retrieval failed: {0}")]
    Retrieval(String),

    #[error("Row {row_id} out of range for corpus of {size} entries")]
    OutOfRange { row_id: usize, size: usize },

    #[error("Corpus load failed: {0}")]
    Corpus(String),

    #[error("Synthesis failed: {0}")]
    Synthesis(String),

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

impl Error {
    /// Wrap any embedder/index failure as a retrieval error.
    pub fn retrieval(err: impl std::fmt::Display) -> Self { Self::Retrieval(err.to_string()) }
}

pub type Result<T> = std::result::Result<T, Error>;
