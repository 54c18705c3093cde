use thiserror::Error;

/// Errors that can occur while embedding a query
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// Invalid input provided to the embedding service
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The HTTP client could not be constructed
    #[error("Failed to build embedding client: {0}")]
    Client(String),

    /// Transport-level failure (connect, timeout, body)
    #[error("Embedding request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service answered with a non-success status
    #[error("Embedding API returned {status}: {message}")]
    Api { status: u16, message: String },

    /// The service answered but produced no vector
    #[error("Embedding API returned an empty vector")]
    EmptyEmbedding,
}
