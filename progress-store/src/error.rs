use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("Invalid slug: {0:?}")]
    InvalidSlug(String),

    #[error("Invalid user id")]
    InvalidUser,

    #[error("Progress storage unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ProgressError {
    /// Errors caused by the caller's input rather than the storage backend
    pub fn is_input_error(&self) -> bool {
        matches!(self, ProgressError::InvalidSlug(_) | ProgressError::InvalidUser)
    }
}
