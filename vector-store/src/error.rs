use thiserror::Error;

/// Errors that can occur while loading or searching the corpus
#[derive(Debug, Error)]
pub enum VectorStoreError {
    /// A query vector or search parameter was unusable
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Vector lengths disagree (between corpus entries, or query vs corpus)
    #[error("Dimension mismatch{}: expected {expected}, got {actual}", at_entry(.index))]
    DimensionMismatch {
        /// Offending corpus entry, `None` when the query is at fault
        index: Option<usize>,
        expected: usize,
        actual: usize,
    },

    /// A corpus entry failed validation at load time
    #[error("Invalid corpus entry {index}: {reason}")]
    InvalidEntry { index: usize, reason: String },

    /// IO error while reading the corpus file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The corpus file is not a JSON array of entries
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl VectorStoreError {
    /// True when the caller supplied bad input, as opposed to a corpus/IO fault.
    pub fn is_query_error(&self) -> bool {
        matches!(
            self,
            VectorStoreError::InvalidQuery(_)
                | VectorStoreError::DimensionMismatch { index: None, .. }
        )
    }
}

fn at_entry(index: &Option<usize>) -> String {
    match index {
        Some(index) => format!(" at entry {index}"),
        None => String::new(),
    }
}
