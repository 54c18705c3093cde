use crate::completion::CompletionError;
use mri_async_utils::Interrupted;
use mri_embeddings::EmbeddingError;
use mri_vector_store::VectorStoreError;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Stage a request can fail in. Prompt assembly and reply post-processing
/// are infallible and have no variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    Embedding,
    Retrieving,
    Completing,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Start => "start",
            Stage::Embedding => "embedding",
            Stage::Retrieving => "retrieving",
            Stage::Completing => "completing",
        };
        f.write_str(name)
    }
}

/// Coarse classification used to pick the response status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed request; the caller should not retry as-is
    Input,
    /// Embedding or similarity search failed
    Retrieval,
    /// The language model call failed or timed out
    Completion,
    /// The caller went away before the pipeline finished
    Cancelled,
    /// The pipeline was constructed with unusable settings
    Config,
}

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Invalid chat request: {0}")]
    InvalidRequest(String),

    #[error("Invalid chat configuration: {0}")]
    InvalidConfig(String),

    #[error("Query embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Similarity search failed: {0}")]
    Search(#[from] VectorStoreError),

    #[error("Completion failed: {0}")]
    Completion(#[from] CompletionError),

    #[error("{stage} timed out after {}ms", .limit.as_millis())]
    TimedOut { stage: Stage, limit: Duration },

    #[error("Request cancelled during {stage}")]
    Cancelled { stage: Stage },
}

impl ChatError {
    pub(crate) fn interrupted(stage: Stage, reason: Interrupted) -> Self {
        match reason {
            Interrupted::Cancelled => ChatError::Cancelled { stage },
            Interrupted::TimedOut(limit) => ChatError::TimedOut { stage, limit },
        }
    }

    /// Pipeline stage the request was in when it failed
    pub fn stage(&self) -> Stage {
        match self {
            ChatError::InvalidRequest(_) | ChatError::InvalidConfig(_) => Stage::Start,
            ChatError::Embedding(_) => Stage::Embedding,
            ChatError::Search(_) => Stage::Retrieving,
            ChatError::Completion(_) => Stage::Completing,
            ChatError::TimedOut { stage, .. } | ChatError::Cancelled { stage } => *stage,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ChatError::InvalidRequest(_) => ErrorKind::Input,
            ChatError::InvalidConfig(_) => ErrorKind::Config,
            ChatError::Search(err) if err.is_query_error() => ErrorKind::Input,
            ChatError::Embedding(_) | ChatError::Search(_) => ErrorKind::Retrieval,
            ChatError::Completion(_) => ErrorKind::Completion,
            ChatError::TimedOut { stage, .. } => match stage {
                Stage::Start | Stage::Embedding | Stage::Retrieving => ErrorKind::Retrieval,
                Stage::Completing => ErrorKind::Completion,
            },
            ChatError::Cancelled { .. } => ErrorKind::Cancelled,
        }
    }
}

pub type Result<T> = std::result::Result<T, ChatError>;
