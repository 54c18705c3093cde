use serde::Deserialize;
use serde::Serialize;
use std::time::Duration;

/// Passages requested from the similarity search per question
pub const DEFAULT_TOP_K: usize = 3;

/// Minimum cosine similarity for a passage to be used as context.
///
/// Earlier deployments used 0.65; 0.6 is the current value. Needs product
/// validation against real questions before changing again.
pub const DEFAULT_MIN_RELEVANCE: f32 = 0.6;

/// Prior turns (excluding the current question) forwarded to the model
pub const DEFAULT_HISTORY_WINDOW: usize = 5;

/// Configuration for the chat pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Number of passages retrieved before relevance filtering
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Passages scoring below this are discarded (inclusive lower bound)
    #[serde(default = "default_min_relevance")]
    pub min_relevance: f32,

    /// Maximum number of prior turns sent as history
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    /// Upper bound on the query embedding call
    #[serde(default = "default_embedding_timeout_ms")]
    pub embedding_timeout_ms: u64,

    /// Upper bound on the completion call
    #[serde(default = "default_completion_timeout_ms")]
    pub completion_timeout_ms: u64,

    /// Replaces the built-in persona when set
    #[serde(default)]
    pub system_instruction: Option<String>,
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

fn default_min_relevance() -> f32 {
    DEFAULT_MIN_RELEVANCE
}

fn default_history_window() -> usize {
    DEFAULT_HISTORY_WINDOW
}

fn default_embedding_timeout_ms() -> u64 {
    10_000
}

fn default_completion_timeout_ms() -> u64 {
    30_000
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            min_relevance: default_min_relevance(),
            history_window: default_history_window(),
            embedding_timeout_ms: default_embedding_timeout_ms(),
            completion_timeout_ms: default_completion_timeout_ms(),
            system_instruction: None,
        }
    }
}

impl ChatConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.top_k == 0 {
            return Err("top_k must be > 0".to_string());
        }

        if !self.min_relevance.is_finite() || !(-1.0..=1.0).contains(&self.min_relevance) {
            return Err(format!(
                "min_relevance must be in [-1.0, 1.0], got {}",
                self.min_relevance
            ));
        }

        if self.embedding_timeout_ms == 0 {
            return Err("embedding_timeout_ms must be > 0".to_string());
        }

        if self.completion_timeout_ms == 0 {
            return Err("completion_timeout_ms must be > 0".to_string());
        }

        if self
            .system_instruction
            .as_deref()
            .is_some_and(|instruction| instruction.trim().is_empty())
        {
            return Err("system_instruction must not be blank".to_string());
        }

        Ok(())
    }

    pub fn embedding_timeout(&self) -> Duration {
        Duration::from_millis(self.embedding_timeout_ms)
    }

    pub fn completion_timeout(&self) -> Duration {
        Duration::from_millis(self.completion_timeout_ms)
    }
}
