//! # MRI Learn Chat
//!
//! Turns a chat transcript into one grounded assistant reply:
//!
//! 1. embed the learner's latest question
//! 2. rank corpus passages by cosine similarity and keep the relevant ones
//! 3. send a bounded slice of prior turns plus a context-bearing prompt to
//!    the completion model
//! 4. strip the `<NO_ANSWER>` sentinel or append Markdown citations
//!
//! Both external calls sit behind traits ([`mri_embeddings::Embedder`] and
//! [`CompletionService`]) and are bounded by a timeout and a
//! [`tokio_util::sync::CancellationToken`].

mod completion;
mod config;
mod error;
mod history;
mod pipeline;
mod prompt;
mod reply;
mod turn;

pub use completion::CompletionConfig;
pub use completion::CompletionError;
pub use completion::CompletionRequest;
pub use completion::CompletionService;
pub use completion::DEFAULT_COMPLETION_MODEL;
pub use completion::GeminiCompletion;
pub use config::ChatConfig;
pub use config::DEFAULT_HISTORY_WINDOW;
pub use config::DEFAULT_MIN_RELEVANCE;
pub use config::DEFAULT_TOP_K;
pub use error::ChatError;
pub use error::ErrorKind;
pub use error::Result;
pub use error::Stage;
pub use history::HistoryTurn;
pub use history::ModelRole;
pub use history::history_window;
pub use pipeline::ChatOutcome;
pub use pipeline::ChatPipeline;
pub use prompt::CONTEXT_DELIMITER;
pub use prompt::NO_ANSWER_SENTINEL;
pub use prompt::SYSTEM_INSTRUCTION;
pub use prompt::grounding_prompt;
pub use prompt::retain_relevant;
pub use reply::FinalizedReply;
pub use reply::finalize_reply;
pub use reply::format_sources;
pub use turn::ConversationTurn;
pub use turn::Role;
