use crate::config::ChatConfig;
use crate::completion::CompletionRequest;
use crate::completion::CompletionService;
use crate::error::ChatError;
use crate::error::Result;
use crate::error::Stage;
use crate::history::history_window;
use crate::prompt::SYSTEM_INSTRUCTION;
use crate::prompt::grounding_prompt;
use crate::prompt::retain_relevant;
use crate::reply::finalize_reply;
use crate::turn::ConversationTurn;
use crate::turn::Role;
use log::debug;
use log::info;
use log::warn;
use mri_async_utils::OrCancelExt;
use mri_embeddings::Embedder;
use mri_vector_store::Corpus;
use mri_vector_store::ScoredChunk;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Result of answering one chat request
#[derive(Debug, Clone, PartialEq)]
pub struct ChatOutcome {
    /// Assistant turn returned to the browser
    pub reply: ConversationTurn,

    /// Passages that passed the relevance filter, in rank order
    pub sources: Vec<ScoredChunk>,

    /// The model declined to answer
    pub no_answer: bool,
}

/// Retrieval-augmented answering over the shared corpus.
///
/// Holds no per-request state; one instance serves every request.
pub struct ChatPipeline {
    config: ChatConfig,
    system_instruction: String,
    corpus: Arc<Corpus>,
    embedder: Arc<dyn Embedder>,
    completion: Arc<dyn CompletionService>,
}

impl ChatPipeline {
    pub fn new(
        config: ChatConfig,
        corpus: Arc<Corpus>,
        embedder: Arc<dyn Embedder>,
        completion: Arc<dyn CompletionService>,
    ) -> Result<Self> {
        config.validate().map_err(ChatError::InvalidConfig)?;
        let system_instruction = config
            .system_instruction
            .clone()
            .unwrap_or_else(|| SYSTEM_INSTRUCTION.to_string());

        info!(
            "Chat pipeline ready: {} passages, embedder {}, completion {}",
            corpus.len(),
            embedder.model_id(),
            completion.model_id()
        );

        Ok(Self {
            config,
            system_instruction,
            corpus,
            embedder,
            completion,
        })
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Answer the last turn of `turns` using retrieved context and recent history.
    ///
    /// The last turn must be a non-blank user turn. Firing `cancel` drops any
    /// in-flight external call and returns [`ChatError::Cancelled`].
    pub async fn answer(
        &self,
        turns: &[ConversationTurn],
        cancel: &CancellationToken,
    ) -> Result<ChatOutcome> {
        let started = Instant::now();
        let (question, prior) = split_question(turns)?;

        let query = self
            .embedder
            .embed(question)
            .or_cancel_within(cancel, self.config.embedding_timeout())
            .await
            .map_err(|reason| ChatError::interrupted(Stage::Embedding, reason))??;

        let candidates = self.corpus.search(&query, self.config.top_k)?;
        let sources = retain_relevant(candidates, self.config.min_relevance);
        debug!(
            "Retrieved {} passages at or above {}",
            sources.len(),
            self.config.min_relevance
        );

        let request = CompletionRequest {
            system_instruction: self.system_instruction.clone(),
            history: history_window(prior, self.config.history_window),
            prompt: grounding_prompt(question, &sources),
        };

        let raw = self
            .completion
            .complete(&request)
            .or_cancel_within(cancel, self.config.completion_timeout())
            .await
            .map_err(|reason| ChatError::interrupted(Stage::Completing, reason))??;

        let finalized = finalize_reply(&raw, &sources);
        if finalized.no_answer {
            warn!("Model declined to answer; {} passages discarded", sources.len());
        }
        info!(
            "Answered with {} sources, {} history turns in {:?}",
            if finalized.no_answer { 0 } else { sources.len() },
            request.history.len(),
            started.elapsed()
        );

        Ok(ChatOutcome {
            reply: ConversationTurn::assistant(finalized.content),
            sources: if finalized.no_answer {
                Vec::new()
            } else {
                sources
            },
            no_answer: finalized.no_answer,
        })
    }
}

fn split_question(turns: &[ConversationTurn]) -> Result<(&str, &[ConversationTurn])> {
    let Some((last, prior)) = turns.split_last() else {
        return Err(ChatError::InvalidRequest("no messages".into()));
    };
    if last.role != Role::User {
        return Err(ChatError::InvalidRequest(
            "last message must come from the user".into(),
        ));
    }
    if last.content.trim().is_empty() {
        return Err(ChatError::InvalidRequest("last message is empty".into()));
    }
    Ok((last.content.as_str(), prior))
}
