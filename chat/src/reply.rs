use crate::prompt::NO_ANSWER_SENTINEL;
use mri_vector_store::ScoredChunk;

/// Model output after sentinel handling and citation formatting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedReply {
    pub content: String,

    /// The model declined to answer; no sources were attached
    pub no_answer: bool,
}

/// Turn raw model text into the reply shown to the learner.
pub fn finalize_reply(raw: &str, sources: &[ScoredChunk]) -> FinalizedReply {
    let trimmed = raw.trim();

    if let Some(rest) = trimmed.strip_prefix(NO_ANSWER_SENTINEL) {
        return FinalizedReply {
            content: rest.to_string(),
            no_answer: true,
        };
    }
    // trimming eats the space after a bare sentinel
    if trimmed == NO_ANSWER_SENTINEL.trim_end() {
        return FinalizedReply {
            content: String::new(),
            no_answer: true,
        };
    }

    let content = if sources.is_empty() {
        trimmed.to_string()
    } else {
        format!("{trimmed}\n\n---\n\n{}", format_sources(sources))
    };
    FinalizedReply {
        content,
        no_answer: false,
    }
}

/// `**Sources:**` heading followed by one Markdown link per passage.
pub fn format_sources(sources: &[ScoredChunk]) -> String {
    let mut block = String::from("**Sources:**");
    for chunk in sources {
        block.push_str(&format!("\n- [{}]({})", chunk.title, chunk.canonical_url));
    }
    block
}
