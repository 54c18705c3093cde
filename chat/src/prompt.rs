use mri_vector_store::ScoredChunk;

/// Token the model emits, followed by one space, when it cannot ground an answer
pub const NO_ANSWER_SENTINEL: &str = "<NO_ANSWER> ";

/// Separator placed between retrieved passages
pub const CONTEXT_DELIMITER: &str = "\n---\n";

/// Persona and output convention sent as the system instruction
pub const SYSTEM_INSTRUCTION: &str = "You are the MRI Learn assistant, an expert educator in \
magnetic resonance imaging physics, safety and clinical procedures. Answer learners clearly and \
accurately, and keep answers focused on the question. When the prompt includes context passages, \
base your answer on them and do not contradict them. If you cannot answer from the provided \
context or from established MRI knowledge, or the question is not about MRI, start your reply \
with the exact token <NO_ANSWER> followed by a single space and a short explanation for the \
learner. Never use that token in any other situation.";

/// Keep only passages whose score reaches `min_relevance`, preserving order.
pub fn retain_relevant(chunks: Vec<ScoredChunk>, min_relevance: f32) -> Vec<ScoredChunk> {
    chunks
        .into_iter()
        .filter(|chunk| chunk.score >= min_relevance)
        .collect()
}

/// Build the final user prompt for the completion call.
///
/// With passages, the question is prefixed by the joined context; without
/// any, the question is sent unchanged.
pub fn grounding_prompt(question: &str, sources: &[ScoredChunk]) -> String {
    if sources.is_empty() {
        return question.to_string();
    }

    let context = sources
        .iter()
        .map(|chunk| chunk.text.as_str())
        .collect::<Vec<_>>()
        .join(CONTEXT_DELIMITER);
    format!("Use this context:\n{context}\n\nUser: {question}")
}
