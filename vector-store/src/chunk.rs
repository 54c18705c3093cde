use serde::Deserialize;
use serde::Serialize;

/// One passage of the bundled corpus together with its precomputed embedding
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CorpusEntry {
    /// Passage text handed to the model as context
    pub text: String,

    /// Dense vector produced offline by the embedding model
    pub embedding: Vec<f32>,

    /// Display label used in citations
    pub title: String,

    /// Citation link target
    pub canonical_url: String,
}

impl CorpusEntry {
    pub fn new(
        text: impl Into<String>,
        embedding: Vec<f32>,
        title: impl Into<String>,
        canonical_url: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            embedding,
            title: title.into(),
            canonical_url: canonical_url.into(),
        }
    }
}

/// A corpus passage scored against one query
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScoredChunk {
    pub text: String,
    pub title: String,
    pub canonical_url: String,

    /// Cosine similarity in [-1, 1], higher is better
    pub score: f32,
}

impl ScoredChunk {
    pub(crate) fn from_entry(entry: &CorpusEntry, score: f32) -> Self {
        Self {
            text: entry.text.clone(),
            title: entry.title.clone(),
            canonical_url: entry.canonical_url.clone(),
            score,
        }
    }
}
