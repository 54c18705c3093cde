use crate::chunk::CorpusEntry;
use crate::chunk::ScoredChunk;
use crate::error::VectorStoreError;
use log::debug;
use log::info;
use std::path::Path;

#[derive(Debug, Clone)]
struct IndexedEntry {
    entry: CorpusEntry,
    norm: f64,
}

/// Read-only passage corpus, loaded once and shared by reference.
///
/// All embeddings have the same length. Each entry's norm is computed at
/// construction so a search only pays for the query norm and the dot products.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    entries: Vec<IndexedEntry>,
    dimension: Option<usize>,
}

impl Corpus {
    /// Build a corpus, validating that every embedding is non-empty, finite,
    /// and of equal length.
    pub fn from_entries(entries: Vec<CorpusEntry>) -> Result<Self, VectorStoreError> {
        let mut dimension = None;
        let mut indexed = Vec::with_capacity(entries.len());

        for (index, entry) in entries.into_iter().enumerate() {
            let actual = entry.embedding.len();
            if actual == 0 {
                return Err(VectorStoreError::InvalidEntry {
                    index,
                    reason: "embedding is empty".to_string(),
                });
            }
            if !entry.embedding.iter().all(|x| x.is_finite()) {
                return Err(VectorStoreError::InvalidEntry {
                    index,
                    reason: "embedding contains a non-finite value".to_string(),
                });
            }
            match dimension {
                None => dimension = Some(actual),
                Some(expected) if expected != actual => {
                    return Err(VectorStoreError::DimensionMismatch {
                        index: Some(index),
                        expected,
                        actual,
                    });
                }
                Some(_) => {}
            }

            let norm = l2_norm(&entry.embedding);
            indexed.push(IndexedEntry { entry, norm });
        }

        Ok(Self {
            entries: indexed,
            dimension,
        })
    }

    /// Parse a JSON array of `{text, embedding, title, canonicalUrl}` records.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, VectorStoreError> {
        let entries: Vec<CorpusEntry> = serde_json::from_slice(bytes)?;
        Self::from_entries(entries)
    }

    /// Load the bundled dataset file.
    pub async fn load(path: &Path) -> Result<Self, VectorStoreError> {
        info!("Loading corpus from {}", path.display());
        let content = tokio::fs::read(path).await?;
        let corpus = Self::from_json_slice(&content)?;
        info!(
            "Loaded {} corpus entries ({} dimensions)",
            corpus.len(),
            corpus.dimension.unwrap_or(0)
        );
        Ok(corpus)
    }

    /// Rank every entry against `query` and return the best `top_k`.
    ///
    /// Results are ordered by descending cosine similarity; equal scores keep
    /// corpus order. An empty corpus yields an empty result for any query.
    pub fn search(
        &self,
        query: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredChunk>, VectorStoreError> {
        if top_k == 0 {
            return Err(VectorStoreError::InvalidQuery(
                "top_k must be greater than zero".to_string(),
            ));
        }
        let Some(expected) = self.dimension else {
            return Ok(Vec::new());
        };
        if query.len() != expected {
            return Err(VectorStoreError::DimensionMismatch {
                index: None,
                expected,
                actual: query.len(),
            });
        }
        if !query.iter().all(|x| x.is_finite()) {
            return Err(VectorStoreError::InvalidQuery(
                "query vector contains a non-finite value".to_string(),
            ));
        }

        let query_norm = l2_norm(query);
        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(idx, indexed)| {
                let score = cosine_with_norms(
                    query,
                    query_norm,
                    &indexed.entry.embedding,
                    indexed.norm,
                );
                (idx, score)
            })
            .collect();

        // sort_by is stable, so ties stay in corpus order
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        let results: Vec<ScoredChunk> = scored
            .into_iter()
            .take(top_k)
            .map(|(idx, score)| ScoredChunk::from_entry(&self.entries[idx].entry, score))
            .collect();

        debug!(
            "Scored {} entries, returning {} (best {:?})",
            self.entries.len(),
            results.len(),
            results.first().map(|r| r.score)
        );
        Ok(results)
    }

    /// Number of entries in the corpus
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Shared embedding length, `None` for an empty corpus
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    pub fn entries(&self) -> impl Iterator<Item = &CorpusEntry> {
        self.entries.iter().map(|indexed| &indexed.entry)
    }
}

/// Cosine similarity of two equal-length vectors; zero when either has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    cosine_with_norms(a, l2_norm(a), b, l2_norm(b))
}

// Accumulates in f64: squares of finite f32 values neither overflow nor
// underflow there.
fn cosine_with_norms(a: &[f32], norm_a: f64, b: &[f32], norm_b: f64) -> f32 {
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let dot: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| f64::from(*x) * f64::from(*y))
        .sum();
    let score = ((dot / norm_a / norm_b) as f32).clamp(-1.0, 1.0);
    // total_cmp orders -0.0 below 0.0
    if score == 0.0 { 0.0 } else { score }
}

fn l2_norm(v: &[f32]) -> f64 {
    v.iter()
        .map(|x| f64::from(*x) * f64::from(*x))
        .sum::<f64>()
        .sqrt()
}
