//! # MRI Learn Vector Store
//!
//! Brute-force similarity search over the bundled passage corpus.
//!
//! The corpus is small (hundreds to low thousands of passages), so every
//! query is scored against every entry with cosine similarity; no index is
//! built. A [`Corpus`] is immutable once loaded and is meant to be shared
//! behind an `Arc` by every request.
//!
//! ## Example
//!
//! ```no_run
//! use mri_vector_store::Corpus;
//! use std::path::Path;
//!
//! # async fn run() -> Result<(), mri_vector_store::VectorStoreError> {
//! let corpus = Corpus::load(Path::new("public/embeddings.json")).await?;
//! let query = vec![0.0_f32; corpus.dimension().unwrap_or(0)];
//! for hit in corpus.search(&query, 3)? {
//!     println!("{:.3} {}", hit.score, hit.title);
//! }
//! # Ok(())
//! # }
//! ```

mod chunk;
mod corpus;
mod error;

pub use chunk::CorpusEntry;
pub use chunk::ScoredChunk;
pub use corpus::Corpus;
pub use corpus::cosine_similarity;
pub use error::VectorStoreError;
