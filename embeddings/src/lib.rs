//! # MRI Learn Embeddings
//!
//! Query embedding for the chat retrieval pipeline. The corpus vectors are
//! precomputed offline; at request time only the user's question needs a
//! vector, which comes from the Gemini `embedContent` endpoint.
//!
//! The pipeline depends on the [`Embedder`] trait rather than a concrete
//! client so it can run against fakes in tests.
//!
//! ## Example
//!
//! ```no_run
//! use mri_embeddings::{Embedder, EmbeddingConfig, GeminiEmbedder};
//!
//! # async fn run() -> Result<(), mri_embeddings::EmbeddingError> {
//! let embedder = GeminiEmbedder::new("api-key", &EmbeddingConfig::default())?;
//! let vector = embedder.embed("What does a gradient coil do?").await?;
//! println!("{} dimensions", vector.len());
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod gemini;

pub use client::GeminiClientError;
pub use client::api_error_message;
pub use client::gemini_client;
pub use error::EmbeddingError;
pub use gemini::EmbeddingConfig;
pub use gemini::GeminiEmbedder;

use async_trait::async_trait;

/// Default Generative Language API host
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Model the bundled corpus was embedded with; queries must use the same one
pub const DEFAULT_EMBEDDING_MODEL: &str = "models/embedding-001";

/// Produces a dense vector for a piece of text.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Identifier of the model behind this embedder, for logging.
    fn model_id(&self) -> String;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}
