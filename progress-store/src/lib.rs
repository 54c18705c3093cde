//! Per-learner lesson completion records.
//!
//! The chat server exposes these through the `/api/progress` routes; the
//! [`ProgressStore`] trait keeps the handlers independent of where records
//! live.

mod error;
mod json_store;

pub use error::ProgressError;
pub use json_store::JsonProgressStore;

use async_trait::async_trait;

/// Completion records keyed by `(user id, lesson slug)`.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    async fn is_completed(&self, user_id: &str, slug: &str) -> Result<bool, ProgressError>;

    /// Record a completion. Marking the same lesson twice is not an error.
    async fn mark_completed(&self, user_id: &str, slug: &str) -> Result<(), ProgressError>;

    /// Cheap round trip proving the backend can serve requests.
    async fn ping(&self) -> Result<(), ProgressError>;
}

/// Trimmed slug, or `None` when it is blank.
pub fn normalize_slug(slug: &str) -> Option<&str> {
    let slug = slug.trim();
    (!slug.is_empty()).then_some(slug)
}
