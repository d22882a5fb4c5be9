use crate::error::IndexError;
use crate::models::{Chunk, RetrievedChunk};
use async_trait::async_trait;

/// Black-box nearest-neighbor store of (id, vector, text, metadata) records.
/// Single-writer: concurrent ingestion from multiple callers is out of scope,
/// and `reset` must not run while other calls are in flight.
#[async_trait]
pub trait VectorIndex {
    /// Creates the backing collection if it does not exist yet.
    async fn ensure_ready(&self) -> Result<(), IndexError>;

    /// Insert-or-overwrite by chunk id.
    async fn upsert(&self, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<(), IndexError>;

    /// Removes every chunk belonging to the named source. Run before
    /// re-upserting a source so a shorter re-ingestion cannot leave stale
    /// high-index chunks behind.
    async fn delete_by_source(&self, source: &str) -> Result<(), IndexError>;

    /// Top-k nearest neighbors by the store's similarity metric, best first.
    /// An absent collection yields an empty result, not an error.
    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<RetrievedChunk>, IndexError>;

    /// Drops and recreates the collection. Idempotent; safe when the
    /// collection does not exist.
    async fn reset(&self) -> Result<(), IndexError>;
}
