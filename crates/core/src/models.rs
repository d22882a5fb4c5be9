use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One page of extracted PDF text. Page numbers are 1-indexed and increase
/// monotonically within a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub number: u32,
    pub text: String,
}

/// Provenance attached to every persisted chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub source: String,
    pub page: u32,
    pub chunk_index: usize,
}

/// The atomic unit stored in and retrieved from the vector index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub text: String,
    pub metadata: ChunkMetadata,
}

impl Chunk {
    /// Builds a chunk with the canonical id `{source}_chunk_{chunk_index}`.
    /// Re-ingesting the same source therefore overwrites by id.
    pub fn new(source: &str, page: u32, chunk_index: usize, text: String) -> Self {
        Self {
            id: format!("{source}_chunk_{chunk_index}"),
            text,
            metadata: ChunkMetadata {
                source: source.to_string(),
                page,
                chunk_index,
            },
        }
    }
}

/// One nearest-neighbor match, ordered by decreasing similarity within a
/// retrieval result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub text: String,
    pub score: f64,
    pub metadata: ChunkMetadata,
}

/// Outcome of ingesting a single document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionReceipt {
    pub source: String,
    pub checksum: String,
    pub chunk_count: usize,
    pub ingested_at: DateTime<Utc>,
}

/// A structured arXiv search hit, surfaced to the model as a tool result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperSummary {
    pub title: String,
    pub authors: Vec<String>,
    pub summary: String,
    pub pdf_url: String,
}

#[cfg(test)]
mod tests {
    use super::Chunk;

    #[test]
    fn chunk_id_follows_source_and_index() {
        let chunk = Chunk::new("paper.pdf", 3, 7, "body text".to_string());
        assert_eq!(chunk.id, "paper.pdf_chunk_7");
        assert_eq!(chunk.metadata.source, "paper.pdf");
        assert_eq!(chunk.metadata.page, 3);
        assert_eq!(chunk.metadata.chunk_index, 7);
    }
}
