use crate::config::DEFAULT_N_RESULTS;
use crate::embeddings::{BatchedEmbedder, EmbeddingProvider, EmbeddingTask};
use crate::error::PipelineError;
use crate::models::RetrievedChunk;
use crate::traits::VectorIndex;

/// Embeds a question in query mode and fetches its nearest chunks. An empty
/// result means nothing has been ingested yet; it is never an error.
pub struct Retriever<P, V> {
    embedder: BatchedEmbedder<P>,
    index: V,
    n_results: usize,
}

impl<P, V> Retriever<P, V>
where
    P: EmbeddingProvider + Sync,
    V: VectorIndex + Sync,
{
    pub fn new(embedder: BatchedEmbedder<P>, index: V) -> Self {
        Self {
            embedder,
            index,
            n_results: DEFAULT_N_RESULTS,
        }
    }

    pub fn with_n_results(mut self, n_results: usize) -> Self {
        self.n_results = n_results;
        self
    }

    pub async fn retrieve(&self, query: &str) -> Result<Vec<RetrievedChunk>, PipelineError> {
        let vectors = self
            .embedder
            .embed_all(&[query.to_string()], EmbeddingTask::Query)
            .await?;

        let query_vector = match vectors.first() {
            Some(vector) => vector,
            None => return Ok(Vec::new()),
        };

        Ok(self.index.query(query_vector, self.n_results).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::Retriever;
    use crate::embeddings::{BatchPolicy, BatchedEmbedder, EmbeddingProvider, EmbeddingTask};
    use crate::error::{EmbeddingError, IndexError};
    use crate::models::{Chunk, ChunkMetadata, RetrievedChunk};
    use crate::traits::VectorIndex;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FixedProvider;

    #[async_trait]
    impl EmbeddingProvider for FixedProvider {
        async fn embed_batch(
            &self,
            texts: &[String],
            task: EmbeddingTask,
        ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            assert_eq!(task, EmbeddingTask::Query);
            Ok(vec![vec![0.5, 0.5]; texts.len()])
        }

        fn dimensions(&self) -> usize {
            2
        }
    }

    #[derive(Default)]
    struct RecordingIndex {
        queries: Mutex<Vec<(Vec<f32>, usize)>>,
        hits: Vec<RetrievedChunk>,
    }

    #[async_trait]
    impl VectorIndex for RecordingIndex {
        async fn ensure_ready(&self) -> Result<(), IndexError> {
            Ok(())
        }

        async fn upsert(
            &self,
            _chunks: &[Chunk],
            _embeddings: &[Vec<f32>],
        ) -> Result<(), IndexError> {
            Ok(())
        }

        async fn delete_by_source(&self, _source: &str) -> Result<(), IndexError> {
            Ok(())
        }

        async fn query(
            &self,
            vector: &[f32],
            k: usize,
        ) -> Result<Vec<RetrievedChunk>, IndexError> {
            self.queries.lock().unwrap().push((vector.to_vec(), k));
            Ok(self.hits.clone())
        }

        async fn reset(&self) -> Result<(), IndexError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn retrieval_embeds_in_query_mode_and_asks_for_n_results() {
        let embedder = BatchedEmbedder::with_policy(FixedProvider, BatchPolicy::immediate());
        let index = RecordingIndex {
            hits: vec![RetrievedChunk {
                text: "relevant text".to_string(),
                score: 0.8,
                metadata: ChunkMetadata {
                    source: "paper.pdf".to_string(),
                    page: 1,
                    chunk_index: 0,
                },
            }],
            ..Default::default()
        };

        let retriever = Retriever::new(embedder, index).with_n_results(5);
        let hits = retriever.retrieve("what is attention?").await.unwrap();

        assert_eq!(hits.len(), 1);
        let queries = retriever.index.queries.lock().unwrap();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0], (vec![0.5, 0.5], 5));
    }

    #[tokio::test]
    async fn empty_index_is_a_valid_empty_result() {
        let embedder = BatchedEmbedder::with_policy(FixedProvider, BatchPolicy::immediate());
        let retriever = Retriever::new(embedder, RecordingIndex::default());

        let hits = retriever.retrieve("anything").await.unwrap();
        assert!(hits.is_empty());
    }
}
