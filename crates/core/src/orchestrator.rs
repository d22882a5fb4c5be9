use crate::arxiv::ArxivSearchTool;
use crate::chunking::ChunkingConfig;
use crate::config::EngineConfig;
use crate::embeddings::{BatchedEmbedder, EmbeddingProvider, GeminiEmbeddingProvider};
use crate::error::PipelineError;
use crate::extractor::LopdfExtractor;
use crate::generation::{GeminiGenerator, GenerativeModel};
use crate::ingest::IngestionPipeline;
use crate::retriever::Retriever;
use crate::stores::QdrantStore;
use crate::synthesizer::AnswerSynthesizer;
use crate::traits::VectorIndex;

/// Retrieve → synthesize. The single entry point for question answering:
/// one request, one answer, no conversation state held here.
pub struct QueryPipeline<P, V, G> {
    retriever: Retriever<P, V>,
    synthesizer: AnswerSynthesizer<G>,
}

impl<P, V, G> QueryPipeline<P, V, G>
where
    P: EmbeddingProvider + Sync,
    V: VectorIndex + Sync,
    G: GenerativeModel + Sync,
{
    pub fn new(retriever: Retriever<P, V>, synthesizer: AnswerSynthesizer<G>) -> Self {
        Self {
            retriever,
            synthesizer,
        }
    }

    pub async fn answer(&self, query: &str) -> Result<String, PipelineError> {
        let retrieved = self.retriever.retrieve(query).await?;
        Ok(self.synthesizer.synthesize(query, &retrieved).await?)
    }
}

/// Production ingestion stack: lopdf extraction, Gemini embeddings, Qdrant.
pub fn build_ingestion_pipeline(
    config: &EngineConfig,
) -> IngestionPipeline<LopdfExtractor, GeminiEmbeddingProvider, QdrantStore> {
    let provider = GeminiEmbeddingProvider::new(config);
    let store = QdrantStore::new(
        &config.qdrant_url,
        &config.collection,
        provider.dimensions(),
    );

    IngestionPipeline::new(
        LopdfExtractor,
        BatchedEmbedder::new(provider),
        store,
        ChunkingConfig::default(),
        config.data_dir.clone(),
    )
}

/// Production query stack, with the arXiv paper-search tool registered as
/// the generation-time fallback.
pub fn build_query_pipeline(
    config: &EngineConfig,
) -> QueryPipeline<GeminiEmbeddingProvider, QdrantStore, GeminiGenerator> {
    let provider = GeminiEmbeddingProvider::new(config);
    let store = QdrantStore::new(
        &config.qdrant_url,
        &config.collection,
        provider.dimensions(),
    );
    let generator = GeminiGenerator::new(config).with_tool(ArxivSearchTool::default());

    QueryPipeline::new(
        Retriever::new(BatchedEmbedder::new(provider), store).with_n_results(config.n_results),
        AnswerSynthesizer::new(generator),
    )
}

/// Store handle for the destructive full-reset entry point. Reset drops and
/// recreates the collection; callers must not run it concurrently with
/// ingestion or queries.
pub fn build_store(config: &EngineConfig) -> QdrantStore {
    QdrantStore::new(
        &config.qdrant_url,
        &config.collection,
        crate::embeddings::GEMINI_EMBEDDING_DIMENSIONS,
    )
}
