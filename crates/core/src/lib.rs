pub mod arxiv;
pub mod chunking;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod extractor;
pub mod generation;
pub mod ingest;
pub mod models;
pub mod orchestrator;
pub mod retriever;
pub mod stores;
pub mod synthesizer;
pub mod traits;

pub use arxiv::{ArxivClient, ArxivSearchTool};
pub use chunking::{chunk_pages, ChunkingConfig, DraftChunk, MIN_CHUNK_CHARS};
pub use config::EngineConfig;
pub use embeddings::{
    BatchPolicy, BatchedEmbedder, EmbeddingProvider, EmbeddingTask, GeminiEmbeddingProvider,
    GEMINI_EMBEDDING_DIMENSIONS,
};
pub use error::{
    ConfigError, EmbeddingError, ExtractionError, GenerationError, IndexError, PipelineError,
};
pub use extractor::{LopdfExtractor, PdfExtractor};
pub use generation::{GeminiGenerator, GenerativeModel, Tool, MAX_TOOL_ROUNDS};
pub use ingest::{
    discover_pdf_files, IngestionPipeline, IngestionReport, SkippedPdf,
};
pub use models::{
    Chunk, ChunkMetadata, IngestionReceipt, Page, PaperSummary, RetrievedChunk,
};
pub use orchestrator::{
    build_ingestion_pipeline, build_query_pipeline, build_store, QueryPipeline,
};
pub use retriever::Retriever;
pub use stores::QdrantStore;
pub use synthesizer::{build_context, AnswerSynthesizer, NO_DOCUMENTS_MESSAGE};
pub use traits::VectorIndex;
