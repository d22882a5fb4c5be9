use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("GOOGLE_API_KEY is not set")]
    MissingApiKey,

    #[error("invalid chunking config: {0}")]
    InvalidChunking(String),
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("pdf parse error: {0}")]
    PdfParse(String),

    #[error("path has no file name: {0}")]
    MissingFileName(String),
}

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("embedding provider rate limited: {0}")]
    RateLimited(String),

    #[error("embedding batch failed after {attempts} attempts due to rate limits")]
    RetriesExhausted { attempts: u32 },

    #[error("embedding provider returned {got} vectors for {expected} inputs")]
    LengthMismatch { expected: usize, got: usize },

    #[error("embedding provider error: {0}")]
    Provider(String),
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("generation api returned {status}: {details}")]
    Api { status: String, details: String },

    #[error("model response contained no text")]
    EmptyResponse,

    #[error("model requested unknown tool: {0}")]
    UnknownTool(String),

    #[error("tool {name} failed: {details}")]
    Tool { name: String, details: String },

    #[error("tool-calling loop exceeded {rounds} rounds")]
    ToolLoopExceeded { rounds: usize },
}

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid response from {backend}: {details}")]
    BackendResponse { backend: String, details: String },

    #[error("index request failed: {0}")]
    Request(String),
}

/// Umbrella error for the ingestion and query pipelines. Each pipeline stage
/// keeps its own error type; this exists so orchestration signatures stay flat.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
