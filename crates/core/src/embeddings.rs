use crate::config::EngineConfig;
use crate::error::EmbeddingError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const GEMINI_EMBEDDING_DIMENSIONS: usize = 768;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Document-mode and query-mode vectors live in the same space but are not
/// produced identically; ingest with `Document` and retrieve with `Query` or
/// the similarity metric loses meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingTask {
    Document,
    Query,
}

impl EmbeddingTask {
    fn as_api_str(&self) -> &'static str {
        match self {
            EmbeddingTask::Document => "RETRIEVAL_DOCUMENT",
            EmbeddingTask::Query => "RETRIEVAL_QUERY",
        }
    }
}

/// Raw embedding provider: one wire call per invocation, no batching or
/// retry of its own.
#[async_trait]
pub trait EmbeddingProvider {
    async fn embed_batch(
        &self,
        texts: &[String],
        task: EmbeddingTask,
    ) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    fn dimensions(&self) -> usize;
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest {
    model: String,
    content: EmbedContent,
    task_type: String,
}

#[derive(Debug, Clone, Serialize)]
struct EmbedContent {
    parts: Vec<EmbedPart>,
}

#[derive(Debug, Clone, Serialize)]
struct EmbedPart {
    text: String,
}

#[derive(Debug, Clone, Serialize)]
struct BatchEmbedRequest {
    requests: Vec<EmbedContentRequest>,
}

#[derive(Debug, Clone, Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<EmbeddingValues>,
}

#[derive(Debug, Clone, Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

/// Gemini `batchEmbedContents` client.
pub struct GeminiEmbeddingProvider {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl GeminiEmbeddingProvider {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: GEMINI_API_BASE.to_string(),
            api_key: config.api_key.clone(),
            model: config.embedding_model.clone(),
        }
    }

    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbeddingProvider {
    async fn embed_batch(
        &self,
        texts: &[String],
        task: EmbeddingTask,
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let body = BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|text| EmbedContentRequest {
                    model: format!("models/{}", self.model),
                    content: EmbedContent {
                        parts: vec![EmbedPart { text: text.clone() }],
                    },
                    task_type: task.as_api_str().to_string(),
                })
                .collect(),
        };

        let response = self
            .client
            .post(format!(
                "{}/models/{}:batchEmbedContents?key={}",
                self.api_base, self.model, self.api_key
            ))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let details = response.text().await.unwrap_or_default();
            if status.as_u16() == 429 || details.contains("RESOURCE_EXHAUSTED") {
                return Err(EmbeddingError::RateLimited(format!("{status}: {details}")));
            }
            return Err(EmbeddingError::Provider(format!("{status}: {details}")));
        }

        let payload: BatchEmbedResponse = response.json().await?;
        if payload.embeddings.len() != texts.len() {
            return Err(EmbeddingError::LengthMismatch {
                expected: texts.len(),
                got: payload.embeddings.len(),
            });
        }

        Ok(payload.embeddings.into_iter().map(|e| e.values).collect())
    }

    fn dimensions(&self) -> usize {
        GEMINI_EMBEDDING_DIMENSIONS
    }
}

/// Batch splitting and retry discipline against a shared provider rate limit.
#[derive(Debug, Clone, Copy)]
pub struct BatchPolicy {
    pub batch_size: usize,
    pub max_attempts: u32,
    pub backoff_base: Duration,
    pub throttle: Duration,
}

impl Default for BatchPolicy {
    fn default() -> Self {
        Self {
            batch_size: 5,
            max_attempts: 3,
            backoff_base: Duration::from_secs(1),
            throttle: Duration::from_secs(1),
        }
    }
}

impl BatchPolicy {
    /// Zero-delay variant for tests.
    pub fn immediate() -> Self {
        Self {
            backoff_base: Duration::ZERO,
            throttle: Duration::ZERO,
            ..Self::default()
        }
    }
}

/// Wraps a provider with fixed-size batching, exponential-backoff retry on
/// rate limits, and a proactive pause after every successful batch. Batches
/// run strictly sequentially in input order because the rate limit is shared;
/// the concatenated output preserves input order and length 1:1. A batch that
/// exhausts its retries fails the whole call, discarding earlier results.
pub struct BatchedEmbedder<P> {
    provider: P,
    policy: BatchPolicy,
}

impl<P: EmbeddingProvider + Sync> BatchedEmbedder<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            policy: BatchPolicy::default(),
        }
    }

    pub fn with_policy(provider: P, policy: BatchPolicy) -> Self {
        Self { provider, policy }
    }

    pub fn dimensions(&self) -> usize {
        self.provider.dimensions()
    }

    pub async fn embed_all(
        &self,
        texts: &[String],
        task: EmbeddingTask,
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut vectors = Vec::with_capacity(texts.len());

        for batch in texts.chunks(self.policy.batch_size.max(1)) {
            vectors.extend(self.embed_with_retry(batch, task).await?);
        }

        if vectors.len() != texts.len() {
            return Err(EmbeddingError::LengthMismatch {
                expected: texts.len(),
                got: vectors.len(),
            });
        }

        Ok(vectors)
    }

    async fn embed_with_retry(
        &self,
        batch: &[String],
        task: EmbeddingTask,
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        for attempt in 0..self.policy.max_attempts {
            match self.provider.embed_batch(batch, task).await {
                Ok(vectors) => {
                    // Fixed pause after every successful batch keeps the
                    // sustained request rate under the provider limit.
                    tokio::time::sleep(self.policy.throttle).await;
                    return Ok(vectors);
                }
                Err(EmbeddingError::RateLimited(_)) if attempt + 1 < self.policy.max_attempts => {
                    tokio::time::sleep(self.policy.backoff_base * 2u32.pow(attempt)).await;
                }
                Err(EmbeddingError::RateLimited(_)) => {
                    return Err(EmbeddingError::RetriesExhausted {
                        attempts: self.policy.max_attempts,
                    });
                }
                Err(error) => return Err(error),
            }
        }

        Err(EmbeddingError::RetriesExhausted {
            attempts: self.policy.max_attempts,
        })
    }
}
