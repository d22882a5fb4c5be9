use crate::error::ConfigError;
use std::path::PathBuf;

pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-004";
pub const DEFAULT_GENERATION_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_COLLECTION: &str = "document_qa_collection";
pub const DEFAULT_N_RESULTS: usize = 15;

/// Explicit configuration handed to every component constructor. Validated
/// once at process start; there is no global mutable state behind it.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub api_key: String,
    pub qdrant_url: String,
    pub collection: String,
    pub data_dir: PathBuf,
    pub embedding_model: String,
    pub generation_model: String,
    pub n_results: usize,
}

impl EngineConfig {
    /// Reads the required credential from `GOOGLE_API_KEY`. A missing or
    /// blank key fails here, not on the first downstream model call.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("GOOGLE_API_KEY")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        Ok(Self::new(api_key))
    }

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            qdrant_url: "http://localhost:6333".to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            data_dir: PathBuf::from("./data"),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            generation_model: DEFAULT_GENERATION_MODEL.to_string(),
            n_results: DEFAULT_N_RESULTS,
        }
    }

    pub fn with_qdrant_url(mut self, url: impl Into<String>) -> Self {
        self.qdrant_url = url.into();
        self
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::EngineConfig;

    #[test]
    fn builder_overrides_defaults() {
        let config = EngineConfig::new("key")
            .with_qdrant_url("http://qdrant:6333")
            .with_collection("papers");

        assert_eq!(config.qdrant_url, "http://qdrant:6333");
        assert_eq!(config.collection, "papers");
        assert_eq!(config.n_results, 15);
    }
}
