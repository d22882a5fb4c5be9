use crate::error::ConfigError;
use crate::models::Page;

/// Windows shorter than this many characters are discarded rather than
/// persisted, losing a little page-tail text in exchange for never indexing
/// fragments too small to be meaningful.
pub const MIN_CHUNK_CHARS: usize = 20;

#[derive(Debug, Clone, Copy)]
pub struct ChunkingConfig {
    chunk_size: usize,
    overlap: usize,
}

impl ChunkingConfig {
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self, ConfigError> {
        if chunk_size == 0 {
            return Err(ConfigError::InvalidChunking(
                "chunk_size must be positive".to_string(),
            ));
        }
        if overlap >= chunk_size {
            return Err(ConfigError::InvalidChunking(format!(
                "overlap {overlap} must be smaller than chunk_size {chunk_size}"
            )));
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            overlap: 50,
        }
    }
}

/// A chunk before ids and indices are assigned by the ingestion pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftChunk {
    pub text: String,
    pub page_number: u32,
}

/// Slides a fixed window over each page independently, advancing by
/// `chunk_size - overlap`. Chunks never span a page boundary, and the output
/// order (page order, then window order) is what assigns `chunk_index`
/// downstream. Windows are measured in characters so multi-byte text cannot
/// split a code point.
pub fn chunk_pages(pages: &[Page], config: &ChunkingConfig) -> Vec<DraftChunk> {
    let step = config.chunk_size - config.overlap;
    let mut drafts = Vec::new();

    for page in pages {
        let chars: Vec<char> = page.text.chars().collect();
        let mut start = 0;

        while start < chars.len() {
            let end = (start + config.chunk_size).min(chars.len());
            if end - start > MIN_CHUNK_CHARS {
                drafts.push(DraftChunk {
                    text: chars[start..end].iter().collect(),
                    page_number: page.number,
                });
            }
            start += step;
        }
    }

    drafts
}
