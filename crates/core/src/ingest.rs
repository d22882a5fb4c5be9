use crate::chunking::{chunk_pages, ChunkingConfig};
use crate::embeddings::{BatchedEmbedder, EmbeddingProvider, EmbeddingTask};
use crate::error::{ExtractionError, PipelineError};
use crate::extractor::PdfExtractor;
use crate::models::{Chunk, IngestionReceipt};
use crate::traits::VectorIndex;
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub fn discover_pdf_files(folder: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(folder)
        .into_iter()
        .filter_map(|item| item.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let is_pdf = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

        if is_pdf {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_unstable();
    files
}

pub struct SkippedPdf {
    pub path: PathBuf,
    pub reason: String,
}

pub struct IngestionReport {
    pub receipts: Vec<IngestionReceipt>,
    pub skipped_files: Vec<SkippedPdf>,
}

impl IngestionReport {
    pub fn total_chunks(&self) -> usize {
        self.receipts.iter().map(|receipt| receipt.chunk_count).sum()
    }
}

/// Extract → chunk → embed (document mode) → upsert, one document at a time.
pub struct IngestionPipeline<X, P, V> {
    extractor: X,
    embedder: BatchedEmbedder<P>,
    index: V,
    chunking: ChunkingConfig,
    data_dir: PathBuf,
}

impl<X, P, V> IngestionPipeline<X, P, V>
where
    X: PdfExtractor,
    P: EmbeddingProvider + Sync,
    V: VectorIndex + Sync,
{
    pub fn new(
        extractor: X,
        embedder: BatchedEmbedder<P>,
        index: V,
        chunking: ChunkingConfig,
        data_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            extractor,
            embedder,
            index,
            chunking,
            data_dir: data_dir.into(),
        }
    }

    /// Ingests one in-memory PDF payload under `document_name`.
    ///
    /// A raw copy is kept under the data directory (overwriting any previous
    /// file of the same name). A PDF with no extractable text is not an
    /// error; it just contributes zero chunks and the index is left alone.
    /// Stale chunks of the same source are deleted before the new ones are
    /// upserted, so a re-ingestion that produces fewer chunks cannot leave
    /// orphaned high-index entries behind.
    pub async fn ingest(
        &self,
        document_name: &str,
        pdf_bytes: &[u8],
    ) -> Result<IngestionReceipt, PipelineError> {
        tokio::fs::create_dir_all(&self.data_dir).await?;
        tokio::fs::write(self.data_dir.join(document_name), pdf_bytes).await?;

        let checksum = format!("{:x}", Sha256::digest(pdf_bytes));
        let pages = self.extractor.extract_pages(pdf_bytes)?;
        let drafts = chunk_pages(&pages, &self.chunking);

        if drafts.is_empty() {
            return Ok(IngestionReceipt {
                source: document_name.to_string(),
                checksum,
                chunk_count: 0,
                ingested_at: Utc::now(),
            });
        }

        // chunk_index runs over the flattened page-ordered sequence from 0.
        let chunks: Vec<Chunk> = drafts
            .into_iter()
            .enumerate()
            .map(|(index, draft)| Chunk::new(document_name, draft.page_number, index, draft.text))
            .collect();

        let texts: Vec<String> = chunks.iter().map(|chunk| chunk.text.clone()).collect();
        let embeddings = self
            .embedder
            .embed_all(&texts, EmbeddingTask::Document)
            .await?;

        self.index.ensure_ready().await?;
        self.index.delete_by_source(document_name).await?;
        self.index.upsert(&chunks, &embeddings).await?;

        Ok(IngestionReceipt {
            source: document_name.to_string(),
            checksum,
            chunk_count: chunks.len(),
            ingested_at: Utc::now(),
        })
    }

    /// Ingests a PDF from disk under its file name.
    pub async fn ingest_file(&self, path: &Path) -> Result<IngestionReceipt, PipelineError> {
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                ExtractionError::MissingFileName(format!(
                    "path missing filename: {}",
                    path.display()
                ))
            })?
            .to_string();

        let bytes = tokio::fs::read(path).await?;
        self.ingest(&name, &bytes).await
    }

    /// Ingests every PDF under `folder`, strictly one document at a time. A
    /// document that fails is recorded and skipped; the rest still go through.
    pub async fn ingest_folder_best_effort(
        &self,
        folder: &Path,
    ) -> Result<IngestionReport, PipelineError> {
        let files = discover_pdf_files(folder);

        let mut receipts = Vec::new();
        let mut skipped_files = Vec::new();

        for path in files {
            match self.ingest_file(&path).await {
                Ok(receipt) => receipts.push(receipt),
                Err(error) => skipped_files.push(SkippedPdf {
                    path,
                    reason: error.to_string(),
                }),
            }
        }

        Ok(IngestionReport {
            receipts,
            skipped_files,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{discover_pdf_files, IngestionPipeline};
    use crate::chunking::ChunkingConfig;
    use crate::embeddings::{BatchPolicy, BatchedEmbedder, EmbeddingProvider, EmbeddingTask};
    use crate::error::{EmbeddingError, ExtractionError, IndexError};
    use crate::extractor::PdfExtractor;
    use crate::models::{Chunk, Page, RetrievedChunk};
    use crate::traits::VectorIndex;
    use async_trait::async_trait;
    use std::fs::{self, File};
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::tempdir;

    struct FakeExtractor {
        pages: Vec<Page>,
    }

    impl PdfExtractor for FakeExtractor {
        fn extract_pages(&self, _bytes: &[u8]) -> Result<Vec<Page>, ExtractionError> {
            Ok(self.pages.clone())
        }
    }

    struct UnitProvider;

    #[async_trait]
    impl EmbeddingProvider for UnitProvider {
        async fn embed_batch(
            &self,
            texts: &[String],
            task: EmbeddingTask,
        ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            assert_eq!(task, EmbeddingTask::Document);
            Ok(vec![vec![1.0]; texts.len()])
        }

        fn dimensions(&self) -> usize {
            1
        }
    }

    #[derive(Debug, PartialEq)]
    enum IndexCall {
        EnsureReady,
        DeleteBySource(String),
        Upsert(Vec<String>),
    }

    #[derive(Default)]
    struct RecordingIndex {
        calls: Mutex<Vec<IndexCall>>,
        chunks: Mutex<Vec<Chunk>>,
    }

    #[async_trait]
    impl VectorIndex for RecordingIndex {
        async fn ensure_ready(&self) -> Result<(), IndexError> {
            self.calls.lock().unwrap().push(IndexCall::EnsureReady);
            Ok(())
        }

        async fn upsert(
            &self,
            chunks: &[Chunk],
            embeddings: &[Vec<f32>],
        ) -> Result<(), IndexError> {
            assert_eq!(chunks.len(), embeddings.len());
            self.calls.lock().unwrap().push(IndexCall::Upsert(
                chunks.iter().map(|chunk| chunk.id.clone()).collect(),
            ));
            self.chunks.lock().unwrap().extend_from_slice(chunks);
            Ok(())
        }

        async fn delete_by_source(&self, source: &str) -> Result<(), IndexError> {
            self.calls
                .lock()
                .unwrap()
                .push(IndexCall::DeleteBySource(source.to_string()));
            Ok(())
        }

        async fn query(
            &self,
            _vector: &[f32],
            _k: usize,
        ) -> Result<Vec<RetrievedChunk>, IndexError> {
            Ok(Vec::new())
        }

        async fn reset(&self) -> Result<(), IndexError> {
            Ok(())
        }
    }

    fn pipeline_with(
        pages: Vec<Page>,
        data_dir: &std::path::Path,
    ) -> IngestionPipeline<FakeExtractor, UnitProvider, RecordingIndex> {
        IngestionPipeline::new(
            FakeExtractor { pages },
            BatchedEmbedder::with_policy(UnitProvider, BatchPolicy::immediate()),
            RecordingIndex::default(),
            ChunkingConfig::default(),
            data_dir,
        )
    }

    #[tokio::test]
    async fn two_page_document_round_trips_into_three_chunks() {
        let dir = tempdir().unwrap();
        let page_one: String = ('a'..='z').cycle().take(600).collect();
        let pipeline = pipeline_with(
            vec![
                Page {
                    number: 1,
                    text: page_one.clone(),
                },
                Page {
                    number: 2,
                    text: "b".repeat(30),
                },
            ],
            dir.path(),
        );

        let receipt = pipeline.ingest("paper.pdf", b"%PDF-fake").await.unwrap();
        assert_eq!(receipt.chunk_count, 3);
        assert_eq!(receipt.source, "paper.pdf");

        let chunks = pipeline.index.chunks.lock().unwrap();
        assert_eq!(chunks.len(), 3);

        let page_chars: Vec<char> = page_one.chars().collect();
        assert_eq!(chunks[0].id, "paper.pdf_chunk_0");
        assert_eq!(chunks[0].text, page_chars[0..500].iter().collect::<String>());
        assert_eq!(chunks[0].metadata.page, 1);

        assert_eq!(chunks[1].id, "paper.pdf_chunk_1");
        assert_eq!(chunks[1].text, page_chars[450..600].iter().collect::<String>());
        assert_eq!(chunks[1].metadata.page, 1);

        assert_eq!(chunks[2].id, "paper.pdf_chunk_2");
        assert_eq!(chunks[2].text, "b".repeat(30));
        assert_eq!(chunks[2].metadata.page, 2);
    }

    #[tokio::test]
    async fn stale_chunks_are_deleted_before_upserting() {
        let dir = tempdir().unwrap();
        let pipeline = pipeline_with(
            vec![Page {
                number: 1,
                text: "c".repeat(100),
            }],
            dir.path(),
        );

        pipeline.ingest("notes.pdf", b"%PDF-fake").await.unwrap();

        let calls = pipeline.index.calls.lock().unwrap();
        assert_eq!(
            *calls,
            vec![
                IndexCall::EnsureReady,
                IndexCall::DeleteBySource("notes.pdf".to_string()),
                IndexCall::Upsert(vec!["notes.pdf_chunk_0".to_string()]),
            ]
        );
    }

    #[tokio::test]
    async fn empty_extraction_contributes_zero_chunks_without_touching_the_index() {
        let dir = tempdir().unwrap();
        let pipeline = pipeline_with(Vec::new(), dir.path());

        let receipt = pipeline.ingest("empty.pdf", b"%PDF-fake").await.unwrap();
        assert_eq!(receipt.chunk_count, 0);
        assert!(pipeline.index.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn raw_file_is_copied_into_the_data_dir() {
        let dir = tempdir().unwrap();
        let data_dir = dir.path().join("data");
        let pipeline = pipeline_with(Vec::new(), &data_dir);

        pipeline.ingest("copy.pdf", b"%PDF-raw-bytes").await.unwrap();
        let saved = fs::read(data_dir.join("copy.pdf")).unwrap();
        assert_eq!(saved, b"%PDF-raw-bytes");
    }

    #[test]
    fn discover_pdf_files_is_recursive_and_sorted() {
        let dir = tempdir().unwrap();
        let base = dir.path();
        let nested = base.join("nested");
        fs::create_dir(&nested).unwrap();

        File::create(base.join("b.pdf"))
            .and_then(|mut file| file.write_all(b"%PDF-1.4\n%fake"))
            .unwrap();
        File::create(nested.join("a.pdf"))
            .and_then(|mut file| file.write_all(b"%PDF-1.4\n%fake"))
            .unwrap();
        File::create(base.join("notes.txt"))
            .and_then(|mut file| file.write_all(b"not a pdf"))
            .unwrap();

        let files = discover_pdf_files(base);
        assert_eq!(files.len(), 2);
        assert!(files.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[tokio::test]
    async fn best_effort_folder_ingest_skips_unreadable_pdfs() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("broken.pdf"), b"%PDF-1.4\n%broken").unwrap();

        // A real extractor rejects the broken payload; the report records it.
        let pipeline = IngestionPipeline::new(
            crate::extractor::LopdfExtractor,
            BatchedEmbedder::with_policy(UnitProvider, BatchPolicy::immediate()),
            RecordingIndex::default(),
            ChunkingConfig::default(),
            dir.path().join("data"),
        );

        let report = pipeline.ingest_folder_best_effort(dir.path()).await.unwrap();
        assert!(report.receipts.is_empty());
        assert_eq!(report.skipped_files.len(), 1);
        assert_eq!(report.total_chunks(), 0);
    }
}
