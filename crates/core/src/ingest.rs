use crate::chunking::{split_documents, SplitterConfig};
use crate::embeddings::Embedder;
use crate::error::{IngestError, PipelineError};
use crate::extractor::PdfExtractor;
use crate::models::{DocumentMetadata, PageDocument};
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::fs;
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

pub fn digest_file(path: &Path) -> Result<String, IngestError> {
    let bytes = fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

pub struct SkippedPdf {
    pub path: PathBuf,
    pub reason: String,
}

/// Result of the per-file loading fold: page documents from readable files,
/// plus the files that could not be read and why.
pub struct LoadOutcome {
    pub documents: Vec<PageDocument>,
    pub loaded_files: Vec<PathBuf>,
    pub skipped_files: Vec<SkippedPdf>,
}

/// Load every file, collecting failures instead of aborting. A single
/// unreadable pdf never fails the batch.
pub fn load_documents(files: &[PathBuf], extractor: &dyn PdfExtractor) -> LoadOutcome {
    let mut documents = Vec::new();
    let mut loaded_files = Vec::new();
    let mut skipped_files = Vec::new();

    for path in files {
        match load_file(path, extractor) {
            Ok(pages) => {
                documents.extend(pages);
                loaded_files.push(path.clone());
            }
            Err(error) => skipped_files.push(SkippedPdf {
                path: path.clone(),
                reason: error.to_string(),
            }),
        }
    }

    LoadOutcome {
        documents,
        loaded_files,
        skipped_files,
    }
}

fn load_file(path: &Path, extractor: &dyn PdfExtractor) -> Result<Vec<PageDocument>, IngestError> {
    let checksum = digest_file(path)?;
    let source_file = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            IngestError::MissingFileName(format!("path missing filename: {}", path.display()))
        })?
        .to_string();

    let document_id = generate_document_id(path);
    let source_path = path.to_string_lossy().to_string();
    let ingested_at = Utc::now();

    let pages = extractor.extract_pages(path)?;

    Ok(pages
        .into_iter()
        .map(|page| PageDocument {
            text: page.text,
            metadata: DocumentMetadata {
                document_id: document_id.clone(),
                source_file: source_file.clone(),
                source_path: source_path.clone(),
                page: page.number,
                checksum: checksum.clone(),
                ingested_at,
            },
        })
        .collect())
}

fn generate_document_id(path: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(path.to_string_lossy().as_bytes());
    format!("{:x}", hasher.finalize())
}

pub struct IngestionReport {
    pub loaded_files: Vec<PathBuf>,
    pub skipped_files: Vec<SkippedPdf>,
    pub chunk_count: usize,
    pub records_persisted: usize,
}

/// Run the full pipeline: discover pdfs under `folder`, load them, split
/// into chunks, embed, and persist into the store's collection.
///
/// Unreadable files are reported and skipped. Errors past loading (splitting
/// never fails once the config is built; embedding and persistence can)
/// propagate and abort the run. A folder with no pdfs, or nothing but
/// unreadable ones, completes successfully with zero chunks and no store
/// calls.
pub async fn ingest_folder<E, S>(
    folder: &Path,
    config: &SplitterConfig,
    extractor: &dyn PdfExtractor,
    embedder: &E,
    store: &S,
) -> Result<IngestionReport, PipelineError>
where
    E: Embedder + Sync + ?Sized,
    S: crate::traits::VectorStore + Sync + ?Sized,
{
    let files = discover_pdf_files(folder);
    let outcome = load_documents(&files, extractor);
    let chunks = split_documents(&outcome.documents, config);

    if chunks.is_empty() {
        return Ok(IngestionReport {
            loaded_files: outcome.loaded_files,
            skipped_files: outcome.skipped_files,
            chunk_count: 0,
            records_persisted: 0,
        });
    }

    let texts: Vec<&str> = chunks.iter().map(|chunk| chunk.text.as_str()).collect();
    let embeddings = embedder.embed_batch(&texts);

    store.ensure_collection(embedder.dimensions()).await?;
    store.add_chunks(&chunks, &embeddings).await?;

    let chunk_count = chunks.len();
    Ok(IngestionReport {
        loaded_files: outcome.loaded_files,
        skipped_files: outcome.skipped_files,
        chunk_count,
        records_persisted: chunk_count,
    })
}

#[cfg(test)]
mod tests {
    use super::{digest_file, discover_pdf_files, ingest_folder};
    use crate::chunking::SplitterConfig;
    use crate::embeddings::FeatureHashEmbedder;
    use crate::error::{IngestError, PipelineError, StoreError};
    use crate::extractor::{PageText, PdfExtractor};
    use crate::models::Chunk;
    use crate::traits::VectorStore;
    use async_trait::async_trait;
    use std::fs::{self, File};
    use std::io::Write;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    /// Reads nothing from disk; any file named `bad*` fails to parse, the
    /// rest yield two short pages.
    struct FakeExtractor;

    impl PdfExtractor for FakeExtractor {
        fn extract_pages(&self, path: &Path) -> Result<Vec<PageText>, IngestError> {
            let name = path
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or_default();

            if name.starts_with("bad") {
                return Err(IngestError::PdfParse(format!(
                    "unreadable pdf: {}",
                    path.display()
                )));
            }

            Ok(vec![
                PageText {
                    number: 1,
                    text: "First page text.".to_string(),
                },
                PageText {
                    number: 2,
                    text: "Second page text.".to_string(),
                },
            ])
        }
    }

    #[derive(Default)]
    struct RecordingStore {
        ensure_calls: AtomicUsize,
        records_added: AtomicUsize,
        embeddings_seen: AtomicUsize,
    }

    #[async_trait]
    impl VectorStore for RecordingStore {
        async fn ensure_collection(&self, _vector_size: usize) -> Result<(), StoreError> {
            self.ensure_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn add_chunks(
            &self,
            chunks: &[Chunk],
            embeddings: &[Vec<f32>],
        ) -> Result<(), StoreError> {
            self.records_added.fetch_add(chunks.len(), Ordering::SeqCst);
            self.embeddings_seen
                .fetch_add(embeddings.len(), Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingStore;

    #[async_trait]
    impl VectorStore for FailingStore {
        async fn ensure_collection(&self, _vector_size: usize) -> Result<(), StoreError> {
            Ok(())
        }

        async fn add_chunks(
            &self,
            _chunks: &[Chunk],
            _embeddings: &[Vec<f32>],
        ) -> Result<(), StoreError> {
            Err(StoreError::Request("store offline".to_string()))
        }
    }

    #[test]
    fn discover_pdf_files_is_recursive() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let base = dir.path();
        let nested = base.join("nested");
        fs::create_dir(&nested)?;

        File::create(base.join("a.pdf")).and_then(|mut file| file.write_all(b"%PDF-1.4\n%fake"))?;
        File::create(nested.join("b.pdf"))
            .and_then(|mut file| file.write_all(b"%PDF-1.4\n%fake"))?;
        File::create(base.join("notes.txt")).and_then(|mut file| file.write_all(b"not a pdf"))?;

        let files = discover_pdf_files(base);
        assert_eq!(files.len(), 2);
        Ok(())
    }

    #[test]
    fn checksum_is_reproducible() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let file_path = dir.path().join("a.pdf");
        fs::write(&file_path, b"abc")?;

        let first = digest_file(&file_path)?;
        let second = digest_file(&file_path)?;
        assert_eq!(first, second);
        Ok(())
    }

    #[tokio::test]
    async fn empty_folder_completes_with_zero_chunks_and_no_store_calls(
    ) -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let store = RecordingStore::default();
        let embedder = FeatureHashEmbedder::default();

        let report = ingest_folder(
            dir.path(),
            &SplitterConfig::default(),
            &FakeExtractor,
            &embedder,
            &store,
        )
        .await?;

        assert_eq!(report.chunk_count, 0);
        assert_eq!(report.records_persisted, 0);
        assert!(report.loaded_files.is_empty());
        assert!(report.skipped_files.is_empty());
        assert_eq!(store.ensure_calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.records_added.load(Ordering::SeqCst), 0);
        Ok(())
    }

    #[tokio::test]
    async fn unreadable_files_are_skipped_not_fatal() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        fs::write(dir.path().join("good.pdf"), b"%PDF-1.4\n%fake")?;
        fs::write(dir.path().join("bad.pdf"), b"%PDF-1.4\n%broken")?;

        let store = RecordingStore::default();
        let embedder = FeatureHashEmbedder::default();

        let report = ingest_folder(
            dir.path(),
            &SplitterConfig::default(),
            &FakeExtractor,
            &embedder,
            &store,
        )
        .await?;

        assert_eq!(report.loaded_files.len(), 1);
        assert_eq!(report.skipped_files.len(), 1);
        assert_eq!(
            report.skipped_files[0]
                .path
                .file_name()
                .and_then(|name| name.to_str()),
            Some("bad.pdf")
        );

        // Two short pages, each under the chunk size, so one chunk per page.
        assert_eq!(report.chunk_count, 2);
        Ok(())
    }

    #[tokio::test]
    async fn chunk_embedding_and_record_counts_match() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        fs::write(dir.path().join("a.pdf"), b"%PDF-1.4\n%fake")?;
        fs::write(dir.path().join("b.pdf"), b"%PDF-1.4\n%fake")?;

        let store = RecordingStore::default();
        let embedder = FeatureHashEmbedder::default();

        let report = ingest_folder(
            dir.path(),
            &SplitterConfig::default(),
            &FakeExtractor,
            &embedder,
            &store,
        )
        .await?;

        assert_eq!(report.chunk_count, 4);
        assert_eq!(report.records_persisted, report.chunk_count);
        assert_eq!(store.ensure_calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.records_added.load(Ordering::SeqCst), report.chunk_count);
        assert_eq!(
            store.embeddings_seen.load(Ordering::SeqCst),
            report.chunk_count
        );
        Ok(())
    }

    #[tokio::test]
    async fn store_failure_aborts_the_run() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        fs::write(dir.path().join("a.pdf"), b"%PDF-1.4\n%fake")?;

        let embedder = FeatureHashEmbedder::default();
        let result = ingest_folder(
            dir.path(),
            &SplitterConfig::default(),
            &FakeExtractor,
            &embedder,
            &FailingStore,
        )
        .await;

        assert!(matches!(result, Err(PipelineError::Store(_))));
        Ok(())
    }

    #[tokio::test]
    async fn rerunning_on_unchanged_input_yields_identical_chunk_ids(
    ) -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        fs::write(dir.path().join("a.pdf"), b"%PDF-1.4\n%fake")?;

        let files = discover_pdf_files(dir.path());
        let first = super::load_documents(&files, &FakeExtractor);
        let second = super::load_documents(&files, &FakeExtractor);

        let config = SplitterConfig::default();
        let first_chunks = crate::chunking::split_documents(&first.documents, &config);
        let second_chunks = crate::chunking::split_documents(&second.documents, &config);

        assert_eq!(first_chunks.len(), second_chunks.len());
        for (left, right) in first_chunks.iter().zip(second_chunks.iter()) {
            assert_eq!(left.chunk_id, right.chunk_id);
        }
        Ok(())
    }
}
