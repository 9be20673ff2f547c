pub mod chunking;
pub mod embeddings;
pub mod error;
pub mod extractor;
pub mod ingest;
pub mod models;
pub mod stores;
pub mod traits;

pub use chunking::{build_chunks, split_documents, split_text, SplitterConfig};
pub use embeddings::{Embedder, FeatureHashEmbedder, DEFAULT_EMBEDDING_DIMENSIONS};
pub use error::{IngestError, PipelineError, StoreError};
pub use extractor::{LopdfExtractor, PageText, PdfExtractor};
pub use ingest::{
    digest_file, discover_pdf_files, ingest_folder, load_documents, IngestionReport, LoadOutcome,
    SkippedPdf,
};
pub use models::{Chunk, DocumentMetadata, PageDocument};
pub use stores::ChromaStore;
pub use traits::VectorStore;
