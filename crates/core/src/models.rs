use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Provenance attached to every page loaded from a PDF and copied onto each
/// chunk derived from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub document_id: String,
    pub source_file: String,
    pub source_path: String,
    pub page: u32,
    pub checksum: String,
    pub ingested_at: DateTime<Utc>,
}

/// One page of extracted text, tagged with where it came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageDocument {
    pub text: String,
    pub metadata: DocumentMetadata,
}

/// A bounded fragment of a page's text, ready to be embedded and persisted.
///
/// `chunk_id` is derived from the document id, page, position, and text, so
/// re-ingesting unchanged input produces the same ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub chunk_id: String,
    pub chunk_index: u64,
    pub text: String,
    pub metadata: DocumentMetadata,
}
