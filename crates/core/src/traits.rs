use crate::error::StoreError;
use crate::models::Chunk;
use async_trait::async_trait;

/// Persistence backend for chunk + embedding records.
#[async_trait]
pub trait VectorStore {
    /// Make sure the target collection exists and accepts vectors of
    /// `vector_size` dimensions.
    async fn ensure_collection(&self, vector_size: usize) -> Result<(), StoreError>;

    /// Persist one record per chunk. `embeddings` must be parallel to
    /// `chunks`.
    async fn add_chunks(&self, chunks: &[Chunk], embeddings: &[Vec<f32>])
        -> Result<(), StoreError>;
}
