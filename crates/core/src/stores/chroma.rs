use crate::error::StoreError;
use crate::models::Chunk;
use crate::traits::VectorStore;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tokio::sync::OnceCell;

/// ChromaDB over its REST API. Records are keyed by chunk id, so re-adding
/// an unchanged chunk overwrites rather than duplicates.
///
/// The collection id is resolved once (get-or-create) and cached; later
/// calls reuse it without another round trip.
pub struct ChromaStore {
    endpoint: String,
    collection: String,
    client: Client,
    vector_size: usize,
    collection_id: OnceCell<String>,
}

impl ChromaStore {
    pub fn new(
        endpoint: impl Into<String>,
        collection: impl Into<String>,
        vector_size: usize,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            collection: collection.into(),
            client: Client::new(),
            vector_size,
            collection_id: OnceCell::new(),
        }
    }

    /// Cached collection id, resolving it on first use.
    async fn collection_id(&self) -> Result<&str, StoreError> {
        self.collection_id
            .get_or_try_init(|| self.resolve_collection_id())
            .await
            .map(String::as_str)
    }

    /// Get-or-create the collection and return its id.
    async fn resolve_collection_id(&self) -> Result<String, StoreError> {
        let response = self
            .client
            .post(format!("{}/api/v1/collections", self.endpoint))
            .json(&json!({
                "name": self.collection,
                "get_or_create": true,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StoreError::BackendResponse {
                backend: "chroma".to_string(),
                details: response.status().to_string(),
            });
        }

        let parsed: Value = response.json().await?;
        parsed
            .pointer("/id")
            .and_then(Value::as_str)
            .map(|id| id.to_string())
            .ok_or_else(|| StoreError::BackendResponse {
                backend: "chroma".to_string(),
                details: "collection response missing id".to_string(),
            })
    }
}

#[async_trait]
impl VectorStore for ChromaStore {
    async fn ensure_collection(&self, vector_size: usize) -> Result<(), StoreError> {
        if self.vector_size != vector_size {
            return Err(StoreError::Request(format!(
                "configured vector size {} does not match requested {}",
                self.vector_size, vector_size
            )));
        }

        self.collection_id().await?;
        Ok(())
    }

    async fn add_chunks(
        &self,
        chunks: &[Chunk],
        embeddings: &[Vec<f32>],
    ) -> Result<(), StoreError> {
        if chunks.len() != embeddings.len() {
            return Err(StoreError::Request(format!(
                "embedding count {} doesn't match chunk count {}",
                embeddings.len(),
                chunks.len()
            )));
        }

        if chunks.is_empty() {
            return Ok(());
        }

        for embedding in embeddings {
            if embedding.len() != self.vector_size {
                return Err(StoreError::Request(format!(
                    "embedding dimension {} != {}",
                    embedding.len(),
                    self.vector_size
                )));
            }
        }

        let ids = chunks
            .iter()
            .map(|chunk| chunk.chunk_id.clone())
            .collect::<Vec<_>>();
        let documents = chunks
            .iter()
            .map(|chunk| chunk.text.clone())
            .collect::<Vec<_>>();
        let metadatas = chunks
            .iter()
            .map(|chunk| {
                json!({
                    "document_id": chunk.metadata.document_id,
                    "source_file": chunk.metadata.source_file,
                    "source_path": chunk.metadata.source_path,
                    "page": chunk.metadata.page,
                    "checksum": chunk.metadata.checksum,
                    "ingested_at": chunk.metadata.ingested_at.to_rfc3339(),
                    "chunk_index": chunk.chunk_index,
                })
            })
            .collect::<Vec<_>>();

        let collection_id = self.collection_id().await?;

        let response = self
            .client
            .post(format!(
                "{}/api/v1/collections/{}/add",
                self.endpoint, collection_id
            ))
            .json(&json!({
                "ids": ids,
                "embeddings": embeddings,
                "documents": documents,
                "metadatas": metadatas,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StoreError::BackendResponse {
                backend: "chroma".to_string(),
                details: response.status().to_string(),
            });
        }

        Ok(())
    }
}
