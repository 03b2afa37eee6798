//! Vector store seam.
//!
//! [`VectorStore`] is the named-collection key→(vector, payload) interface the
//! chunk-store core consumes. The production implementation is
//! [`qdrant::QdrantStore`]; tests substitute an in-memory double.

pub mod filter;
pub mod qdrant;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use filter::Filter;

/// Dummy vector dimension for payload-only collections (catalog, aggregates).
pub const PAYLOAD_ONLY_DIM: usize = 1;

/// A stored point fetched by id or scan.
#[derive(Debug, Clone)]
pub struct StoredPoint {
    pub id: String,
    pub payload: Value,
}

/// A nearest-neighbor result with its similarity score.
#[derive(Debug, Clone)]
pub struct ScoredPoint {
    pub id: String,
    pub score: f32,
    pub payload: Value,
}

/// Collection-level counts.
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct CollectionStats {
    pub total_count: u64,
    pub vector_count: u64,
}

/// Named-collection vector store, as provided by an external vector database.
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn create_collection(&self, name: &str, vector_dim: usize) -> Result<()>;

    /// Payload-only collection: provisioned with a dummy vector dimension.
    async fn create_payload_collection(&self, name: &str) -> Result<()> {
        self.create_collection(name, PAYLOAD_ONLY_DIM).await
    }

    async fn collection_exists(&self, name: &str) -> Result<bool>;
    async fn delete_collection(&self, name: &str) -> Result<()>;
    async fn list_collections(&self) -> Result<Vec<String>>;

    /// Insert or replace a point. Re-upsert with the same id replaces both
    /// vector and payload.
    async fn upsert(
        &self,
        collection: &str,
        id: &str,
        vector: Vec<f32>,
        payload: Value,
    ) -> Result<()>;

    /// Payload-only upsert into a dummy-dimension collection.
    async fn upsert_payload(&self, collection: &str, id: &str, payload: Value) -> Result<()> {
        self.upsert(collection, id, vec![0.0; PAYLOAD_ONLY_DIM], payload)
            .await
    }

    async fn get_by_id(&self, collection: &str, id: &str) -> Result<Option<StoredPoint>>;

    /// Delete by id. Not an error if the point is absent.
    async fn delete(&self, collection: &str, id: &str) -> Result<()>;

    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
        filter: Option<&Filter>,
        score_threshold: Option<f32>,
    ) -> Result<Vec<ScoredPoint>>;

    /// Single-page scan. Multi-page cursors are never followed; aggregate
    /// scans accept bounded completeness.
    async fn scroll(
        &self,
        collection: &str,
        limit: usize,
        filter: Option<&Filter>,
    ) -> Result<Vec<StoredPoint>>;

    async fn stats(&self, collection: &str) -> Result<CollectionStats>;
}

/// Map a logical id into the store's id space.
///
/// The store only accepts UUIDs (or unsigned integers) as point ids. Chunk
/// ids are already UUIDs and pass through; catalog keys like `lore:name` or
/// `topic:x` are hashed with UUIDv5 so repeated writes to the same logical
/// key always resolve to the same physical id.
pub fn point_id(logical: &str) -> String {
    if uuid::Uuid::parse_str(logical).is_ok() {
        logical.to_string()
    } else {
        uuid::Uuid::new_v5(&uuid::Uuid::NAMESPACE_URL, logical.as_bytes()).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuid_ids_pass_through() {
        let id = uuid::Uuid::new_v4().to_string();
        assert_eq!(point_id(&id), id);
    }

    #[test]
    fn logical_keys_map_deterministically() {
        let a = point_id("lore:my-project");
        let b = point_id("lore:my-project");
        let c = point_id("lore:other");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(uuid::Uuid::parse_str(&a).is_ok());
    }
}
