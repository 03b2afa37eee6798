//! Lore lifecycle management.
//!
//! Each lore is an isolated namespace backed by two collections: content
//! (`lore_{name}`) and metadata (`lore_{name}_metadata`). The catalog entry
//! under `lore:{name}` in the canon metadata collection is the sole source
//! of truth for existence — collections are provisioned before the entry is
//! registered, so a crash mid-provisioning never registers a lore with
//! missing collections.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::error::{Error, Result};
use crate::lore::index::MetadataIndex;
use crate::lore::now_rfc3339;
use crate::lore::types::{LoreInfo, LoreRecord};
use crate::vector::{CollectionStats, VectorStore};

const LORE_PREFIX: &str = "lore_";
const LORE_METADATA_SUFFIX: &str = "_metadata";
const LORE_KEY_PREFIX: &str = "lore:";
pub const MAX_LORE_NAME_LEN: usize = 64;

pub struct LoreManager {
    store: Arc<dyn VectorStore>,
    /// Canon metadata collection holding the lore catalog.
    catalog_collection: String,
    vector_dim: usize,
    scan_limit: usize,
    /// Lazily constructed per-lore index instances, cached for process
    /// lifetime and evicted on delete.
    indexes: Mutex<HashMap<String, Arc<MetadataIndex>>>,
}

/// `[A-Za-z0-9][A-Za-z0-9_-]*`, length 1–64.
pub fn validate_lore_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::Validation("lore name is empty".into()));
    }
    if name.len() > MAX_LORE_NAME_LEN {
        return Err(Error::Validation(format!(
            "lore name exceeds {MAX_LORE_NAME_LEN} characters: \"{name}\""
        )));
    }
    let mut chars = name.chars();
    let first_ok = chars.next().is_some_and(|c| c.is_ascii_alphanumeric());
    let rest_ok = chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !first_ok || !rest_ok {
        return Err(Error::Validation(format!(
            "invalid lore name: \"{name}\". Use letters, digits, '-' and '_'; \
             the first character must be a letter or digit"
        )));
    }
    Ok(())
}

impl LoreManager {
    pub fn new(
        store: Arc<dyn VectorStore>,
        catalog_collection: impl Into<String>,
        vector_dim: usize,
        scan_limit: usize,
    ) -> Self {
        Self {
            store,
            catalog_collection: catalog_collection.into(),
            vector_dim,
            scan_limit,
            indexes: Mutex::new(HashMap::new()),
        }
    }

    pub fn collection_name(&self, lore: &str) -> String {
        format!("{LORE_PREFIX}{lore}")
    }

    pub fn metadata_collection_name(&self, lore: &str) -> String {
        format!("{LORE_PREFIX}{lore}{LORE_METADATA_SUFFIX}")
    }

    fn catalog_key(lore: &str) -> String {
        format!("{LORE_KEY_PREFIX}{lore}")
    }

    pub async fn exists(&self, lore: &str) -> Result<bool> {
        let entry = self
            .store
            .get_by_id(&self.catalog_collection, &Self::catalog_key(lore))
            .await?;
        Ok(entry.is_some())
    }

    /// Idempotent create. An existing lore with a supplied `description` gets
    /// only its description and `last_updated` refreshed.
    pub async fn ensure_exists(&self, lore: &str, description: Option<&str>) -> Result<()> {
        validate_lore_name(lore)?;

        let key = Self::catalog_key(lore);
        if let Some(existing) = self.store.get_by_id(&self.catalog_collection, &key).await? {
            if let Some(description) = description {
                let mut record: LoreRecord = serde_json::from_value(existing.payload)
                    .map_err(|e| Error::Backend(anyhow::anyhow!("corrupt lore record: {e}")))?;
                record.description = description.to_string();
                record.last_updated = now_rfc3339();
                self.write_catalog_entry(&key, &record).await?;
            }
            return Ok(());
        }

        let collection = self.collection_name(lore);
        let metadata_collection = self.metadata_collection_name(lore);
        let now = now_rfc3339();

        // Provision collections first, register the catalog entry last.
        self.store
            .create_collection(&collection, self.vector_dim)
            .await?;
        self.store
            .create_payload_collection(&metadata_collection)
            .await?;

        let record = LoreRecord {
            kind: "lore".into(),
            name: lore.to_string(),
            description: description.unwrap_or_default().to_string(),
            collection_name: collection.clone(),
            metadata_collection_name: metadata_collection,
            created_at: now.clone(),
            last_updated: now,
        };
        self.write_catalog_entry(&key, &record).await?;

        tracing::info!(lore, collection = %collection, "lore created");
        Ok(())
    }

    pub async fn update_description(&self, lore: &str, description: &str) -> Result<()> {
        validate_lore_name(lore)?;
        let key = Self::catalog_key(lore);
        let existing = self
            .store
            .get_by_id(&self.catalog_collection, &key)
            .await?
            .ok_or_else(|| Error::NotFound(format!("lore not found: \"{lore}\"")))?;
        let mut record: LoreRecord = serde_json::from_value(existing.payload)
            .map_err(|e| Error::Backend(anyhow::anyhow!("corrupt lore record: {e}")))?;
        record.description = description.to_string();
        record.last_updated = now_rfc3339();
        self.write_catalog_entry(&key, &record).await
    }

    /// Delete both collections (if present), then the catalog entry, then
    /// evict the cached index. The steps are not atomic; a failure partway
    /// leaves earlier deletions in place.
    pub async fn delete(&self, lore: &str) -> Result<()> {
        validate_lore_name(lore)?;
        if !self.exists(lore).await? {
            return Err(Error::NotFound(format!("lore not found: \"{lore}\"")));
        }

        let collection = self.collection_name(lore);
        if self.store.collection_exists(&collection).await? {
            self.store.delete_collection(&collection).await?;
        }
        let metadata_collection = self.metadata_collection_name(lore);
        if self.store.collection_exists(&metadata_collection).await? {
            self.store.delete_collection(&metadata_collection).await?;
        }

        self.store
            .delete(&self.catalog_collection, &Self::catalog_key(lore))
            .await?;

        self.indexes
            .lock()
            .expect("lore index cache poisoned")
            .remove(lore);

        tracing::info!(lore, "lore deleted");
        Ok(())
    }

    /// List catalog entries with their live chunk counts. A stats failure
    /// for one lore degrades that entry's count to 0 without aborting the
    /// rest of the listing.
    pub async fn list(&self) -> Result<Vec<LoreInfo>> {
        let points = self
            .store
            .scroll(&self.catalog_collection, self.scan_limit, None)
            .await?;

        let mut lores = Vec::new();
        for point in points {
            if point.payload.get("type").and_then(Value::as_str) != Some("lore") {
                continue;
            }
            let record: LoreRecord = match serde_json::from_value(point.payload) {
                Ok(record) => record,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping corrupt lore catalog entry");
                    continue;
                }
            };

            let total_chunks = match self.live_chunk_count(&record.collection_name).await {
                Ok(count) => count,
                Err(e) => {
                    tracing::warn!(lore = %record.name, error = %e, "lore stats unavailable");
                    0
                }
            };

            lores.push(LoreInfo {
                name: record.name,
                description: record.description,
                collection_name: record.collection_name,
                total_chunks,
                created_at: record.created_at,
            });
        }
        Ok(lores)
    }

    /// Content-collection counts merged with per-category chunk counts.
    pub async fn get_stats(
        &self,
        lore: &str,
    ) -> Result<(CollectionStats, std::collections::BTreeMap<String, u64>)> {
        validate_lore_name(lore)?;
        if !self.exists(lore).await? {
            return Err(Error::NotFound(format!("lore not found: \"{lore}\"")));
        }
        let stats = self.store.stats(&self.collection_name(lore)).await?;
        let categories = self.metadata_index(lore).get_category_stats().await?;
        Ok((stats, categories))
    }

    /// Cached-or-new index bound to this lore's metadata collection.
    /// Construction does not verify the lore exists.
    pub fn metadata_index(&self, lore: &str) -> Arc<MetadataIndex> {
        let mut indexes = self.indexes.lock().expect("lore index cache poisoned");
        indexes
            .entry(lore.to_string())
            .or_insert_with(|| {
                Arc::new(MetadataIndex::new(
                    Arc::clone(&self.store),
                    self.metadata_collection_name(lore),
                    self.scan_limit,
                ))
            })
            .clone()
    }

    async fn live_chunk_count(&self, collection: &str) -> Result<u64> {
        if !self.store.collection_exists(collection).await? {
            return Ok(0);
        }
        Ok(self.store.stats(collection).await?.total_count)
    }

    async fn write_catalog_entry(&self, key: &str, record: &LoreRecord) -> Result<()> {
        let payload = serde_json::to_value(record)
            .map_err(|e| Error::Backend(anyhow::anyhow!("record serialization: {e}")))?;
        self.store
            .upsert_payload(&self.catalog_collection, key, payload)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_names_pass() {
        let max_len = "x".repeat(64);
        for name in ["my-proj_1", "a", "0start", max_len.as_str()] {
            validate_lore_name(name).unwrap();
        }
    }

    #[test]
    fn invalid_names_fail() {
        let too_long = "x".repeat(65);
        for name in ["-bad", "_bad", "a b", "", "naïve", too_long.as_str()] {
            assert!(validate_lore_name(name).is_err(), "{name:?} should fail");
        }
    }

    #[test]
    fn collection_names_derive_from_lore_name() {
        let store: Arc<dyn VectorStore> = Arc::new(NullStore);
        let manager = LoreManager::new(store, "canon_metadata", 768, 1000);
        assert_eq!(manager.collection_name("proj"), "lore_proj");
        assert_eq!(manager.metadata_collection_name("proj"), "lore_proj_metadata");
    }

    struct NullStore;

    #[async_trait::async_trait]
    impl VectorStore for NullStore {
        async fn create_collection(&self, _: &str, _: usize) -> crate::error::Result<()> {
            Ok(())
        }
        async fn collection_exists(&self, _: &str) -> crate::error::Result<bool> {
            Ok(false)
        }
        async fn delete_collection(&self, _: &str) -> crate::error::Result<()> {
            Ok(())
        }
        async fn list_collections(&self) -> crate::error::Result<Vec<String>> {
            Ok(vec![])
        }
        async fn upsert(
            &self,
            _: &str,
            _: &str,
            _: Vec<f32>,
            _: Value,
        ) -> crate::error::Result<()> {
            Ok(())
        }
        async fn get_by_id(
            &self,
            _: &str,
            _: &str,
        ) -> crate::error::Result<Option<crate::vector::StoredPoint>> {
            Ok(None)
        }
        async fn delete(&self, _: &str, _: &str) -> crate::error::Result<()> {
            Ok(())
        }
        async fn search(
            &self,
            _: &str,
            _: &[f32],
            _: usize,
            _: Option<&crate::vector::filter::Filter>,
            _: Option<f32>,
        ) -> crate::error::Result<Vec<crate::vector::ScoredPoint>> {
            Ok(vec![])
        }
        async fn scroll(
            &self,
            _: &str,
            _: usize,
            _: Option<&crate::vector::filter::Filter>,
        ) -> crate::error::Result<Vec<crate::vector::StoredPoint>> {
            Ok(vec![])
        }
        async fn stats(&self, _: &str) -> crate::error::Result<CollectionStats> {
            Ok(CollectionStats::default())
        }
    }
}
