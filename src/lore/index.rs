//! Derived metadata index — category/topic aggregates.
//!
//! One instance per namespace, backed by that namespace's payload-only
//! metadata collection. Aggregates are kept in sync with chunk create/delete
//! events so index queries never scan the full content collection.
//!
//! Update sequences are best-effort chains of independent store calls with
//! no rollback: a failure partway surfaces to the caller and may leave the
//! index transiently inconsistent (topic updated, category not).

use std::sync::Arc;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::lore::types::{CategoryInfo, CategoryRecord, ChunkMetadata, MetaIndex, TopicRecord};
use crate::lore::{merge_unique, now_rfc3339};
use crate::vector::VectorStore;

/// Category/topic aggregate maintenance for one metadata collection.
pub struct MetadataIndex {
    store: Arc<dyn VectorStore>,
    collection: String,
    /// Single-page bound for aggregate scans.
    scan_limit: usize,
}

fn topic_key(topic_id: &str) -> String {
    format!("topic:{topic_id}")
}

fn category_key(name: &str) -> String {
    format!("cat:{name}")
}

impl MetadataIndex {
    pub fn new(store: Arc<dyn VectorStore>, collection: impl Into<String>, scan_limit: usize) -> Self {
        Self {
            store,
            collection: collection.into(),
            scan_limit,
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Provision the backing payload-only collection if needed.
    pub async fn initialize(&self) -> Result<()> {
        if !self.store.collection_exists(&self.collection).await? {
            self.store.create_payload_collection(&self.collection).await?;
        }
        Ok(())
    }

    /// Chunk created: topic aggregate first, then category — the category's
    /// `topic_count` recomputation depends on the just-updated topic state.
    pub async fn on_chunk_created(&self, metadata: &ChunkMetadata) -> Result<()> {
        let now = now_rfc3339();
        self.upsert_topic(metadata, &now).await?;
        self.upsert_category(metadata, &now).await?;
        Ok(())
    }

    /// Chunk deleted: decrement both aggregates; either reaching zero is
    /// deleted outright rather than lingering at zero.
    pub async fn on_chunk_deleted(&self, metadata: &ChunkMetadata) -> Result<()> {
        let now = now_rfc3339();
        self.decrement_topic(&metadata.topic_id).await?;
        self.decrement_category(&metadata.category, &now).await?;
        Ok(())
    }

    async fn upsert_topic(&self, metadata: &ChunkMetadata, now: &str) -> Result<()> {
        let key = topic_key(&metadata.topic_id);
        let record = match self.read_topic(&key).await? {
            Some(existing) => TopicRecord {
                kind: "topic".into(),
                topic_id: metadata.topic_id.clone(),
                topic_name: metadata
                    .topic_name
                    .clone()
                    .unwrap_or(existing.topic_name),
                // A topic_id reused under a different category overwrites the
                // category here; the old category keeps its stale chunk count
                // until its own chunks are erased.
                category: metadata.category.clone(),
                sub_category: metadata
                    .sub_category
                    .clone()
                    .or(existing.sub_category),
                chunk_count: existing.chunk_count + 1,
                keywords: merge_unique(&existing.keywords, &metadata.keywords),
                last_updated: now.to_string(),
            },
            None => TopicRecord {
                kind: "topic".into(),
                topic_id: metadata.topic_id.clone(),
                topic_name: metadata
                    .topic_name
                    .clone()
                    .unwrap_or_else(|| metadata.topic_id.clone()),
                category: metadata.category.clone(),
                sub_category: metadata.sub_category.clone(),
                chunk_count: 1,
                keywords: metadata.keywords.clone(),
                last_updated: now.to_string(),
            },
        };
        self.write_record(&key, &record).await
    }

    async fn upsert_category(&self, metadata: &ChunkMetadata, now: &str) -> Result<()> {
        let key = category_key(&metadata.category);
        let incoming_sub: Vec<String> = metadata.sub_category.clone().into_iter().collect();
        let record = match self.read_category(&key).await? {
            Some(existing) => CategoryRecord {
                kind: "category".into(),
                name: metadata.category.clone(),
                sub_categories: merge_unique(&existing.sub_categories, &incoming_sub),
                topic_count: self.count_topics_for(&metadata.category).await?,
                chunk_count: existing.chunk_count + 1,
                last_updated: now.to_string(),
            },
            None => CategoryRecord {
                kind: "category".into(),
                name: metadata.category.clone(),
                sub_categories: incoming_sub,
                topic_count: 1,
                chunk_count: 1,
                last_updated: now.to_string(),
            },
        };
        self.write_record(&key, &record).await
    }

    async fn decrement_topic(&self, topic_id: &str) -> Result<()> {
        let key = topic_key(topic_id);
        if let Some(mut existing) = self.read_topic(&key).await? {
            if existing.chunk_count <= 1 {
                self.store.delete(&self.collection, &key).await?;
            } else {
                existing.chunk_count -= 1;
                existing.last_updated = now_rfc3339();
                self.write_record(&key, &existing).await?;
            }
        }
        Ok(())
    }

    async fn decrement_category(&self, category: &str, now: &str) -> Result<()> {
        let key = category_key(category);
        if let Some(mut existing) = self.read_category(&key).await? {
            if existing.chunk_count <= 1 {
                self.store.delete(&self.collection, &key).await?;
            } else {
                existing.chunk_count -= 1;
                existing.topic_count = self.count_topics_for(category).await?;
                existing.last_updated = now.to_string();
                self.write_record(&key, &existing).await?;
            }
        }
        Ok(())
    }

    /// All category aggregates as a flat listing, optionally narrowed to one
    /// category, with totals summed over the (filtered) set.
    pub async fn get_index(&self, scope: Option<&str>) -> Result<MetaIndex> {
        let points = self
            .store
            .scroll(&self.collection, self.scan_limit, None)
            .await?;

        let mut categories = Vec::new();
        let mut total_topics = 0;
        let mut total_chunks = 0;

        for point in points {
            if point.payload.get("type").and_then(Value::as_str) != Some("category") {
                continue;
            }
            let record: CategoryRecord = serde_json::from_value(point.payload)
                .map_err(|e| Error::Backend(anyhow::anyhow!("corrupt category record: {e}")))?;
            if let Some(scope) = scope {
                if record.name != scope {
                    continue;
                }
            }
            total_topics += record.topic_count;
            total_chunks += record.chunk_count;
            categories.push(CategoryInfo {
                id: record.name.clone(),
                name: record.name.clone(),
                sub_categories: record.sub_categories,
                topic_count: record.topic_count,
                chunk_count: record.chunk_count,
                description: format!(
                    "{} chunks, {} topics",
                    record.chunk_count, record.topic_count
                ),
            });
        }

        Ok(MetaIndex {
            categories,
            total_topics,
            total_chunks,
            last_updated: now_rfc3339(),
        })
    }

    /// Category name → chunk count for all categories.
    pub async fn get_category_stats(&self) -> Result<std::collections::BTreeMap<String, u64>> {
        let points = self
            .store
            .scroll(&self.collection, self.scan_limit, None)
            .await?;
        let mut stats = std::collections::BTreeMap::new();
        for point in points {
            if point.payload.get("type").and_then(Value::as_str) == Some("category") {
                let name = point
                    .payload
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                let count = point
                    .payload
                    .get("chunk_count")
                    .and_then(Value::as_u64)
                    .unwrap_or(0);
                stats.insert(name, count);
            }
        }
        Ok(stats)
    }

    /// Count topic aggregates currently assigned to `category`. Recomputed
    /// by a single-page-bounded scan on every mutating event rather than
    /// maintained incrementally.
    async fn count_topics_for(&self, category: &str) -> Result<u64> {
        let points = self
            .store
            .scroll(&self.collection, self.scan_limit, None)
            .await?;
        let count = points
            .iter()
            .filter(|p| {
                p.payload.get("type").and_then(Value::as_str) == Some("topic")
                    && p.payload.get("category").and_then(Value::as_str) == Some(category)
            })
            .count();
        Ok(count as u64)
    }

    async fn read_topic(&self, key: &str) -> Result<Option<TopicRecord>> {
        match self.store.get_by_id(&self.collection, key).await? {
            Some(point) => {
                let record = serde_json::from_value(point.payload)
                    .map_err(|e| Error::Backend(anyhow::anyhow!("corrupt topic record: {e}")))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    async fn read_category(&self, key: &str) -> Result<Option<CategoryRecord>> {
        match self.store.get_by_id(&self.collection, key).await? {
            Some(point) => {
                let record = serde_json::from_value(point.payload).map_err(|e| {
                    Error::Backend(anyhow::anyhow!("corrupt category record: {e}"))
                })?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    async fn write_record<T: serde::Serialize>(&self, key: &str, record: &T) -> Result<()> {
        let payload = serde_json::to_value(record)
            .map_err(|e| Error::Backend(anyhow::anyhow!("record serialization: {e}")))?;
        self.store
            .upsert_payload(&self.collection, key, payload)
            .await
    }
}
