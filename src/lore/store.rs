//! Write path — session gating, duplicate detection, embedding, storage,
//! and aggregate upkeep.
//!
//! [`ChunkStore::scribe`] is the single mutation entry point for both canon
//! and lore targets. The pipeline is a sequence of independent external
//! calls with no rollback: a failure at any step aborts the rest and leaves
//! earlier effects in place.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::embedding::Embedder;
use crate::error::{Error, Result};
use crate::lore::index::MetadataIndex;
use crate::lore::manager::LoreManager;
use crate::lore::now_rfc3339;
use crate::lore::search::Searcher;
use crate::lore::session::RestSessions;
use crate::lore::types::{Chunk, ChunkMetadata, SearchResult};
use crate::vector::VectorStore;

/// Where a mutation lands: the canon default namespace or a named lore.
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    Canon,
    Lore(&'a str),
}

impl Target<'_> {
    fn describe(&self) -> String {
        match self {
            Target::Canon => "canon".into(),
            Target::Lore(name) => format!("lore \"{name}\""),
        }
    }
}

/// Outcome of a scribe call. `warning` means duplicates were found and
/// nothing was written — the caller must decide whether to resubmit.
/// There is no force flag; only altering the text gets past the warning.
#[derive(Debug, Serialize)]
pub struct ScribeOutcome {
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicates: Option<Vec<SearchResult>>,
}

pub struct ChunkStore {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    searcher: Arc<Searcher>,
    sessions: Arc<RestSessions>,
    lores: Arc<LoreManager>,
    canon_collection: String,
    canon_index: Arc<MetadataIndex>,
}

impl ChunkStore {
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        searcher: Arc<Searcher>,
        sessions: Arc<RestSessions>,
        lores: Arc<LoreManager>,
        canon_collection: impl Into<String>,
        canon_index: Arc<MetadataIndex>,
    ) -> Self {
        Self {
            store,
            embedder,
            searcher,
            sessions,
            lores,
            canon_collection: canon_collection.into(),
            canon_index,
        }
    }

    fn resolve(&self, target: Target<'_>) -> (String, Arc<MetadataIndex>) {
        match target {
            Target::Canon => (
                self.canon_collection.clone(),
                Arc::clone(&self.canon_index),
            ),
            Target::Lore(name) => (
                self.lores.collection_name(name),
                self.lores.metadata_index(name),
            ),
        }
    }

    /// Store a chunk. Full pipeline: session validation → overrides and
    /// field checks → lore provisioning → id/timestamps → duplicate
    /// soft-block → embed → upsert → aggregate update → activity count.
    pub async fn scribe(
        &self,
        session_id: &str,
        target: Target<'_>,
        mut chunk: Chunk,
        category_override: Option<&str>,
        source_override: Option<&str>,
        lore_description: Option<&str>,
    ) -> Result<ScribeOutcome> {
        if session_id.trim().is_empty() {
            return Err(Error::Validation("session_id is empty".into()));
        }

        // 1. Session gate — fails closed on absent or expired sessions.
        self.sessions.validate(session_id)?;

        // 2. Apply overrides, then reject malformed chunks before any
        // external call. A bad chunk must not provision a new lore.
        if let Some(category) = category_override {
            chunk.metadata.category = category.to_string();
        }
        if let Some(source) = source_override {
            chunk.metadata.source = Some(source.to_string());
        }
        validate_chunk(&chunk)?;

        // 3. Lore targets are provisioned on demand.
        if let Target::Lore(name) = target {
            self.lores.ensure_exists(name, lore_description).await?;
        }

        // 4. Assign id, stamp timestamps.
        let id = chunk
            .id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let now = now_rfc3339();
        chunk.metadata.created_at = now.clone();
        chunk.metadata.updated_at = now;
        chunk.metadata.rest_session_id = Some(session_id.to_string());

        let (collection, index) = self.resolve(target);

        // 5. Duplicate soft-block: warn and write nothing.
        if let Some(duplicates) = self
            .searcher
            .detect_duplicates(&collection, &chunk.text, None)
            .await?
        {
            tracing::info!(
                namespace = %target.describe(),
                count = duplicates.len(),
                "duplicate chunks detected, write withheld"
            );
            return Ok(ScribeOutcome {
                status: "warning",
                message: format!(
                    "{} similar chunk(s) already exist in {}. \
                     Resubmit with altered text to store anyway.",
                    duplicates.len(),
                    target.describe()
                ),
                chunk_id: None,
                duplicates: Some(duplicates),
            });
        }

        // 6. Embed and store.
        let vector = self.embedder.embed(&chunk.text).await?;
        chunk.id = Some(id.clone());
        self.store
            .upsert(&collection, &id, vector, chunk.to_payload())
            .await?;

        // 7. Keep the aggregates in sync.
        index.on_chunk_created(&chunk.metadata).await?;

        // 8. Count the successful write against the session.
        self.sessions.record_activity(session_id)?;

        tracing::info!(namespace = %target.describe(), chunk_id = %id, "chunk scribed");
        Ok(ScribeOutcome {
            status: "success",
            message: format!("chunk stored in {}", target.describe()),
            chunk_id: Some(id),
            duplicates: None,
        })
    }

    /// Delete a chunk. The current payload is fetched first for the
    /// aggregate decrement; when the point is already gone the delete is
    /// still issued (idempotent) and the decrement is skipped.
    pub async fn erase(&self, target: Target<'_>, chunk_id: &str) -> Result<String> {
        if let Target::Lore(name) = target {
            self.require_lore(name).await?;
        }
        let (collection, index) = self.resolve(target);

        let existing = self.store.get_by_id(&collection, chunk_id).await?;
        self.store.delete(&collection, chunk_id).await?;

        if let Some(point) = existing {
            match serde_json::from_value::<ChunkMetadata>(point.payload) {
                Ok(metadata) => index.on_chunk_deleted(&metadata).await?,
                Err(err) => tracing::warn!(
                    chunk_id,
                    error = %err,
                    "deleted chunk payload did not parse, aggregates not decremented"
                ),
            }
        }

        tracing::info!(namespace = %target.describe(), chunk_id, "chunk erased");
        Ok(format!("chunk erased from {}: {chunk_id}", target.describe()))
    }

    /// Replace a chunk's text: re-embed, preserve all other metadata, bump
    /// `updated_at`. Category/topic membership does not change, so the
    /// aggregates are left alone.
    pub async fn revise(
        &self,
        target: Target<'_>,
        chunk_id: &str,
        new_text: &str,
    ) -> Result<String> {
        if new_text.trim().is_empty() {
            return Err(Error::Validation("new_text is empty".into()));
        }
        if let Target::Lore(name) = target {
            self.require_lore(name).await?;
        }
        let (collection, _) = self.resolve(target);

        let existing = self
            .store
            .get_by_id(&collection, chunk_id)
            .await?
            .ok_or_else(|| {
                Error::NotFound(format!(
                    "chunk not found in {}: {chunk_id}",
                    target.describe()
                ))
            })?;

        let vector = self.embedder.embed(new_text).await?;

        let mut payload = existing.payload;
        payload["text"] = Value::String(new_text.to_string());
        payload["updated_at"] = Value::String(now_rfc3339());
        self.store.upsert(&collection, chunk_id, vector, payload).await?;

        tracing::info!(namespace = %target.describe(), chunk_id, "chunk revised");
        Ok(format!("chunk revised in {}: {chunk_id}", target.describe()))
    }

    async fn require_lore(&self, name: &str) -> Result<()> {
        crate::lore::manager::validate_lore_name(name)?;
        if !self.lores.exists(name).await? {
            return Err(Error::NotFound(format!("lore not found: \"{name}\"")));
        }
        Ok(())
    }
}

/// Required-field checks, rejected before any external call.
fn validate_chunk(chunk: &Chunk) -> Result<()> {
    if chunk.text.trim().is_empty() {
        return Err(Error::Validation("chunk text is empty".into()));
    }
    if chunk.metadata.topic_id.trim().is_empty() {
        return Err(Error::Validation("chunk metadata is missing topic_id".into()));
    }
    if chunk.metadata.category.trim().is_empty() {
        return Err(Error::Validation("chunk metadata is missing category".into()));
    }
    Ok(())
}
