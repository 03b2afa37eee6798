//! Backup export / import.
//!
//! Export snapshots a collection's payloads into a portable JSON document.
//! Import re-embeds every chunk on the way back in, so a backup moves
//! cleanly between embedding models and dimensions.

use serde::Serialize;
use serde_json::json;

use crate::embedding::Embedder;
use crate::error::Result;
use crate::lore::index::MetadataIndex;
use crate::lore::now_rfc3339;
use crate::lore::types::{Backup, BackupChunk, ChunkMetadata, Importance};
use crate::vector::VectorStore;

pub const BACKUP_VERSION: &str = "1.0";

/// Per-chunk result accounting for an import run. A failed chunk never
/// aborts the rest.
#[derive(Debug, Serialize)]
pub struct ImportReport {
    pub imported: usize,
    pub failed: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

/// Snapshot every chunk payload in `collection`.
pub async fn export(
    store: &dyn VectorStore,
    collection: &str,
    page_size: usize,
) -> Result<Backup> {
    let points = store.scroll(collection, page_size, None).await?;

    let chunks: Vec<BackupChunk> = points
        .into_iter()
        .filter_map(|point| {
            let mut chunk: BackupChunk = serde_json::from_value(point.payload).ok()?;
            chunk.id = Some(point.id);
            Some(chunk)
        })
        .collect();

    tracing::info!(collection, count = chunks.len(), "exported backup");
    Ok(Backup {
        version: BACKUP_VERSION.to_string(),
        exported_at: Some(now_rfc3339()),
        total_chunks: chunks.len(),
        chunks,
    })
}

/// Restore a backup into `collection`, replaying aggregate updates through
/// `index`. Missing metadata fields take fixed defaults so partial or
/// hand-written backups still import.
pub async fn import(
    store: &dyn VectorStore,
    embedder: &dyn Embedder,
    index: &MetadataIndex,
    collection: &str,
    backup: Backup,
) -> Result<ImportReport> {
    let mut imported = 0;
    let mut errors = Vec::new();

    for (position, chunk) in backup.chunks.into_iter().enumerate() {
        let id = chunk
            .id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        match import_one(store, embedder, index, collection, &id, chunk).await {
            Ok(()) => imported += 1,
            Err(err) => {
                tracing::warn!(collection, position, %err, "skipped backup chunk");
                errors.push(format!("chunk {position} ({id}): {err}"));
            }
        }
    }

    let failed = errors.len();
    tracing::info!(collection, imported, failed, "import finished");
    Ok(ImportReport {
        imported,
        failed,
        errors,
    })
}

async fn import_one(
    store: &dyn VectorStore,
    embedder: &dyn Embedder,
    index: &MetadataIndex,
    collection: &str,
    id: &str,
    chunk: BackupChunk,
) -> Result<()> {
    let now = now_rfc3339();
    let metadata = ChunkMetadata {
        topic_id: chunk.topic_id.unwrap_or_else(|| "imported".to_string()),
        topic_name: chunk.topic_name,
        category: chunk.category.unwrap_or_else(|| "imported".to_string()),
        sub_category: chunk.sub_category,
        keywords: chunk.keywords.unwrap_or_default(),
        questions: chunk.questions.unwrap_or_default(),
        entities: chunk.entities.unwrap_or_default(),
        importance: chunk.importance.unwrap_or(Importance::Medium),
        source: Some(
            chunk.source.unwrap_or_else(|| "backup-import".to_string()),
        ),
        rest_session_id: None,
        created_at: chunk.created_at.unwrap_or_else(|| now.clone()),
        updated_at: chunk.updated_at.unwrap_or(now),
    };

    let vector = embedder.embed(&chunk.text).await?;

    let mut payload = serde_json::to_value(&metadata).unwrap_or_else(|_| json!({}));
    payload["text"] = serde_json::Value::String(chunk.text);
    store.upsert(collection, id, vector, payload).await?;

    index.on_chunk_created(&metadata).await
}
