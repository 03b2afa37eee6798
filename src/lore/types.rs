//! Core chunk-store type definitions.
//!
//! Defines [`Chunk`] and its metadata, the derived aggregate records kept in
//! metadata collections ([`TopicRecord`], [`CategoryRecord`], [`LoreRecord`]),
//! REST session types, and the backup exchange format.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A named thing referenced by a chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Entity {
    pub name: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Person,
    Project,
    Technology,
    Organization,
    Concept,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Importance {
    High,
    Medium,
    Low,
}

impl Importance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl std::fmt::Display for Importance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Importance {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            _ => Err(format!("unknown importance: {s}")),
        }
    }
}

/// Chunk metadata as persisted in the content collection payload.
///
/// Immutable by convention except `updated_at` (bumped on revision).
/// Timestamps and `rest_session_id` are set by the store, never by the
/// caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub topic_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_name: Option<String>,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_category: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub questions: Vec<String>,
    #[serde(default)]
    pub entities: Vec<Entity>,
    pub importance: Importance,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rest_session_id: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

/// One retrievable unit of stored knowledge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Generated at write time when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub text: String,
    pub metadata: ChunkMetadata,
}

impl Chunk {
    /// Flatten text + metadata into the stored payload shape.
    pub fn to_payload(&self) -> Value {
        let mut payload = serde_json::to_value(&self.metadata).unwrap_or_default();
        payload["text"] = Value::String(self.text.clone());
        payload
    }
}

/// A search hit: similarity score plus full stored payload.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub id: String,
    pub score: f32,
    pub chunk: Value,
}

// ── Metadata collection records ───────────────────────────────────────────────

/// Derived per-topic aggregate, keyed by `topic:{topic_id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub topic_id: String,
    pub topic_name: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_category: Option<String>,
    pub chunk_count: u64,
    pub keywords: Vec<String>,
    pub last_updated: String,
}

/// Derived per-category aggregate, keyed by `cat:{name}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub sub_categories: Vec<String>,
    pub topic_count: u64,
    pub chunk_count: u64,
    pub last_updated: String,
}

/// Lore catalog entry, keyed by `lore:{name}` in the canon metadata
/// collection. Its existence is the sole source of truth for lore existence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoreRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub description: String,
    pub collection_name: String,
    pub metadata_collection_name: String,
    pub created_at: String,
    pub last_updated: String,
}

/// One category in the flat index listing.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryInfo {
    pub id: String,
    pub name: String,
    pub sub_categories: Vec<String>,
    pub topic_count: u64,
    pub chunk_count: u64,
    pub description: String,
}

/// The meta index: all categories plus totals over the (filtered) set.
#[derive(Debug, Clone, Serialize)]
pub struct MetaIndex {
    pub categories: Vec<CategoryInfo>,
    pub total_topics: u64,
    pub total_chunks: u64,
    pub last_updated: String,
}

/// Lore listing entry with its live chunk count.
#[derive(Debug, Clone, Serialize)]
pub struct LoreInfo {
    pub name: String,
    pub description: String,
    pub collection_name: String,
    pub total_chunks: u64,
    pub created_at: String,
}

// ── REST sessions ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkSizeRange {
    pub min_tokens: u32,
    pub max_tokens: u32,
}

/// Chunking guidance snapshot returned at session start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingGuide {
    pub principles: Vec<String>,
    pub ideal_chunk_size: ChunkSizeRange,
    pub examples: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordCount {
    pub min: u32,
    pub max: u32,
}

/// Metadata authoring rules snapshot returned at session start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataRules {
    pub required_fields: Vec<String>,
    pub keyword_count: KeywordCount,
    pub question_guidelines: Vec<String>,
    pub entity_extraction: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Expired,
}

/// A time-boxed write-authorization session.
#[derive(Debug, Clone, Serialize)]
pub struct RestSession {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub chunking_guide: ChunkingGuide,
    pub metadata_rules: MetadataRules,
    pub scribed_count: u64,
    pub status: SessionStatus,
}

// ── Backup exchange format ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Backup {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<String>,
    pub total_chunks: usize,
    pub chunks: Vec<BackupChunk>,
}

/// A chunk as carried in a backup file. Only `text` is required; missing
/// fields take documented defaults on import.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupChunk {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub questions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entities: Option<Vec<Entity>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance: Option<Importance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}
