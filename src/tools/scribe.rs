use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::lore::types::{Chunk, ChunkMetadata, Entity, Importance};

/// Chunk fields as accepted over the wire. Timestamps and the session id
/// are stamped by the store and cannot be supplied here.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ChunkInput {
    #[schemars(description = "The chunk text to store and embed")]
    pub text: String,

    #[schemars(description = "Stable topic identifier, e.g. 'auth-flow'")]
    pub topic_id: String,

    #[schemars(description = "Human-readable topic name")]
    pub topic_name: Option<String>,

    #[schemars(description = "Top-level category, e.g. 'architecture'")]
    pub category: String,

    #[schemars(description = "Optional sub-category within the category")]
    pub sub_category: Option<String>,

    #[schemars(description = "Search keywords (3-10 recommended)")]
    pub keywords: Option<Vec<String>>,

    #[schemars(description = "Questions this chunk answers")]
    pub questions: Option<Vec<String>>,

    #[schemars(
        description = "Named entities: person, project, technology, organization, concept"
    )]
    pub entities: Option<Vec<Entity>>,

    #[schemars(description = "Importance: 'high', 'medium', or 'low'")]
    pub importance: Importance,

    #[schemars(description = "Where this knowledge came from")]
    pub source: Option<String>,
}

impl ChunkInput {
    pub fn into_chunk(self) -> Chunk {
        Chunk {
            id: None,
            text: self.text,
            metadata: ChunkMetadata {
                topic_id: self.topic_id,
                topic_name: self.topic_name,
                category: self.category,
                sub_category: self.sub_category,
                keywords: self.keywords.unwrap_or_default(),
                questions: self.questions.unwrap_or_default(),
                entities: self.entities.unwrap_or_default(),
                importance: self.importance,
                source: self.source,
                rest_session_id: None,
                created_at: String::new(),
                updated_at: String::new(),
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ScribeParams {
    #[schemars(description = "Active REST session id from rest()")]
    pub session_id: String,

    #[schemars(description = "The chunk to store")]
    pub chunk: ChunkInput,

    #[schemars(description = "Override the chunk's source field")]
    pub source: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct EraseParams {
    #[schemars(description = "Id of the chunk to delete")]
    pub chunk_id: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ReviseParams {
    #[schemars(description = "Id of the chunk to revise")]
    pub chunk_id: String,

    #[schemars(description = "Replacement text; metadata is preserved")]
    pub new_text: String,
}
