use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::scribe::ChunkInput;

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ChronicleParams {
    #[schemars(description = "Active REST session id from rest()")]
    pub session_id: String,

    #[schemars(
        description = "Lore to write into. Created on first use. Letters, digits, '_' and '-'; must start with a letter or digit; max 64 chars."
    )]
    pub lore_name: String,

    #[schemars(description = "Lore description, set or refreshed when provided")]
    pub description: Option<String>,

    #[schemars(description = "The chunk to store")]
    pub chunk: ChunkInput,

    #[schemars(description = "Override the chunk's category field")]
    pub category: Option<String>,

    #[schemars(description = "Override the chunk's source field")]
    pub source: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct EraseLoreParams {
    #[schemars(description = "Lore containing the chunk")]
    pub lore_name: String,

    #[schemars(description = "Id of the chunk to delete")]
    pub chunk_id: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ReviseLoreParams {
    #[schemars(description = "Lore containing the chunk")]
    pub lore_name: String,

    #[schemars(description = "Id of the chunk to revise")]
    pub chunk_id: String,

    #[schemars(description = "Replacement text; metadata is preserved")]
    pub new_text: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct LoresParams {}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct LoreDeleteParams {
    #[schemars(description = "Lore to delete, along with all of its chunks")]
    pub lore_name: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct LoreStatsParams {
    #[schemars(description = "Lore to report statistics for")]
    pub lore_name: String,
}
