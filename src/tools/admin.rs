use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct StatsParams {}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct GetIndexParams {
    #[schemars(description = "Optional category name to narrow the index to")]
    pub scope: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ExportParams {}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ImportParams {
    #[schemars(
        description = "Backup document as produced by export: {version, total_chunks, chunks: [...]}"
    )]
    pub backup: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct FilterGuideParams {}
