use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct MemorizeParams {
    #[schemars(description = "Natural language query")]
    pub query: String,

    #[schemars(description = "Maximum results to return (default 5)")]
    pub limit: Option<usize>,

    #[schemars(
        description = "Optional metadata filter, e.g. {\"category\": \"architecture\"}. Call filter_guide for the full syntax."
    )]
    pub filter: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct FindParams {
    #[schemars(description = "Keywords to match against chunk keyword lists")]
    pub keywords: Vec<String>,

    #[schemars(description = "Maximum results to return (default 5)")]
    pub limit: Option<usize>,

    #[schemars(description = "Optional metadata filter. Call filter_guide for the syntax.")]
    pub filter: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct GetTopicParams {
    #[schemars(description = "Topic id whose chunks to fetch")]
    pub topic_id: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RecallParams {
    #[schemars(description = "Name of the lore to search")]
    pub lore_name: String,

    #[schemars(description = "Natural language query")]
    pub query: String,

    #[schemars(description = "Maximum results to return (default 5)")]
    pub limit: Option<usize>,

    #[schemars(description = "Optional metadata filter. Call filter_guide for the syntax.")]
    pub filter: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RecallFindParams {
    #[schemars(description = "Name of the lore to search")]
    pub lore_name: String,

    #[schemars(description = "Keywords to match against chunk keyword lists")]
    pub keywords: Vec<String>,

    #[schemars(description = "Maximum results to return (default 5)")]
    pub limit: Option<usize>,

    #[schemars(description = "Optional metadata filter. Call filter_guide for the syntax.")]
    pub filter: Option<serde_json::Value>,
}
