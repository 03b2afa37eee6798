use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RestParams {}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RestEndParams {
    #[schemars(description = "Session id returned by rest()")]
    pub session_id: String,
}
