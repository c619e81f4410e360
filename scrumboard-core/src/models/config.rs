use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored override. `org_id = None` is the global layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub id: i64,
    pub org_id: Option<i64>,
    pub config_key: String,
    /// JSON-encoded value.
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertConfigInput {
    pub org_id: Option<i64>,
    pub config_key: String,
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigUpsertResult {
    pub status: String,
    pub config_key: String,
    pub value: serde_json::Value,
}
