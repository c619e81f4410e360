use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Retrospective {
    pub id: i64,
    pub sprint_id: i64,
    pub summary: Option<String>,
    /// What went well.
    pub positives: Option<String>,
    /// What didn't go well.
    pub negatives: Option<String>,
    pub needs_improve: Option<String>,
    /// Action items.
    pub actions: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Used for both create and partial update; absent fields are left alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetrospectiveInput {
    pub summary: Option<String>,
    pub positives: Option<String>,
    pub negatives: Option<String>,
    pub needs_improve: Option<String>,
    pub actions: Option<String>,
}
