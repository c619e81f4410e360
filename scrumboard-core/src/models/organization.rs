use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_THEME_COLOR: &str = "#0078d4";

/// Top-level tenant. Projects and config overrides hang off an organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub logo_url: Option<String>,
    pub theme_color: Option<String>,
    pub settings: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateOrganizationInput {
    pub name: String,
    pub slug: String,
    pub logo_url: Option<String>,
    pub theme_color: Option<String>,
    pub settings: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateOrganizationInput {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub logo_url: Option<String>,
    pub theme_color: Option<String>,
    pub settings: Option<String>,
}
