use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Sprint;

pub const DEFAULT_METHODOLOGY: &str = "Scrum";
pub const DEFAULT_PROJECT_STATE: &str = "active";
pub const DEFAULT_PROJECT_COLOR: &str = "#0078d4";
pub const DEFAULT_PROJECT_ICON: &str = "📁";
pub const DEFAULT_SPRINT_DURATION: i64 = 14;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub org_id: Option<i64>,
    pub name: String,
    /// Upper-cased, unique across all organizations.
    pub key: String,
    pub description: Option<String>,
    pub methodology: String,
    pub state: String,
    pub lead: Option<String>,
    pub color: String,
    pub icon: String,
    pub sprint_duration: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateProjectInput {
    pub name: String,
    pub key: String,
    pub description: Option<String>,
    pub methodology: Option<String>,
    pub state: Option<String>,
    pub lead: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub sprint_duration: Option<i64>,
    pub org_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProjectInput {
    pub name: Option<String>,
    pub key: Option<String>,
    pub description: Option<String>,
    pub methodology: Option<String>,
    pub state: Option<String>,
    pub lead: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub sprint_duration: Option<i64>,
    pub org_id: Option<i64>,
}

/// Project as returned by list endpoints, with sprint roll-up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSummary {
    #[serde(flatten)]
    pub project: Project,
    pub sprint_count: usize,
    pub active_sprint: Option<String>,
}

impl ProjectSummary {
    pub fn new(project: Project, sprints: &[Sprint]) -> Self {
        let active_sprint = sprints
            .iter()
            .find(|s| s.state == super::SprintState::Active)
            .map(|s| s.name.clone());
        Self {
            project,
            sprint_count: sprints.len(),
            active_sprint,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub summary: ProjectSummary,
    pub sprints: Vec<Sprint>,
}

/// Per-project roster entry. Independent of [`super::User`] accounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMember {
    pub id: i64,
    pub project_id: i64,
    pub name: String,
    pub email: String,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateTeamMemberInput {
    pub name: String,
    pub email: String,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTeamMemberInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
}
