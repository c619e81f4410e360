use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named group of users that can be assigned to projects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamSummary {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub member_count: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateTeamInput {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTeamInput {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMembership {
    pub id: i64,
    pub team_id: i64,
    pub user_id: i64,
    /// Role within the team, e.g. Lead, Dev, QA.
    pub role: Option<String>,
}

/// A user as listed under a team.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamUser {
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub team_role: Option<String>,
}

/// Either an existing `user_id`, or `name` + `email` to find-or-create a user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddUserToTeamInput {
    pub user_id: Option<i64>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub team_role: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectTeam {
    pub project_id: i64,
    pub team_id: i64,
    pub team_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectAccess {
    pub allowed: bool,
    pub user_id: i64,
    pub project_id: i64,
}
