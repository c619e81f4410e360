use anyhow::Result;
use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};

use super::Database;
use crate::models::{
    CreateProjectInput, CreateTeamMemberInput, Project, TeamMember, UpdateProjectInput,
    UpdateTeamMemberInput, DEFAULT_METHODOLOGY, DEFAULT_PROJECT_COLOR, DEFAULT_PROJECT_ICON,
    DEFAULT_PROJECT_STATE, DEFAULT_SPRINT_DURATION,
};

const COLUMNS: &str = "id, org_id, name, key, description, methodology, state, lead, color, icon, \
                       sprint_duration, created_at, updated_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        org_id: row.get(1)?,
        name: row.get(2)?,
        key: row.get(3)?,
        description: row.get(4)?,
        methodology: row.get(5)?,
        state: row.get(6)?,
        lead: row.get(7)?,
        color: row.get(8)?,
        icon: row.get(9)?,
        sprint_duration: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

fn member_from_row(row: &Row<'_>) -> rusqlite::Result<TeamMember> {
    Ok(TeamMember {
        id: row.get(0)?,
        project_id: row.get(1)?,
        name: row.get(2)?,
        email: row.get(3)?,
        role: row.get(4)?,
    })
}

impl Database {
    /// All projects, optionally restricted to one organization, by name.
    pub fn get_projects(&self, org_id: Option<i64>) -> Result<Vec<Project>> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM projects WHERE (?1 IS NULL OR org_id = ?1) ORDER BY name"
            ))?;
            let projects = stmt
                .query_map([org_id], from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(projects)
        })
    }

    pub fn get_project(&self, id: i64) -> Result<Option<Project>> {
        self.with_connection(|conn| {
            let project = conn
                .query_row(
                    &format!("SELECT {COLUMNS} FROM projects WHERE id = ?1"),
                    [id],
                    from_row,
                )
                .optional()?;
            Ok(project)
        })
    }

    pub fn get_project_by_key(&self, key: &str) -> Result<Option<Project>> {
        self.with_connection(|conn| {
            let project = conn
                .query_row(
                    &format!("SELECT {COLUMNS} FROM projects WHERE key = ?1"),
                    [key],
                    from_row,
                )
                .optional()?;
            Ok(project)
        })
    }

    /// Inserts the project as given; key normalisation is the caller's job.
    pub fn create_project(&self, input: CreateProjectInput) -> Result<Project> {
        let now = Utc::now();
        let id = self.with_connection(|conn| {
            conn.execute(
                "INSERT INTO projects (org_id, name, key, description, methodology, state, lead, color, icon,
                                       sprint_duration, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
                params![
                    input.org_id,
                    input.name,
                    input.key,
                    input.description,
                    input.methodology.as_deref().unwrap_or(DEFAULT_METHODOLOGY),
                    input.state.as_deref().unwrap_or(DEFAULT_PROJECT_STATE),
                    input.lead,
                    input.color.as_deref().unwrap_or(DEFAULT_PROJECT_COLOR),
                    input.icon.as_deref().unwrap_or(DEFAULT_PROJECT_ICON),
                    input.sprint_duration.unwrap_or(DEFAULT_SPRINT_DURATION),
                    now,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })?;
        self.get_project(id)?
            .ok_or_else(|| anyhow::anyhow!("project {id} vanished after insert"))
    }

    pub fn update_project(&self, id: i64, input: UpdateProjectInput) -> Result<bool> {
        self.with_connection(|conn| {
            let changed = conn.execute(
                "UPDATE projects SET
                    name = COALESCE(?2, name),
                    key = COALESCE(?3, key),
                    description = COALESCE(?4, description),
                    methodology = COALESCE(?5, methodology),
                    state = COALESCE(?6, state),
                    lead = COALESCE(?7, lead),
                    color = COALESCE(?8, color),
                    icon = COALESCE(?9, icon),
                    sprint_duration = COALESCE(?10, sprint_duration),
                    org_id = COALESCE(?11, org_id),
                    updated_at = ?12
                 WHERE id = ?1",
                params![
                    id,
                    input.name,
                    input.key,
                    input.description,
                    input.methodology,
                    input.state,
                    input.lead,
                    input.color,
                    input.icon,
                    input.sprint_duration,
                    input.org_id,
                    Utc::now(),
                ],
            )?;
            Ok(changed > 0)
        })
    }

    /// Deletes the project; sprints, roster, team links and roles cascade.
    pub fn delete_project(&self, id: i64) -> Result<bool> {
        self.with_connection(|conn| {
            let changed = conn.execute("DELETE FROM projects WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
    }

    // Project roster

    pub fn get_team_members(&self, project_id: i64) -> Result<Vec<TeamMember>> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, project_id, name, email, role FROM team_members
                 WHERE project_id = ?1 ORDER BY id",
            )?;
            let members = stmt
                .query_map([project_id], member_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(members)
        })
    }

    pub fn get_team_member(&self, project_id: i64, member_id: i64) -> Result<Option<TeamMember>> {
        self.with_connection(|conn| {
            let member = conn
                .query_row(
                    "SELECT id, project_id, name, email, role FROM team_members
                     WHERE id = ?1 AND project_id = ?2",
                    [member_id, project_id],
                    member_from_row,
                )
                .optional()?;
            Ok(member)
        })
    }

    pub fn get_team_member_by_email(&self, email: &str) -> Result<Option<TeamMember>> {
        self.with_connection(|conn| {
            let member = conn
                .query_row(
                    "SELECT id, project_id, name, email, role FROM team_members WHERE email = ?1",
                    [email],
                    member_from_row,
                )
                .optional()?;
            Ok(member)
        })
    }

    pub fn create_team_member(
        &self,
        project_id: i64,
        input: CreateTeamMemberInput,
    ) -> Result<TeamMember> {
        let id = self.with_connection(|conn| {
            conn.execute(
                "INSERT INTO team_members (project_id, name, email, role) VALUES (?1, ?2, ?3, ?4)",
                params![project_id, input.name, input.email, input.role],
            )?;
            Ok(conn.last_insert_rowid())
        })?;
        self.get_team_member(project_id, id)?
            .ok_or_else(|| anyhow::anyhow!("team member {id} vanished after insert"))
    }

    pub fn update_team_member(
        &self,
        project_id: i64,
        member_id: i64,
        input: UpdateTeamMemberInput,
    ) -> Result<bool> {
        self.with_connection(|conn| {
            let changed = conn.execute(
                "UPDATE team_members SET
                    name = COALESCE(?3, name),
                    email = COALESCE(?4, email),
                    role = COALESCE(?5, role)
                 WHERE id = ?1 AND project_id = ?2",
                params![member_id, project_id, input.name, input.email, input.role],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn delete_team_member(&self, project_id: i64, member_id: i64) -> Result<bool> {
        self.with_connection(|conn| {
            let changed = conn.execute(
                "DELETE FROM team_members WHERE id = ?1 AND project_id = ?2",
                [member_id, project_id],
            )?;
            Ok(changed > 0)
        })
    }
}
