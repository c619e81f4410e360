use anyhow::Result;
use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};

use super::Database;
use crate::models::{
    CreateTeamInput, ProjectTeam, Team, TeamMembership, TeamSummary, TeamUser, UpdateTeamInput,
};

const COLUMNS: &str = "id, name, description, created_at, updated_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Team> {
    Ok(Team {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

fn membership_from_row(row: &Row<'_>) -> rusqlite::Result<TeamMembership> {
    Ok(TeamMembership {
        id: row.get(0)?,
        team_id: row.get(1)?,
        user_id: row.get(2)?,
        role: row.get(3)?,
    })
}

impl Database {
    pub fn get_team_summaries(&self) -> Result<Vec<TeamSummary>> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(
                "SELECT t.id, t.name, t.description, COUNT(m.id)
                 FROM teams t LEFT JOIN team_memberships m ON m.team_id = t.id
                 GROUP BY t.id ORDER BY t.name",
            )?;
            let teams = stmt
                .query_map([], |row| {
                    Ok(TeamSummary {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        description: row.get(2)?,
                        member_count: row.get::<_, i64>(3)? as usize,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(teams)
        })
    }

    pub fn get_team(&self, id: i64) -> Result<Option<Team>> {
        self.with_connection(|conn| {
            let team = conn
                .query_row(&format!("SELECT {COLUMNS} FROM teams WHERE id = ?1"), [id], from_row)
                .optional()?;
            Ok(team)
        })
    }

    pub fn get_team_by_name(&self, name: &str) -> Result<Option<Team>> {
        self.with_connection(|conn| {
            let team = conn
                .query_row(
                    &format!("SELECT {COLUMNS} FROM teams WHERE name = ?1"),
                    [name],
                    from_row,
                )
                .optional()?;
            Ok(team)
        })
    }

    pub fn count_team_members(&self, team_id: i64) -> Result<usize> {
        self.with_connection(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM team_memberships WHERE team_id = ?1",
                [team_id],
                |row| row.get(0),
            )?;
            Ok(count as usize)
        })
    }

    pub fn create_team(&self, input: CreateTeamInput) -> Result<Team> {
        let now = Utc::now();
        let id = self.with_connection(|conn| {
            conn.execute(
                "INSERT INTO teams (name, description, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
                params![input.name, input.description, now],
            )?;
            Ok(conn.last_insert_rowid())
        })?;
        self.get_team(id)?
            .ok_or_else(|| anyhow::anyhow!("team {id} vanished after insert"))
    }

    pub fn update_team(&self, id: i64, input: UpdateTeamInput) -> Result<bool> {
        self.with_connection(|conn| {
            let changed = conn.execute(
                "UPDATE teams SET
                    name = COALESCE(?2, name),
                    description = COALESCE(?3, description),
                    updated_at = ?4
                 WHERE id = ?1",
                params![id, input.name, input.description, Utc::now()],
            )?;
            Ok(changed > 0)
        })
    }

    /// Deletes the team; memberships and project assignments cascade.
    pub fn delete_team(&self, id: i64) -> Result<bool> {
        self.with_connection(|conn| {
            let changed = conn.execute("DELETE FROM teams WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
    }

    // Memberships

    pub fn get_team_users(&self, team_id: i64) -> Result<Vec<TeamUser>> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(
                "SELECT u.id, u.name, u.email, m.role
                 FROM team_memberships m JOIN users u ON u.id = m.user_id
                 WHERE m.team_id = ?1 ORDER BY m.id",
            )?;
            let users = stmt
                .query_map([team_id], |row| {
                    Ok(TeamUser {
                        user_id: row.get(0)?,
                        name: row.get(1)?,
                        email: row.get(2)?,
                        team_role: row.get(3)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(users)
        })
    }

    pub fn get_membership(&self, team_id: i64, user_id: i64) -> Result<Option<TeamMembership>> {
        self.with_connection(|conn| {
            let membership = conn
                .query_row(
                    "SELECT id, team_id, user_id, role FROM team_memberships
                     WHERE team_id = ?1 AND user_id = ?2",
                    [team_id, user_id],
                    membership_from_row,
                )
                .optional()?;
            Ok(membership)
        })
    }

    pub fn create_membership(
        &self,
        team_id: i64,
        user_id: i64,
        role: Option<&str>,
    ) -> Result<TeamMembership> {
        self.with_connection(|conn| {
            conn.execute(
                "INSERT INTO team_memberships (team_id, user_id, role) VALUES (?1, ?2, ?3)",
                params![team_id, user_id, role],
            )?;
            Ok(TeamMembership {
                id: conn.last_insert_rowid(),
                team_id,
                user_id,
                role: role.map(str::to_owned),
            })
        })
    }

    pub fn set_membership_role(&self, team_id: i64, user_id: i64, role: &str) -> Result<bool> {
        self.with_connection(|conn| {
            let changed = conn.execute(
                "UPDATE team_memberships SET role = ?3 WHERE team_id = ?1 AND user_id = ?2",
                params![team_id, user_id, role],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn delete_membership(&self, team_id: i64, user_id: i64) -> Result<bool> {
        self.with_connection(|conn| {
            let changed = conn.execute(
                "DELETE FROM team_memberships WHERE team_id = ?1 AND user_id = ?2",
                [team_id, user_id],
            )?;
            Ok(changed > 0)
        })
    }

    // Project assignments

    pub fn get_project_teams(&self, project_id: i64) -> Result<Vec<ProjectTeam>> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(
                "SELECT pt.project_id, pt.team_id, t.name
                 FROM project_teams pt JOIN teams t ON t.id = pt.team_id
                 WHERE pt.project_id = ?1 ORDER BY pt.id",
            )?;
            let rows = stmt
                .query_map([project_id], |row| {
                    Ok(ProjectTeam {
                        project_id: row.get(0)?,
                        team_id: row.get(1)?,
                        team_name: row.get(2)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }

    /// Links a team to a project; a no-op when already linked.
    pub fn assign_project_team(&self, project_id: i64, team_id: i64) -> Result<()> {
        self.with_connection(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO project_teams (project_id, team_id) VALUES (?1, ?2)",
                [project_id, team_id],
            )?;
            Ok(())
        })
    }

    pub fn unassign_project_team(&self, project_id: i64, team_id: i64) -> Result<bool> {
        self.with_connection(|conn| {
            let changed = conn.execute(
                "DELETE FROM project_teams WHERE project_id = ?1 AND team_id = ?2",
                [project_id, team_id],
            )?;
            Ok(changed > 0)
        })
    }

    /// Whether `user_id` belongs to at least one team assigned to the project.
    pub fn is_member_of_project_team(&self, user_id: i64, project_id: i64) -> Result<bool> {
        self.with_connection(|conn| {
            let found = conn
                .query_row(
                    "SELECT 1 FROM team_memberships m
                     JOIN project_teams pt ON pt.team_id = m.team_id
                     WHERE m.user_id = ?1 AND pt.project_id = ?2 LIMIT 1",
                    [user_id, project_id],
                    |_| Ok(()),
                )
                .optional()?;
            Ok(found.is_some())
        })
    }
}
