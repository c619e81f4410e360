use anyhow::Result;
use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};

use super::Database;
use crate::models::{CreateUserInput, ProjectRole, UpdateRoleInput, UpdateUserInput, User};

const COLUMNS: &str = "id, name, email, settings, created_at, updated_at";
const ROLE_COLUMNS: &str = "id, user_id, project_id, role, permissions";

fn from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        settings: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

fn role_from_row(row: &Row<'_>) -> rusqlite::Result<ProjectRole> {
    Ok(ProjectRole {
        id: row.get(0)?,
        user_id: row.get(1)?,
        project_id: row.get(2)?,
        role: row.get(3)?,
        permissions: row.get(4)?,
    })
}

impl Database {
    pub fn get_users(&self) -> Result<Vec<User>> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM users ORDER BY name, id"))?;
            let users = stmt
                .query_map([], from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(users)
        })
    }

    pub fn get_user(&self, id: i64) -> Result<Option<User>> {
        self.with_connection(|conn| {
            let user = conn
                .query_row(&format!("SELECT {COLUMNS} FROM users WHERE id = ?1"), [id], from_row)
                .optional()?;
            Ok(user)
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.with_connection(|conn| {
            let user = conn
                .query_row(
                    &format!("SELECT {COLUMNS} FROM users WHERE email = ?1"),
                    [email],
                    from_row,
                )
                .optional()?;
            Ok(user)
        })
    }

    pub fn create_user(&self, input: CreateUserInput) -> Result<User> {
        let now = Utc::now();
        let id = self.with_connection(|conn| {
            conn.execute(
                "INSERT INTO users (name, email, settings, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?4)",
                params![input.name, input.email, input.settings, now],
            )?;
            Ok(conn.last_insert_rowid())
        })?;
        self.get_user(id)?
            .ok_or_else(|| anyhow::anyhow!("user {id} vanished after insert"))
    }

    pub fn update_user(&self, id: i64, input: UpdateUserInput) -> Result<bool> {
        self.with_connection(|conn| {
            let changed = conn.execute(
                "UPDATE users SET
                    name = COALESCE(?2, name),
                    email = COALESCE(?3, email),
                    settings = COALESCE(?4, settings),
                    updated_at = ?5
                 WHERE id = ?1",
                params![id, input.name, input.email, input.settings, Utc::now()],
            )?;
            Ok(changed > 0)
        })
    }

    /// Deletes the user; team memberships and project roles cascade.
    pub fn delete_user(&self, id: i64) -> Result<bool> {
        self.with_connection(|conn| {
            let changed = conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
    }

    // Project roles

    pub fn get_project_roles(&self, project_id: i64) -> Result<Vec<ProjectRole>> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ROLE_COLUMNS} FROM project_roles WHERE project_id = ?1 ORDER BY id"
            ))?;
            let roles = stmt
                .query_map([project_id], role_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(roles)
        })
    }

    pub fn get_role(&self, id: i64) -> Result<Option<ProjectRole>> {
        self.with_connection(|conn| {
            let role = conn
                .query_row(
                    &format!("SELECT {ROLE_COLUMNS} FROM project_roles WHERE id = ?1"),
                    [id],
                    role_from_row,
                )
                .optional()?;
            Ok(role)
        })
    }

    pub fn get_project_role(&self, user_id: i64, project_id: i64) -> Result<Option<ProjectRole>> {
        self.with_connection(|conn| {
            let role = conn
                .query_row(
                    &format!(
                        "SELECT {ROLE_COLUMNS} FROM project_roles
                         WHERE user_id = ?1 AND project_id = ?2 ORDER BY id LIMIT 1"
                    ),
                    [user_id, project_id],
                    role_from_row,
                )
                .optional()?;
            Ok(role)
        })
    }

    pub fn create_role(
        &self,
        user_id: i64,
        project_id: i64,
        role: &str,
        permissions: Option<&str>,
    ) -> Result<ProjectRole> {
        let id = self.with_connection(|conn| {
            conn.execute(
                "INSERT INTO project_roles (user_id, project_id, role, permissions) VALUES (?1, ?2, ?3, ?4)",
                params![user_id, project_id, role, permissions],
            )?;
            Ok(conn.last_insert_rowid())
        })?;
        self.get_role(id)?
            .ok_or_else(|| anyhow::anyhow!("role {id} vanished after insert"))
    }

    pub fn update_role(&self, id: i64, input: UpdateRoleInput) -> Result<bool> {
        self.with_connection(|conn| {
            let changed = conn.execute(
                "UPDATE project_roles SET
                    role = COALESCE(?2, role),
                    permissions = COALESCE(?3, permissions)
                 WHERE id = ?1",
                params![id, input.role, input.permissions],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn delete_role(&self, id: i64) -> Result<bool> {
        self.with_connection(|conn| {
            let changed = conn.execute("DELETE FROM project_roles WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
    }
}
