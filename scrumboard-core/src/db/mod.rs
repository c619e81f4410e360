//! SQLite persistence.
//!
//! [`Database`] is a cheaply cloneable handle around a single connection.
//! Repository methods live in the per-entity submodules as `impl Database`
//! blocks and return `anyhow::Result`; "not found" is `Ok(None)` or
//! `Ok(false)`, never an error.

mod config;
mod organizations;
mod projects;
mod retrospectives;
mod schema;
mod sprints;
mod tasks;
mod teams;
mod users;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context, Result};
use rusqlite::{Connection, Transaction};

pub use tasks::ImportedTask;

#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create database directory {}", parent.display())
                })?;
            }
        }

        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database {}", path.display()))?;
        Self::from_connection(conn)
    }

    /// Open the database at the platform data directory.
    pub fn open_default() -> Result<Self> {
        Self::open(Self::default_path()?)
    }

    /// Open a private in-memory database. Used by tests.
    pub fn open_memory() -> Result<Self> {
        let db = Self::from_connection(Connection::open_in_memory()?)?;
        db.migrate()?;
        Ok(db)
    }

    pub fn default_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("", "", "scrumboard")
            .ok_or_else(|| anyhow!("could not determine a data directory for scrumboard"))?;
        Ok(dirs.data_dir().join("scrumboard.db"))
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "busy_timeout", 5000)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create any missing tables and indexes.
    pub fn migrate(&self) -> Result<()> {
        self.with_connection(|conn| {
            conn.execute_batch(schema::SCHEMA)
                .context("schema migration failed")?;
            Ok(())
        })
    }

    pub fn with_connection<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| anyhow!("database lock poisoned"))?;
        f(&conn)
    }

    /// Run `f` inside a transaction, committing only if it succeeds.
    pub fn with_transaction<T>(&self, f: impl FnOnce(&Transaction<'_>) -> Result<T>) -> Result<T> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| anyhow!("database lock poisoned"))?;
        let tx = conn.transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn migrate_creates_tables() {
        let db = Database::open_memory().unwrap();
        let tables: Vec<String> = db
            .with_connection(|conn| {
                let mut stmt =
                    conn.prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<rusqlite::Result<Vec<String>>>()?;
                Ok(names)
            })
            .unwrap();

        for expected in [
            "app_configs",
            "organizations",
            "project_roles",
            "project_teams",
            "projects",
            "retrospectives",
            "sprints",
            "task_updates",
            "tasks",
            "team_members",
            "team_memberships",
            "teams",
            "users",
        ] {
            assert!(tables.iter().any(|t| t == expected), "missing table {expected}");
        }
    }

    #[test]
    fn migrate_is_idempotent_on_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("scrumboard.db");

        let db = Database::open(&path).unwrap();
        db.migrate().unwrap();
        db.migrate().unwrap();
        drop(db);

        let reopened = Database::open(&path).unwrap();
        reopened.migrate().unwrap();
        assert!(path.exists());
    }

    #[test]
    fn foreign_keys_enforced() {
        let db = Database::open_memory().unwrap();
        let result = db.with_connection(|conn| {
            conn.execute(
                "INSERT INTO sprints (project_id, name, state, created_at, updated_at)
                 VALUES (999, 'orphan', 'planning', '2024-01-01', '2024-01-01')",
                [],
            )?;
            Ok(())
        });
        assert!(result.is_err(), "sprint without project should be rejected");
    }
}
