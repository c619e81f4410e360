use anyhow::Result;
use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};

use super::Database;
use crate::models::AppConfig;

const COLUMNS: &str = "id, org_id, config_key, value, updated_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<AppConfig> {
    Ok(AppConfig {
        id: row.get(0)?,
        org_id: row.get(1)?,
        config_key: row.get(2)?,
        value: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

impl Database {
    /// Global rows plus, when `org_id` is given, that organization's rows.
    pub fn get_config_rows(&self, org_id: Option<i64>) -> Result<Vec<AppConfig>> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM app_configs
                 WHERE org_id IS NULL OR org_id = ?1 ORDER BY id"
            ))?;
            let rows = stmt
                .query_map([org_id], from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }

    pub fn get_config_row(&self, org_id: Option<i64>, key: &str) -> Result<Option<AppConfig>> {
        self.with_connection(|conn| {
            let row = conn
                .query_row(
                    &format!(
                        "SELECT {COLUMNS} FROM app_configs
                         WHERE config_key = ?1 AND org_id IS ?2 ORDER BY id LIMIT 1"
                    ),
                    params![key, org_id],
                    from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    /// Insert or replace the `(org_id, key)` override with an encoded JSON value.
    pub fn upsert_config_row(&self, org_id: Option<i64>, key: &str, value: &str) -> Result<()> {
        let existing = self.get_config_row(org_id, key)?;
        self.with_connection(|conn| {
            match existing {
                Some(row) => conn.execute(
                    "UPDATE app_configs SET value = ?2, updated_at = ?3 WHERE id = ?1",
                    params![row.id, value, Utc::now()],
                )?,
                None => conn.execute(
                    "INSERT INTO app_configs (org_id, config_key, value, updated_at) VALUES (?1, ?2, ?3, ?4)",
                    params![org_id, key, value, Utc::now()],
                )?,
            };
            Ok(())
        })
    }

    pub fn delete_config_row(&self, org_id: Option<i64>, key: &str) -> Result<bool> {
        self.with_connection(|conn| {
            let changed = conn.execute(
                "DELETE FROM app_configs WHERE config_key = ?1 AND org_id IS ?2",
                params![key, org_id],
            )?;
            Ok(changed > 0)
        })
    }
}
