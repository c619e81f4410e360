use anyhow::Result;
use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};

use super::Database;
use crate::models::{Retrospective, RetrospectiveInput};

const COLUMNS: &str =
    "id, sprint_id, summary, positives, negatives, needs_improve, actions, created_at, updated_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Retrospective> {
    Ok(Retrospective {
        id: row.get(0)?,
        sprint_id: row.get(1)?,
        summary: row.get(2)?,
        positives: row.get(3)?,
        negatives: row.get(4)?,
        needs_improve: row.get(5)?,
        actions: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

impl Database {
    pub fn get_retrospective(&self, sprint_id: i64) -> Result<Option<Retrospective>> {
        self.with_connection(|conn| {
            let retro = conn
                .query_row(
                    &format!("SELECT {COLUMNS} FROM retrospectives WHERE sprint_id = ?1"),
                    [sprint_id],
                    from_row,
                )
                .optional()?;
            Ok(retro)
        })
    }

    pub fn create_retrospective(
        &self,
        sprint_id: i64,
        input: RetrospectiveInput,
    ) -> Result<Retrospective> {
        let now = Utc::now();
        self.with_connection(|conn| {
            conn.execute(
                "INSERT INTO retrospectives (sprint_id, summary, positives, negatives, needs_improve, actions,
                                             created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
                params![
                    sprint_id,
                    input.summary,
                    input.positives,
                    input.negatives,
                    input.needs_improve,
                    input.actions,
                    now,
                ],
            )?;
            Ok(())
        })?;
        self.get_retrospective(sprint_id)?
            .ok_or_else(|| anyhow::anyhow!("retrospective for sprint {sprint_id} vanished after insert"))
    }

    pub fn update_retrospective(&self, sprint_id: i64, input: RetrospectiveInput) -> Result<bool> {
        self.with_connection(|conn| {
            let changed = conn.execute(
                "UPDATE retrospectives SET
                    summary = COALESCE(?2, summary),
                    positives = COALESCE(?3, positives),
                    negatives = COALESCE(?4, negatives),
                    needs_improve = COALESCE(?5, needs_improve),
                    actions = COALESCE(?6, actions),
                    updated_at = ?7
                 WHERE sprint_id = ?1",
                params![
                    sprint_id,
                    input.summary,
                    input.positives,
                    input.negatives,
                    input.needs_improve,
                    input.actions,
                    Utc::now(),
                ],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn delete_retrospective(&self, sprint_id: i64) -> Result<bool> {
        self.with_connection(|conn| {
            let changed = conn.execute("DELETE FROM retrospectives WHERE sprint_id = ?1", [sprint_id])?;
            Ok(changed > 0)
        })
    }
}
