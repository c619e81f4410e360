use anyhow::Result;
use chrono::Utc;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, OptionalExtension, Row};

use super::Database;
use crate::models::{CreateSprintInput, Sprint, SprintState, UpdateSprintInput};

const COLUMNS: &str =
    "id, project_id, name, goal, start_date, end_date, state, capacity, velocity, created_at, updated_at";

impl ToSql for SprintState {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for SprintState {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        SprintState::from_str(s).ok_or_else(|| FromSqlError::Other(format!("unknown sprint state: {s}").into()))
    }
}

fn from_row(row: &Row<'_>) -> rusqlite::Result<Sprint> {
    Ok(Sprint {
        id: row.get(0)?,
        project_id: row.get(1)?,
        name: row.get(2)?,
        goal: row.get(3)?,
        start_date: row.get(4)?,
        end_date: row.get(5)?,
        state: row.get(6)?,
        capacity: row.get(7)?,
        velocity: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

impl Database {
    /// Sprints of a project; undated sprints first, then by start date.
    pub fn get_sprints(&self, project_id: i64) -> Result<Vec<Sprint>> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM sprints WHERE project_id = ?1
                 ORDER BY start_date ASC, created_at ASC, id ASC"
            ))?;
            let sprints = stmt
                .query_map([project_id], from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(sprints)
        })
    }

    pub fn get_sprint(&self, id: i64) -> Result<Option<Sprint>> {
        self.with_connection(|conn| {
            let sprint = conn
                .query_row(
                    &format!("SELECT {COLUMNS} FROM sprints WHERE id = ?1"),
                    [id],
                    from_row,
                )
                .optional()?;
            Ok(sprint)
        })
    }

    pub fn get_active_sprint(&self, project_id: i64) -> Result<Option<Sprint>> {
        self.with_connection(|conn| {
            let sprint = conn
                .query_row(
                    &format!(
                        "SELECT {COLUMNS} FROM sprints WHERE project_id = ?1 AND state = 'active'
                         ORDER BY id LIMIT 1"
                    ),
                    [project_id],
                    from_row,
                )
                .optional()?;
            Ok(sprint)
        })
    }

    pub fn create_sprint(&self, project_id: i64, input: CreateSprintInput) -> Result<Sprint> {
        let now = Utc::now();
        let id = self.with_connection(|conn| {
            conn.execute(
                "INSERT INTO sprints (project_id, name, goal, start_date, end_date, state, capacity, velocity,
                                      created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
                params![
                    project_id,
                    input.name,
                    input.goal,
                    input.start_date,
                    input.end_date,
                    input.state.unwrap_or(SprintState::Planning),
                    input.capacity,
                    input.velocity,
                    now,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })?;
        self.get_sprint(id)?
            .ok_or_else(|| anyhow::anyhow!("sprint {id} vanished after insert"))
    }

    pub fn update_sprint(&self, id: i64, input: UpdateSprintInput) -> Result<bool> {
        self.with_connection(|conn| {
            let changed = conn.execute(
                "UPDATE sprints SET
                    name = COALESCE(?2, name),
                    goal = COALESCE(?3, goal),
                    start_date = COALESCE(?4, start_date),
                    end_date = COALESCE(?5, end_date),
                    state = COALESCE(?6, state),
                    capacity = COALESCE(?7, capacity),
                    velocity = COALESCE(?8, velocity),
                    updated_at = ?9
                 WHERE id = ?1",
                params![
                    id,
                    input.name,
                    input.goal,
                    input.start_date,
                    input.end_date,
                    input.state,
                    input.capacity,
                    input.velocity,
                    Utc::now(),
                ],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn set_sprint_state(&self, id: i64, state: SprintState) -> Result<bool> {
        self.with_connection(|conn| {
            let changed = conn.execute(
                "UPDATE sprints SET state = ?2, updated_at = ?3 WHERE id = ?1",
                params![id, state, Utc::now()],
            )?;
            Ok(changed > 0)
        })
    }

    /// Deletes the sprint; its retrospective cascades.
    pub fn delete_sprint(&self, id: i64) -> Result<bool> {
        self.with_connection(|conn| {
            let changed = conn.execute("DELETE FROM sprints WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
    }
}
