use anyhow::Result;
use chrono::{NaiveDate, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, OptionalExtension, Row};

use super::Database;
use crate::models::{
    CreateWorkItemInput, StatusUpdateInput, Task, TaskUpdate, UpdateWorkItemInput,
    WorkItemFilter, DEFAULT_PRIORITY, DEFAULT_WORK_ITEM_STATE, DEFAULT_WORK_ITEM_TYPE,
};

const COLUMNS: &str = "id, task_id, work_item_type, parent_task_id, title, description, \
    assigned_to, state, sub_state, priority, story_points, sprint, tags, area_path, \
    iteration_path, activated_date, target_date, committed_date, release_date, closed_date, \
    cycle_time, current_status, current_update, update_date, risk_item, carry_forward_reason, \
    criticality, expected_timeline_min, expected_timeline_max, delayed, project_id, sprint_id, \
    created_at, updated_at";

const UPDATE_COLUMNS: &str =
    "id, task_id, update_date, current_status, current_update, state, sub_state, created_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        task_id: row.get(1)?,
        work_item_type: row.get(2)?,
        parent_task_id: row.get(3)?,
        title: row.get(4)?,
        description: row.get(5)?,
        assigned_to: row.get(6)?,
        state: row.get(7)?,
        sub_state: row.get(8)?,
        priority: row.get(9)?,
        story_points: row.get(10)?,
        sprint: row.get(11)?,
        tags: row.get(12)?,
        area_path: row.get(13)?,
        iteration_path: row.get(14)?,
        activated_date: row.get(15)?,
        target_date: row.get(16)?,
        committed_date: row.get(17)?,
        release_date: row.get(18)?,
        closed_date: row.get(19)?,
        cycle_time: row.get(20)?,
        current_status: row.get(21)?,
        current_update: row.get(22)?,
        update_date: row.get(23)?,
        risk_item: row.get(24)?,
        carry_forward_reason: row.get(25)?,
        criticality: row.get(26)?,
        expected_timeline_min: row.get(27)?,
        expected_timeline_max: row.get(28)?,
        delayed: row.get(29)?,
        project_id: row.get(30)?,
        sprint_id: row.get(31)?,
        created_at: row.get(32)?,
        updated_at: row.get(33)?,
    })
}

fn update_from_row(row: &Row<'_>) -> rusqlite::Result<TaskUpdate> {
    Ok(TaskUpdate {
        id: row.get(0)?,
        task_id: row.get(1)?,
        update_date: row.get(2)?,
        current_status: row.get(3)?,
        current_update: row.get(4)?,
        state: row.get(5)?,
        sub_state: row.get(6)?,
        created_at: row.get(7)?,
    })
}

/// One normalized row from a bulk import.
///
/// `fields` holds `(column, value)` pairs for the tasks table; column names
/// come from the ingestion alias table, never from user input.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedTask {
    pub task_id: String,
    pub fields: Vec<(&'static str, Value)>,
}

impl Database {
    pub fn list_tasks(&self) -> Result<Vec<Task>> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM tasks ORDER BY id"))?;
            let tasks = stmt
                .query_map([], from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(tasks)
        })
    }

    pub fn get_work_items(&self, filter: &WorkItemFilter) -> Result<Vec<Task>> {
        let search = filter
            .search
            .as_deref()
            .map(|s| format!("%{}%", s.to_lowercase()));
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM tasks
                 WHERE (?1 IS NULL OR work_item_type = ?1)
                   AND (?2 IS NULL OR state = ?2)
                   AND (?3 IS NULL OR assigned_to = ?3)
                   AND (?4 IS NULL OR sprint = ?4)
                   AND (?5 IS NULL OR LOWER(COALESCE(title, '')) LIKE ?5 OR LOWER(task_id) LIKE ?5)
                 ORDER BY id"
            ))?;
            let tasks = stmt
                .query_map(
                    params![
                        filter.work_item_type,
                        filter.state,
                        filter.assigned_to,
                        filter.sprint,
                        search
                    ],
                    from_row,
                )?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(tasks)
        })
    }

    pub fn get_task_by_task_id(&self, task_id: &str) -> Result<Option<Task>> {
        self.with_connection(|conn| {
            let task = conn
                .query_row(
                    &format!("SELECT {COLUMNS} FROM tasks WHERE task_id = ?1"),
                    [task_id],
                    from_row,
                )
                .optional()?;
            Ok(task)
        })
    }

    pub fn get_children(&self, parent_task_id: &str) -> Result<Vec<Task>> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM tasks WHERE parent_task_id = ?1 ORDER BY id"
            ))?;
            let tasks = stmt
                .query_map([parent_task_id], from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(tasks)
        })
    }

    /// Highest row id in `tasks`, 0 when empty.
    pub fn max_task_row_id(&self) -> Result<i64> {
        self.with_connection(|conn| {
            let max = conn.query_row("SELECT COALESCE(MAX(id), 0) FROM tasks", [], |row| row.get(0))?;
            Ok(max)
        })
    }

    pub fn create_work_item(&self, task_id: &str, input: CreateWorkItemInput) -> Result<Task> {
        let now = Utc::now();
        self.with_connection(|conn| {
            conn.execute(
                "INSERT INTO tasks (
                    task_id, title, work_item_type, state, sub_state, assigned_to, priority,
                    story_points, description, iteration_path, area_path, sprint, tags,
                    parent_task_id, criticality, target_date, activated_date, project_id,
                    sprint_id, created_at, updated_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                           ?16, ?17, ?18, ?19, ?20, ?20)",
                params![
                    task_id,
                    input.title,
                    input.work_item_type.as_deref().unwrap_or(DEFAULT_WORK_ITEM_TYPE),
                    input.state.as_deref().unwrap_or(DEFAULT_WORK_ITEM_STATE),
                    input.sub_state,
                    input.assigned_to,
                    input.priority.unwrap_or(DEFAULT_PRIORITY),
                    input.story_points,
                    input.description,
                    input.iteration_path,
                    input.area_path,
                    input.sprint,
                    input.tags,
                    input.parent_task_id,
                    input.criticality,
                    input.target_date,
                    input.activated_date,
                    input.project_id,
                    input.sprint_id,
                    now,
                ],
            )?;
            Ok(())
        })?;
        self.get_task_by_task_id(task_id)?
            .ok_or_else(|| anyhow::anyhow!("work item {task_id} vanished after insert"))
    }

    pub fn update_work_item(&self, task_id: &str, input: UpdateWorkItemInput) -> Result<bool> {
        self.with_connection(|conn| {
            let changed = conn.execute(
                "UPDATE tasks SET
                    title = COALESCE(?2, title),
                    work_item_type = COALESCE(?3, work_item_type),
                    state = COALESCE(?4, state),
                    sub_state = COALESCE(?5, sub_state),
                    assigned_to = COALESCE(?6, assigned_to),
                    priority = COALESCE(?7, priority),
                    story_points = COALESCE(?8, story_points),
                    description = COALESCE(?9, description),
                    iteration_path = COALESCE(?10, iteration_path),
                    area_path = COALESCE(?11, area_path),
                    sprint = COALESCE(?12, sprint),
                    tags = COALESCE(?13, tags),
                    parent_task_id = COALESCE(?14, parent_task_id),
                    criticality = COALESCE(?15, criticality),
                    target_date = COALESCE(?16, target_date),
                    activated_date = COALESCE(?17, activated_date),
                    closed_date = COALESCE(?18, closed_date),
                    project_id = COALESCE(?19, project_id),
                    sprint_id = COALESCE(?20, sprint_id),
                    updated_at = ?21
                 WHERE task_id = ?1",
                params![
                    task_id,
                    input.title,
                    input.work_item_type,
                    input.state,
                    input.sub_state,
                    input.assigned_to,
                    input.priority,
                    input.story_points,
                    input.description,
                    input.iteration_path,
                    input.area_path,
                    input.sprint,
                    input.tags,
                    input.parent_task_id,
                    input.criticality,
                    input.target_date,
                    input.activated_date,
                    input.closed_date,
                    input.project_id,
                    input.sprint_id,
                    Utc::now(),
                ],
            )?;
            Ok(changed > 0)
        })
    }

    /// Deletes the work item together with its status history.
    pub fn delete_work_item(&self, task_id: &str) -> Result<bool> {
        self.with_transaction(|tx| {
            tx.execute("DELETE FROM task_updates WHERE task_id = ?1", [task_id])?;
            let changed = tx.execute("DELETE FROM tasks WHERE task_id = ?1", [task_id])?;
            Ok(changed > 0)
        })
    }

    /// Stamp the status fields on the task and append a history row.
    ///
    /// Returns `false` if no task has `task_id`.
    pub fn record_status_update(
        &self,
        task_id: &str,
        update_date: NaiveDate,
        input: &StatusUpdateInput,
    ) -> Result<bool> {
        let now = Utc::now();
        self.with_transaction(|tx| {
            let changed = tx.execute(
                "UPDATE tasks SET
                    current_status = COALESCE(?2, current_status),
                    current_update = COALESCE(?3, current_update),
                    state = COALESCE(?4, state),
                    sub_state = COALESCE(?5, sub_state),
                    update_date = ?6,
                    updated_at = ?7
                 WHERE task_id = ?1",
                params![
                    task_id,
                    input.current_status,
                    input.current_update,
                    input.state,
                    input.sub_state,
                    update_date,
                    now,
                ],
            )?;
            if changed == 0 {
                return Ok(false);
            }
            // History rows snapshot the task after the update is applied.
            tx.execute(
                "INSERT INTO task_updates
                    (task_id, update_date, current_status, current_update, state, sub_state, created_at)
                 SELECT task_id, update_date, current_status, current_update, state, sub_state, ?2
                 FROM tasks WHERE task_id = ?1",
                params![task_id, now],
            )?;
            Ok(true)
        })
    }

    /// Status history, newest first.
    pub fn get_task_updates(&self, task_id: &str) -> Result<Vec<TaskUpdate>> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {UPDATE_COLUMNS} FROM task_updates
                 WHERE task_id = ?1 ORDER BY update_date DESC, id DESC"
            ))?;
            let updates = stmt
                .query_map([task_id], update_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(updates)
        })
    }

    /// Upsert imported rows by `task_id` in a single transaction.
    pub fn upsert_imported_tasks(&self, rows: &[ImportedTask]) -> Result<usize> {
        let now = Utc::now().to_rfc3339();
        self.with_transaction(|tx| {
            for row in rows {
                let exists = tx
                    .query_row("SELECT 1 FROM tasks WHERE task_id = ?1", [&row.task_id], |_| Ok(()))
                    .optional()?
                    .is_some();

                let mut values: Vec<Value> = row.fields.iter().map(|(_, v)| v.clone()).collect();
                if exists {
                    let assignments: Vec<String> = row
                        .fields
                        .iter()
                        .enumerate()
                        .map(|(i, (column, _))| format!("{column} = ?{}", i + 1))
                        .collect();
                    let n = values.len();
                    let sql = format!(
                        "UPDATE tasks SET {}{}updated_at = ?{} WHERE task_id = ?{}",
                        assignments.join(", "),
                        if assignments.is_empty() { "" } else { ", " },
                        n + 1,
                        n + 2,
                    );
                    values.push(Value::Text(now.clone()));
                    values.push(Value::Text(row.task_id.clone()));
                    tx.execute(&sql, params_from_iter(values))?;
                } else {
                    let mut columns: Vec<&str> = vec!["task_id"];
                    columns.extend(row.fields.iter().map(|(column, _)| *column));
                    columns.push("created_at");
                    columns.push("updated_at");
                    let placeholders: Vec<String> =
                        (1..=columns.len()).map(|i| format!("?{i}")).collect();
                    let sql = format!(
                        "INSERT INTO tasks ({}) VALUES ({})",
                        columns.join(", "),
                        placeholders.join(", "),
                    );
                    values.insert(0, Value::Text(row.task_id.clone()));
                    values.push(Value::Text(now.clone()));
                    values.push(Value::Text(now.clone()));
                    tx.execute(&sql, params_from_iter(values))?;
                }
            }
            Ok(rows.len())
        })
    }
}
