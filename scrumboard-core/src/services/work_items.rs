//! Work items (tasks) and their status history.

use chrono::Local;
use tracing::{debug, info};

use crate::db::Database;
use crate::error::{ServiceError, ServiceResult};
use crate::models::{
    type_prefix, CreateWorkItemInput, StatusUpdateInput, Task, TaskUpdate, UpdateWorkItemInput,
    WorkItemFilter, DEFAULT_WORK_ITEM_TYPE,
};

fn require_task(db: &Database, task_id: &str) -> ServiceResult<Task> {
    db.get_task_by_task_id(task_id)?
        .ok_or_else(|| ServiceError::not_found("Task"))
}

fn check_parent(db: &Database, task_id: Option<&str>, parent: Option<&str>) -> ServiceResult<()> {
    let Some(parent) = parent else {
        return Ok(());
    };
    if Some(parent) == task_id {
        return Err(ServiceError::invalid("A work item cannot be its own parent"));
    }
    if db.get_task_by_task_id(parent)?.is_none() {
        return Err(ServiceError::invalid(format!(
            "Parent work item {parent} not found"
        )));
    }
    Ok(())
}

/// Next free `{PREFIX}-{n}` id, starting from `max(row id) + 1`.
fn generate_task_id(db: &Database, work_item_type: &str) -> ServiceResult<String> {
    let prefix = type_prefix(work_item_type);
    let mut next = db.max_task_row_id()? + 1;
    loop {
        let candidate = format!("{prefix}-{next}");
        if db.get_task_by_task_id(&candidate)?.is_none() {
            return Ok(candidate);
        }
        next += 1;
    }
}

pub fn list_tasks(db: &Database) -> ServiceResult<Vec<Task>> {
    let tasks = db.list_tasks()?;
    debug!(count = tasks.len(), "listed tasks");
    Ok(tasks)
}

pub fn list_work_items(db: &Database, filter: &WorkItemFilter) -> ServiceResult<Vec<Task>> {
    let items = db.get_work_items(filter)?;
    debug!(?filter, count = items.len(), "listed work items");
    Ok(items)
}

pub fn get_work_item(db: &Database, task_id: &str) -> ServiceResult<Task> {
    require_task(db, task_id)
}

pub fn create_work_item(db: &Database, mut input: CreateWorkItemInput) -> ServiceResult<Task> {
    if input.title.trim().is_empty() {
        return Err(ServiceError::invalid("Title is required"));
    }

    let task_id = match input.task_id.take() {
        Some(id) if !id.trim().is_empty() => {
            let id = id.trim().to_string();
            if db.get_task_by_task_id(&id)?.is_some() {
                return Err(ServiceError::conflict(format!("Work item {id} already exists")));
            }
            id
        }
        _ => {
            let work_item_type = input
                .work_item_type
                .as_deref()
                .unwrap_or(DEFAULT_WORK_ITEM_TYPE);
            generate_task_id(db, work_item_type)?
        }
    };
    check_parent(db, Some(&task_id), input.parent_task_id.as_deref())?;

    let task = db.create_work_item(&task_id, input)?;
    info!(task_id = %task.task_id, "created work item");
    Ok(task)
}

pub fn update_work_item(
    db: &Database,
    task_id: &str,
    input: UpdateWorkItemInput,
) -> ServiceResult<Task> {
    require_task(db, task_id)?;
    check_parent(db, Some(task_id), input.parent_task_id.as_deref())?;
    db.update_work_item(task_id, input)?;
    info!(task_id, "updated work item");
    require_task(db, task_id)
}

pub fn delete_work_item(db: &Database, task_id: &str) -> ServiceResult<()> {
    if !db.delete_work_item(task_id)? {
        return Err(ServiceError::not_found("Task"));
    }
    info!(task_id, "deleted work item");
    Ok(())
}

/// Apply a status update and record it in the task's history.
pub fn update_status(db: &Database, task_id: &str, input: StatusUpdateInput) -> ServiceResult<Task> {
    let update_date = input
        .update_date
        .unwrap_or_else(|| Local::now().date_naive());
    if !db.record_status_update(task_id, update_date, &input)? {
        return Err(ServiceError::not_found("Task"));
    }
    info!(task_id, %update_date, "recorded status update");
    require_task(db, task_id)
}

/// Newest first. Unknown ids yield an empty history.
pub fn get_history(db: &Database, task_id: &str) -> ServiceResult<Vec<TaskUpdate>> {
    Ok(db.get_task_updates(task_id)?)
}

pub fn get_children(db: &Database, task_id: &str) -> ServiceResult<Vec<Task>> {
    require_task(db, task_id)?;
    Ok(db.get_children(task_id)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_item(title: &str, work_item_type: Option<&str>) -> CreateWorkItemInput {
        CreateWorkItemInput {
            title: title.into(),
            work_item_type: work_item_type.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn generated_ids_use_type_prefix_and_next_row_id() {
        let db = Database::open_memory().unwrap();
        let first = create_work_item(&db, new_item("Platform", Some("Epic"))).unwrap();
        assert_eq!(first.task_id, "EPIC-1");

        create_work_item(&db, new_item("Something", None)).unwrap();
        let bug = create_work_item(&db, new_item("Crash", Some("Bug"))).unwrap();
        assert_eq!(bug.task_id, "BUG-3");

        let other = create_work_item(&db, new_item("Spike", Some("Research"))).unwrap();
        assert_eq!(other.task_id, "WI-4");
        assert_eq!(other.state.as_deref(), Some("New"));
    }

    #[test]
    fn generated_id_skips_taken_values() {
        let db = Database::open_memory().unwrap();
        let mut explicit = new_item("Taken", Some("Bug"));
        explicit.task_id = Some("BUG-2".into());
        create_work_item(&db, explicit).unwrap();

        let bug = create_work_item(&db, new_item("Crash", Some("Bug"))).unwrap();
        assert_eq!(bug.task_id, "BUG-3");
    }

    #[test]
    fn duplicate_and_orphan_items_are_rejected() {
        let db = Database::open_memory().unwrap();
        let mut item = new_item("One", None);
        item.task_id = Some("TASK-9".into());
        create_work_item(&db, item.clone()).unwrap();
        assert!(matches!(create_work_item(&db, item), Err(ServiceError::Conflict(_))));

        let mut orphan = new_item("Two", None);
        orphan.parent_task_id = Some("EPIC-404".into());
        assert!(matches!(
            create_work_item(&db, orphan),
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[test]
    fn children_are_listed_under_parent() {
        let db = Database::open_memory().unwrap();
        let epic = create_work_item(&db, new_item("Epic", Some("Epic"))).unwrap();
        let mut feature = new_item("Feature", Some("Feature"));
        feature.parent_task_id = Some(epic.task_id.clone());
        let feature = create_work_item(&db, feature).unwrap();

        let children = get_children(&db, &epic.task_id).unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].task_id, feature.task_id);
        assert!(get_children(&db, &feature.task_id).unwrap().is_empty());
    }

    #[test]
    fn status_update_defaults_date_to_today() {
        let db = Database::open_memory().unwrap();
        let task = create_work_item(&db, new_item("Write", None)).unwrap();
        let updated = update_status(
            &db,
            &task.task_id,
            StatusUpdateInput {
                current_update: Some("halfway".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(updated.update_date, Some(Local::now().date_naive()));
        assert_eq!(get_history(&db, &task.task_id).unwrap().len(), 1);

        let missing = update_status(&db, "NOPE-1", StatusUpdateInput::default());
        assert!(matches!(missing, Err(ServiceError::NotFound(_))));
    }
}
