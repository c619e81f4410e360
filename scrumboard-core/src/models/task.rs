use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_WORK_ITEM_TYPE: &str = "Task";
pub const DEFAULT_WORK_ITEM_STATE: &str = "New";
pub const DEFAULT_PRIORITY: i64 = 3;

/// A work item: epic, feature, user story, task or bug.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub task_id: String,
    pub work_item_type: Option<String>,
    pub parent_task_id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub assigned_to: Option<String>,
    pub state: Option<String>,
    pub sub_state: Option<String>,
    /// 1 = Critical, 2 = High, 3 = Medium, 4 = Low.
    pub priority: Option<i64>,
    pub story_points: Option<f64>,
    pub sprint: Option<String>,
    pub tags: Option<String>,
    pub area_path: Option<String>,
    pub iteration_path: Option<String>,
    pub activated_date: Option<NaiveDate>,
    pub target_date: Option<NaiveDate>,
    pub committed_date: Option<NaiveDate>,
    pub release_date: Option<NaiveDate>,
    pub closed_date: Option<NaiveDate>,
    /// Days between activation and closure.
    pub cycle_time: Option<f64>,
    pub current_status: Option<String>,
    pub current_update: Option<String>,
    pub update_date: Option<NaiveDate>,
    pub risk_item: Option<String>,
    pub carry_forward_reason: Option<String>,
    pub criticality: Option<String>,
    pub expected_timeline_min: Option<i64>,
    pub expected_timeline_max: Option<i64>,
    pub delayed: bool,
    pub project_id: Option<i64>,
    pub sprint_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Prefix for generated task ids, keyed by work item type.
pub fn type_prefix(work_item_type: &str) -> &'static str {
    match work_item_type {
        "Epic" => "EPIC",
        "Feature" => "FEAT",
        "User Story" => "US",
        "Task" => "TASK",
        "Bug" => "BUG",
        _ => "WI",
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateWorkItemInput {
    /// Generated from the type prefix when absent.
    pub task_id: Option<String>,
    pub title: String,
    pub work_item_type: Option<String>,
    pub state: Option<String>,
    pub sub_state: Option<String>,
    pub assigned_to: Option<String>,
    pub priority: Option<i64>,
    pub story_points: Option<f64>,
    pub description: Option<String>,
    pub iteration_path: Option<String>,
    pub area_path: Option<String>,
    pub sprint: Option<String>,
    pub tags: Option<String>,
    pub parent_task_id: Option<String>,
    pub criticality: Option<String>,
    pub target_date: Option<NaiveDate>,
    pub activated_date: Option<NaiveDate>,
    pub project_id: Option<i64>,
    pub sprint_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateWorkItemInput {
    pub title: Option<String>,
    pub work_item_type: Option<String>,
    pub state: Option<String>,
    pub sub_state: Option<String>,
    pub assigned_to: Option<String>,
    pub priority: Option<i64>,
    pub story_points: Option<f64>,
    pub description: Option<String>,
    pub iteration_path: Option<String>,
    pub area_path: Option<String>,
    pub sprint: Option<String>,
    pub tags: Option<String>,
    pub parent_task_id: Option<String>,
    pub criticality: Option<String>,
    pub target_date: Option<NaiveDate>,
    pub activated_date: Option<NaiveDate>,
    pub closed_date: Option<NaiveDate>,
    pub project_id: Option<i64>,
    pub sprint_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkItemFilter {
    pub work_item_type: Option<String>,
    pub state: Option<String>,
    pub assigned_to: Option<String>,
    pub sprint: Option<String>,
    /// Case-insensitive substring match on title or task id.
    pub search: Option<String>,
}

/// Append-only status history entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskUpdate {
    pub id: i64,
    pub task_id: String,
    pub update_date: NaiveDate,
    pub current_status: Option<String>,
    pub current_update: Option<String>,
    pub state: Option<String>,
    pub sub_state: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusUpdateInput {
    pub current_status: Option<String>,
    pub current_update: Option<String>,
    /// Defaults to today.
    pub update_date: Option<NaiveDate>,
    pub state: Option<String>,
    pub sub_state: Option<String>,
}
