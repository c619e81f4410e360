use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};

use super::ApiResult;
use crate::models::{CreateWorkItemInput, StatusUpdateInput, UpdateWorkItemInput, WorkItemFilter};
use crate::services::{export, work_items};
use crate::Database;

pub async fn list_tasks(State(db): State<Database>) -> ApiResult<impl IntoResponse> {
    Ok(Json(work_items::list_tasks(&db)?))
}

pub async fn update_status(
    State(db): State<Database>,
    Path(task_id): Path<String>,
    Json(input): Json<StatusUpdateInput>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(work_items::update_status(&db, &task_id, input)?))
}

pub async fn list_updates(
    State(db): State<Database>,
    Path(task_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(work_items::get_history(&db, &task_id)?))
}

pub async fn list_work_items(
    State(db): State<Database>,
    Query(filter): Query<WorkItemFilter>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(work_items::list_work_items(&db, &filter)?))
}

pub async fn get_work_item(
    State(db): State<Database>,
    Path(task_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(work_items::get_work_item(&db, &task_id)?))
}

pub async fn create_work_item(
    State(db): State<Database>,
    Json(input): Json<CreateWorkItemInput>,
) -> ApiResult<impl IntoResponse> {
    let item = work_items::create_work_item(&db, input)?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn update_work_item(
    State(db): State<Database>,
    Path(task_id): Path<String>,
    Json(input): Json<UpdateWorkItemInput>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(work_items::update_work_item(&db, &task_id, input)?))
}

pub async fn delete_work_item(
    State(db): State<Database>,
    Path(task_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    work_items::delete_work_item(&db, &task_id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_children(
    State(db): State<Database>,
    Path(task_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(work_items::get_children(&db, &task_id)?))
}

pub async fn export_excel(State(db): State<Database>) -> ApiResult<impl IntoResponse> {
    let bytes = export::export_tasks(&db)?;
    let disposition = format!("attachment; filename={}", export::EXPORT_FILENAME);
    Ok((
        [
            (header::CONTENT_TYPE, export::XLSX_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}
