use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use super::{ApiResult, Caller};
use crate::models::{CreateSprintInput, UpdateSprintInput};
use crate::services::sprints;
use crate::Database;

const SECTION: &str = "sprints";

pub async fn list_sprints(
    State(db): State<Database>,
    Path(project_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(sprints::list_sprints(&db, project_id)?))
}

pub async fn get_sprint(
    State(db): State<Database>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(sprints::require_sprint(&db, id)?))
}

pub async fn create_sprint(
    State(db): State<Database>,
    caller: Caller,
    Path(project_id): Path<i64>,
    Json(input): Json<CreateSprintInput>,
) -> ApiResult<impl IntoResponse> {
    caller.require_section(&db, project_id, SECTION, "create")?;
    let sprint = sprints::create_sprint(&db, project_id, input)?;
    Ok((StatusCode::CREATED, Json(sprint)))
}

pub async fn update_sprint(
    State(db): State<Database>,
    caller: Caller,
    Path(id): Path<i64>,
    Json(input): Json<UpdateSprintInput>,
) -> ApiResult<impl IntoResponse> {
    caller.require_for_sprint(&db, id, SECTION, "update")?;
    Ok(Json(sprints::update_sprint(&db, id, input)?))
}

pub async fn activate_sprint(
    State(db): State<Database>,
    caller: Caller,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    caller.require_for_sprint(&db, id, SECTION, "update")?;
    Ok(Json(sprints::activate_sprint(&db, id)?))
}

pub async fn complete_sprint(
    State(db): State<Database>,
    caller: Caller,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    caller.require_for_sprint(&db, id, SECTION, "update")?;
    Ok(Json(sprints::complete_sprint(&db, id)?))
}

pub async fn delete_sprint(
    State(db): State<Database>,
    caller: Caller,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    caller.require_for_sprint(&db, id, SECTION, "delete")?;
    sprints::delete_sprint(&db, id)?;
    Ok(StatusCode::NO_CONTENT)
}
