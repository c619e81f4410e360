use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use super::{ApiResult, Caller};
use crate::models::RetrospectiveInput;
use crate::services::retrospectives;
use crate::Database;

const SECTION: &str = "retrospectives";

pub async fn get_retrospective(
    State(db): State<Database>,
    Path(sprint_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(retrospectives::get_retrospective(&db, sprint_id)?))
}

pub async fn create_retrospective(
    State(db): State<Database>,
    caller: Caller,
    Path(sprint_id): Path<i64>,
    Json(input): Json<RetrospectiveInput>,
) -> ApiResult<impl IntoResponse> {
    caller.require_for_sprint(&db, sprint_id, SECTION, "create")?;
    let retro = retrospectives::create_retrospective(&db, sprint_id, input)?;
    Ok((StatusCode::CREATED, Json(retro)))
}

pub async fn update_retrospective(
    State(db): State<Database>,
    caller: Caller,
    Path(sprint_id): Path<i64>,
    Json(input): Json<RetrospectiveInput>,
) -> ApiResult<impl IntoResponse> {
    caller.require_for_sprint(&db, sprint_id, SECTION, "update")?;
    Ok(Json(retrospectives::update_retrospective(&db, sprint_id, input)?))
}

pub async fn delete_retrospective(
    State(db): State<Database>,
    caller: Caller,
    Path(sprint_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    caller.require_for_sprint(&db, sprint_id, SECTION, "delete")?;
    retrospectives::delete_retrospective(&db, sprint_id)?;
    Ok(StatusCode::NO_CONTENT)
}
