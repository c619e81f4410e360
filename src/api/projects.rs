use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use super::{config::OrgQuery, ApiResult, Caller};
use crate::models::{
    CreateProjectInput, CreateTeamMemberInput, UpdateProjectInput, UpdateTeamMemberInput,
};
use crate::services::projects;
use crate::Database;

pub async fn list_projects(
    State(db): State<Database>,
    Query(query): Query<OrgQuery>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(projects::list_projects(&db, query.org_id)?))
}

pub async fn get_project(
    State(db): State<Database>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(projects::get_project(&db, id)?))
}

pub async fn create_project(
    State(db): State<Database>,
    Json(input): Json<CreateProjectInput>,
) -> ApiResult<impl IntoResponse> {
    let project = projects::create_project(&db, input)?;
    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn update_project(
    State(db): State<Database>,
    caller: Caller,
    Path(id): Path<i64>,
    Json(input): Json<UpdateProjectInput>,
) -> ApiResult<impl IntoResponse> {
    caller.require(&db, id, "update")?;
    Ok(Json(projects::update_project(&db, id, input)?))
}

pub async fn delete_project(
    State(db): State<Database>,
    caller: Caller,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    caller.require(&db, id, "delete")?;
    projects::delete_project(&db, id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_team_members(
    State(db): State<Database>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(projects::list_team_members(&db, id)?))
}

pub async fn add_team_member(
    State(db): State<Database>,
    caller: Caller,
    Path(id): Path<i64>,
    Json(input): Json<CreateTeamMemberInput>,
) -> ApiResult<impl IntoResponse> {
    caller.require_section(&db, id, "team", "add")?;
    let member = projects::add_team_member(&db, id, input)?;
    Ok((StatusCode::CREATED, Json(member)))
}

pub async fn update_team_member(
    State(db): State<Database>,
    caller: Caller,
    Path((id, member_id)): Path<(i64, i64)>,
    Json(input): Json<UpdateTeamMemberInput>,
) -> ApiResult<impl IntoResponse> {
    caller.require_section(&db, id, "team", "update")?;
    Ok(Json(projects::update_team_member(&db, id, member_id, input)?))
}

pub async fn remove_team_member(
    State(db): State<Database>,
    caller: Caller,
    Path((id, member_id)): Path<(i64, i64)>,
) -> ApiResult<impl IntoResponse> {
    caller.require_section(&db, id, "team", "delete")?;
    projects::remove_team_member(&db, id, member_id)?;
    Ok(StatusCode::NO_CONTENT)
}
