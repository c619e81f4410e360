use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use super::ApiResult;
use crate::models::{AddUserToTeamInput, CreateTeamInput, UpdateTeamInput};
use crate::services::teams;
use crate::Database;

pub async fn list_teams(State(db): State<Database>) -> ApiResult<impl IntoResponse> {
    Ok(Json(teams::list_teams(&db)?))
}

pub async fn get_team(
    State(db): State<Database>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(teams::get_team(&db, id)?))
}

pub async fn create_team(
    State(db): State<Database>,
    Json(input): Json<CreateTeamInput>,
) -> ApiResult<impl IntoResponse> {
    let team = teams::create_team(&db, input)?;
    Ok((StatusCode::CREATED, Json(team)))
}

pub async fn update_team(
    State(db): State<Database>,
    Path(id): Path<i64>,
    Json(input): Json<UpdateTeamInput>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(teams::update_team(&db, id, input)?))
}

pub async fn delete_team(
    State(db): State<Database>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    teams::delete_team(&db, id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_members(
    State(db): State<Database>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(teams::list_team_users(&db, id)?))
}

pub async fn add_member(
    State(db): State<Database>,
    Path(id): Path<i64>,
    Json(input): Json<AddUserToTeamInput>,
) -> ApiResult<impl IntoResponse> {
    let member = teams::add_user_to_team(&db, id, input)?;
    Ok((StatusCode::CREATED, Json(member)))
}

pub async fn remove_member(
    State(db): State<Database>,
    Path((id, user_id)): Path<(i64, i64)>,
) -> ApiResult<impl IntoResponse> {
    teams::remove_user_from_team(&db, id, user_id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_project_teams(
    State(db): State<Database>,
    Path(project_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(teams::list_project_teams(&db, project_id)?))
}

pub async fn assign_team(
    State(db): State<Database>,
    Path((project_id, team_id)): Path<(i64, i64)>,
) -> ApiResult<impl IntoResponse> {
    let link = teams::assign_team_to_project(&db, project_id, team_id)?;
    Ok((StatusCode::CREATED, Json(link)))
}

pub async fn unassign_team(
    State(db): State<Database>,
    Path((project_id, team_id)): Path<(i64, i64)>,
) -> ApiResult<impl IntoResponse> {
    teams::unassign_team_from_project(&db, project_id, team_id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn check_access(
    State(db): State<Database>,
    Path((project_id, user_id)): Path<(i64, i64)>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(teams::check_project_access(&db, project_id, user_id)?))
}
