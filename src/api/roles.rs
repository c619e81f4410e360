use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;

use super::ApiResult;
use crate::models::{AssignRoleInput, UpdateRoleInput};
use crate::services::{access, users};
use crate::Database;

#[derive(Debug, Serialize)]
pub struct PermissionsResponse {
    pub project_id: i64,
    pub user_id: i64,
    pub permissions: access::PermissionMap,
}

pub async fn list_roles(
    State(db): State<Database>,
    Path(project_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(users::list_project_roles(&db, project_id)?))
}

pub async fn get_user_role(
    State(db): State<Database>,
    Path((project_id, user_id)): Path<(i64, i64)>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(users::get_user_role(&db, project_id, user_id)?))
}

pub async fn assign_role(
    State(db): State<Database>,
    Path(project_id): Path<i64>,
    Json(input): Json<AssignRoleInput>,
) -> ApiResult<impl IntoResponse> {
    let role = users::assign_role(&db, project_id, input)?;
    Ok((StatusCode::CREATED, Json(role)))
}

pub async fn update_role(
    State(db): State<Database>,
    Path(id): Path<i64>,
    Json(input): Json<UpdateRoleInput>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(users::update_role(&db, id, input)?))
}

pub async fn delete_role(
    State(db): State<Database>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    users::delete_role(&db, id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_permissions(
    State(db): State<Database>,
    Path((project_id, user_id)): Path<(i64, i64)>,
) -> ApiResult<impl IntoResponse> {
    let permissions = access::effective_permissions(&db, project_id, user_id)?;
    Ok(Json(PermissionsResponse {
        project_id,
        user_id,
        permissions,
    }))
}
