use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use super::ApiResult;
use crate::models::{CreateOrganizationInput, UpdateOrganizationInput};
use crate::services::organizations;
use crate::Database;

pub async fn list_organizations(State(db): State<Database>) -> ApiResult<impl IntoResponse> {
    Ok(Json(organizations::list_organizations(&db)?))
}

pub async fn get_organization(
    State(db): State<Database>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(organizations::get_organization(&db, id)?))
}

pub async fn create_organization(
    State(db): State<Database>,
    Json(input): Json<CreateOrganizationInput>,
) -> ApiResult<impl IntoResponse> {
    let org = organizations::create_organization(&db, input)?;
    Ok((StatusCode::CREATED, Json(org)))
}

pub async fn update_organization(
    State(db): State<Database>,
    Path(id): Path<i64>,
    Json(input): Json<UpdateOrganizationInput>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(organizations::update_organization(&db, id, input)?))
}

pub async fn delete_organization(
    State(db): State<Database>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    organizations::delete_organization(&db, id)?;
    Ok(StatusCode::NO_CONTENT)
}
