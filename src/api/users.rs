use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use super::ApiResult;
use crate::models::{CreateUserInput, UpdateUserInput};
use crate::services::users;
use crate::Database;

pub async fn list_users(State(db): State<Database>) -> ApiResult<impl IntoResponse> {
    Ok(Json(users::list_users(&db)?))
}

pub async fn get_user(
    State(db): State<Database>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(users::require_user(&db, id)?))
}

pub async fn create_user(
    State(db): State<Database>,
    Json(input): Json<CreateUserInput>,
) -> ApiResult<impl IntoResponse> {
    let user = users::create_user(&db, input)?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn update_user(
    State(db): State<Database>,
    Path(id): Path<i64>,
    Json(input): Json<UpdateUserInput>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(users::update_user(&db, id, input)?))
}

pub async fn delete_user(
    State(db): State<Database>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    users::delete_user(&db, id)?;
    Ok(StatusCode::NO_CONTENT)
}
