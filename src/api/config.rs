use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use super::ApiResult;
use crate::models::UpsertConfigInput;
use crate::services::config;
use crate::Database;

#[derive(Debug, Default, Deserialize)]
pub struct OrgQuery {
    pub org_id: Option<i64>,
}

pub async fn get_config(
    State(db): State<Database>,
    Query(query): Query<OrgQuery>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(config::resolve_config(&db, query.org_id)?))
}

pub async fn get_defaults() -> impl IntoResponse {
    Json(config::defaults())
}

pub async fn upsert_config(
    State(db): State<Database>,
    Json(input): Json<UpsertConfigInput>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(config::upsert_config(&db, input)?))
}

pub async fn reset_config(
    State(db): State<Database>,
    Path(config_key): Path<String>,
    Query(query): Query<OrgQuery>,
) -> ApiResult<impl IntoResponse> {
    config::reset_config(&db, &config_key, query.org_id)?;
    Ok(StatusCode::NO_CONTENT)
}
