use axum::{
    extract::{Multipart, State},
    response::IntoResponse,
    Json,
};
use serde::Serialize;

use super::ApiResult;
use crate::services::ingestion;
use crate::{Database, ServiceError};

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub ingested: usize,
}

/// Accepts a multipart upload with a `file` field (CSV, JSON or Excel).
pub async fn import_file(
    State(db): State<Database>,
    mut multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServiceError::invalid(format!("Malformed upload: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ServiceError::invalid(format!("Malformed upload: {e}")))?;
        let ingested = ingestion::import_bytes(&db, &bytes, &filename)?;
        return Ok(Json(ImportResponse { ingested }));
    }
    Err(ServiceError::invalid("Missing file field").into())
}
