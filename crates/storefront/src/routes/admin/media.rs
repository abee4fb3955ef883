//! Media uploads.
//!
//! Files arrive as base64 data URLs inside JSON, are written to the uploads
//! directory and served back under `/uploads`.

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode, header::HOST},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{ApiJson, AppError, Result};
use crate::middleware::RequireAdmin;
use crate::routes::non_blank;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    pub filename: Option<String>,
    pub data_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
    pub mime: String,
}

/// Store an uploaded image or video and return its public URL.
#[instrument(skip(state, _admin, headers, request))]
pub async fn upload(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    headers: HeaderMap,
    ApiJson(request): ApiJson<UploadRequest>,
) -> Result<(StatusCode, Json<UploadResponse>)> {
    let data_url = non_blank(request.data_url.as_ref())
        .ok_or_else(|| AppError::bad_request("dataUrl is required"))?;
    let filename = request.filename.as_deref().unwrap_or_default();

    let stored = state.media().save(filename, data_url).await?;
    let base = public_base_url(state.config().public_base_url.as_deref(), &headers);

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            url: format!("{base}/uploads/{}", stored.file_name),
            mime: stored.mime,
        }),
    ))
}

/// `PUBLIC_BASE_URL` when configured, else `http://` plus the request's Host.
fn public_base_url(configured: Option<&str>, headers: &HeaderMap) -> String {
    if let Some(base) = configured {
        return base.trim_end_matches('/').to_owned();
    }
    let host = headers
        .get(HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("localhost");
    format!("http://{host}")
}
