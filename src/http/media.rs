use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::{GalleryError, Result};
use crate::http::error::{ApiResult, ResultExt};
use crate::http::params::{json_body, required_id, required_text, FlexibleId, JsonPayload};
use crate::http::AppState;
use crate::media::blob::BlobFolder;
use crate::media::qr;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrRequest {
    artwork_id: Option<FlexibleId>,
    base_url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QrResponse {
    qr_code_url: String,
    redirect_url: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    url: String,
}

pub(crate) async fn qrcode_handler(payload: JsonPayload<QrRequest>) -> ApiResult<Json<QrResponse>> {
    let action = "generate QR code";
    let body = json_body(payload).during(action)?;
    let artwork_id = required_id(body.artwork_id.as_ref(), "artworkId").during(action)?;
    let base_url = required_text(body.base_url, "baseUrl").during(action)?;

    let redirect_url = qr::artwork_url(&base_url, artwork_id);
    let target = redirect_url.clone();
    let qr_code_url = tokio::task::spawn_blocking(move || qr::qr_data_url(&target))
        .await
        .map_err(GalleryError::from)
        .and_then(|rendered| rendered)
        .during(action)?;
    Ok(Json(QrResponse {
        qr_code_url,
        redirect_url,
    }))
}

pub(crate) async fn upload_handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    upload(state, BlobFolder::Uploads, multipart, "upload file").await
}

pub(crate) async fn upload_student_handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    upload(state, BlobFolder::Students, multipart, "upload student photo").await
}

async fn upload(
    state: AppState,
    folder: BlobFolder,
    multipart: Multipart,
    action: &'static str,
) -> ApiResult<Json<UploadResponse>> {
    let (file_name, bytes) = file_field(multipart).await.during(action)?;
    let blob = state
        .blobs
        .put(folder, &file_name, &bytes)
        .await
        .during(action)?;
    Ok(Json(UploadResponse {
        url: blob.url(&state.config.public_base_url),
    }))
}

/// Pulls the `file` part out of the form; other parts are skipped.
async fn file_field(mut multipart: Multipart) -> Result<(String, Vec<u8>)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| GalleryError::validation(format!("invalid multipart body: {}", e.body_text())))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("file").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| GalleryError::validation(format!("invalid multipart body: {}", e.body_text())))?;
        if bytes.is_empty() {
            return Err(GalleryError::validation("no file uploaded"));
        }
        return Ok((file_name, bytes.to_vec()));
    }
    Err(GalleryError::validation("no file uploaded"))
}

pub(crate) async fn blob_handler(
    State(state): State<AppState>,
    Path((folder, name)): Path<(String, String)>,
) -> ApiResult<Response> {
    let Some(folder) = BlobFolder::parse(&folder) else {
        return Ok(StatusCode::NOT_FOUND.into_response());
    };
    let found = state.blobs.get(folder, &name).await.during("read blob")?;
    Ok(match found {
        Some((bytes, content_type)) => ([(header::CONTENT_TYPE, content_type)], bytes).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    })
}

pub(crate) async fn healthz_handler() -> &'static str {
    "ok"
}
