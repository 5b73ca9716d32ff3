use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{error, warn};

use crate::error::GalleryError;

pub type ApiResult<T> = Result<T, ApiError>;

/// A failed request: the underlying error plus what the caller was trying to
/// do, which becomes the generic message for server-side failures.
#[derive(Debug)]
pub struct ApiError {
    err: GalleryError,
    action: &'static str,
}

impl ApiError {
    pub fn new(err: GalleryError, action: &'static str) -> Self {
        Self { err, action }
    }

    pub fn status(&self) -> StatusCode {
        match &self.err {
            GalleryError::Validation(_) | GalleryError::DuplicateNis(_) => StatusCode::BAD_REQUEST,
            GalleryError::NotFound { .. } => StatusCode::NOT_FOUND,
            GalleryError::Store(_) | GalleryError::Runtime(_) | GalleryError::Media(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

pub trait ResultExt<T> {
    fn during(self, action: &'static str) -> Result<T, ApiError>;
}

impl<T, E: Into<GalleryError>> ResultExt<T> for Result<T, E> {
    fn during(self, action: &'static str) -> Result<T, ApiError> {
        self.map_err(|e| ApiError::new(e.into(), action))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if self.err.is_client_error() {
            warn!(action = self.action, status = status.as_u16(), "{}", self.err);
            capitalize(&self.err.to_string())
        } else {
            // Internal detail stays in the log.
            error!(action = self.action, "{}", self.err);
            format!("Failed to {}", self.action)
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
