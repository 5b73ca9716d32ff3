use thiserror::Error;

pub type Result<T, E = GalleryError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum GalleryError {
    /// Missing or malformed input. Always a client error.
    #[error("{0}")]
    Validation(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("student with NIS {0} already exists")]
    DuplicateNis(String),

    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("runtime error: {0}")]
    Runtime(String),

    #[error("media error: {0}")]
    Media(String),
}

impl GalleryError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    /// Client-caused failures are not worth an error-level log line.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::NotFound { .. } | Self::DuplicateNis(_)
        )
    }
}

impl From<tokio::task::JoinError> for GalleryError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Runtime(format!("blocking store task failed: {e}"))
    }
}

impl From<tokio::sync::AcquireError> for GalleryError {
    fn from(_: tokio::sync::AcquireError) -> Self {
        Self::Runtime("connection pool closed".to_string())
    }
}

impl From<image::ImageError> for GalleryError {
    fn from(e: image::ImageError) -> Self {
        Self::Media(e.to_string())
    }
}

impl From<std::io::Error> for GalleryError {
    fn from(e: std::io::Error) -> Self {
        Self::Media(e.to_string())
    }
}
