use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Request-level failures.
///
/// Messages only ever carry client-relative paths; raw I/O detail is logged
/// where the error is produced and never rendered into the response.
#[derive(Error, Debug)]
pub enum FileHostError {
    #[error("Invalid path")]
    InvalidPath,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Failed to create directory: {0}")]
    CreateDirFailed(String),

    #[error("Missing multipart field `file`")]
    MissingUploadField,

    #[error("File too large: {size} bytes exceeds limit of {limit} bytes")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("Storage I/O error")]
    Io(#[from] std::io::Error),
}

impl FileHostError {
    pub fn status(&self) -> StatusCode {
        match self {
            FileHostError::InvalidPath => StatusCode::BAD_REQUEST,
            FileHostError::NotFound(_) => StatusCode::INTERNAL_SERVER_ERROR,
            FileHostError::CreateDirFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            FileHostError::MissingUploadField => StatusCode::BAD_REQUEST,
            FileHostError::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            FileHostError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for FileHostError {
    fn into_response(self) -> Response {
        (self.status(), format!("{}\n", self)).into_response()
    }
}
