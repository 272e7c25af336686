use actix_multipart::MultipartError;
use actix_web::error::BlockingError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("at most {0} files may be uploaded per request")]
    TooManyFiles(usize),
    #[error("no files were uploaded under field '{0}'")]
    NoFiles(&'static str),
    #[error("multipart error: {0}")]
    Multipart(#[from] MultipartError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("blocking task failed: {0}")]
    Blocking(#[from] BlockingError),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ResponseError for UploadError {
    fn status_code(&self) -> StatusCode {
        match self {
            UploadError::TooManyFiles(_) | UploadError::NoFiles(_) | UploadError::Multipart(_) => {
                StatusCode::BAD_REQUEST
            }
            UploadError::Io(_) | UploadError::Blocking(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("upload failed: {}", self);
        } else {
            tracing::debug!("upload rejected: {}", self);
        }
        HttpResponse::build(status).json(ErrorBody {
            error: self.to_string(),
        })
    }
}
