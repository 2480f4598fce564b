use std::time::Duration;

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    BadRequest(String),
    #[error("Only JSON files are allowed")]
    UnsupportedFileType,
    #[error("Invalid JSON file")]
    InvalidDataset(String),
    #[error("{0}")]
    PayloadTooLarge(String),
    #[error("generation failed: {0}")]
    Collaborator(String),
    #[error("generation timed out after {0:?}")]
    Timeout(Duration),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("internal error: {0}")]
    Internal(String),
}

/// Coarse classification used for status mapping and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ClientInput,
    Collaborator,
    Internal,
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::BadRequest(_)
            | ServiceError::UnsupportedFileType
            | ServiceError::InvalidDataset(_)
            | ServiceError::PayloadTooLarge(_) => ErrorKind::ClientInput,
            ServiceError::Collaborator(_) | ServiceError::Timeout(_) => ErrorKind::Collaborator,
            ServiceError::Io(_) | ServiceError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            other => match other.kind() {
                ErrorKind::ClientInput => StatusCode::BAD_REQUEST,
                ErrorKind::Collaborator | ErrorKind::Internal => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }
}

impl From<JsonRejection> for ServiceError {
    fn from(rejection: JsonRejection) -> Self {
        ServiceError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartRejection> for ServiceError {
    fn from(rejection: MultipartRejection) -> Self {
        ServiceError::BadRequest(rejection.body_text())
    }
}

impl ServiceError {
    /// Maps a multipart read failure, naming `limit` when the body cap was hit.
    pub fn from_multipart(err: MultipartError, limit: usize) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ServiceError::PayloadTooLarge(format!("upload exceeds the {limit} byte limit"))
        } else {
            ServiceError::BadRequest(err.body_text())
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        if self.kind() != ErrorKind::ClientInput {
            tracing::warn!(%status, error = %self, "request failed");
        }

        let body = serde_json::json!({
            "detail": self.to_string(),
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_input_errors_map_to_bad_request() {
        assert_eq!(
            ServiceError::UnsupportedFileType.status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::InvalidDataset("eof".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::PayloadTooLarge("too big".into()).status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[test]
    fn collaborator_message_is_relayed() {
        let err = ServiceError::Collaborator("quota exceeded".into());
        assert_eq!(err.kind(), ErrorKind::Collaborator);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().contains("quota exceeded"));
    }

    #[test]
    fn file_rejections_have_distinct_details() {
        assert_ne!(
            ServiceError::UnsupportedFileType.to_string(),
            ServiceError::InvalidDataset("x".into()).to_string()
        );
    }
}
