use axum::{
    extract::rejection::JsonRejection,
    response::{IntoResponse, Response},
    Json,
};
use http::StatusCode;
use tracing::{debug, error, warn};

use crate::rest_api::Message;

pub type ApiResult<T, E = ApiError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Item not found")]
    NotFound,
    #[error("{0}")]
    Validation(String),
    #[error("Invalid data : {0}")]
    InvalidData(String),
    #[error("Unauthenticated")]
    Unauthenticated,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sneakers_dal::Error> for ApiError {
    fn from(e: sneakers_dal::Error) -> Self {
        use sneakers_dal::Error;
        match e {
            Error::RecordNotFound(_) => ApiError::NotFound,
            Error::DuplicateName(_) => {
                ApiError::Validation("The name has already been taken.".to_string())
            }
            Error::DuplicateEmail(_) => {
                ApiError::Validation("The email has already been taken.".to_string())
            }
            Error::InvalidCredentials => ApiError::InvalidCredentials,
            other => ApiError::InvalidData(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        ApiError::Validation(e.body_text())
    }
}

/// Only first failure is reported back
impl From<garde::Report> for ApiError {
    fn from(report: garde::Report) -> Self {
        let msg = report
            .iter()
            .next()
            .map(|(path, error)| {
                let path = path.to_string();
                if path.is_empty() {
                    error.to_string()
                } else {
                    format!("{path}: {error}")
                }
            })
            .unwrap_or_else(|| "Invalid input".to_string());
        ApiError::Validation(msg)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Validation(_) | ApiError::InvalidData(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated | ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        match status {
            StatusCode::INTERNAL_SERVER_ERROR => error!("Request failed: {self}"),
            StatusCode::BAD_REQUEST => warn!("Request rejected: {self}"),
            _ => debug!("Request rejected: {self}"),
        }
        (status, Json(Message::new(self.to_string()))).into_response()
    }
}
