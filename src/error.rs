use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::validation::{FieldError, ValidationError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
    #[error("validation failed")]
    Validation(Vec<FieldError>),
    #[error("No update data provided")]
    EmptyUpdate,
    #[error("{0}")]
    BadRequest(String),
    #[error("Trip not found")]
    NotFound,
    #[error("unauthorized")]
    Unauthorized,
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::Fields(fields) => AppError::Validation(fields),
            ValidationError::EmptyUpdate => AppError::EmptyUpdate,
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Config(_)
            | AppError::Io(_)
            | AppError::Database(_)
            | AppError::Migrate(_)
            | AppError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) | AppError::EmptyUpdate | AppError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            AppError::Validation(fields) => ErrorBody {
                error: "Validation failed".into(),
                details: Some(fields),
            },
            err if status.is_server_error() => {
                // Driver details stay in the log.
                error!("request failed: {err:?}");
                ErrorBody {
                    error: "Internal server error".into(),
                    details: None,
                }
            }
            err => ErrorBody {
                error: err.to_string(),
                details: None,
            },
        };

        (status, Json(body)).into_response()
    }
}
