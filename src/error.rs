use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::authz::DenyReason;

/// AppError
///
/// The error taxonomy shared by every core operation. No variant is ever produced
/// after a partial mutation: the core fails closed.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AppError {
    /// Malformed or unsatisfiable request (unknown students, overlapping add/remove, bad instructor).
    #[error("validation failed: {message}")]
    Validation { message: String, invalid: Vec<Uuid> },

    /// The authorization engine denied the operation.
    #[error("forbidden: {0}")]
    Forbidden(DenyReason),

    /// The course or identity does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// Persistence or storage collaborator failure. Never retried here.
    #[error("dependency failure: {0}")]
    Dependency(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>, invalid: Vec<Uuid>) -> Self {
        AppError::Validation {
            message: message.into(),
            invalid,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation { .. } => "validation_error",
            AppError::Forbidden(reason) => reason.code(),
            AppError::NotFound(_) => "not_found",
            AppError::Dependency(_) => "dependency_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Dependency(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Dependency(err.to_string())
    }
}

/// ErrorResponse
///
/// JSON body returned for every failed request.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub invalid: Vec<Uuid>,
}

impl From<&AppError> for ErrorResponse {
    fn from(err: &AppError) -> Self {
        let invalid = match err {
            AppError::Validation { invalid, .. } => invalid.clone(),
            _ => Vec::new(),
        };
        // Internal details stay in the logs.
        let message = match err {
            AppError::Dependency(_) => "internal error".to_string(),
            other => other.to_string(),
        };
        ErrorResponse {
            error: err.code().to_string(),
            message,
            invalid,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Dependency(detail) = &self {
            tracing::error!("dependency failure: {}", detail);
        }
        (self.status(), Json(ErrorResponse::from(&self))).into_response()
    }
}
