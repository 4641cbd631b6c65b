//! # API Error Module
//!
//! Application-wide error type for HTTP handlers: each variant maps to a
//! status code and a JSON body of the shape
//! `{"error": {"code", "message"[, "details"]}}`. Storage failures are
//! logged with their full chain and surface to the client as a generic 500.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("validation failed")]
    Validation { details: Vec<String> },
    #[error("{resource} not found")]
    NotFound { resource: &'static str },
    #[error("{message}")]
    Conflict { message: String },
    #[error("{message}")]
    Unauthorized { message: &'static str },
    #[error("{message}")]
    Forbidden { message: String },
    #[error("internal server error")]
    Internal,
}

impl ApiError {
    pub fn validation(details: Vec<String>) -> Self {
        Self::Validation { details }
    }

    pub fn not_found(resource: &'static str) -> Self {
        Self::NotFound { resource }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn unauthorized(message: &'static str) -> Self {
        Self::Unauthorized { message }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match self {
            ApiError::Validation { details } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "VALIDATION_ERROR",
                "Validation failed".to_string(),
                Some(details),
            ),
            ApiError::NotFound { resource } => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("{resource} not found"),
                None,
            ),
            ApiError::Conflict { message } => {
                (StatusCode::CONFLICT, "CONFLICT", message, None)
            }
            ApiError::Unauthorized { message } => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                message.to_string(),
                None,
            ),
            ApiError::Forbidden { message } => {
                (StatusCode::FORBIDDEN, "FORBIDDEN", message, None)
            }
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_SERVER_ERROR",
                "internal server error".to_string(),
                None,
            ),
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code,
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        tracing::error!("request failed: {err:#}");
        ApiError::Internal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variants_map_to_expected_status_codes() {
        let cases = [
            (
                ApiError::validation(vec!["department_name is required".into()]),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (ApiError::not_found("Department"), StatusCode::NOT_FOUND),
            (
                ApiError::conflict("Department name already exists"),
                StatusCode::CONFLICT,
            ),
            (
                ApiError::unauthorized("Invalid username or password"),
                StatusCode::UNAUTHORIZED,
            ),
            (
                ApiError::forbidden("Insufficient permissions"),
                StatusCode::FORBIDDEN,
            ),
            (ApiError::Internal, StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
