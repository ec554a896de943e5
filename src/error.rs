use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::{
    codec::CodecError,
    response::{ApiResponse, Meta, STATUS_ERROR},
};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("Invalid payload: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("ORM error")]
    OrmError(#[from] sea_orm::DbErr),

    #[error("Stored content is corrupt")]
    Codec(#[from] CodecError),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn not_found(resource: &str, id: impl std::fmt::Display) -> Self {
        AppError::NotFound(format!("The {resource} with id = {id} was not found"))
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        AppError::InvalidRequest(message.into())
    }

    /// A unique-index rejection becomes `InvalidRequest(message)`; any other
    /// database failure stays an `OrmError`.
    pub fn unique_violation(err: sea_orm::DbErr, message: impl Into<String>) -> Self {
        match err.sql_err() {
            Some(sea_orm::SqlErr::UniqueConstraintViolation(_)) => AppError::invalid(message),
            _ => AppError::OrmError(err),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidRequest(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::OrmError(_) | AppError::Codec(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            match &self {
                AppError::OrmError(err) => tracing::error!(error = %err, "database failure"),
                AppError::Codec(err) => tracing::error!(error = %err, "codec failure"),
                AppError::Internal(err) => tracing::error!(error = ?err, "internal failure"),
                _ => {}
            }
        }

        let body = ApiResponse {
            status: STATUS_ERROR.to_string(),
            message: self.to_string(),
            data: Some(ErrorData {
                error: self.to_string(),
            }),
            meta: Some(Meta::empty()),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_taxonomy_to_http_status() {
        assert_eq!(AppError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::not_found("order", 7).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::invalid("nope").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::OrmError(sea_orm::DbErr::Custom("boom".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn other_database_failures_stay_internal() {
        let err = AppError::unique_violation(sea_orm::DbErr::Custom("boom".into()), "duplicate");
        assert!(matches!(err, AppError::OrmError(_)));
    }

    #[test]
    fn not_found_message_names_the_resource() {
        let err = AppError::not_found("cart item", "abc");
        assert_eq!(err.to_string(), "The cart item with id = abc was not found");
    }
}
