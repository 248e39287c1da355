// src/error.rs
use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde_json::json;
use sqlx::Error as SqlxError;

use crate::bom::BomError;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

#[derive(Debug)]
pub enum AppError {
    DatabaseError(sqlx::Error),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    ValidationError(String),
    Conflict(String),
    Internal(String),
}

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::ValidationError(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        AppError::Conflict(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        AppError::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        AppError::Forbidden(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::DatabaseError(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_message = match self {
            AppError::DatabaseError(e) => {
                tracing::error!(error = %e, "Database error");
                "Database error occurred".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                "Internal server error".to_string()
            }
            AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::ValidationError(msg)
            | AppError::Conflict(msg) => msg,
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::DatabaseError(err)
    }
}

impl From<BomError> for AppError {
    fn from(err: BomError) -> Self {
        match err {
            BomError::ProductNotFound(_) => AppError::NotFound(err.to_string()),
            BomError::MalformedEdge { .. } | BomError::InvalidQuantity(_) => {
                AppError::ValidationError(err.to_string())
            }
            BomError::CycleDetected { .. }
            | BomError::DepthExceeded { .. }
            | BomError::Overflow(_)
            | BomError::TotalsOverflow(_) => AppError::Conflict(err.to_string()),
        }
    }
}

fn db_error_code(err: &SqlxError) -> Option<String> {
    err.as_database_error()
        .and_then(|db_err| db_err.code())
        .map(|code| code.into_owned())
}

/// Maps a unique-constraint violation to 409 with `message`, anything else passes through.
pub fn map_unique_violation(err: SqlxError, message: &str) -> AppError {
    match db_error_code(&err).as_deref() {
        Some(UNIQUE_VIOLATION) => AppError::conflict(message),
        _ => err.into(),
    }
}

/// Maps a foreign-key violation to 404 with `message`, anything else passes through.
pub fn map_foreign_key_violation(err: SqlxError, message: &str) -> AppError {
    match db_error_code(&err).as_deref() {
        Some(FOREIGN_KEY_VIOLATION) => AppError::not_found(message),
        _ => err.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn bom_errors_map_to_http_statuses() {
        let not_found: AppError = BomError::ProductNotFound(7).into();
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);

        let cycle: AppError = BomError::CycleDetected { path: vec![1, 2, 1] }.into();
        assert_eq!(cycle.status_code(), StatusCode::CONFLICT);

        let malformed: AppError = BomError::MalformedEdge {
            initial_product_id: 1,
            final_product_id: 2,
            reason: "rate must be greater than zero".into(),
        }
        .into();
        assert_eq!(malformed.status_code(), StatusCode::BAD_REQUEST);

        let quantity: AppError = BomError::InvalidQuantity(dec!(-1)).into();
        assert_eq!(quantity.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn non_database_errors_pass_through_violation_mappers() {
        let err = map_unique_violation(SqlxError::RowNotFound, "duplicate");
        assert!(matches!(err, AppError::DatabaseError(SqlxError::RowNotFound)));

        let err = map_foreign_key_violation(SqlxError::RowNotFound, "missing");
        assert!(matches!(err, AppError::DatabaseError(SqlxError::RowNotFound)));
    }

    #[tokio::test]
    async fn error_body_carries_message() {
        let response = AppError::conflict("Role title already exists").into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Role title already exists");
    }

    #[tokio::test]
    async fn internal_errors_hide_details() {
        let response = AppError::internal("bcrypt exploded").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Internal server error");
    }
}
