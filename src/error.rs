//! Error handling module
//!
//! Provides unified error types and handling for the entire application.

use crate::diagram::RenderError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Connection not established: {0}")]
    NotConnected(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Diagram rendering failed: {0}")]
    Render(#[from] RenderError),

    #[error("Report generation failed: {0}")]
    Report(#[from] rust_xlsxwriter::XlsxError),

}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl AppError {
    /// Status, machine-readable code, user-facing message and optional details
    fn parts(&self) -> (StatusCode, &'static str, String, Option<String>) {
        match self {
            AppError::Database(e) => {
                error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                    Some(e.to_string()),
                )
            }
            AppError::Pool(e) => {
                error!("Pool error: {:?}", e);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "CONNECTION_UNAVAILABLE",
                    "Database connection unavailable".to_string(),
                    Some(e.to_string()),
                )
            }
            AppError::Connection(msg) => (
                StatusCode::BAD_REQUEST,
                "CONNECTION_FAILED",
                format!("Error connecting to database: {}", msg),
                None,
            ),
            AppError::NotConnected(msg) => (
                StatusCode::BAD_REQUEST,
                "NOT_CONNECTED",
                msg.clone(),
                None,
            ),
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                msg.clone(),
                None,
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                msg.clone(),
                None,
            ),
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                "BAD_REQUEST",
                msg.clone(),
                None,
            ),
            AppError::Render(e) => {
                error!("Diagram rendering error: {}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    "DIAGRAM_RENDER_FAILED",
                    format!("Failed to generate diagram. {}", e),
                    e.service_response().map(str::to_string),
                )
            }
            AppError::Report(e) => {
                error!("Report error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "REPORT_ERROR",
                    "Failed to generate the spreadsheet report".to_string(),
                    Some(e.to_string()),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = self.parts();

        let body = Json(ErrorResponse {
            success: false,
            message,
            error: details,
            code: Some(error_code.to_string()),
        });

        (status, body).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, AppError>;

/// Helper function to create a validation error
pub fn validation_error(msg: impl Into<String>) -> AppError {
    AppError::Validation(msg.into())
}

/// Helper function to create a not found error
pub fn not_found_error(msg: impl Into<String>) -> AppError {
    AppError::NotFound(msg.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_connected_maps_to_bad_request() {
        let response = AppError::NotConnected("No active session".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_render_rejection_keeps_service_body() {
        let err = AppError::Render(RenderError::Rejected {
            status: 400,
            body: "Syntax error in graph".to_string(),
        });
        let (status, code, message, details) = err.parts();

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(code, "DIAGRAM_RENDER_FAILED");
        assert!(message.contains("Syntax error in graph"));
        assert_eq!(details.as_deref(), Some("Syntax error in graph"));
    }

    #[test]
    fn test_not_found_helper() {
        let response = not_found_error("missing").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
