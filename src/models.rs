//! Data models and DTOs (Data Transfer Objects)
//!
//! Contains the request/response structures used by the API.

use crate::analysis::Analysis;
use crate::connection::ConnectionParams;
use crate::session::SessionStatus;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Generic success response
#[derive(Serialize)]
pub struct SuccessResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(flatten)]
    pub data: Option<T>,
}

impl<T: Serialize> SuccessResponse<T> {
    pub fn with_data(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }
}

/// Message-only response (no data)
#[derive(Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// Request to open a session connection.
///
/// Leave `username` empty to use trusted authentication.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ConnectRequest {
    #[validate(length(min = 1, message = "Server is required"))]
    pub server: String,

    #[validate(length(min = 1, max = 63, message = "Database name must be between 1 and 63 characters"))]
    pub database: String,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    #[serde(default)]
    pub require_tls: bool,
}

impl From<ConnectRequest> for ConnectionParams {
    fn from(req: ConnectRequest) -> Self {
        ConnectionParams {
            server: req.server.trim().to_string(),
            database: req.database.trim().to_string(),
            username: req.username.filter(|u| !u.trim().is_empty()),
            password: req.password,
            require_tls: req.require_tls,
        }
    }
}

/// Session status wrapper
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub session: SessionStatus,
}

/// Query parameters for listing tables
#[derive(Debug, Deserialize)]
pub struct TableSearchQuery {
    pub search: Option<String>,
}

/// Table list response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableListResponse {
    pub tables: Vec<String>,
    pub total: usize,
    pub search: String,
}

/// Request to analyze a table
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[validate(length(min = 1, message = "Table name is required"))]
    pub table_name: String,
}

/// Analysis wrapper
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    pub analysis: Analysis,
}
