//! Session route handlers
//!
//! Connect, disconnect, reconnect and status of the explorer session.

use crate::error::{validation_error, ApiResult};
use crate::models::{ConnectRequest, MessageResponse, SessionResponse, SuccessResponse};
use crate::state::SharedState;
use axum::{extract::State, Json};
use tracing::{debug, info};
use validator::Validate;

/// Connect to a database and cache its table list
pub async fn connect<R: Send + Sync>(
    State(state): State<SharedState<R>>,
    Json(payload): Json<ConnectRequest>,
) -> ApiResult<Json<SuccessResponse<SessionResponse>>> {
    payload.validate().map_err(|e| validation_error(e.to_string()))?;

    debug!("Connecting to '{}' on {}", payload.database, payload.server);

    let mut session = state.session.lock().await;
    let status = session.connect(payload.into()).await?;

    let message = match &status.connection {
        Some(conn) => format!(
            "Connected to database '{}'. Found {} table(s).",
            conn.database, status.table_count
        ),
        None => "Connected".to_string(),
    };

    Ok(Json(SuccessResponse::with_data(
        message,
        SessionResponse { session: status },
    )))
}

/// Release the connection and clear the session
pub async fn disconnect<R: Send + Sync>(
    State(state): State<SharedState<R>>,
) -> ApiResult<Json<MessageResponse>> {
    let mut session = state.session.lock().await;

    let message = if session.disconnect() {
        info!("Session disconnected");
        "Disconnected from database"
    } else {
        "No active connection"
    };

    Ok(Json(MessageResponse::new(message)))
}

/// Re-establish the connection with the last parameters
pub async fn reconnect<R: Send + Sync>(
    State(state): State<SharedState<R>>,
) -> ApiResult<Json<SuccessResponse<SessionResponse>>> {
    let mut session = state.session.lock().await;
    let status = session.reconnect().await?;

    Ok(Json(SuccessResponse::with_data(
        format!("Reconnected. Found {} table(s).", status.table_count),
        SessionResponse { session: status },
    )))
}

/// Current session status
pub async fn status<R: Send + Sync>(
    State(state): State<SharedState<R>>,
) -> ApiResult<Json<SuccessResponse<SessionResponse>>> {
    let session = state.session.lock().await;
    let status = session.status();

    let message = if status.connected {
        "Connected"
    } else {
        "Not connected"
    };

    Ok(Json(SuccessResponse::with_data(
        message,
        SessionResponse { session: status },
    )))
}
