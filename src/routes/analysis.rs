//! Analysis route handlers

use crate::error::{validation_error, ApiResult};
use crate::models::{AnalysisResponse, AnalyzeRequest, SuccessResponse};
use crate::state::SharedState;
use axum::{extract::State, Json};
use validator::Validate;

/// Analyze a table: dependencies, similar tables and ER diagram
pub async fn analyze_table<R: Send + Sync>(
    State(state): State<SharedState<R>>,
    Json(payload): Json<AnalyzeRequest>,
) -> ApiResult<Json<SuccessResponse<AnalysisResponse>>> {
    payload.validate().map_err(|e| validation_error(e.to_string()))?;

    let mut session = state.session.lock().await;
    let analysis = session.analyze(&payload.table_name).await?.clone();

    let message = if analysis.dependencies.is_empty() {
        format!("No dependencies found for table '{}'", analysis.table)
    } else {
        format!("Analyzed table '{}'", analysis.table)
    };

    Ok(Json(SuccessResponse::with_data(
        message,
        AnalysisResponse { analysis },
    )))
}

/// The last analysis of this session
pub async fn last_analysis<R: Send + Sync>(
    State(state): State<SharedState<R>>,
) -> ApiResult<Json<SuccessResponse<AnalysisResponse>>> {
    let session = state.session.lock().await;
    let analysis = session.last_analysis()?.clone();

    Ok(Json(SuccessResponse::with_data(
        format!("Last analysis of table '{}'", analysis.table),
        AnalysisResponse { analysis },
    )))
}
