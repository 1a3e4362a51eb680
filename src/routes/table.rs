//! Table listing route handlers
//!
//! These routes work with the cached table list of the active session.

use crate::error::ApiResult;
use crate::models::{SuccessResponse, TableListResponse, TableSearchQuery};
use crate::state::SharedState;
use axum::{
    extract::{Query, State},
    Json,
};
use tracing::debug;

/// List tables, filtered by a case-insensitive substring.
///
/// The search text is remembered; omitting it reapplies the last one and an
/// empty value clears it.
pub async fn list_tables<R: Send + Sync>(
    State(state): State<SharedState<R>>,
    Query(query): Query<TableSearchQuery>,
) -> ApiResult<Json<SuccessResponse<TableListResponse>>> {
    let mut session = state.session.lock().await;
    let tables = session.search_tables(query.search.as_deref())?;
    let search = session.search().to_string();

    debug!("Table search '{}' matched {} table(s)", search, tables.len());

    Ok(Json(SuccessResponse::with_data(
        format!("Found {} table(s)", tables.len()),
        TableListResponse {
            total: tables.len(),
            tables,
            search,
        },
    )))
}
