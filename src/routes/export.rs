//! Download route handlers
//!
//! Mermaid source, rendered PNG and spreadsheet report of the last analysis.

use crate::diagram::DiagramRenderer;
use crate::error::{not_found_error, ApiResult};
use crate::report::write_xlsx;
use crate::state::SharedState;
use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use tracing::info;

const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Build a file download response
fn download(content_type: &'static str, file_name: &str, body: impl Into<axum::body::Body>) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", header_safe(file_name));
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body.into(),
    )
        .into_response()
}

/// Replace characters that cannot appear in a quoted header file name
fn header_safe(file_name: &str) -> String {
    file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Diagram text of the last analysis and the table it belongs to
async fn last_diagram<R>(state: &SharedState<R>) -> ApiResult<(String, String)> {
    let session = state.session.lock().await;
    let analysis = session.last_analysis()?;

    let diagram = analysis.diagram.clone().ok_or_else(|| {
        not_found_error(format!(
            "No foreign key relationships found for table '{}'",
            analysis.table
        ))
    })?;

    Ok((analysis.table.clone(), diagram))
}

/// Download the Mermaid source as `ERD_<table>.mmd`
pub async fn diagram_source<R: Send + Sync>(
    State(state): State<SharedState<R>>,
) -> ApiResult<Response> {
    let (table, diagram) = last_diagram(&state).await?;

    Ok(download(
        "text/plain; charset=utf-8",
        &format!("ERD_{}.mmd", table),
        diagram,
    ))
}

/// Render the diagram and download it as `er_diagram.png`
pub async fn diagram_png<R: DiagramRenderer + Send + Sync>(
    State(state): State<SharedState<R>>,
) -> ApiResult<Response> {
    let (table, diagram) = last_diagram(&state).await?;

    let png = state.renderer.render(&diagram).await?;
    info!("Rendered ER diagram for '{}' ({} bytes)", table, png.len());

    Ok(download("image/png", "er_diagram.png", png))
}

/// Build and download the spreadsheet report as `DB_Metadata_<table>.xlsx`
pub async fn report<R: Send + Sync>(
    State(state): State<SharedState<R>>,
) -> ApiResult<Response> {
    let session = state.session.lock().await;
    let report = session.report().await?;
    drop(session);

    let bytes = write_xlsx(&report)?;
    info!(
        "Generated report for '{}': {} detail sheet(s)",
        report.selected_table,
        report.sheets.len()
    );

    Ok(download(XLSX_CONTENT_TYPE, &report.file_name(), bytes))
}
