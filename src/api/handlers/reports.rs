use crate::api::error::AppError;
use crate::api::handlers::uploads::stream_file;
use crate::services::report::is_report_file_name;
use axum::{
    extract::{Path, State},
    response::Response,
};

/// Serves a finished report. Scratch files that share the directory while a
/// render is running never match the report name pattern.
#[utoipa::path(
    get,
    path = "/static/reports/{filename}",
    params(
        ("filename" = String, Path, description = "Report file name, e.g. report_20260314_093000_1a2b3c4d.pdf")
    ),
    responses(
        (status = 200, description = "PDF report (application/pdf)"),
        (status = 404, description = "No such report")
    ),
    tag = "files"
)]
pub async fn report_file(
    State(state): State<crate::AppState>,
    Path(filename): Path<String>,
) -> Result<Response, AppError> {
    if !is_report_file_name(&filename) {
        return Err(AppError::NotFound(format!("Report '{}' not found", filename)));
    }

    let path = state.config.report_dir.join(&filename);
    stream_file(&path, &filename, Some("application/pdf")).await
}
