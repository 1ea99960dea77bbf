use crate::api::error::AppError;
use crate::api::session::Session;
use crate::api::views;
use crate::services::diagnosis::ScanUpload;
use crate::services::report::PatientInfo;
use crate::utils::validation::sanitize_filename;
use axum::{
    extract::{Multipart, State},
    response::Html,
};
use chrono::{Datelike, Local};

fn current_year() -> i32 {
    Local::now().year()
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Upload form", body = String, content_type = "text/html"),
        (status = 303, description = "Not logged in, redirect to /login")
    ),
    tag = "diagnosis"
)]
pub async fn index(session: Session) -> Html<String> {
    tracing::debug!("Upload form for {:?}", session.username);
    Html(views::index_page(None, current_year()))
}

fn text_or_unknown(value: String) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        "Unknown".to_string()
    } else {
        trimmed.to_string()
    }
}

#[utoipa::path(
    post,
    path = "/",
    request_body(content = String, description = "Multipart form: file, patient_name, patient_age, patient_gender", content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Result page with prediction and report link", body = String, content_type = "text/html"),
        (status = 303, description = "Not logged in, redirect to /login"),
        (status = 500, description = "Upload could not be classified")
    ),
    tag = "diagnosis"
)]
pub async fn diagnose(
    State(state): State<crate::AppState>,
    session: Session,
    mut multipart: Multipart,
) -> Result<Html<String>, AppError> {
    let mut patient = PatientInfo::default();
    let mut scan: Option<ScanUpload> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        let err_msg = e.to_string();
        if err_msg.contains("length limit exceeded") {
            AppError::PayloadTooLarge("Request body exceeds the maximum allowed limit".to_string())
        } else {
            AppError::BadRequest(err_msg)
        }
    })? {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "file" => {
                let original_filename = field.file_name().unwrap_or_default().to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;

                // Browsers send an empty part when no file was chosen
                if original_filename.is_empty() {
                    continue;
                }

                let filename = sanitize_filename(&original_filename)
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                scan = Some(ScanUpload {
                    filename,
                    data: data.to_vec(),
                });
            }
            "patient_name" | "patient_age" | "patient_gender" => {
                let value = text_or_unknown(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?,
                );
                match name.as_str() {
                    "patient_name" => patient.name = value,
                    "patient_age" => patient.age = value,
                    _ => patient.gender = value,
                }
            }
            _ => {}
        }
    }

    let Some(scan) = scan else {
        return Ok(Html(views::index_page(None, current_year())));
    };

    tracing::info!(
        "📥 Scan '{}' ({} bytes) submitted by {:?}",
        scan.filename,
        scan.data.len(),
        session.username
    );

    let outcome = state.diagnosis.diagnose(scan, patient).await?;

    Ok(Html(views::index_page(Some(&outcome), current_year())))
}
