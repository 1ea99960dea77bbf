use crate::services::classifier::{Classifier, Prediction};
use crate::services::report::{
    PatientInfo, ReportInput, ReportRenderer, new_report_id, report_file_name,
};
use crate::services::storage::UploadStore;
use anyhow::{Result, anyhow};
use chrono::Local;
use std::sync::Arc;
use tracing::info;

/// One uploaded scan, filename already sanitized.
pub struct ScanUpload {
    pub filename: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct DiagnosisOutcome {
    pub prediction: Prediction,
    pub patient: PatientInfo,
    pub upload_filename: String,
    pub report_file_name: String,
}

/// Upload → classify → report, for one request.
pub struct DiagnosisService {
    uploads: Arc<UploadStore>,
    classifier: Arc<Classifier>,
    renderer: Arc<ReportRenderer>,
}

impl DiagnosisService {
    pub fn new(
        uploads: Arc<UploadStore>,
        classifier: Arc<Classifier>,
        renderer: Arc<ReportRenderer>,
    ) -> Self {
        Self {
            uploads,
            classifier,
            renderer,
        }
    }

    pub async fn diagnose(&self, scan: ScanUpload, patient: PatientInfo) -> Result<DiagnosisOutcome> {
        let image_path = self.uploads.save(&scan.filename, &scan.data).await?;

        let classifier = self.classifier.clone();
        let classify_path = image_path.clone();
        let prediction = tokio::task::spawn_blocking(move || classifier.classify(&classify_path))
            .await
            .map_err(|e| anyhow!("Classification task failed: {}", e))??;

        info!(
            "🧠 {} → {} ({})",
            scan.filename,
            prediction.display_label(),
            prediction.confidence_percent()
        );

        let now = Local::now();
        let report_id = new_report_id(now);
        let report_file_name = report_file_name(&report_id);
        let renderer = self.renderer.clone();
        let display = prediction.display_label();
        let render_patient = patient.clone();
        tokio::task::spawn_blocking(move || {
            let input = ReportInput {
                prediction: &display,
                confidence: prediction.confidence,
                image_path: &image_path,
                patient: &render_patient,
                generated_at: now.naive_local(),
            };
            renderer.render(&report_id, &input)
        })
        .await
        .map_err(|e| anyhow!("Report task failed: {}", e))??;

        Ok(DiagnosisOutcome {
            prediction,
            patient,
            upload_filename: scan.filename,
            report_file_name,
        })
    }
}
