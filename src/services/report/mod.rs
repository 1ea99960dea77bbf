pub mod fonts;
pub mod layout;
pub mod pdf;
pub mod qr;

use crate::config::ReportConfig;
use crate::utils::imaging::open_image;
use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Local, NaiveDateTime};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientInfo {
    pub name: String,
    pub age: String,
    pub gender: String,
}

impl Default for PatientInfo {
    fn default() -> Self {
        Self {
            name: "Unknown".to_string(),
            age: "Unknown".to_string(),
            gender: "Unknown".to_string(),
        }
    }
}

/// Everything printed on one report.
#[derive(Debug, Clone)]
pub struct ReportInput<'a> {
    /// Display form of the prediction, e.g. "No Tumor"
    pub prediction: &'a str,
    pub confidence: f32,
    pub image_path: &'a Path,
    pub patient: &'a PatientInfo,
    pub generated_at: NaiveDateTime,
}

/// Identifier embedded in report file names: wall-clock timestamp plus a
/// random suffix so two requests in the same second get distinct files.
pub fn new_report_id(now: DateTime<Local>) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{}_{}", now.format("%Y%m%d_%H%M%S"), &suffix[..8])
}

pub fn report_file_name(report_id: &str) -> String {
    format!("report_{}.pdf", report_id)
}

/// Whether `name` is a finished report as produced by [`report_file_name`].
pub fn is_report_file_name(name: &str) -> bool {
    name.starts_with("report_")
        && name.ends_with(".pdf")
        && name.len() > "report_.pdf".len()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        && !name.contains("..")
}

pub struct ReportRenderer {
    report_dir: PathBuf,
    assets: ReportConfig,
}

impl ReportRenderer {
    pub fn new(report_dir: PathBuf, assets: ReportConfig) -> Self {
        Self { report_dir, assets }
    }

    /// Renders the report and returns the path of the finished PDF.
    ///
    /// The PDF is written to a hidden temporary file and renamed into place,
    /// so readers never observe a partial report. The QR scratch image is
    /// deleted before this returns, on success and on error alike.
    pub fn render(&self, report_id: &str, input: &ReportInput<'_>) -> Result<PathBuf> {
        let payload = qr::qr_payload(input.patient, input.prediction, input.confidence);
        let qr_file = qr::write_qr_temp(&payload, &self.report_dir)
            .with_context(|| format!("Failed to write QR image in {}", self.report_dir.display()))?;
        let qr_image = open_image(qr_file.path())
            .map_err(|e| anyhow!("Failed to reload QR image: {}", e))?;
        qr_file.close()?;

        let page = layout::build_page(&self.assets, input, qr_image);
        let bytes = pdf::write_page(&page)?;

        let mut staging = tempfile::Builder::new()
            .prefix(".report_")
            .suffix(".tmp")
            .tempfile_in(&self.report_dir)?;
        staging.write_all(&bytes)?;
        staging.as_file().sync_all()?;

        let path = self.report_dir.join(report_file_name(report_id));
        staging
            .persist(&path)
            .with_context(|| format!("Failed to store report {}", path.display()))?;

        info!("📄 Report written: {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }
}
