use crate::config::AppConfig;
use crate::services::report::ReportRenderer;
use crate::services::storage::UploadStore;
use std::sync::Arc;
use tracing::info;

/// Creates the upload and report directories and the services writing to them.
pub async fn setup_storage(
    config: &AppConfig,
) -> anyhow::Result<(Arc<UploadStore>, Arc<ReportRenderer>)> {
    tokio::fs::create_dir_all(&config.upload_dir).await?;
    tokio::fs::create_dir_all(&config.report_dir).await?;

    info!("📁 Uploads: {}", config.upload_dir.display());
    info!("📁 Reports: {}", config.report_dir.display());

    for (label, path) in [
        ("Header image", &config.report.header_image_path),
        ("Signature image", &config.report.signature_image_path),
    ] {
        if !path.exists() {
            tracing::warn!("⚠️  {} {} not found; reports will omit it", label, path.display());
        }
    }

    let uploads = Arc::new(UploadStore::new(config.upload_dir.clone()));
    let renderer = Arc::new(ReportRenderer::new(
        config.report_dir.clone(),
        config.report.clone(),
    ));
    Ok((uploads, renderer))
}
