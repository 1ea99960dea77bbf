use crate::config::AppConfig;
use crate::services::classifier::{Classifier, OnnxBackend};
use anyhow::Context;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Loads the model once; the returned handle is shared by every request.
pub async fn setup_classifier(config: &AppConfig) -> anyhow::Result<Arc<Classifier>> {
    let model_path = config.model_path.clone();
    let input_size = config.model_input_size;

    info!("🧠 Loading model: {} ({}x{})", model_path.display(), input_size, input_size);
    let started = Instant::now();

    let backend = tokio::task::spawn_blocking(move || OnnxBackend::load(&model_path, input_size))
        .await
        .context("Model loading task panicked")??;

    info!("✅ Model ready in {:?}", started.elapsed());
    Ok(Arc::new(Classifier::new(Arc::new(backend), input_size)))
}
