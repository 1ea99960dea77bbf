#![allow(dead_code)]

use anyhow::Result;
use image::{ImageBuffer, Rgb};
use mri_report_server::config::{AppConfig, ReportConfig};
use mri_report_server::infrastructure::database;
use mri_report_server::services::classifier::{Classifier, ImageTensor, InferenceBackend};
use mri_report_server::services::report::ReportRenderer;
use mri_report_server::services::storage::UploadStore;
use mri_report_server::AppState;
use sea_orm::{Database, DatabaseConnection};
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

pub const INPUT_SIZE: u32 = 16;

pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    database::run_migrations(&db).await.unwrap();
    db
}

/// Always answers with the same probability vector.
pub struct FixedBackend(pub Vec<f32>);

impl InferenceBackend for FixedBackend {
    fn infer(&self, _input: &ImageTensor) -> Result<Vec<f32>> {
        Ok(self.0.clone())
    }
}

/// Picks the class from the mean brightness of the input, one quarter of the
/// range per class in label order.
pub struct BrightnessBackend;

impl InferenceBackend for BrightnessBackend {
    fn infer(&self, input: &ImageTensor) -> Result<Vec<f32>> {
        assert_eq!(input.data.len(), (input.size * input.size * 3) as usize);
        let mean = input.data.iter().sum::<f32>() / input.data.len() as f32;
        let index = ((mean * 4.0) as usize).min(3);

        let mut probabilities = vec![0.1_f32; 4];
        probabilities[index] = 0.7;
        Ok(probabilities)
    }
}

pub fn gray_png(level: u8, width: u32, height: u32) -> Vec<u8> {
    let img = ImageBuffer::from_pixel(width, height, Rgb([level, level, level]));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageOutputFormat::Png)
        .unwrap();
    bytes
}

pub fn gray_jpeg(level: u8, width: u32, height: u32) -> Vec<u8> {
    let img = ImageBuffer::from_pixel(width, height, Rgb([level, level, level]));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageOutputFormat::Jpeg(95))
        .unwrap();
    bytes
}

pub fn write_gray_png(path: &Path, level: u8) {
    std::fs::write(path, gray_png(level, 64, 48)).unwrap();
}

/// Config rooted in a temp directory, with report assets that do not exist.
pub fn test_config(root: &Path) -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".to_string(),
        upload_dir: root.join("uploads"),
        report_dir: root.join("reports"),
        model_input_size: INPUT_SIZE,
        report: ReportConfig {
            header_image_path: root.join("missing_header.jpg"),
            signature_image_path: root.join("missing_signature.png"),
            ..ReportConfig::default()
        },
        ..AppConfig::default()
    }
}

pub struct TestApp {
    pub state: AppState,
    pub dir: TempDir,
}

pub async fn setup_test_app(backend: Arc<dyn InferenceBackend>) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    std::fs::create_dir_all(&config.upload_dir).unwrap();
    std::fs::create_dir_all(&config.report_dir).unwrap();

    let db = setup_test_db().await;
    let classifier = Arc::new(Classifier::new(backend, INPUT_SIZE));
    let uploads = Arc::new(UploadStore::new(config.upload_dir.clone()));
    let renderer = Arc::new(ReportRenderer::new(
        config.report_dir.clone(),
        config.report.clone(),
    ));

    let state = AppState::new(db, classifier, uploads, renderer, config);
    TestApp { state, dir }
}
