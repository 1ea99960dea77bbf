//! Brain tumor classifier.
//!
//! Wraps a pretrained four-class model. Images are resized to a fixed square,
//! scaled to `[0, 1]` and fed as a single NHWC batch; the arg-max of the
//! returned probability vector becomes the prediction.

use crate::utils::imaging::open_image;
use anyhow::{Context, Result, anyhow};
use image::imageops::FilterType;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tract_onnx::prelude::*;

/// The fixed label set, in the model's output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TumorLabel {
    Pituitary,
    Glioma,
    NoTumor,
    Meningioma,
}

impl TumorLabel {
    pub const ALL: [TumorLabel; 4] = [
        TumorLabel::Pituitary,
        TumorLabel::Glioma,
        TumorLabel::NoTumor,
        TumorLabel::Meningioma,
    ];

    /// Raw class name as used in the training set.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pituitary => "pituitary",
            Self::Glioma => "glioma",
            Self::NoTumor => "notumor",
            Self::Meningioma => "meningioma",
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Human-readable result shown on the page and in the report.
    pub fn display_name(&self) -> String {
        match self {
            Self::NoTumor => "No Tumor".to_string(),
            other => format!("Tumor: {}", other.as_str()),
        }
    }
}

impl fmt::Display for TumorLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prediction {
    pub label: TumorLabel,
    /// Probability of `label`, in `[0, 1]`
    pub confidence: f32,
}

impl Prediction {
    pub fn display_label(&self) -> String {
        self.label.display_name()
    }

    /// Confidence as a percentage with two decimals, e.g. `93.00%`.
    pub fn confidence_percent(&self) -> String {
        format_percent(self.confidence)
    }
}

pub fn format_percent(confidence: f32) -> String {
    format!("{:.2}%", confidence * 100.0)
}

/// Model input: one RGB image, row-major NHWC with values in `[0, 1]`.
#[derive(Debug, Clone)]
pub struct ImageTensor {
    pub size: u32,
    pub data: Vec<f32>,
}

/// Runs the network on a prepared input and returns class probabilities.
pub trait InferenceBackend: Send + Sync {
    fn infer(&self, input: &ImageTensor) -> Result<Vec<f32>>;
}

type OnnxPlan = TypedRunnableModel<TypedModel>;

/// ONNX model executed with tract.
pub struct OnnxBackend {
    plan: OnnxPlan,
}

impl OnnxBackend {
    pub fn load(model_path: &Path, input_size: u32) -> Result<Self> {
        let size = input_size as usize;
        let plan = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("Failed to read model {}", model_path.display()))?
            .with_input_fact(0, f32::fact([1, size, size, 3]).into())?
            .into_optimized()?
            .into_runnable()?;

        Ok(Self { plan })
    }
}

impl InferenceBackend for OnnxBackend {
    fn infer(&self, input: &ImageTensor) -> Result<Vec<f32>> {
        let size = input.size as usize;
        let tensor: Tensor =
            tract_ndarray::Array4::from_shape_vec((1, size, size, 3), input.data.clone())?.into();

        let outputs = self.plan.run(tvec!(tensor.into()))?;
        let output = outputs
            .first()
            .ok_or_else(|| anyhow!("Model produced no output"))?;

        Ok(output.to_array_view::<f32>()?.iter().copied().collect())
    }
}

/// Loaded once at startup and shared read-only by every request.
pub struct Classifier {
    backend: Arc<dyn InferenceBackend>,
    input_size: u32,
}

impl Classifier {
    pub fn new(backend: Arc<dyn InferenceBackend>, input_size: u32) -> Self {
        Self {
            backend,
            input_size,
        }
    }

    pub fn input_size(&self) -> u32 {
        self.input_size
    }

    pub fn classify(&self, image_path: &Path) -> Result<Prediction> {
        let input = preprocess(image_path, self.input_size)?;
        let probabilities = self.backend.infer(&input)?;
        let prediction = select_prediction(&probabilities)?;

        tracing::debug!(
            "Classified {} as {} ({:.4})",
            image_path.display(),
            prediction.label,
            prediction.confidence
        );
        Ok(prediction)
    }
}

/// Decodes (format sniffed from content), resizes (nearest neighbour) and
/// normalizes an image file.
pub fn preprocess(image_path: &Path, size: u32) -> Result<ImageTensor> {
    let img = open_image(image_path)
        .map_err(|e| anyhow!("Failed to decode image {}: {}", image_path.display(), e))?;

    let rgb = img.resize_exact(size, size, FilterType::Nearest).to_rgb8();
    let data = rgb.as_raw().iter().map(|&v| f32::from(v) / 255.0).collect();

    Ok(ImageTensor { size, data })
}

/// Arg-max over the probability vector; ties keep the first class.
pub fn select_prediction(probabilities: &[f32]) -> Result<Prediction> {
    if probabilities.len() != TumorLabel::ALL.len() {
        return Err(anyhow!(
            "Expected {} class probabilities, model returned {}",
            TumorLabel::ALL.len(),
            probabilities.len()
        ));
    }

    let (index, confidence) = probabilities
        .iter()
        .copied()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |best, (i, p)| {
            if p > best.1 { (i, p) } else { best }
        });

    let label = TumorLabel::from_index(index)
        .ok_or_else(|| anyhow!("Class index {} out of range", index))?;

    Ok(Prediction { label, confidence })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names() {
        assert_eq!(TumorLabel::NoTumor.display_name(), "No Tumor");
        assert_eq!(TumorLabel::Glioma.display_name(), "Tumor: glioma");
        assert_eq!(TumorLabel::Pituitary.display_name(), "Tumor: pituitary");
        assert_eq!(TumorLabel::Meningioma.display_name(), "Tumor: meningioma");
    }

    #[test]
    fn test_label_order_matches_model_output() {
        let names: Vec<_> = TumorLabel::ALL.iter().map(|l| l.as_str()).collect();
        assert_eq!(names, ["pituitary", "glioma", "notumor", "meningioma"]);
    }

    #[test]
    fn test_select_prediction_argmax() {
        let p = select_prediction(&[0.01, 0.03, 0.93, 0.03]).unwrap();
        assert_eq!(p.label, TumorLabel::NoTumor);
        assert_eq!(p.confidence_percent(), "93.00%");
        assert_eq!(p.display_label(), "No Tumor");
    }

    #[test]
    fn test_select_prediction_rejects_wrong_arity() {
        assert!(select_prediction(&[0.5, 0.5]).is_err());
        assert!(select_prediction(&[]).is_err());
    }

    #[test]
    fn test_preprocess_normalizes_and_resizes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("white.png");
        image::RgbImage::from_pixel(40, 20, image::Rgb([255, 255, 255]))
            .save(&path)
            .unwrap();

        let tensor = preprocess(&path, 8).unwrap();
        assert_eq!(tensor.size, 8);
        assert_eq!(tensor.data.len(), 8 * 8 * 3);
        assert!(tensor.data.iter().all(|&v| (v - 1.0).abs() < f32::EPSILON));
    }

    #[test]
    fn test_preprocess_fails_on_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"definitely not an image").unwrap();
        assert!(preprocess(&path, 8).is_err());
    }
}
