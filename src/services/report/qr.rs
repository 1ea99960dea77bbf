use super::PatientInfo;
use anyhow::{Result, anyhow};
use image::{GrayImage, ImageFormat, Luma};
use qrcode::{Color, QrCode};
use std::path::Path;
use tempfile::NamedTempFile;

/// Pixels per QR module
const MODULE_PX: u32 = 8;
/// Quiet zone width in modules
const QUIET_ZONE: u32 = 4;

/// Human-readable summary encoded in the report's QR code.
pub fn qr_payload(patient: &PatientInfo, prediction: &str, confidence: f32) -> String {
    format!(
        "Name: {}, Age: {}, Gender: {}, Result: {}, Confidence: {:.2}",
        patient.name, patient.age, patient.gender, prediction, confidence
    )
}

pub fn render_qr(payload: &str) -> Result<GrayImage> {
    let code = QrCode::new(payload.as_bytes()).map_err(|e| anyhow!("QR encoding failed: {}", e))?;
    let modules = code.width() as u32;
    let colors = code.to_colors();
    let side = (modules + 2 * QUIET_ZONE) * MODULE_PX;

    Ok(GrayImage::from_fn(side, side, |x, y| {
        let mx = (x / MODULE_PX).checked_sub(QUIET_ZONE);
        let my = (y / MODULE_PX).checked_sub(QUIET_ZONE);
        match (mx, my) {
            (Some(mx), Some(my)) if mx < modules && my < modules => {
                match colors[(my * modules + mx) as usize] {
                    Color::Dark => Luma([0]),
                    Color::Light => Luma([255]),
                }
            }
            _ => Luma([255]),
        }
    }))
}

/// Writes the QR code as a PNG into `dir`. The file is removed when the
/// returned handle is closed or dropped.
pub fn write_qr_temp(payload: &str, dir: &Path) -> Result<NamedTempFile> {
    let qr = render_qr(payload)?;
    let file = tempfile::Builder::new()
        .prefix("qr_")
        .suffix(".png")
        .tempfile_in(dir)?;
    qr.save_with_format(file.path(), ImageFormat::Png)?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_format() {
        let patient = PatientInfo {
            name: "Jane Doe".to_string(),
            age: "34".to_string(),
            gender: "F".to_string(),
        };
        assert_eq!(
            qr_payload(&patient, "No Tumor", 0.93),
            "Name: Jane Doe, Age: 34, Gender: F, Result: No Tumor, Confidence: 0.93"
        );
    }

    #[test]
    fn test_render_has_quiet_zone() {
        let img = render_qr("hello").unwrap();
        assert_eq!(img.width(), img.height());
        assert_eq!(img.get_pixel(0, 0), &Luma([255]));
        // Finder pattern corner starts right after the quiet zone
        let edge = QUIET_ZONE * MODULE_PX;
        assert_eq!(img.get_pixel(edge, edge), &Luma([0]));
    }

    #[test]
    fn test_temp_file_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = {
            let file = write_qr_temp("payload", dir.path()).unwrap();
            assert!(file.path().exists());
            file.path().to_path_buf()
        };
        assert!(!path.exists());
    }
}
