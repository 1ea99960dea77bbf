//! Page composition for the diagnostic report.
//!
//! Produces a flat list of drawing elements in paint order. Coordinates are
//! PDF points with the origin at the bottom-left corner of an A4 page.

use super::fonts::Font;
use super::{PatientInfo, ReportInput};
use crate::config::ReportConfig;
use crate::services::classifier::format_percent;
use crate::utils::imaging::open_image;
use image::DynamicImage;
use std::path::Path;
use tracing::debug;

pub const PAGE_WIDTH: f32 = 595.2756;
pub const PAGE_HEIGHT: f32 = 841.8898;

pub const TITLE: &str = "MRI Brain Tumor Analysis Report";

const MRI_BOX: f32 = 200.0;
/// Largest edge kept when embedding a raster, about 3x the printed size
const MAX_EMBED_EDGE: u32 = 600;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb(pub f32, pub f32, pub f32);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0.0, 0.0, 0.0);
    pub const WHITE: Rgb = Rgb(1.0, 1.0, 1.0);
    pub const RED: Rgb = Rgb(1.0, 0.0, 0.0);
    pub const GREY: Rgb = Rgb(0.5, 0.5, 0.5);
    pub const OFF_WHITE: Rgb = Rgb(0.98, 0.96, 0.92);
    pub const PANEL_BLUE: Rgb = Rgb(0.9, 0.95, 1.0);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone)]
pub enum Element {
    /// Filled rectangle without outline
    Fill { rect: Rect, color: Rgb },
    /// Filled rounded rectangle with a 1pt black outline
    Panel { rect: Rect, radius: f32, color: Rgb },
    Text {
        x: f32,
        y: f32,
        font: Font,
        size: f32,
        color: Rgb,
        text: String,
    },
    Image { rect: Rect, image: DynamicImage },
}

#[derive(Debug, Clone)]
pub struct Page {
    pub width: f32,
    pub height: f32,
    pub elements: Vec<Element>,
}

impl Page {
    /// Every text run on the page, in paint order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.elements.iter().filter_map(|e| match e {
            Element::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn image_count(&self) -> usize {
        self.elements
            .iter()
            .filter(|e| matches!(e, Element::Image { .. }))
            .count()
    }
}

pub fn patient_line(patient: &PatientInfo) -> String {
    format!(
        "Name: {}    Age: {}    Gender: {}",
        patient.name, patient.age, patient.gender
    )
}

pub fn diagnosis_line(prediction: &str, confidence: f32) -> String {
    format!(
        "Prediction: {}    Confidence: {}",
        prediction,
        format_percent(confidence)
    )
}

/// Loads an optional decoration; a missing or undecodable file yields `None`.
pub fn load_optional_image(path: &Path) -> Option<DynamicImage> {
    if !path.exists() {
        debug!("Report asset {} missing, skipping", path.display());
        return None;
    }
    match open_image(path) {
        Ok(img) => Some(img),
        Err(e) => {
            debug!("Report asset {} unreadable ({}), skipping", path.display(), e);
            None
        }
    }
}

fn downscale(img: DynamicImage) -> DynamicImage {
    if img.width() > MAX_EMBED_EDGE || img.height() > MAX_EMBED_EDGE {
        img.thumbnail(MAX_EMBED_EDGE, MAX_EMBED_EDGE)
    } else {
        img
    }
}

/// Largest rect with the image's aspect ratio centred inside `bounds`.
pub fn fit_centered(image_width: u32, image_height: u32, bounds: Rect) -> Rect {
    if image_width == 0 || image_height == 0 {
        return bounds;
    }
    let scale = (bounds.width / image_width as f32).min(bounds.height / image_height as f32);
    let width = image_width as f32 * scale;
    let height = image_height as f32 * scale;
    Rect {
        x: bounds.x + (bounds.width - width) / 2.0,
        y: bounds.y + (bounds.height - height) / 2.0,
        width,
        height,
    }
}

fn text(x: f32, y: f32, font: Font, size: f32, color: Rgb, text: impl Into<String>) -> Element {
    Element::Text {
        x,
        y,
        font,
        size,
        color,
        text: text.into(),
    }
}

/// Builds the full report page. `qr` is the already rendered QR code.
pub fn build_page(assets: &ReportConfig, input: &ReportInput<'_>, qr: DynamicImage) -> Page {
    let (w, h) = (PAGE_WIDTH, PAGE_HEIGHT);
    let mut elements = Vec::new();

    elements.push(Element::Fill {
        rect: Rect { x: 0.0, y: 0.0, width: w, height: h },
        color: Rgb::OFF_WHITE,
    });

    if let Some(header) = load_optional_image(&assets.header_image_path) {
        elements.push(Element::Image {
            rect: Rect { x: 0.0, y: h - 120.0, width: w, height: 100.0 },
            image: downscale(header),
        });
        let size = 24.0;
        let title_width = Font::HelveticaBold.text_width(TITLE, size);
        elements.push(text(
            (w - title_width) / 2.0,
            h - 70.0,
            Font::HelveticaBold,
            size,
            Rgb::WHITE,
            TITLE,
        ));
    }

    elements.push(text(
        50.0,
        h - 135.0,
        Font::Helvetica,
        10.0,
        Rgb::BLACK,
        format!("Date: {}", input.generated_at.format("%Y-%m-%d %H:%M:%S")),
    ));

    elements.push(Element::Panel {
        rect: Rect { x: 40.0, y: h - 210.0, width: w - 80.0, height: 60.0 },
        radius: 10.0,
        color: Rgb::PANEL_BLUE,
    });
    elements.push(text(55.0, h - 185.0, Font::HelveticaBold, 13.0, Rgb::BLACK, "Patient Information"));
    elements.push(text(60.0, h - 200.0, Font::Helvetica, 11.0, Rgb::BLACK, patient_line(input.patient)));

    elements.push(Element::Panel {
        rect: Rect { x: 40.0, y: h - 290.0, width: w - 80.0, height: 60.0 },
        radius: 10.0,
        color: Rgb::WHITE,
    });
    elements.push(text(55.0, h - 265.0, Font::HelveticaBold, 13.0, Rgb::BLACK, "AI Diagnosis"));
    elements.push(text(
        60.0,
        h - 280.0,
        Font::Helvetica,
        11.0,
        Rgb::BLACK,
        diagnosis_line(input.prediction, input.confidence),
    ));

    let mri_x = (w - MRI_BOX) / 2.0;
    let mri_y = h - 590.0;
    elements.push(text(50.0, mri_y + 220.0, Font::HelveticaBold, 12.0, Rgb::BLACK, "MRI Scan Image:"));
    match open_image(input.image_path) {
        Ok(scan) => {
            let bounds = Rect { x: mri_x, y: mri_y, width: MRI_BOX, height: MRI_BOX };
            let rect = fit_centered(scan.width(), scan.height(), bounds);
            elements.push(Element::Image { rect, image: downscale(scan) });
        }
        Err(e) => {
            debug!("Scan {} not embeddable: {}", input.image_path.display(), e);
            elements.push(text(
                50.0,
                mri_y,
                Font::HelveticaBold,
                12.0,
                Rgb::RED,
                format!("Error loading image: {}", e),
            ));
        }
    }

    if let Some(signature) = load_optional_image(&assets.signature_image_path) {
        elements.push(text(w - 180.0, 160.0, Font::Helvetica, 10.0, Rgb::BLACK, assets.doctor_name.clone()));
        elements.push(text(w - 180.0, 145.0, Font::Helvetica, 10.0, Rgb::BLACK, assets.doctor_title.clone()));
        elements.push(Element::Image {
            rect: Rect { x: w - 190.0, y: 180.0, width: 100.0, height: 40.0 },
            image: downscale(signature),
        });
    }

    elements.push(Element::Image {
        rect: Rect { x: 60.0, y: 80.0, width: 70.0, height: 70.0 },
        image: qr,
    });

    elements.push(text(140.0, 95.0, Font::Helvetica, 10.0, Rgb::BLACK, assets.contact.clone()));
    elements.push(text(140.0, 80.0, Font::HelveticaOblique, 9.0, Rgb::GREY, assets.disclaimer.clone()));

    Page {
        width: w,
        height: h,
        elements,
    }
}
