//! Serializes a composed [`Page`] into a single-page PDF with lopdf.

use super::fonts::Font;
use super::layout::{Element, Page, Rect, Rgb};
use anyhow::Result;
use image::DynamicImage;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat, dictionary};

/// Kappa for approximating a quarter circle with one cubic bezier
const KAPPA: f32 = 0.552_284_8;

fn real(v: f32) -> Object {
    Object::Real(v)
}

/// WinAnsi-ish bytes for a text run; characters outside Latin-1 become `?`.
fn encode_text(text: &str) -> Object {
    let bytes = text
        .chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect();
    Object::String(bytes, StringFormat::Literal)
}

fn set_fill(ops: &mut Vec<Operation>, color: Rgb) {
    ops.push(Operation::new(
        "rg",
        vec![real(color.0), real(color.1), real(color.2)],
    ));
}

fn rounded_rect_path(ops: &mut Vec<Operation>, rect: Rect, radius: f32) {
    let r = radius.min(rect.width / 2.0).min(rect.height / 2.0);
    let k = r * KAPPA;
    let (x0, y0) = (rect.x, rect.y);
    let (x1, y1) = (rect.x + rect.width, rect.y + rect.height);

    ops.push(Operation::new("m", vec![real(x0 + r), real(y0)]));
    ops.push(Operation::new("l", vec![real(x1 - r), real(y0)]));

    // bottom-right, top-right, top-left, bottom-left corners
    ops.push(Operation::new(
        "c",
        vec![real(x1 - r + k), real(y0), real(x1), real(y0 + r - k), real(x1), real(y0 + r)],
    ));
    ops.push(Operation::new("l", vec![real(x1), real(y1 - r)]));
    ops.push(Operation::new(
        "c",
        vec![real(x1), real(y1 - r + k), real(x1 - r + k), real(y1), real(x1 - r), real(y1)],
    ));
    ops.push(Operation::new("l", vec![real(x0 + r), real(y1)]));
    ops.push(Operation::new(
        "c",
        vec![real(x0 + r - k), real(y1), real(x0), real(y1 - r + k), real(x0), real(y1 - r)],
    ));
    ops.push(Operation::new("l", vec![real(x0), real(y0 + r)]));
    ops.push(Operation::new(
        "c",
        vec![real(x0), real(y0 + r - k), real(x0 + r - k), real(y0), real(x0 + r), real(y0)],
    ));
    ops.push(Operation::new("h", vec![]));
}

/// Adds an image XObject (plus a soft mask for alpha) and returns its id.
fn add_image(doc: &mut Document, image: &DynamicImage) -> ObjectId {
    let (width, height) = (i64::from(image.width()), i64::from(image.height()));
    let rgb = image.to_rgb8().into_raw();

    let mut dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => width,
        "Height" => height,
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => 8_i64,
    };

    if image.color().has_alpha() {
        let alpha: Vec<u8> = image.to_rgba8().pixels().map(|p| p.0[3]).collect();
        let mask_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width,
                "Height" => height,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8_i64,
            },
            alpha,
        ));
        dict.set("SMask", mask_id);
    }

    doc.add_object(Stream::new(dict, rgb))
}

/// Renders `page` to PDF bytes.
pub fn write_page(page: &Page) -> Result<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut fonts = Dictionary::new();
    for font in Font::ALL {
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => font.base_font(),
            "Encoding" => "WinAnsiEncoding",
        });
        fonts.set(font.resource_name(), font_id);
    }

    let mut xobjects = Dictionary::new();
    let mut ops = Vec::new();

    for element in &page.elements {
        match element {
            Element::Fill { rect, color } => {
                set_fill(&mut ops, *color);
                ops.push(Operation::new(
                    "re",
                    vec![real(rect.x), real(rect.y), real(rect.width), real(rect.height)],
                ));
                ops.push(Operation::new("f", vec![]));
            }
            Element::Panel { rect, radius, color } => {
                set_fill(&mut ops, *color);
                ops.push(Operation::new("RG", vec![real(0.0), real(0.0), real(0.0)]));
                ops.push(Operation::new("w", vec![real(1.0)]));
                rounded_rect_path(&mut ops, *rect, *radius);
                ops.push(Operation::new("B", vec![]));
            }
            Element::Text {
                x,
                y,
                font,
                size,
                color,
                text,
            } => {
                set_fill(&mut ops, *color);
                ops.push(Operation::new("BT", vec![]));
                ops.push(Operation::new(
                    "Tf",
                    vec![font.resource_name().into(), real(*size)],
                ));
                ops.push(Operation::new("Td", vec![real(*x), real(*y)]));
                ops.push(Operation::new("Tj", vec![encode_text(text)]));
                ops.push(Operation::new("ET", vec![]));
            }
            Element::Image { rect, image } => {
                let name = format!("Im{}", xobjects.len());
                let image_id = add_image(&mut doc, image);
                xobjects.set(name.as_bytes().to_vec(), image_id);

                ops.push(Operation::new("q", vec![]));
                ops.push(Operation::new(
                    "cm",
                    vec![
                        real(rect.width),
                        real(0.0),
                        real(0.0),
                        real(rect.height),
                        real(rect.x),
                        real(rect.y),
                    ],
                ));
                ops.push(Operation::new("Do", vec![Object::Name(name.into_bytes())]));
                ops.push(Operation::new("Q", vec![]));
            }
        }
    }

    let content = Content { operations: ops };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

    let resources_id = doc.add_object(dictionary! {
        "Font" => fonts,
        "XObject" => xobjects,
    });

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
    });

    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1_i64,
        "MediaBox" => vec![real(0.0), real(0.0), real(page.width), real(page.height)],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}
