//! Single-page PDF output.
//!
//! The canvas is embedded as a JPEG image XObject and the detail lines are
//! set on top as Helvetica text, so the receipt stays searchable.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, StringFormat, dictionary};

use super::RenderError;
use super::layout::{A4_HEIGHT_MM, A4_WIDTH_MM, Placement};
use super::raster::Composite;

const JPEG_QUALITY: u8 = 90;
const POINTS_PER_MM: f64 = 72.0 / 25.4;

#[allow(clippy::cast_possible_truncation)]
fn pt(mm: f64) -> f32 {
    (mm * POINTS_PER_MM) as f32
}

/// Encode text for a WinAnsi Type1 font; characters outside Latin-1 become `?`.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

/// Write `composite` onto one A4 page at `placement`.
///
/// # Errors
///
/// Returns `RenderError` if the image cannot be encoded or the document
/// cannot be serialized.
pub fn write_pdf(
    composite: &Composite,
    placement: &Placement,
    title: &str,
) -> Result<Vec<u8>, RenderError> {
    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY).encode_image(&composite.image)?;

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });

    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(composite.image.width()),
            "Height" => i64::from(composite.image.height()),
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8_i64,
            "Filter" => "DCTDecode",
        },
        jpeg,
    ));

    let page_height = pt(A4_HEIGHT_MM);
    // PDF user space has its origin at the bottom-left.
    let image_bottom = page_height - pt(placement.y_mm + placement.height_mm);

    let mut operations = vec![
        Operation::new("q", vec![]),
        Operation::new(
            "cm",
            vec![
                pt(placement.width_mm).into(),
                0.into(),
                0.into(),
                pt(placement.height_mm).into(),
                pt(placement.x_mm).into(),
                image_bottom.into(),
            ],
        ),
        Operation::new("Do", vec!["Im0".into()]),
        Operation::new("Q", vec![]),
    ];

    if !composite.text.is_empty() {
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new("rg", vec![0.2_f32.into(), 0.2_f32.into(), 0.2_f32.into()]));
        for line in &composite.text {
            let (x_mm, y_mm) = placement.to_page_mm(line.x, line.baseline);
            let size = pt(f64::from(line.size) * placement.mm_per_px);
            operations.push(Operation::new("Tf", vec!["F1".into(), size.into()]));
            // Tm (absolute) rather than Td, which is relative to the previous line.
            operations.push(Operation::new(
                "Tm",
                vec![
                    1.into(),
                    0.into(),
                    0.into(),
                    1.into(),
                    pt(x_mm).into(),
                    (page_height - pt(y_mm)).into(),
                ],
            ));
            operations.push(Operation::new(
                "Tj",
                vec![Object::String(win_ansi(&line.text), StringFormat::Literal)],
            ));
        }
        operations.push(Operation::new("ET", vec![]));
    }

    let content = Content { operations };
    let encoded = content
        .encode()
        .map_err(|e| RenderError::Pdf(e.to_string()))?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => dictionary! {
            "XObject" => dictionary! { "Im0" => image_id },
            "Font" => dictionary! { "F1" => font_id },
        },
    });

    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1_i64,
        "MediaBox" => vec![0.into(), 0.into(), pt(A4_WIDTH_MM).into(), page_height.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let info_id = doc.add_object(dictionary! {
        "Title" => Object::String(win_ansi(title), StringFormat::Literal),
        "Producer" => Object::string_literal("CaseCrafters"),
    });
    doc.trailer.set("Info", info_id);

    let mut out = Cursor::new(Vec::new());
    doc.save_to(&mut out)
        .map_err(|e| RenderError::Pdf(e.to_string()))?;
    Ok(out.into_inner())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use image::{Rgb, RgbImage};

    use super::super::layout::fit_on_a4;
    use super::super::raster::TextLine;
    use super::*;

    fn composite(text: Vec<TextLine>) -> Composite {
        Composite {
            image: RgbImage::from_pixel(120, 200, Rgb([200, 30, 30])),
            text,
        }
    }

    #[test]
    fn test_writes_a_pdf_document() {
        let c = composite(vec![]);
        let bytes = write_pdf(&c, &fit_on_a4(120, 200), "Receipt").unwrap();

        assert!(bytes.starts_with(b"%PDF-1.5"));
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn test_text_is_embedded() {
        let c = composite(vec![TextLine {
            text: "Total INR 285.00".to_string(),
            x: 10,
            baseline: 150,
            size: 22,
        }]);
        let bytes = write_pdf(&c, &fit_on_a4(120, 200), "Receipt").unwrap();

        let doc = Document::load_mem(&bytes).unwrap();
        let page_id = *doc.get_pages().get(&1).unwrap();
        let content = doc.get_page_content(page_id).unwrap();
        let content = String::from_utf8_lossy(&content);
        assert!(content.contains("(Total INR 285.00) Tj"));
    }

    #[test]
    fn test_win_ansi_replaces_wide_chars() {
        assert_eq!(win_ansi("₹5 café"), b"?5 caf\xe9".to_vec());
    }
}
