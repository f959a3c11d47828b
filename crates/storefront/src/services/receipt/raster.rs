//! Receipt rasterization.
//!
//! The receipt canvas is drawn at [`SCALE`]x its logical size: a band in the
//! case color, each preloaded image centered and stacked, then a blank
//! details panel. Text is not rasterized; the panel's line positions are
//! returned so the PDF layer can set them as real text.

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};

use super::assets::Asset;

/// Device-pixel multiplier over logical pixels.
pub const SCALE: u32 = 2;

const WIDTH: u32 = 600;
const PADDING: u32 = 24;
const BAND_HEIGHT: u32 = 24;
const GAP: u32 = 16;
const MAX_IMAGE_HEIGHT: u32 = 480;
const PLACEHOLDER_HEIGHT: u32 = 240;
const LINE_HEIGHT: u32 = 18;
const FONT_SIZE: u32 = 11;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const PLACEHOLDER_FILL: Rgb<u8> = Rgb([235, 235, 235]);
const PLACEHOLDER_BORDER: Rgb<u8> = Rgb([200, 200, 200]);
const DIVIDER: Rgb<u8> = Rgb([220, 220, 220]);

/// A line of text positioned on the canvas, in device pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextLine {
    pub text: String,
    pub x: u32,
    /// Distance from the canvas top to the text baseline.
    pub baseline: u32,
    pub size: u32,
}

/// The rasterized receipt and where its text goes.
#[derive(Debug, Clone)]
pub struct Composite {
    pub image: RgbImage,
    pub text: Vec<TextLine>,
}

enum Block {
    Image { image: RgbImage },
    Placeholder,
}

/// Compose the receipt canvas.
#[must_use]
pub fn compose(band_color: [u8; 3], assets: &[Asset], lines: &[String]) -> Composite {
    let s = SCALE;
    let width = WIDTH * s;
    let inner_width = (WIDTH - 2 * PADDING) * s;

    let blocks: Vec<Block> = assets
        .iter()
        .map(|asset| match asset {
            Asset::Loaded(image) => {
                let (w, h) = fit(
                    image.width(),
                    image.height(),
                    inner_width,
                    MAX_IMAGE_HEIGHT * s,
                );
                Block::Image {
                    image: image.resize_exact(w, h, FilterType::Triangle).to_rgb8(),
                }
            }
            Asset::Failed { .. } => Block::Placeholder,
        })
        .collect();

    let blocks_height: u32 = blocks
        .iter()
        .map(|block| match block {
            Block::Image { image } => image.height() + GAP * s,
            Block::Placeholder => (PLACEHOLDER_HEIGHT + GAP) * s,
        })
        .sum();
    let line_count = u32::try_from(lines.len()).unwrap_or(u32::MAX);
    let panel_top = (BAND_HEIGHT + PADDING) * s + blocks_height;
    let height = panel_top + line_count.saturating_mul(LINE_HEIGHT * s) + PADDING * s;

    let mut canvas = RgbImage::from_pixel(width, height, WHITE);
    fill_rect(&mut canvas, 0, 0, width, BAND_HEIGHT * s, Rgb(band_color));

    let mut y = (BAND_HEIGHT + PADDING) * s;
    for block in &blocks {
        match block {
            Block::Image { image } => {
                let x = (width - image.width()) / 2;
                imageops::overlay(&mut canvas, image, i64::from(x), i64::from(y));
                y += image.height() + GAP * s;
            }
            Block::Placeholder => {
                let x = PADDING * s;
                let h = PLACEHOLDER_HEIGHT * s;
                fill_rect(&mut canvas, x, y, inner_width, h, PLACEHOLDER_BORDER);
                fill_rect(&mut canvas, x + s, y + s, inner_width - 2 * s, h - 2 * s, PLACEHOLDER_FILL);
                y += h + GAP * s;
            }
        }
    }

    if !lines.is_empty() {
        fill_rect(&mut canvas, PADDING * s, panel_top - (GAP / 2) * s, inner_width, s, DIVIDER);
    }

    let text = lines
        .iter()
        .zip(1..)
        .map(|(line, n): (&String, u32)| TextLine {
            text: line.clone(),
            x: PADDING * s,
            baseline: panel_top + n * LINE_HEIGHT * s - (LINE_HEIGHT - FONT_SIZE) * s / 2,
            size: FONT_SIZE * s,
        })
        .collect();

    Composite {
        image: canvas,
        text,
    }
}

/// Scale `(w, h)` to fit within `(max_w, max_h)` keeping aspect ratio.
fn fit(w: u32, h: u32, max_w: u32, max_h: u32) -> (u32, u32) {
    let ratio = (f64::from(max_w) / f64::from(w)).min(f64::from(max_h) / f64::from(h));
    let scaled = |v: u32| {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let out = (f64::from(v) * ratio).round() as u32;
        out.clamp(1, max_w.max(max_h))
    };
    (scaled(w).min(max_w), scaled(h).min(max_h))
}

fn fill_rect(canvas: &mut RgbImage, x: u32, y: u32, w: u32, h: u32, color: Rgb<u8>) {
    let x_end = (x + w).min(canvas.width());
    let y_end = (y + h).min(canvas.height());
    for py in y..y_end {
        for px in x..x_end {
            canvas.put_pixel(px, py, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use image::DynamicImage;

    use super::*;

    fn loaded(w: u32, h: u32) -> Asset {
        Asset::Loaded(DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb([0, 0, 0]))))
    }

    fn failed() -> Asset {
        Asset::Failed {
            url: "https://cdn/broken.png".to_string(),
            reason: "unexpected status 404".to_string(),
        }
    }

    #[test]
    fn test_canvas_is_scaled_and_banded() {
        let composite = compose([244, 63, 94], &[loaded(100, 200)], &[]);
        assert_eq!(composite.image.width(), WIDTH * SCALE);
        assert_eq!(*composite.image.get_pixel(5, 5), Rgb([244, 63, 94]));
        assert_eq!(*composite.image.get_pixel(5, BAND_HEIGHT * SCALE + 1), WHITE);
    }

    #[test]
    fn test_image_keeps_aspect_ratio() {
        let (w, h) = fit(100, 200, 1104, 960);
        assert_eq!((w, h), (480, 960));

        let (w, h) = fit(4000, 1000, 1104, 960);
        assert_eq!((w, h), (1104, 276));
    }

    #[test]
    fn test_failed_image_becomes_placeholder() {
        let with_failure = compose([0, 0, 0], &[failed()], &[]);
        let y = (BAND_HEIGHT + PADDING) * SCALE + 10;
        assert_eq!(*with_failure.image.get_pixel(WIDTH, y), PLACEHOLDER_FILL);
        assert_eq!(
            with_failure.image.height(),
            (BAND_HEIGHT + PADDING + PLACEHOLDER_HEIGHT + GAP + PADDING) * SCALE
        );
    }

    #[test]
    fn test_text_lines_are_below_images() {
        let lines = vec!["Order 1".to_string(), "Total INR 50.00".to_string()];
        let composite = compose([0, 0, 0], &[loaded(10, 10)], &lines);

        assert_eq!(composite.text.len(), 2);
        assert!(composite.text[0].baseline < composite.text[1].baseline);
        assert!(composite.text[1].baseline < composite.image.height());
        assert_eq!(composite.text[0].size, FONT_SIZE * SCALE);
    }
}
