//! A4 page placement.
//!
//! The canvas is scaled uniformly to 95% of whatever fits on a portrait A4
//! page, centered horizontally and pinned 10 mm from the top.

/// A4 portrait width in millimetres.
pub const A4_WIDTH_MM: f64 = 210.0;
/// A4 portrait height in millimetres.
pub const A4_HEIGHT_MM: f64 = 297.0;

const TOP_MM: f64 = 10.0;
const FILL: f64 = 0.95;

/// Where the canvas sits on the page, in millimetres from the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x_mm: f64,
    pub y_mm: f64,
    pub width_mm: f64,
    pub height_mm: f64,
    /// Millimetres per canvas pixel.
    pub mm_per_px: f64,
}

impl Placement {
    /// Map a canvas point (device pixels from the top-left) to page millimetres.
    #[must_use]
    pub fn to_page_mm(&self, px: u32, py: u32) -> (f64, f64) {
        (
            self.x_mm + f64::from(px) * self.mm_per_px,
            self.y_mm + f64::from(py) * self.mm_per_px,
        )
    }
}

/// Place a `width` x `height` pixel canvas on an A4 page.
#[must_use]
pub fn fit_on_a4(width: u32, height: u32) -> Placement {
    let (iw, ih) = (f64::from(width.max(1)), f64::from(height.max(1)));
    let ratio = (A4_WIDTH_MM / iw).min(A4_HEIGHT_MM / ih) * FILL;
    let width_mm = iw * ratio;

    Placement {
        x_mm: (A4_WIDTH_MM - width_mm) / 2.0,
        y_mm: TOP_MM,
        width_mm,
        height_mm: ih * ratio,
        mm_per_px: ratio,
    }
}
