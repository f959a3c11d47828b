//! Downloadable order receipts.
//!
//! Rendering runs in four stages:
//!
//! 1. [`assets::preload_all`] - fetch every referenced image concurrently
//! 2. [`raster::compose`] - draw the 2x canvas (failed images become placeholders)
//! 3. [`layout::fit_on_a4`] - place the canvas on an A4 portrait page
//! 4. [`pdf::write_pdf`] - emit a single-page PDF
//!
//! Either a complete file is returned or an error; nothing partial.

pub mod assets;
pub mod layout;
pub mod pdf;
pub mod raster;

use std::time::Duration;

use thiserror::Error;
use tracing::instrument;

use casecrafters_core::{CaseColor, CurrencyCode, OrderId, Price};

use crate::models::{Address, OrderProjection};

pub use assets::{Asset, AssetLoader, HttpAssetLoader};

/// Band color when the configuration has no color.
const NEUTRAL_BAND: [u8; 3] = [24, 24, 27];

/// Errors from receipt rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("PDF generation failed: {0}")]
    Pdf(String),

    #[error("render task failed: {0}")]
    Task(String),
}

/// What a receipt shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub order_id: OrderId,
    pub case_color: Option<CaseColor>,
    pub image_urls: Vec<String>,
    pub lines: Vec<String>,
}

impl Receipt {
    /// Build the receipt for a paid order.
    ///
    /// Unknown stored option values are shown as-is rather than failing the
    /// download.
    #[must_use]
    pub fn from_projection(projection: &OrderProjection, currency: CurrencyCode) -> Self {
        let order = &projection.order;
        let configuration = &projection.configuration;

        let option = |label: &str, value: Option<String>| {
            format!("{label}: {}", value.unwrap_or_else(|| "-".to_string()))
        };
        let model = configuration
            .phone_model()
            .ok()
            .flatten()
            .map(|m| m.label().to_string())
            .or_else(|| configuration.model.clone());
        let color = configuration
            .case_color()
            .ok()
            .flatten()
            .map(|c| c.label().to_string())
            .or_else(|| configuration.color.clone());
        let price_options = configuration.price_options().ok();

        let mut lines = vec![
            format!("Order {}", order.id),
            format!("Placed {}", order.created_at.format("%d %b %Y")),
            option("Model", model),
            option("Color", color),
            option(
                "Material",
                price_options.map(|o| o.material.label().to_string()),
            ),
            option("Finish", price_options.map(|o| o.finish.label().to_string())),
            format!("Total: {}", Price::new(order.amount, currency).display_code()),
            format!("Status: {}", order.status.label()),
        ];
        if let Some(address) = &projection.shipping_address {
            lines.push(String::new());
            lines.push("Ship to".to_string());
            lines.extend(address_lines(address));
        }

        let mut image_urls = vec![configuration.image_url.clone()];
        if let Some(cropped) = &configuration.cropped_image_url {
            image_urls.insert(0, cropped.clone());
        }

        Self {
            order_id: order.id,
            case_color: configuration.case_color().ok().flatten(),
            image_urls,
            lines,
        }
    }

    /// Download filename.
    #[must_use]
    pub fn filename(&self) -> String {
        format!("CaseCrafters_Order_{}.pdf", self.order_id)
    }
}

fn address_lines(address: &Address) -> Vec<String> {
    let mut lines = vec![address.name.clone(), address.street.clone()];
    let city = match &address.state {
        Some(state) => format!("{} {}, {state}", address.postal_code, address.city),
        None => format!("{} {}", address.postal_code, address.city),
    };
    lines.push(city);
    lines.push(address.country.clone());
    lines
}

/// A rendered receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Render `receipt` to a PDF.
///
/// # Errors
///
/// Returns `RenderError` if rasterization or PDF generation fails. Image
/// load failures are not errors; they render as placeholders.
#[instrument(skip_all, fields(order_id = %receipt.order_id))]
pub async fn render_receipt<L: AssetLoader>(
    loader: &L,
    receipt: &Receipt,
    load_timeout: Duration,
) -> Result<ReceiptFile, RenderError> {
    let assets = assets::preload_all(loader, &receipt.image_urls, load_timeout).await;
    let failed = assets.iter().filter(|a| !a.is_loaded()).count();
    if failed > 0 {
        tracing::info!(failed, "Rendering receipt with placeholder images");
    }

    let band = receipt.case_color.map_or(NEUTRAL_BAND, CaseColor::rgb);
    let lines = receipt.lines.clone();
    let filename = receipt.filename();
    let title = filename.trim_end_matches(".pdf").replace('_', " ");

    let bytes = tokio::task::spawn_blocking(move || {
        let composite = raster::compose(band, &assets, &lines);
        let placement = layout::fit_on_a4(composite.image.width(), composite.image.height());
        pdf::write_pdf(&composite, &placement, &title)
    })
    .await
    .map_err(|e| RenderError::Task(e.to_string()))??;

    Ok(ReceiptFile { filename, bytes })
}
