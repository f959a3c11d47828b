//! Image preloading for receipts.
//!
//! Every image is awaited before rasterizing, and every wait ends: a load
//! either yields a decoded image or a failure (error or timeout).

use std::future::Future;
use std::time::Duration;

use futures::future::join_all;
use image::DynamicImage;
use thiserror::Error;

/// Largest image body we are willing to decode.
const MAX_IMAGE_BYTES: usize = 15 * 1024 * 1024;

/// Default per-image load timeout.
pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(10);

/// Why an image could not be loaded.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("image too large ({0} bytes)")]
    TooLarge(usize),

    #[error("decode error: {0}")]
    Decode(#[from] image::ImageError),

    #[error("decode task failed: {0}")]
    Task(String),

    #[error("timed out")]
    Timeout,
}

/// Outcome of loading one image.
#[derive(Debug)]
pub enum Asset {
    Loaded(DynamicImage),
    Failed { url: String, reason: String },
}

impl Asset {
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }
}

/// Fetches and decodes images.
pub trait AssetLoader: Send + Sync {
    fn load(&self, url: &str) -> impl Future<Output = Result<DynamicImage, AssetError>> + Send;
}

/// Loads images over HTTP.
#[derive(Clone, Default)]
pub struct HttpAssetLoader {
    client: reqwest::Client,
}

impl HttpAssetLoader {
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl AssetLoader for HttpAssetLoader {
    async fn load(&self, url: &str) -> Result<DynamicImage, AssetError> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(AssetError::Status(response.status().as_u16()));
        }

        let bytes = response.bytes().await?;
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(AssetError::TooLarge(bytes.len()));
        }

        tokio::task::spawn_blocking(move || image::load_from_memory(&bytes))
            .await
            .map_err(|e| AssetError::Task(e.to_string()))?
            .map_err(AssetError::from)
    }
}

/// Load every URL concurrently, bounding each load by `timeout`.
///
/// The result has one entry per URL, in the same order.
pub async fn preload_all<L: AssetLoader>(
    loader: &L,
    urls: &[String],
    timeout: Duration,
) -> Vec<Asset> {
    join_all(urls.iter().map(|url| async move {
        let result = match tokio::time::timeout(timeout, loader.load(url)).await {
            Ok(result) => result,
            Err(_) => Err(AssetError::Timeout),
        };

        match result {
            Ok(image) if image.width() > 0 && image.height() > 0 => Asset::Loaded(image),
            Ok(_) => Asset::Failed {
                url: url.clone(),
                reason: "empty image".to_string(),
            },
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Receipt image failed to load");
                Asset::Failed {
                    url: url.clone(),
                    reason: e.to_string(),
                }
            }
        }
    }))
    .await
}
