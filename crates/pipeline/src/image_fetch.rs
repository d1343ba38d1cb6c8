//! Lead image retrieval.

use async_trait::async_trait;
use image::RgbImage;

#[derive(Debug, thiserror::Error)]
pub enum ImageFetchError {
    #[error("image request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {status} when fetching {url}")]
    Status { status: u16, url: String },

    #[error("could not decode image: {0}")]
    Decode(String),
}

/// Resolves an image reference into decoded RGB pixels.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<RgbImage, ImageFetchError>;
}

/// Downloads images over HTTP(S).
#[derive(Clone, Default)]
pub struct HttpImageFetcher {
    client: reqwest::Client,
}

impl HttpImageFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<RgbImage, ImageFetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ImageFetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let bytes = response.bytes().await?;
        tracing::debug!(%url, bytes = bytes.len(), "Downloaded image");

        tokio::task::spawn_blocking(move || decode(&bytes))
            .await
            .map_err(|e| ImageFetchError::Decode(format!("decoder task failed: {e}")))?
    }
}

/// Decode any supported format into 8-bit RGB.
pub fn decode(bytes: &[u8]) -> Result<RgbImage, ImageFetchError> {
    let image = image::load_from_memory(bytes).map_err(|e| ImageFetchError::Decode(e.to_string()))?;
    if image.width() == 0 || image.height() == 0 {
        return Err(ImageFetchError::Decode("image has no pixels".into()));
    }
    Ok(image.to_rgb8())
}
