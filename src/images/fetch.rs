//! Image download and decoding
//!
//! The provider hands back a URL; the image itself is fetched with a plain
//! GET, read into memory up to a size limit and decoded.

use std::io::Cursor;
use std::path::Path;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use image::{DynamicImage, ImageFormat};
use reqwest::Client;
use tracing::debug;

use crate::error::GenerationError;

/// A decoded, displayable image
#[derive(Debug, Clone)]
pub struct Bitmap {
    image: DynamicImage,
}

impl Bitmap {
    /// Decode raw image bytes (PNG, JPEG or WebP)
    pub fn decode(bytes: &[u8]) -> Result<Self, GenerationError> {
        let image = image::load_from_memory(bytes)?;
        Ok(Self { image })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Re-encode as PNG
    pub fn to_png(&self) -> Result<Vec<u8>, GenerationError> {
        let mut buf = Cursor::new(Vec::new());
        self.image.write_to(&mut buf, ImageFormat::Png)?;
        Ok(buf.into_inner())
    }

    /// PNG data URI for embedding in the page
    pub fn to_data_uri(&self) -> Result<String, GenerationError> {
        Ok(format!("data:image/png;base64,{}", BASE64.encode(self.to_png()?)))
    }

    /// Save as PNG
    pub fn save_png(&self, path: &Path) -> Result<(), image::ImageError> {
        self.image.save_with_format(path, ImageFormat::Png)
    }
}

impl From<DynamicImage> for Bitmap {
    fn from(image: DynamicImage) -> Self {
        Self { image }
    }
}

/// Downloads generated images
#[derive(Debug, Clone)]
pub struct ImageFetcher {
    client: Client,
    max_bytes: u64,
}

impl ImageFetcher {
    /// Create a fetcher with the given request timeout and body size limit
    pub fn new(timeout: Duration, max_bytes: u64) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GenerationError::Transport(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client, max_bytes })
    }

    fn too_large(&self, size: u64) -> GenerationError {
        GenerationError::Transport(format!(
            "image too large: {} bytes (limit {})",
            size, self.max_bytes
        ))
    }

    /// Download from URL and decode
    pub async fn fetch(&self, url: &str) -> Result<Bitmap, GenerationError> {
        debug!("Downloading image from: {}", url);

        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| GenerationError::Transport(format!("failed to fetch image: {}", e)))?;

        if !response.status().is_success() {
            return Err(GenerationError::Transport(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        if let Some(length) = response.content_length() {
            if length > self.max_bytes {
                return Err(self.too_large(length));
            }
        }

        // Chunked bodies carry no length up front
        let mut data = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| GenerationError::Transport(format!("failed to read image bytes: {}", e)))?
        {
            let size = (data.len() + chunk.len()) as u64;
            if size > self.max_bytes {
                return Err(self.too_large(size));
            }
            data.extend_from_slice(&chunk);
        }

        debug!("Downloaded {} bytes", data.len());
        Bitmap::decode(&data)
    }
}
