//! Image retrieval module
//!
//! Provides:
//! - Download of provider-hosted images
//! - Decoding into displayable bitmaps

mod fetch;

pub use fetch::{Bitmap, ImageFetcher};
