//! Image resizing engine
//!
//! Decodes an uploaded image, scales it to the requested geometry and
//! re-encodes it for the response body.

pub mod mock;
pub mod processor;

pub use mock::MockImageProcessor;
pub use processor::ImageProcessor;

use crate::models::ResizeOptions;
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Description of a processed image, returned as the success body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResizedImage {
    pub content_type: String,
    pub width: u32,
    pub height: u32,
    pub source_width: u32,
    pub source_height: u32,
    /// Base64-encoded image bytes.
    pub data: String,
}

#[async_trait]
pub trait ImageService: Send + Sync {
    async fn resize(&self, image_data: &[u8], options: &ResizeOptions) -> Result<ResizedImage>;
}
