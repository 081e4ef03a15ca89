use super::{ImageService, ResizedImage};
use crate::models::{ResizeOptions, MAX_DIMENSION};
use crate::{Error, Result};
use async_trait::async_trait;
use base64::Engine as _;
use image::imageops::FilterType;
use image::DynamicImage;
use std::io::Cursor;

#[derive(Debug, Default, Clone, Copy)]
pub struct ImageProcessor;

impl ImageProcessor {
    pub fn new() -> Self {
        Self
    }

    fn scale(image: &DynamicImage, options: &ResizeOptions) -> DynamicImage {
        match options.height {
            Some(height) => image.resize_exact(options.width, height, FilterType::Lanczos3),
            None => image.resize(options.width, MAX_DIMENSION, FilterType::Lanczos3),
        }
    }

    fn resize_sync(image_data: Vec<u8>, options: ResizeOptions) -> Result<ResizedImage> {
        let source = image::load_from_memory(&image_data)?;
        let resized = Self::scale(&source, &options);

        // JPEG has no alpha channel
        let resized = match options.format.image_format() {
            image::ImageFormat::Jpeg => DynamicImage::ImageRgb8(resized.to_rgb8()),
            _ => resized,
        };

        let mut encoded = Vec::new();
        resized.write_to(&mut Cursor::new(&mut encoded), options.format.image_format())?;

        Ok(ResizedImage {
            content_type: options.format.content_type().to_string(),
            width: resized.width(),
            height: resized.height(),
            source_width: source.width(),
            source_height: source.height(),
            data: base64::engine::general_purpose::STANDARD.encode(&encoded),
        })
    }
}

#[async_trait]
impl ImageService for ImageProcessor {
    async fn resize(&self, image_data: &[u8], options: &ResizeOptions) -> Result<ResizedImage> {
        tracing::debug!(
            "Resizing image ({} bytes) to width {} height {:?}",
            image_data.len(),
            options.width,
            options.height
        );

        tokio::task::spawn_blocking({
            let image_data = image_data.to_vec();
            let options = *options;
            move || Self::resize_sync(image_data, options)
        })
        .await
        .map_err(|e| Error::Invariant(format!("Image processing task join error: {}", e)))?
    }
}
