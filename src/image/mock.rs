use super::{ImageService, ResizedImage};
use crate::models::ResizeOptions;
use crate::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

pub struct MockImageProcessor {
    resize_count: Arc<Mutex<usize>>,
    data: String,
    should_fail: Arc<Mutex<bool>>,
}

impl MockImageProcessor {
    pub fn new() -> Self {
        Self {
            resize_count: Arc::new(Mutex::new(0)),
            data: "bW9jaw==".to_string(),
            should_fail: Arc::new(Mutex::new(false)),
        }
    }

    pub fn with_data(mut self, data: String) -> Self {
        self.data = data;
        self
    }

    pub fn with_failure(self, should_fail: bool) -> Self {
        *self.should_fail.lock().unwrap() = should_fail;
        self
    }

    pub fn get_resize_count(&self) -> usize {
        *self.resize_count.lock().unwrap()
    }
}

impl Default for MockImageProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageService for MockImageProcessor {
    async fn resize(&self, _image_data: &[u8], options: &ResizeOptions) -> Result<ResizedImage> {
        *self.resize_count.lock().unwrap() += 1;

        if *self.should_fail.lock().unwrap() {
            return Err(crate::Error::Image(image::ImageError::IoError(
                std::io::Error::other("Mock failure"),
            )));
        }

        Ok(ResizedImage {
            content_type: options.format.content_type().to_string(),
            width: options.width,
            height: options.height.unwrap_or(options.width),
            source_width: options.width.saturating_mul(2),
            source_height: options.height.unwrap_or(options.width).saturating_mul(2),
            data: self.data.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_image_processor() {
        let processor = MockImageProcessor::new();

        let result = processor
            .resize(b"fake image data", &ResizeOptions::default())
            .await
            .unwrap();

        assert_eq!(result.width, 100);
        assert_eq!(result.content_type, "image/png");
        assert_eq!(result.data, "bW9jaw==");
        assert_eq!(processor.get_resize_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_with_custom_data() {
        let processor = MockImageProcessor::new().with_data("AAAA".to_string());

        let result = processor
            .resize(b"data", &ResizeOptions::default())
            .await
            .unwrap();
        assert_eq!(result.data, "AAAA");
    }

    #[tokio::test]
    async fn test_mock_handles_extreme_dimensions() {
        let processor = MockImageProcessor::new();
        let options = ResizeOptions {
            width: u32::MAX,
            height: None,
            ..ResizeOptions::default()
        };

        let result = processor.resize(b"data", &options).await.unwrap();
        assert_eq!(result.source_width, u32::MAX);
        assert_eq!(result.source_height, u32::MAX);
    }

    #[tokio::test]
    async fn test_mock_with_failure() {
        let processor = MockImageProcessor::new().with_failure(true);

        let result = processor.resize(b"data", &ResizeOptions::default()).await;
        assert!(result.is_err());
        assert_eq!(processor.get_resize_count(), 1);
    }
}
