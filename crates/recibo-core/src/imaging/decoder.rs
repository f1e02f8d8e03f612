//! Raw bytes to decoded image.

use std::io::Cursor;

use image::{DynamicImage, GenericImageView, ImageError, ImageReader, Limits};
use tracing::debug;

use crate::error::DecodeError;
use crate::models::config::ImageConfig;

/// Decodes uploaded bytes into an in-memory image.
#[derive(Debug, Clone)]
pub struct ImageDecoder {
    max_dimension: u32,
}

impl ImageDecoder {
    /// Create a decoder with default limits.
    pub fn new() -> Self {
        Self::from_config(&ImageConfig::default())
    }

    pub fn from_config(config: &ImageConfig) -> Self {
        Self {
            max_dimension: config.max_dimension,
        }
    }

    /// Set the maximum accepted width or height.
    pub fn with_max_dimension(mut self, max_dimension: u32) -> Self {
        self.max_dimension = max_dimension;
        self
    }

    /// Decode `bytes`, sniffing the container format from its contents.
    pub fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, DecodeError> {
        if bytes.is_empty() {
            return Err(DecodeError::Empty);
        }

        let mut reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| DecodeError::Corrupt(e.to_string()))?;

        let format = reader.format().ok_or(DecodeError::UnsupportedFormat)?;

        let mut limits = Limits::default();
        limits.max_image_width = Some(self.max_dimension);
        limits.max_image_height = Some(self.max_dimension);
        reader.limits(limits);

        let image = reader.decode().map_err(|e| match e {
            ImageError::Unsupported(_) => DecodeError::UnsupportedFormat,
            ImageError::Limits(err) => DecodeError::TooLarge(err.to_string()),
            other => DecodeError::Corrupt(other.to_string()),
        })?;

        let (width, height) = image.dimensions();
        debug!(?format, width, height, "Decoded image");

        Ok(image)
    }
}

impl Default for ImageDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| Rgb([(x * 7) as u8, (y * 3) as u8, 90]));
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn test_decodes_png() {
        let image = ImageDecoder::new().decode(&png_bytes(40, 20)).unwrap();
        assert_eq!(image.dimensions(), (40, 20));
    }

    #[test]
    fn test_rejects_empty_payload() {
        assert!(matches!(ImageDecoder::new().decode(&[]), Err(DecodeError::Empty)));
    }

    #[test]
    fn test_rejects_text_payload() {
        let err = ImageDecoder::new().decode(b"%PDF-1.4 definitely not an image").unwrap_err();
        assert!(matches!(err, DecodeError::UnsupportedFormat));
    }

    #[test]
    fn test_rejects_truncated_png() {
        let bytes = png_bytes(64, 64);
        let truncated = &bytes[..bytes.len() / 2];
        let err = ImageDecoder::new().decode(truncated).unwrap_err();
        assert!(matches!(err, DecodeError::Corrupt(_)));
    }

    #[test]
    fn test_enforces_dimension_limit() {
        let decoder = ImageDecoder::new().with_max_dimension(16);
        let err = decoder.decode(&png_bytes(32, 8)).unwrap_err();
        assert!(matches!(err, DecodeError::TooLarge(_)));
    }
}
