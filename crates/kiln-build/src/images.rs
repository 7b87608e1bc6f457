//! Raster image conversion to AVIF.

use std::path::Path;

use image::codecs::avif::AvifEncoder;
use image::{DynamicImage, ImageReader};

use crate::builder::BuildError;
use crate::files::write_file;

/// Re-encodes JPEG/PNG images as AVIF at a fixed quality.
#[derive(Debug, Clone, Copy)]
pub struct ImageConverter {
    quality: u8,
    speed: u8,
}

impl ImageConverter {
    pub fn new(quality: u8, speed: u8) -> Self {
        Self { quality, speed }
    }

    /// Decode `input` and encode it to AVIF bytes.
    pub fn encode(&self, input: &Path) -> Result<Vec<u8>, BuildError> {
        let image_error = |message: String| BuildError::ImageError {
            path: input.display().to_string(),
            message,
        };

        let img = ImageReader::open(input)
            .map_err(|e| BuildError::read(input, e))?
            .with_guessed_format()
            .map_err(|e| BuildError::read(input, e))?
            .decode()
            .map_err(|e| image_error(format!("decode failed: {}", e)))?;

        // The encoder only takes 8-bit RGB(A).
        let img = if img.color().has_alpha() {
            DynamicImage::ImageRgba8(img.to_rgba8())
        } else {
            DynamicImage::ImageRgb8(img.to_rgb8())
        };

        let mut encoded = Vec::new();
        let encoder = AvifEncoder::new_with_speed_quality(&mut encoded, self.speed, self.quality);
        img.write_with_encoder(encoder)
            .map_err(|e| image_error(format!("AVIF encode failed: {}", e)))?;

        Ok(encoded)
    }

    /// Convert `input` and write the result to `output`.
    ///
    /// The file is encoded fully in memory first, so a failed conversion
    /// leaves no partial output behind.
    pub fn convert(&self, input: &Path, output: &Path) -> Result<(), BuildError> {
        let encoded = self.encode(input)?;
        write_file(output, encoded)
    }
}

impl Default for ImageConverter {
    fn default() -> Self {
        Self::new(50, 6)
    }
}
