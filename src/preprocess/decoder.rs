//! Image decoding collaborators
//!
//! Decoding and resizing are delegated to an [`ImageDecoder`]. The default
//! implementation uses the `image` crate; tests and embedders can plug in
//! their own.

use image::imageops::FilterType;

use crate::error::{LiteCnnError, LiteCnnResult};
use crate::tensor::checked_element_count;

/// Interleaved RGB8 pixels, row-major, `height × width × 3`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbPixels {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl RgbPixels {
    pub fn new(width: usize, height: usize, data: Vec<u8>) -> LiteCnnResult<Self> {
        let pixels = RgbPixels {
            width,
            height,
            data,
        };
        pixels.validate()?;
        Ok(pixels)
    }

    /// Check that `data` holds exactly `height × width × 3` bytes
    ///
    /// The fields are public, so consumers re-check before indexing.
    pub fn validate(&self) -> LiteCnnResult<()> {
        let expected = checked_element_count(&[self.height, self.width, 3])?;
        if self.data.len() != expected {
            return Err(LiteCnnError::InvalidTensorShape(format!(
                "RGB buffer of {}x{} needs {} bytes, got {}",
                self.width,
                self.height,
                expected,
                self.data.len()
            )));
        }
        Ok(())
    }

    /// Every pixel set to `rgb`
    pub fn filled(width: usize, height: usize, rgb: [u8; 3]) -> Self {
        RgbPixels {
            width,
            height,
            data: rgb.repeat(width * height),
        }
    }
}

/// Decode encoded image bytes and resize to `size × size` RGB8
pub trait ImageDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8], size: usize) -> LiteCnnResult<RgbPixels>;
}

/// [`ImageDecoder`] backed by the `image` crate with bilinear resizing
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCrateDecoder;

impl ImageDecoder for ImageCrateDecoder {
    fn decode(&self, bytes: &[u8], size: usize) -> LiteCnnResult<RgbPixels> {
        if bytes.is_empty() {
            return Err(LiteCnnError::ImageDecodeFailed("empty image payload".to_string()));
        }
        let side = u32::try_from(size)
            .ok()
            .filter(|&s| s > 0)
            .ok_or_else(|| {
                LiteCnnError::InvalidConfiguration(format!("invalid image size {}", size))
            })?;

        let decoded = image::load_from_memory(bytes)
            .map_err(|e| LiteCnnError::ImageDecodeFailed(e.to_string()))?;
        tracing::debug!(
            "Decoded {}x{} image, resizing to {}x{}",
            decoded.width(),
            decoded.height(),
            side,
            side
        );

        let rgb = decoded.to_rgb8();
        let resized = image::imageops::resize(&rgb, side, side, FilterType::Triangle);
        RgbPixels::new(size, size, resized.into_raw())
    }
}
