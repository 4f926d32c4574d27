//! Pixel buffer → normalized network input

pub mod decoder;

pub use decoder::{ImageCrateDecoder, ImageDecoder, RgbPixels};

use crate::error::LiteCnnResult;
use crate::tensor::Tensor;

/// Side length the network was trained on
pub const DEFAULT_IMAGE_SIZE: usize = 224;

/// ImageNet per-channel mean (RGB)
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
/// ImageNet per-channel standard deviation (RGB)
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Convert interleaved RGB8 into a `[1, 3, H, W]` tensor
///
/// Each value becomes `(pixel / 255 − mean[c]) / std[c]`. A buffer whose
/// length disagrees with `width × height × 3` is rejected.
pub fn pixels_to_tensor(pixels: &RgbPixels) -> LiteCnnResult<Tensor> {
    pixels.validate()?;
    let (h, w) = (pixels.height, pixels.width);
    let plane = h * w;
    let mut data = vec![0.0f32; 3 * plane];

    for (i, rgb) in pixels.data.chunks_exact(3).enumerate() {
        for c in 0..3 {
            let v = rgb[c] as f32 / 255.0;
            data[c * plane + i] = (v - IMAGENET_MEAN[c]) / IMAGENET_STD[c];
        }
    }

    Tensor::from_vec(&[1, 3, h, w], data)
}

/// Decode, resize to `size × size` and normalize
pub fn preprocess_image(
    bytes: &[u8],
    decoder: &dyn ImageDecoder,
    size: usize,
) -> LiteCnnResult<Tensor> {
    let pixels = decoder.decode(bytes, size)?;
    pixels_to_tensor(&pixels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LiteCnnError;

    struct FixedDecoder(RgbPixels);

    impl ImageDecoder for FixedDecoder {
        fn decode(&self, _bytes: &[u8], _size: usize) -> LiteCnnResult<RgbPixels> {
            Ok(self.0.clone())
        }
    }

    struct FailingDecoder;

    impl ImageDecoder for FailingDecoder {
        fn decode(&self, _bytes: &[u8], _size: usize) -> LiteCnnResult<RgbPixels> {
            Err(LiteCnnError::ImageDecodeFailed("corrupt".to_string()))
        }
    }

    #[test]
    fn test_planar_layout_and_normalization() {
        // 2x1 image: left pixel pure red, right pixel black
        let pixels = RgbPixels::new(2, 1, vec![255, 0, 0, 0, 0, 0]).unwrap();
        let t = pixels_to_tensor(&pixels).unwrap();
        assert_eq!(t.shape(), &[1, 3, 1, 2]);

        let red_hi = (1.0 - 0.485) / 0.229;
        let red_lo = (0.0 - 0.485) / 0.229;
        let green_lo = (0.0 - 0.456) / 0.224;
        assert!((t.at(0, 0, 0, 0) - red_hi).abs() < 1e-6);
        assert!((t.at(0, 0, 0, 1) - red_lo).abs() < 1e-6);
        assert!((t.at(0, 1, 0, 0) - green_lo).abs() < 1e-6);
    }

    #[test]
    fn test_hand_built_pixels_with_wrong_length_rejected() {
        let oversized = RgbPixels {
            width: 1,
            height: 1,
            data: vec![0; 6],
        };
        assert!(matches!(
            pixels_to_tensor(&oversized),
            Err(LiteCnnError::InvalidTensorShape(_))
        ));

        let short = RgbPixels {
            width: 2,
            height: 2,
            data: vec![0; 3],
        };
        assert!(pixels_to_tensor(&short).is_err());

        let overflowing = RgbPixels {
            width: usize::MAX,
            height: 2,
            data: Vec::new(),
        };
        assert!(pixels_to_tensor(&overflowing).is_err());
    }

    #[test]
    fn test_preprocess_uses_decoder() {
        let decoder = FixedDecoder(RgbPixels::filled(4, 4, [128, 128, 128]));
        let t = preprocess_image(b"ignored", &decoder, 4).unwrap();
        assert_eq!(t.shape(), &[1, 3, 4, 4]);
    }

    #[test]
    fn test_decode_failure_propagates() {
        let err = preprocess_image(b"x", &FailingDecoder, 4).unwrap_err();
        assert!(matches!(err, LiteCnnError::ImageDecodeFailed(_)));
    }
}
