// THEORY:
// The `Loader` is the narrow boundary between encoded image bytes and the
// pipeline. Everything about file formats (JPEG, PNG, colour spaces) lives on the
// far side of this boundary, inside the `image` crate. What crosses it is a
// single-channel `Raster` with samples normalized to [0, 1], or an error.
//
// Key architectural principles:
// 1.  **Grayscale at the Door**: the loader owns colour conversion. Downstream
//     stages only ever see one channel.
// 2.  **Distinct Failures**: an empty buffer, an unparseable buffer and a
//     zero-sized image are reported as different errors, and any of them stops
//     the pipeline before the first processing stage runs.
// 3.  **Swappable**: the pipeline is generic over the `Loader` trait, so callers
//     (and tests) can plug in a different decoder without touching the stages.

use crate::core_modules::raster::Raster;
use crate::error::PipelineError;

/// Decodes raw image bytes into a grayscale raster.
pub trait Loader {
    fn load(&self, bytes: &[u8]) -> Result<Raster, PipelineError>;
}

/// Default loader backed by the `image` crate with format auto-detection.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageLoader;

impl Loader for ImageLoader {
    fn load(&self, bytes: &[u8]) -> Result<Raster, PipelineError> {
        if bytes.is_empty() {
            return Err(PipelineError::EmptyInput);
        }
        let decoded = image::load_from_memory(bytes).map_err(PipelineError::Decode)?;
        let gray = decoded.to_luma8();
        let (width, height) = gray.dimensions();
        if width == 0 || height == 0 {
            return Err(PipelineError::InvalidRaster(format!(
                "decoded image has no pixels ({width}x{height})"
            )));
        }

        tracing::debug!(width, height, "decoded image to grayscale");
        Raster::from_gray_image(&gray)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use image::{GrayImage, ImageFormat, Luma, Rgb, RgbImage};
    use std::io::Cursor;

    fn encode_png(image: image::DynamicImage) -> Vec<u8> {
        let mut bytes = Cursor::new(Vec::new());
        image.write_to(&mut bytes, ImageFormat::Png).expect("png encoding");
        bytes.into_inner()
    }

    #[test]
    fn empty_buffer_is_reported() {
        assert!(matches!(ImageLoader.load(&[]), Err(PipelineError::EmptyInput)));
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let result = ImageLoader.load(b"definitely not an image");
        assert!(matches!(result, Err(PipelineError::Decode(_))));
    }

    #[test]
    fn grayscale_png_is_normalized() {
        let mut gray = GrayImage::new(2, 1);
        gray.put_pixel(0, 0, Luma([0]));
        gray.put_pixel(1, 0, Luma([255]));
        let raster = ImageLoader.load(&encode_png(gray.into())).unwrap();

        assert_eq!((raster.width(), raster.height(), raster.channels()), (2, 1, 1));
        assert_relative_eq!(raster.get(0, 0), 0.0);
        assert_relative_eq!(raster.get(1, 0), 1.0);
    }

    #[test]
    fn colour_input_collapses_to_one_channel() {
        let rgb = RgbImage::from_pixel(3, 2, Rgb([255, 255, 255]));
        let raster = ImageLoader.load(&encode_png(rgb.into())).unwrap();
        assert_eq!(raster.channels(), 1);
        assert_eq!(raster.data().len(), 6);
        assert!(raster.data().iter().all(|&v| (v - 1.0).abs() < 1e-6));
    }
}
