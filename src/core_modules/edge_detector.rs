// THEORY:
// The `EdgeDetector` reduces the binary raster to the outlines of its regions
// using the Canny operator from `imageproc`. A licence plate is a bright
// rectangle full of dark glyphs, so after binarization it shows up as a dense
// cluster of short outlines; the dilation stage later fuses those outlines into
// one blob.
//
// Algorithm steps:
// 1.  **Noise Reduction** (optional): a Gaussian pass with sigma 1.4, the 5x5
//     kernel with weights summing to 159, removes isolated specks left by the
//     binarizer.
// 2.  **Canny**: `imageproc::edges::canny` smooths once more, takes 3x3 Sobel
//     gradients, suppresses non-maxima across the quantized gradient direction
//     and links weak pixels to strong ones by hysteresis.
// 3.  **Relative Thresholds**: the hysteresis thresholds are configured as
//     fractions of the strongest gradient in the raster. The peak is measured
//     on the same smoothed Sobel response `canny` computes, then scaled into the
//     absolute thresholds it expects.
//
// Border policy (observable for regions touching the frame):
// - blur and Sobel replicate the nearest in-bounds pixel (clamp to edge), so a
//   region running into the border has no gradient across the border;
// - the outermost row and column never become edge pixels.

use crate::core_modules::raster::{Raster, Sample};
use crate::error::PipelineError;
use image::GrayImage;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::gradients::{horizontal_sobel, vertical_sobel};
use serde::{Deserialize, Serialize};

/// Standard deviation of the optional noise-reduction pass.
pub const NOISE_SIGMA: f32 = 1.4;

/// Smoothing applied inside `imageproc::edges::canny` before its gradients.
const CANNY_SIGMA: f32 = 1.4;

/// Tuning for the Canny operator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CannyConfig {
    /// Run a Gaussian blur before edge detection.
    pub reduce_noise: bool,
    /// Weak-edge threshold as a fraction of the strongest gradient.
    pub low_ratio: Sample,
    /// Strong-edge threshold as a fraction of the strongest gradient.
    pub high_ratio: Sample,
}

impl Default for CannyConfig {
    fn default() -> Self {
        Self {
            reduce_noise: true,
            low_ratio: 0.1,
            high_ratio: 0.3,
        }
    }
}

impl CannyConfig {
    pub fn validate(&self) -> Result<(), PipelineError> {
        let ordered = self.low_ratio > 0.0 && self.low_ratio <= self.high_ratio && self.high_ratio <= 1.0;
        if ordered {
            Ok(())
        } else {
            Err(PipelineError::InvalidConfig(format!(
                "canny ratios must satisfy 0 < low <= high <= 1, got low={} high={}",
                self.low_ratio, self.high_ratio
            )))
        }
    }
}

/// Runs the full edge operator and returns a binary edge raster.
pub fn detect_edges(raster: Raster, config: &CannyConfig) -> Result<Raster, PipelineError> {
    config.validate()?;
    let mut gray = raster.to_gray_image()?;
    let (width, height) = gray.dimensions();
    drop(raster);

    if config.reduce_noise {
        gray = gaussian_blur_f32(&gray, NOISE_SIGMA);
    }

    let peak = peak_gradient(&gray);
    if peak <= 0.0 {
        tracing::trace!("no gradient in raster, edge map is empty");
        return Raster::zeroed(width, height);
    }
    let (low, high) = (config.low_ratio * peak, config.high_ratio * peak);
    tracing::trace!(peak, low, high, "hysteresis thresholds");

    Raster::from_gray_image(&canny(&gray, low, high))
}

/// Strongest Sobel magnitude of `gray` after the smoothing `canny` applies.
fn peak_gradient(gray: &GrayImage) -> f32 {
    let smoothed = gaussian_blur_f32(gray, CANNY_SIGMA);
    let gx = horizontal_sobel(&smoothed);
    let gy = vertical_sobel(&smoothed);
    gx.pixels()
        .zip(gy.pixels())
        .map(|(h, v)| (h[0] as f32).hypot(v[0] as f32))
        .fold(0.0, f32::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::raster::{OFF, ON};

    const SHARP: CannyConfig = CannyConfig {
        reduce_noise: false,
        low_ratio: 0.1,
        high_ratio: 0.3,
    };

    fn filled_rect(width: u32, height: u32, x0: u32, y0: u32, x1: u32, y1: u32) -> Raster {
        Raster::from_fn(width, height, |x, y| {
            if (x0..x1).contains(&x) && (y0..y1).contains(&y) { ON } else { OFF }
        })
        .unwrap()
    }

    /// Chebyshev distance from (x, y) to the outline of the half-open rectangle.
    fn distance_to_outline(x: u32, y: u32, x0: u32, y0: u32, x1: u32, y1: u32) -> u32 {
        let (x, y) = (x as i64, y as i64);
        let (x0, y0, x1, y1) = (x0 as i64, y0 as i64, x1 as i64, y1 as i64);
        let inside_x = x >= x0 && x < x1;
        let inside_y = y >= y0 && y < y1;
        let dx = (x - x0).abs().min((x - x1).abs());
        let dy = (y - y0).abs().min((y - y1).abs());
        let d = if inside_x && inside_y {
            dx.min(dy)
        } else if inside_x {
            dy
        } else if inside_y {
            dx
        } else {
            dx.max(dy)
        };
        d as u32
    }

    fn assert_edges_near_outline(edges: &Raster, rect: (u32, u32, u32, u32), tolerance: u32) {
        let (x0, y0, x1, y1) = rect;
        for y in 0..edges.height() {
            for x in 0..edges.width() {
                if edges.is_on(x, y) {
                    assert!(
                        distance_to_outline(x, y, x0, y0, x1, y1) <= tolerance,
                        "stray edge at ({x},{y})"
                    );
                }
            }
        }
    }

    #[test]
    fn uniform_raster_has_no_edges() {
        for fill in [OFF, ON] {
            let raster = Raster::from_fn(16, 16, |_, _| fill).unwrap();
            let edges = detect_edges(raster, &CannyConfig::default()).unwrap();
            assert_eq!(edges.count_on(), 0);
            assert_eq!((edges.width(), edges.height()), (16, 16));
        }
    }

    #[test]
    fn rectangle_outline_is_found_on_every_side() {
        let rect = (20, 20, 40, 40);
        let edges = detect_edges(filled_rect(64, 64, rect.0, rect.1, rect.2, rect.3), &SHARP).unwrap();

        assert!(edges.is_on(30, 19) || edges.is_on(30, 20), "top side");
        assert!(edges.is_on(30, 39) || edges.is_on(30, 40), "bottom side");
        assert!(edges.is_on(19, 30) || edges.is_on(20, 30), "left side");
        assert!(edges.is_on(39, 30) || edges.is_on(40, 30), "right side");
        assert!(!edges.is_on(30, 30), "interior stays off");
        assert_edges_near_outline(&edges, rect, 2);
    }

    #[test]
    fn edge_output_is_binary() {
        let edges = detect_edges(filled_rect(32, 32, 8, 8, 24, 24), &SHARP).unwrap();
        assert!(edges.data().iter().all(|&v| v == OFF || v == ON));
    }

    #[test]
    fn noise_reduction_keeps_edges_near_the_outline() {
        let rect = (12, 10, 44, 30);
        let edges = detect_edges(filled_rect(56, 40, rect.0, rect.1, rect.2, rect.3), &CannyConfig::default()).unwrap();

        assert!(edges.count_on() > 0);
        assert_edges_near_outline(&edges, rect, 4);
    }

    #[test]
    fn region_touching_the_border_has_no_border_edge() {
        // Left half on: only the interior step between x = 7 and x = 8 produces edges.
        let raster = Raster::from_fn(16, 8, |x, _| if x < 8 { ON } else { OFF }).unwrap();
        let edges = detect_edges(raster, &SHARP).unwrap();

        assert!(edges.count_on() > 0);
        for y in 0..8 {
            for x in 0..16 {
                if edges.is_on(x, y) {
                    assert!((6..=9).contains(&x), "edge away from the step at ({x},{y})");
                }
            }
            assert!(!edges.is_on(0, y) && !edges.is_on(15, y), "border column on in row {y}");
        }
    }

    #[test]
    fn detection_is_deterministic() {
        let raster = filled_rect(48, 32, 5, 7, 30, 20);
        let first = detect_edges(raster.clone(), &CannyConfig::default()).unwrap();
        let second = detect_edges(raster, &CannyConfig::default()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn thresholds_scale_with_the_input() {
        // A faint and a full-contrast copy of the same shape give the same edges.
        let faint = Raster::from_fn(40, 30, |x, y| {
            if (10..30).contains(&x) && (8..22).contains(&y) { 0.4 } else { 0.0 }
        })
        .unwrap();
        let strong = filled_rect(40, 30, 10, 8, 30, 22);

        let faint_edges = detect_edges(faint, &SHARP).unwrap();
        let strong_edges = detect_edges(strong, &SHARP).unwrap();
        assert!(faint_edges.count_on() > 0);
        assert_edges_near_outline(&faint_edges, (10, 8, 30, 22), 2);
        assert_edges_near_outline(&strong_edges, (10, 8, 30, 22), 2);
    }

    #[test]
    fn rejects_inverted_ratios() {
        let config = CannyConfig {
            low_ratio: 0.5,
            high_ratio: 0.2,
            ..CannyConfig::default()
        };
        let raster = Raster::zeroed(4, 4).unwrap();
        assert!(matches!(detect_edges(raster, &config), Err(PipelineError::InvalidConfig(_))));
    }

    #[test]
    fn multi_channel_input_is_rejected() {
        let rgb = Raster::new(4, 4, 3, vec![0.0; 48]).unwrap();
        assert!(matches!(detect_edges(rgb, &SHARP), Err(PipelineError::InvalidRaster(_))));
    }
}
