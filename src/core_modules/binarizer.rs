// THEORY:
// The `Binarizer` turns a grayscale raster into a two-level raster. It is the
// simplest stage of the pipeline and the only one that looks at absolute
// intensity: every later stage works purely on the on/off structure it leaves
// behind.
//
// Boundary convention: a pixel is "on" only when its intensity is strictly
// greater than the threshold. A pixel sitting exactly on the threshold is "off".

use crate::core_modules::raster::{OFF, ON, Raster, Sample};
use crate::error::PipelineError;

/// Default binarization threshold.
pub const DEFAULT_THRESHOLD: Sample = 0.5;

/// Checks that `threshold` lies in the open interval (0, 1).
pub fn validate_threshold(threshold: Sample) -> Result<(), PipelineError> {
    if threshold > 0.0 && threshold < 1.0 {
        Ok(())
    } else {
        Err(PipelineError::InvalidConfig(format!(
            "threshold must lie in (0, 1), got {threshold}"
        )))
    }
}

/// Thresholds a grayscale raster in place and hands it back as a binary raster.
pub fn binarize(mut raster: Raster, threshold: Sample) -> Result<Raster, PipelineError> {
    validate_threshold(threshold)?;
    raster.ensure_single_channel("binarizer")?;

    for sample in raster.data_mut() {
        *sample = if *sample > threshold { ON } else { OFF };
    }
    Ok(raster)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_at_threshold_is_off() {
        let raster = Raster::from_gray(3, 1, vec![0.5, 0.500_001, 0.499_999]).unwrap();
        let binary = binarize(raster, 0.5).unwrap();
        assert_eq!(binary.data(), &[OFF, ON, OFF]);
    }

    #[test]
    fn two_bands_split_on_the_threshold() {
        // Left half dark, right half bright, with the boundary column exactly at t.
        let t = 0.4;
        let raster = Raster::from_fn(9, 3, |x, _| match x {
            0..=3 => 0.1,
            4 => t,
            _ => 0.9,
        })
        .unwrap();
        let binary = binarize(raster, t).unwrap();
        for y in 0..3 {
            for x in 0..9 {
                assert_eq!(binary.is_on(x, y), x > 4, "pixel ({x},{y})");
            }
        }
    }

    #[test]
    fn threshold_must_be_open_interval() {
        for t in [0.0, 1.0, -0.2, 1.5] {
            let raster = Raster::zeroed(2, 2).unwrap();
            assert!(matches!(binarize(raster, t), Err(PipelineError::InvalidConfig(_))));
        }
    }

    #[test]
    fn rejects_multichannel_input() {
        let rgb = Raster::new(2, 1, 3, vec![0.9; 6]).unwrap();
        assert!(matches!(binarize(rgb, 0.5), Err(PipelineError::InvalidRaster(_))));
    }
}
