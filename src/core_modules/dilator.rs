// THEORY:
// The `Dilator` closes the gaps between the edge fragments of a plate. The glyph
// outlines and the plate border are separate thin curves after edge detection;
// growing every "on" pixel outwards a few times merges them into one solid
// blob that the extractor can label as a single component.
//
// One iteration applies the full 3x3 structuring element: a pixel is on when any
// pixel in its 3x3 neighbourhood was on. Out-of-bounds neighbours count as off.
// `k` iterations of the square element are the same as one dilation of radius
// `k` under the Chebyshev (L-infinity) norm, which is what
// `imageproc::morphology::dilate` computes from a distance transform. A pixel
// ends up on exactly when it lies within Chebyshev distance `k` of an on pixel.
//
// Larger `k` bridges wider gaps but coarsens the box and risks fusing
// neighbouring, unrelated regions.

use crate::core_modules::raster::Raster;
use crate::error::PipelineError;
use imageproc::distance_transform::Norm;
use imageproc::morphology;

/// Default number of dilation iterations.
pub const DEFAULT_ITERATIONS: u32 = 12;

/// Largest radius handed to one `morphology::dilate` call. Its distance
/// transform saturates at 255, so a single call must stay below that.
const MAX_RADIUS_PER_CALL: u32 = 254;

/// Dilates a binary raster `iterations` times with a 3x3 square element.
pub fn dilate(raster: Raster, iterations: u32) -> Result<Raster, PipelineError> {
    raster.ensure_single_channel("dilator")?;
    if iterations == 0 || raster.count_on() == 0 {
        tracing::trace!(iterations, "nothing to dilate");
        return Ok(raster);
    }

    let mut mask = raster.to_mask_image()?;
    drop(raster);

    let mut remaining = iterations;
    while remaining > 0 {
        let radius = remaining.min(MAX_RADIUS_PER_CALL);
        mask = morphology::dilate(&mask, Norm::LInf, radius as u8);
        remaining -= radius;
    }
    Raster::from_gray_image(&mask)
}
