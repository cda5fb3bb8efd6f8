//! Shared builders for synthetic test images.
//!
//! Compiled for unit tests and, behind the `test-utils` feature, for the
//! integration tests under `tests/`.

use crate::core_modules::raster::Raster;
use image::ImageFormat;
use std::io::Cursor;

/// Background level of the synthetic scenes.
pub const BACKGROUND: f32 = 0.1;
/// Plate body level.
pub const PLATE: f32 = 0.95;
/// Glyph level inside the plate.
pub const GLYPH: f32 = 0.15;

/// Encode a single-channel raster as PNG bytes, as a camera file would arrive.
pub fn encode_png(raster: &Raster) -> Vec<u8> {
    let img = raster.to_gray_image().expect("single-channel raster");
    let mut bytes = Cursor::new(Vec::new());
    img.write_to(&mut bytes, ImageFormat::Png).expect("png encoding");
    bytes.into_inner()
}

/// Render a dark scene holding one bright plate with dark glyph bars.
///
/// The plate covers `[x0, x0 + w) x [y0, y0 + h)`; glyphs are vertical bars
/// inset from the plate border.
pub fn plate_scene(width: u32, height: u32, x0: u32, y0: u32, w: u32, h: u32) -> Raster {
    Raster::from_fn(width, height, |x, y| {
        let in_plate = (x0..x0 + w).contains(&x) && (y0..y0 + h).contains(&y);
        if !in_plate {
            return BACKGROUND;
        }
        let (px, py) = (x - x0, y - y0);
        let in_glyph_band = py >= h / 4 && py < h - h / 4 && px >= 6 && px < w - 6;
        if in_glyph_band && (px / 4) % 2 == 0 { GLYPH } else { PLATE }
    })
    .expect("valid scene dimensions")
}

/// Fill `[x0, x0 + w) x [y0, y0 + h)` with `value`, clipped to the raster.
pub fn paint_rect(raster: &mut Raster, x0: u32, y0: u32, w: u32, h: u32, value: f32) {
    for y in y0..(y0 + h).min(raster.height()) {
        for x in x0..(x0 + w).min(raster.width()) {
            raster.set(x, y, value);
        }
    }
}
