// THEORY:
// The `Raster` is the unit of data that flows between the pipeline stages. Like
// the other data modules it is a "dumb" container: a width, a height, a channel
// count and a flat, row-major buffer of `f32` samples normalized to [0, 1].
//
// Key architectural principles:
// 1.  **Valid by Construction**: every constructor checks `width > 0`,
//     `height > 0` and `data.len() == width * height * channels`. A raster that
//     failed to load simply never exists; the loader returns an `Err` instead.
// 2.  **Moved, Not Shared**: each stage takes its input raster by value and
//     hands back a new one. The previous buffer is dropped the moment a stage
//     returns, so no stage can read a released raster.
// 3.  **Fallible Allocation**: working buffers are reserved with
//     `try_reserve_exact`, turning an out-of-memory condition into a
//     `PipelineError::Allocation` instead of an abort.
//
// Binary rasters use exactly two levels, `OFF` and `ON`. Any sample at or above
// `ON_CUTOFF` counts as "on" when a stage asks.
//
// The pixel operators from `imageproc` work on 8-bit `GrayImage`s. Stages convert
// at their boundary with `to_gray_image` / `to_mask_image` and come back through
// `from_gray_image`, so the rest of the pipeline only ever sees a `Raster`.

use crate::error::PipelineError;
use image::GrayImage;

pub type Sample = f32;

/// The "off" level of a binary raster.
pub const OFF: Sample = 0.0;
/// The "on" level of a binary raster.
pub const ON: Sample = 1.0;
/// Samples at or above this value are treated as foreground.
pub const ON_CUTOFF: Sample = 0.5;

/// A dense, row-major image buffer with samples in [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    width: u32,
    height: u32,
    channels: u32,
    data: Vec<Sample>,
}

/// Reserves a buffer of `len` copies of `value`, reporting allocation failure.
pub fn alloc_filled<T: Clone>(len: usize, value: T) -> Result<Vec<T>, PipelineError> {
    let mut data = Vec::new();
    data.try_reserve_exact(len)
        .map_err(|e| PipelineError::allocation::<T>(len, e))?;
    data.resize(len, value);
    Ok(data)
}

/// Reserves a zero-filled sample buffer.
pub fn alloc_samples(len: usize) -> Result<Vec<Sample>, PipelineError> {
    alloc_filled(len, OFF)
}

impl Raster {
    /// Wraps an existing buffer, validating its shape.
    pub fn new(width: u32, height: u32, channels: u32, data: Vec<Sample>) -> Result<Self, PipelineError> {
        if width == 0 || height == 0 {
            return Err(PipelineError::InvalidRaster(format!(
                "dimensions must be non-zero, got {width}x{height}"
            )));
        }
        if channels == 0 {
            return Err(PipelineError::InvalidRaster("channel count must be non-zero".into()));
        }
        let expected = width as usize * height as usize * channels as usize;
        if data.len() != expected {
            return Err(PipelineError::InvalidRaster(format!(
                "buffer holds {} samples, {width}x{height}x{channels} needs {expected}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// A single-channel raster from a grayscale buffer.
    pub fn from_gray(width: u32, height: u32, data: Vec<Sample>) -> Result<Self, PipelineError> {
        Self::new(width, height, 1, data)
    }

    /// An all-off single-channel raster.
    pub fn zeroed(width: u32, height: u32) -> Result<Self, PipelineError> {
        let data = alloc_samples(width as usize * height as usize)?;
        Self::from_gray(width, height, data)
    }

    /// Builds a single-channel raster by evaluating `f(x, y)` for every pixel.
    pub fn from_fn<F>(width: u32, height: u32, mut f: F) -> Result<Self, PipelineError>
    where
        F: FnMut(u32, u32) -> Sample,
    {
        let mut raster = Self::zeroed(width, height)?;
        for y in 0..height {
            for x in 0..width {
                let index = raster.index(x, y);
                raster.data[index] = f(x, y);
            }
        }
        Ok(raster)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u32 {
        self.channels
    }

    pub fn data(&self) -> &[Sample] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [Sample] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<Sample> {
        self.data
    }

    /// Number of pixels (not samples).
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    #[inline]
    pub fn index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * self.channels as usize
    }

    /// First-channel sample at (x, y). Panics when out of bounds.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Sample {
        self.data[self.index(x, y)]
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, value: Sample) {
        let index = self.index(x, y);
        self.data[index] = value;
    }

    #[inline]
    pub fn is_on(&self, x: u32, y: u32) -> bool {
        self.get(x, y) >= ON_CUTOFF
    }

    /// Count of foreground pixels.
    pub fn count_on(&self) -> usize {
        self.data
            .iter()
            .step_by(self.channels as usize)
            .filter(|&&v| v >= ON_CUTOFF)
            .count()
    }

    /// 8-bit copy of the raster, mapping [0, 1] onto 0..=255.
    pub fn to_gray_image(&self) -> Result<GrayImage, PipelineError> {
        self.to_luma8(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
    }

    /// 8-bit foreground mask: 255 for "on" pixels, 0 everywhere else.
    pub fn to_mask_image(&self) -> Result<GrayImage, PipelineError> {
        self.to_luma8(|v| if v >= ON_CUTOFF { u8::MAX } else { 0 })
    }

    fn to_luma8(&self, map: impl Fn(Sample) -> u8) -> Result<GrayImage, PipelineError> {
        self.ensure_single_channel("8-bit conversion")?;
        let mut buffer = alloc_filled(self.pixel_count(), 0u8)?;
        for (dst, &src) in buffer.iter_mut().zip(&self.data) {
            *dst = map(src);
        }
        GrayImage::from_raw(self.width, self.height, buffer).ok_or_else(|| {
            PipelineError::InvalidRaster(format!("cannot view {}x{} raster as an image", self.width, self.height))
        })
    }

    /// Single-channel raster from an 8-bit grayscale image, scaled to [0, 1].
    pub fn from_gray_image(image: &GrayImage) -> Result<Self, PipelineError> {
        let (width, height) = image.dimensions();
        let mut data = alloc_samples(image.as_raw().len())?;
        for (dst, &src) in data.iter_mut().zip(image.as_raw()) {
            *dst = src as Sample / 255.0;
        }
        Self::from_gray(width, height, data)
    }

    /// Rejects rasters with more than one channel.
    pub fn ensure_single_channel(&self, stage: &str) -> Result<(), PipelineError> {
        if self.channels != 1 {
            return Err(PipelineError::InvalidRaster(format!(
                "{stage} expects a single-channel raster, got {} channels",
                self.channels
            )));
        }
        Ok(())
    }
}
