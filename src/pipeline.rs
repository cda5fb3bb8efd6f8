// THEORY:
// The `pipeline` module is the top-level API of the detection engine. It chains
// the five stages into a single call: bytes in, candidate plate boxes out.
//
// Stage order is fixed and strictly downstream:
//   Loader -> Binarizer -> EdgeDetector -> Dilator -> BlobExtractor
// Every stage takes ownership of the previous stage's raster and returns a new
// one, so each intermediate buffer is released as soon as the next exists. The
// first stage that fails stops the whole call; no partial box list is returned.
//
// A `DetectionPipeline` is immutable once built. It can be shared between
// threads and used for any number of independent calls.

use crate::core_modules::binarizer::{self, DEFAULT_THRESHOLD};
use crate::core_modules::blob_extractor::blob_extractor;
use crate::core_modules::dilator::{self, DEFAULT_ITERATIONS};
use crate::core_modules::edge_detector::{self, CannyConfig};
use crate::core_modules::loader::{ImageLoader, Loader};
use crate::core_modules::raster::Raster;
use crate::error::PipelineError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;

// Re-export key data structures for the public API.
pub use crate::core_modules::bounding_box::{BoundingBox, BoxList};
pub use crate::core_modules::region_filter::{AcceptAll, PlateSizeFilter, RegionFilter, RejectAll};

/// Configuration for the DetectionPipeline, allowing for tunable behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Binarization threshold in (0, 1); intensities strictly above it are on.
    pub threshold: f32,
    pub canny: CannyConfig,
    /// Number of 3x3 dilation passes used to fuse edge fragments.
    pub dilation_iterations: u32,
    /// Size window applied by `detect_plates`.
    pub plate_filter: PlateSizeFilter,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            canny: CannyConfig::default(),
            dilation_iterations: DEFAULT_ITERATIONS,
            plate_filter: PlateSizeFilter::default(),
        }
    }
}

impl PipelineConfig {
    /// Loads a JSON configuration; fields missing from the file keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, PipelineError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::InvalidConfig(format!("cannot read {}: {e}", path.display()))
        })?;
        let config: PipelineConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        binarizer::validate_threshold(self.threshold)?;
        self.canny.validate()
    }
}

/// Every intermediate raster of one detection call, for inspection.
#[derive(Debug, Clone)]
pub struct StagedDetection {
    pub binary: Raster,
    pub edges: Raster,
    pub dilated: Raster,
    pub boxes: BoxList,
}

/// The main, top-level struct for the detection engine.
#[derive(Debug, Clone)]
pub struct DetectionPipeline<L: Loader = ImageLoader> {
    loader: L,
    config: PipelineConfig,
}

impl DetectionPipeline<ImageLoader> {
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        Self::with_loader(config, ImageLoader)
    }
}

impl<L: Loader> DetectionPipeline<L> {
    pub fn with_loader(config: PipelineConfig, loader: L) -> Result<Self, PipelineError> {
        if let Err(err) = config.validate() {
            tracing::warn!(%err, "rejecting pipeline configuration");
            return Err(err);
        }
        Ok(Self { loader, config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Decodes `bytes` and runs every stage, keeping boxes accepted by `filter`.
    pub fn detect<F>(&self, bytes: &[u8], filter: &F) -> Result<BoxList, PipelineError>
    where
        F: RegionFilter + ?Sized,
    {
        let gray = self.load(bytes)?;
        self.detect_raster(gray, filter)
    }

    /// Runs the pipeline with the configured plate-size filter.
    pub fn detect_plates(&self, bytes: &[u8]) -> Result<BoxList, PipelineError> {
        self.detect(bytes, &self.config.plate_filter)
    }

    /// Runs every stage after the loader on an already decoded grayscale raster.
    pub fn detect_raster<F>(&self, gray: Raster, filter: &F) -> Result<BoxList, PipelineError>
    where
        F: RegionFilter + ?Sized,
    {
        let binary = self.binarize(gray)?;
        let edges = self.detect_edges(binary)?;
        let dilated = self.dilate(edges)?;
        self.extract(&dilated, filter)
    }

    /// Like `detect`, but keeps a copy of each intermediate raster.
    pub fn detect_staged<F>(&self, bytes: &[u8], filter: &F) -> Result<StagedDetection, PipelineError>
    where
        F: RegionFilter + ?Sized,
    {
        let gray = self.load(bytes)?;
        let binary = self.binarize(gray)?;
        let edges = self.detect_edges(binary.clone())?;
        let dilated = self.dilate(edges.clone())?;
        let boxes = self.extract(&dilated, filter)?;
        Ok(StagedDetection {
            binary,
            edges,
            dilated,
            boxes,
        })
    }

    fn load(&self, bytes: &[u8]) -> Result<Raster, PipelineError> {
        let started = Instant::now();
        let gray = self.loader.load(bytes)?;
        tracing::debug!(
            width = gray.width(),
            height = gray.height(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "loaded"
        );
        Ok(gray)
    }

    fn binarize(&self, gray: Raster) -> Result<Raster, PipelineError> {
        let started = Instant::now();
        let binary = binarizer::binarize(gray, self.config.threshold)?;
        tracing::debug!(elapsed_us = started.elapsed().as_micros() as u64, "binarized");
        Ok(binary)
    }

    fn detect_edges(&self, binary: Raster) -> Result<Raster, PipelineError> {
        let started = Instant::now();
        let edges = edge_detector::detect_edges(binary, &self.config.canny)?;
        tracing::debug!(
            edge_pixels = edges.count_on(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "edges detected"
        );
        Ok(edges)
    }

    fn dilate(&self, edges: Raster) -> Result<Raster, PipelineError> {
        let started = Instant::now();
        let dilated = dilator::dilate(edges, self.config.dilation_iterations)?;
        tracing::debug!(
            iterations = self.config.dilation_iterations,
            elapsed_us = started.elapsed().as_micros() as u64,
            "dilated"
        );
        Ok(dilated)
    }

    fn extract<F>(&self, dilated: &Raster, filter: &F) -> Result<BoxList, PipelineError>
    where
        F: RegionFilter + ?Sized,
    {
        tracing::debug!("performing blob detection");
        let boxes = blob_extractor::find_blobs(dilated, filter)?;
        tracing::info!(candidates = boxes.len(), "blob detection complete");
        Ok(boxes)
    }
}
