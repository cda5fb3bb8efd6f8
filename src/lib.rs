// THEORY:
// This file is the main entry point for the `plate_vision` library crate.
// It follows the standard Rust convention of using `lib.rs` to define the public
// API that will be exposed to external consumers.
//
// The primary goal is to export the `DetectionPipeline` and its associated data
// structures (`PipelineConfig`, `BoxList`, `RegionFilter`, etc.) as the clean,
// high-level interface for the detection engine. The individual stages live in
// `core_modules` and stay usable on their own for callers that want to run or
// inspect a single step.

pub mod core_modules;
pub mod error;
pub mod parallel_pipeline;
pub mod pipeline;

#[cfg(any(test, feature = "test-utils"))]
#[doc(hidden)]
pub mod test_utils;

pub use error::PipelineError;
pub use parallel_pipeline::BatchPipeline;
pub use pipeline::{
    AcceptAll, BoundingBox, BoxList, DetectionPipeline, PipelineConfig, PlateSizeFilter, RegionFilter, RejectAll,
};
