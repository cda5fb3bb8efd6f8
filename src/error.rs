// THEORY:
// The `error` module holds the single failure type shared by every stage of the
// detection pipeline. A stage never "recovers" from malformed input: it returns
// one of these variants and the caller stops. Filter rejections are not errors
// and never show up here.
//
// The variants fall into three families:
// 1.  **Input**: the bytes could not be read from disk (`Open`, `Allocation`,
//     `ShortRead`, `Io`).
// 2.  **Decode / Raster**: the bytes could not become a valid raster, or a
//     stage was handed a raster it cannot process (`EmptyInput`, `Decode`,
//     `InvalidRaster`).
// 3.  **Setup / Output**: the configuration or the worker pool is unusable, or
//     results could not be written (`InvalidConfig`, `Config`, `Encode`,
//     `Output`, `WorkerUnavailable`, `DetectionPanicked`).
//
// Load failures (family 2 raised by the loader) are not fatal for the
// command-line front end: it reports them and exits successfully with no boxes.

use std::collections::TryReserveError;
use std::path::PathBuf;

/// Errors produced while reading, decoding or processing an image.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The input file could not be opened.
    #[error("failed to open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A working buffer (read buffer, raster or box list) could not be allocated.
    #[error("failed to allocate {bytes} bytes")]
    Allocation { bytes: usize },

    /// Fewer bytes were read than the file claims to hold.
    #[error("short read: expected {expected} bytes, got {actual}")]
    ShortRead { expected: usize, actual: usize },

    /// Any other I/O failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// The loader could not parse the byte buffer.
    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    /// A raster violates its shape invariants or has the wrong channel count.
    #[error("invalid raster: {0}")]
    InvalidRaster(String),

    /// Pipeline configuration is out of range.
    #[error("invalid pipeline configuration: {0}")]
    InvalidConfig(String),

    /// A configuration file could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// A debug raster could not be encoded to disk.
    #[error("failed to encode image: {0}")]
    Encode(#[source] image::ImageError),

    /// Detection results could not be serialized for output.
    #[error("failed to write detection output: {0}")]
    Output(#[source] serde_json::Error),

    /// The batch worker pool has shut down.
    #[error("detection worker pool is unavailable")]
    WorkerUnavailable,

    /// Detection of one batch image panicked; the worker carries on.
    #[error("detection of image {image_id} panicked: {message}")]
    DetectionPanicked { image_id: u64, message: String },
}

impl PipelineError {
    /// Builds an `Allocation` error for a buffer of `len` elements of `T`.
    pub fn allocation<T>(len: usize, _cause: TryReserveError) -> Self {
        PipelineError::Allocation {
            bytes: len.saturating_mul(std::mem::size_of::<T>()),
        }
    }

    /// The input bytes never became a usable raster.
    pub fn is_load_failure(&self) -> bool {
        matches!(
            self,
            PipelineError::EmptyInput | PipelineError::Decode(_) | PipelineError::InvalidRaster(_)
        )
    }

    /// Process exit code used by the command-line front end for fatal errors.
    pub fn exit_code(&self) -> u8 {
        match self {
            PipelineError::Open { .. } => 1,
            PipelineError::Allocation { .. } => 2,
            PipelineError::ShortRead { .. } => 3,
            PipelineError::InvalidConfig(_) | PipelineError::Config(_) => 5,
            _ => 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_failures_keep_their_exit_codes() {
        let open = PipelineError::Open {
            path: PathBuf::from("missing.jpg"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(open.exit_code(), 1);
        assert_eq!(PipelineError::Allocation { bytes: 10 }.exit_code(), 2);
        assert_eq!(
            PipelineError::ShortRead {
                expected: 10,
                actual: 4
            }
            .exit_code(),
            3
        );
    }

    #[test]
    fn load_failures_are_classified() {
        assert!(PipelineError::EmptyInput.is_load_failure());
        assert!(PipelineError::InvalidRaster("0x0".into()).is_load_failure());
        assert!(!PipelineError::Allocation { bytes: 1 }.is_load_failure());
        assert!(!PipelineError::InvalidConfig("t".into()).is_load_failure());
        assert!(!PipelineError::WorkerUnavailable.is_load_failure());
    }

    #[test]
    fn config_failures_exit_with_five() {
        assert_eq!(PipelineError::InvalidConfig("t".into()).exit_code(), 5);
        let parse = serde_json::from_str::<u32>("nope").unwrap_err();
        assert_eq!(PipelineError::Config(parse).exit_code(), 5);
    }

    #[test]
    fn output_failure_is_not_a_config_failure() {
        let cause = serde_json::from_str::<u32>("nope").unwrap_err();
        let err = PipelineError::Output(cause);
        assert_eq!(err.exit_code(), 4);
        assert!(err.to_string().starts_with("failed to write detection output"));
    }

    #[test]
    fn open_error_mentions_the_path() {
        let err = PipelineError::Open {
            path: PathBuf::from("plates/car.jpg"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(err.to_string().contains("plates/car.jpg"));
    }
}
