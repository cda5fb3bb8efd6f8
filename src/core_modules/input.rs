// THEORY:
// The `input` module is the plumbing in front of the loader: it pulls the whole
// encoded file into memory so the pipeline only ever deals with a byte slice.
// Each way this can go wrong maps onto its own error (and so its own exit code
// in the command-line front end): the file cannot be opened, the read buffer
// cannot be allocated, or the file yields fewer bytes than its length.

use crate::error::PipelineError;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Reads the complete contents of an image file.
pub fn read_image_file(path: &Path) -> Result<Vec<u8>, PipelineError> {
    let file = File::open(path).map_err(|source| PipelineError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let expected = file.metadata()?.len() as usize;
    read_exact_len(file, expected)
}

/// Reads exactly `expected` bytes from `reader` into a freshly reserved buffer.
pub fn read_exact_len<R: Read>(reader: R, expected: usize) -> Result<Vec<u8>, PipelineError> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(expected)
        .map_err(|e| PipelineError::allocation::<u8>(expected, e))?;

    let actual = reader.take(expected as u64).read_to_end(&mut buffer)?;
    if actual != expected {
        return Err(PipelineError::ShortRead { expected, actual });
    }
    tracing::debug!(bytes = actual, "input buffer loaded");
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_is_an_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_image_file(&dir.path().join("plate.jpg")).unwrap_err();
        assert!(matches!(err, PipelineError::Open { .. }));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn reads_whole_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"\x89PNG not really").unwrap();
        let bytes = read_image_file(file.path()).unwrap();
        assert_eq!(bytes, b"\x89PNG not really");
    }

    #[test]
    fn truncated_source_is_a_short_read() {
        let err = read_exact_len(&b"abc"[..], 10).unwrap_err();
        assert!(matches!(err, PipelineError::ShortRead { expected: 10, actual: 3 }));
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn impossible_reservation_is_an_allocation_error() {
        let err = read_exact_len(&b""[..], usize::MAX).unwrap_err();
        assert!(matches!(err, PipelineError::Allocation { .. }));
        assert_eq!(err.exit_code(), 2);
    }
}
