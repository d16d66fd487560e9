//! Debug drawer error types.

use thiserror::Error;

/// Errors reported by the frame accumulator and its GPU backend.
///
/// None of these are fatal: the caller skips the frame and tries again next frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DrawError {
    /// The host camera singleton could not be read.
    #[error("camera state is unavailable")]
    CameraUnavailable,
    /// The backend refused to create an overlay render target.
    #[error("failed to create {width}x{height} render target: {reason}")]
    TargetCreation {
        width: u32,
        height: u32,
        reason: String,
    },
    /// The backend failed while executing submitted batches.
    #[error("backend error: {0}")]
    Backend(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DrawError::CameraUnavailable;
        assert_eq!(err.to_string(), "camera state is unavailable");

        let err = DrawError::TargetCreation {
            width: 0,
            height: 1080,
            reason: "zero width".into(),
        };
        assert_eq!(
            err.to_string(),
            "failed to create 0x1080 render target: zero width"
        );
    }
}
