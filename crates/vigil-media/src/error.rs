//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while cutting and joining footage.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("Download failed: {message}")]
    DownloadFailed { message: String },

    #[error("Clip plan has no segments")]
    EmptyPlan,

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MediaError {
    /// Create an FFmpeg failure error.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Create a download failure error.
    pub fn download_failed(message: impl Into<String>) -> Self {
        Self::DownloadFailed {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Detailed description including captured FFmpeg stderr, if any.
    pub fn details(&self) -> String {
        match self {
            Self::FfmpegFailed {
                message,
                stderr: Some(stderr),
                exit_code,
            } => match exit_code {
                Some(code) => format!("{} (exit code {}): {}", message, code, stderr.trim()),
                None => format!("{}: {}", message, stderr.trim()),
            },
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_details_include_stderr() {
        let err = MediaError::ffmpeg_failed(
            "Segment extraction failed",
            Some("input.mp4: No such file or directory\n".to_string()),
            Some(1),
        );
        assert_eq!(
            err.details(),
            "Segment extraction failed (exit code 1): input.mp4: No such file or directory"
        );
    }

    #[test]
    fn test_details_fall_back_to_display() {
        assert_eq!(MediaError::EmptyPlan.details(), "Clip plan has no segments");
    }
}
