//! Error types for media operations.

use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur during media processing.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("Audio decode failed: {0}")]
    DecodeFailed(String),

    #[error("Audio fetch failed: {0}")]
    FetchFailed(String),

    #[error("No audio data in input")]
    NoAudioData,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    /// Create a decode failure error.
    pub fn decode_failed(message: impl Into<String>) -> Self {
        Self::DecodeFailed(message.into())
    }

    /// Create a fetch failure error.
    pub fn fetch_failed(message: impl Into<String>) -> Self {
        Self::FetchFailed(message.into())
    }
}
