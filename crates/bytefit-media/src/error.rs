//! Error types for the transcoding pipeline.

use thiserror::Error;

/// Result type for encode operations.
pub type EncodeResult<T> = Result<T, EncodeError>;

/// Errors that can occur while running a transcode job.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("engine initialization failed: {message}")]
    EngineInit { message: String },

    #[error("encode pass failed: {message}")]
    PassFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("artifact not found in engine workspace: {0}")]
    ArtifactMissing(String),

    #[error("invalid edit options: {0}")]
    InvalidOptions(String),

    #[error("job cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EncodeError {
    /// Create an engine initialization error.
    pub fn engine_init(message: impl Into<String>) -> Self {
        Self::EngineInit {
            message: message.into(),
        }
    }

    /// Create a pass failure error.
    pub fn pass_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::PassFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Create an invalid options error.
    pub fn invalid_options(message: impl Into<String>) -> Self {
        Self::InvalidOptions(message.into())
    }

    /// Whether this error is a cancellation rather than a genuine failure.
    ///
    /// Callers log the two differently: a cancelled job is "stopped",
    /// a failed one carries the underlying message.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
