use std::path::PathBuf;

use thiserror::Error;

/// Every way a single recognition request can fail.
///
/// Each variant maps to exactly one status code, see [`RecognitionError::status`].
/// A malformed body is reported as `MissingPath`: the validator cannot tell
/// "unparseable" apart from "no path supplied".
#[derive(Debug, Error)]
pub enum RecognitionError {
    #[error("path is required")]
    MissingPath,

    #[error("file not found at {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("failed to decode image {}: {reason}", path.display())]
    Decode { path: PathBuf, reason: String },

    #[error("recognition engine is not ready")]
    EngineNotReady,

    #[error("recognition engine is busy, try again later")]
    Busy,

    #[error("inference failed: {0}")]
    Inference(String),
}

impl RecognitionError {
    /// HTTP-style status code carried in the response payload.
    pub fn status(&self) -> u16 {
        match self {
            Self::MissingPath => 400,
            Self::FileNotFound { .. } => 404,
            Self::Decode { .. } | Self::Inference(_) => 500,
            Self::EngineNotReady | Self::Busy => 503,
        }
    }
}

impl From<EngineError> for RecognitionError {
    fn from(err: EngineError) -> Self {
        Self::Inference(err.to_string())
    }
}

/// Failure reported by a [`RecognitionEngine`](crate::RecognitionEngine) implementation.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("models not loaded")]
    NotLoaded,

    #[error("model asset missing: {0}")]
    MissingAsset(String),

    #[error("model asset unreadable ({name}): {source}")]
    Asset {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Failed(String),
}
