use std::path::{Path, PathBuf};

use tokio::task;
use tracing::debug;

use ocrgate_core::{BufferTracker, DecodedImage, RecognitionError};

/// Loads images from the local filesystem into tracked RGB buffers.
#[derive(Debug, Clone, Default)]
pub struct ImageDecoder {
    tracker: BufferTracker,
}

impl ImageDecoder {
    pub fn new(tracker: BufferTracker) -> Self {
        Self { tracker }
    }

    pub fn tracker(&self) -> &BufferTracker {
        &self.tracker
    }

    /// Existence is checked before decoding so a missing file (404) is never
    /// confused with a corrupt one (500).
    pub async fn decode(&self, path: &str) -> Result<DecodedImage, RecognitionError> {
        let path = PathBuf::from(path);
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(RecognitionError::FileNotFound { path });
        }

        let tracker = self.tracker.clone();
        let target = path.clone();
        let decoded = task::spawn_blocking(move || decode_file(&target, &tracker))
            .await
            .map_err(|e| RecognitionError::Decode {
                path: path.clone(),
                reason: format!("decoder task failed: {e}"),
            })??;

        debug!(path = %path.display(), width = decoded.width(), height = decoded.height(), "Image decoded");
        Ok(decoded)
    }
}

fn decode_file(path: &Path, tracker: &BufferTracker) -> Result<DecodedImage, RecognitionError> {
    let image = image::open(path).map_err(|e| RecognitionError::Decode {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(tracker.track(image.to_rgb8()))
}
