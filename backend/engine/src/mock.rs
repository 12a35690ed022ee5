use std::thread;
use std::time::Duration;

use tracing::info;

use ocrgate_core::{
    AssetSource, BoundingBox, DecodedImage, EngineError, Mode, RecognitionEngine,
    RecognitionResult, TextSpan,
};

/// Deterministic engine that reports a single span describing the image.
///
/// Used when no real model backend is configured, and to exercise the
/// not-ready window through `init_delay`.
#[derive(Debug, Default)]
pub struct MockEngine {
    init_delay: Duration,
    loaded: bool,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_init_delay(mut self, delay: Duration) -> Self {
        self.init_delay = delay;
        self
    }
}

impl RecognitionEngine for MockEngine {
    fn name(&self) -> &str {
        "mock"
    }

    fn initialize(&mut self, assets: &AssetSource) -> bool {
        if self.loaded {
            return true;
        }
        // Runs on a blocking worker, never on the async executor.
        thread::sleep(self.init_delay);
        self.loaded = true;
        info!(assets = %assets.root().display(), "Mock engine ready");
        true
    }

    fn infer(
        &mut self,
        image: &DecodedImage,
        mode: Mode,
    ) -> Result<RecognitionResult, EngineError> {
        if !self.loaded {
            return Err(EngineError::NotLoaded);
        }
        let span = TextSpan {
            text: format!("image {}x{}", image.width(), image.height()),
            confidence: 1.0,
            bbox: BoundingBox::new(0, 0, image.width(), image.height()),
        };
        Ok(RecognitionResult::from_spans(vec![span], mode))
    }

    fn release(&mut self) {
        self.loaded = false;
    }
}
