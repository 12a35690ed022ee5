use crate::assets::AssetSource;
use crate::error::EngineError;
use crate::image::DecodedImage;
use crate::types::{Mode, RecognitionResult};

/// The opaque recognition capability behind the service.
///
/// Implementations hold mutable scratch state and are not safe to call
/// concurrently; every method takes `&mut self`. The service never calls an
/// engine directly, only through its inference dispatcher, which owns the
/// single instance and serializes calls.
pub trait RecognitionEngine: Send + 'static {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// One-time model load. Returns `false` on failure; calling it again
    /// after a success is a cheap no-op that returns `true`.
    fn initialize(&mut self, assets: &AssetSource) -> bool;

    /// Run recognition on one image, shaping the output for `mode`.
    fn infer(&mut self, image: &DecodedImage, mode: Mode)
        -> Result<RecognitionResult, EngineError>;

    /// Drop loaded models. A later `initialize` must load them again.
    fn release(&mut self) {}
}
