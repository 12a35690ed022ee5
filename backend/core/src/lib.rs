pub mod assets;
pub mod error;
pub mod image;
pub mod traits;
pub mod types;

pub use assets::AssetSource;
pub use error::{EngineError, RecognitionError};
pub use image::{BufferTracker, DecodedImage};
pub use traits::RecognitionEngine;
pub use types::{
    BoundingBox, CenteredText, DetailedText, Mode, PayloadData, RecognitionRequest,
    RecognitionResult, ResponsePayload, TextSpan,
};
