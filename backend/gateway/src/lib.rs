//! ocrgate request path: validation, decoding, serialized inference, and the
//! loopback HTTP listener that ties them together.

pub mod decode;
pub mod dispatcher;
pub mod request;
pub mod response;
pub mod server;

pub use decode::ImageDecoder;
pub use dispatcher::{DispatchSettings, InferenceDispatcher};
pub use request::{parse_mode, parse_request};
pub use response::{format_outcome, Reply};
pub use server::{bind_loopback, build_router, handle, serve, GatewayState, MAX_BODY_BYTES};
