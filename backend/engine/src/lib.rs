//! Recognition engine implementations.
//!
//! [`PipelineEngine`] runs the two-stage text pipeline (detection map, region
//! extraction, line recognition, CTC decoding, reading order) around any
//! [`TextModel`] that supplies the numerical forward passes. [`MockEngine`]
//! is a deterministic stand-in used by the default binary.

pub mod charset;
pub mod ctc;
pub mod detection;
pub mod layout;
pub mod mock;
pub mod pipeline;
pub mod profile;

pub use charset::Charset;
pub use ctc::{greedy_decode, ScoreMatrix};
pub use detection::{expand_region, find_regions, ProbabilityMap, Region, ScalePlan};
pub use layout::reading_order;
pub use mock::MockEngine;
pub use pipeline::{PipelineEngine, TextModel, MODEL_ASSETS};
pub use profile::EngineProfile;
