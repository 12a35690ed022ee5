//! Structured logging setup for ocrgate.
//!
//! Console output for operators plus an optional daily-rolling NDJSON file.

pub mod logger;

pub use logger::{init_logger, LOG_FILE_PREFIX};
