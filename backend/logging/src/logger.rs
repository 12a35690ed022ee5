//! Structured Logger
//!
//! Wraps `tracing` to provide console output, optional JSON file rotation
//! (NDJSON), and environment-based level control.

use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// File name prefix; the appender adds a `.YYYY-MM-DD` suffix.
pub const LOG_FILE_PREFIX: &str = "ocrgate.log";

/// Initialize the global structured logger.
///
/// `RUST_LOG` wins over `level` when set. Without a `log_dir` only the
/// console layer is installed. Returns `false` if a global subscriber was
/// already set (tests, embedding applications).
pub fn init_logger(log_dir: Option<&Path>, level: &str) -> bool {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| build_filter(level));

    let console_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(false)
        .with_ansi(true);

    // Rolling file appender: writes NDJSON to `<dir>/ocrgate.log.YYYY-MM-DD`
    let file_layer = log_dir.map(|dir| {
        let file_appender = RollingFileAppender::new(Rotation::DAILY, dir, LOG_FILE_PREFIX);
        fmt::layer()
            .json()
            .with_writer(file_appender)
            .with_ansi(false)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .is_ok()
}

/// Parse a level directive, falling back to `info` on garbage.
fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
}
