//! Config defaults: applies sensible default values to parsed config.

use crate::schema::{DispatchConfig, EngineConfig, LoggingConfig, OcrGateConfig, ServerConfig};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 1666;
pub const DEFAULT_SHUTDOWN_GRACE_MS: u64 = 2_000;

pub const DEFAULT_BACKEND: &str = "mock";
pub const DEFAULT_ASSET_DIR: &str = "assets";

pub const DEFAULT_QUEUE_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_MAX_PENDING: usize = 16;

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Apply all defaults to a freshly loaded config.
pub fn apply_all_defaults(config: OcrGateConfig) -> OcrGateConfig {
    let config = apply_server_defaults(config);
    let config = apply_engine_defaults(config);
    let config = apply_dispatch_defaults(config);
    apply_logging_defaults(config)
}

fn apply_server_defaults(mut config: OcrGateConfig) -> OcrGateConfig {
    let server = config.server.get_or_insert_with(ServerConfig::default);
    server.host.get_or_insert_with(|| DEFAULT_HOST.to_string());
    server.port.get_or_insert(DEFAULT_PORT);
    server.shutdown_grace_ms.get_or_insert(DEFAULT_SHUTDOWN_GRACE_MS);
    config
}

fn apply_engine_defaults(mut config: OcrGateConfig) -> OcrGateConfig {
    let engine = config.engine.get_or_insert_with(EngineConfig::default);
    engine.backend.get_or_insert_with(|| DEFAULT_BACKEND.to_string());
    engine.asset_dir.get_or_insert_with(|| DEFAULT_ASSET_DIR.to_string());
    engine.mock_init_delay_ms.get_or_insert(0);
    config
}

fn apply_dispatch_defaults(mut config: OcrGateConfig) -> OcrGateConfig {
    let dispatch = config.dispatch.get_or_insert_with(DispatchConfig::default);
    dispatch.queue_timeout_ms.get_or_insert(DEFAULT_QUEUE_TIMEOUT_MS);
    dispatch.max_pending.get_or_insert(DEFAULT_MAX_PENDING);
    config
}

/// Ensure logging.level is set; `dir` stays optional.
fn apply_logging_defaults(mut config: OcrGateConfig) -> OcrGateConfig {
    let logging = config.logging.get_or_insert_with(LoggingConfig::default);
    logging.level.get_or_insert_with(|| DEFAULT_LOG_LEVEL.to_string());
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_gets_everything() {
        let config = apply_all_defaults(OcrGateConfig::default());
        let server = config.server.unwrap();
        assert_eq!(server.host.as_deref(), Some(DEFAULT_HOST));
        assert_eq!(server.port, Some(DEFAULT_PORT));
        assert_eq!(config.engine.unwrap().backend.as_deref(), Some("mock"));
        assert_eq!(config.dispatch.unwrap().max_pending, Some(DEFAULT_MAX_PENDING));
        let logging = config.logging.unwrap();
        assert_eq!(logging.level.as_deref(), Some("info"));
        assert!(logging.dir.is_none());
    }

    #[test]
    fn explicit_values_survive() {
        let mut config = OcrGateConfig::default();
        config.server = Some(ServerConfig {
            port: Some(9000),
            ..Default::default()
        });
        let config = apply_all_defaults(config);
        let server = config.server.unwrap();
        assert_eq!(server.port, Some(9000));
        assert_eq!(server.host.as_deref(), Some(DEFAULT_HOST));
    }
}
