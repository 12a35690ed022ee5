//! Environment overrides, applied on top of the config file.
//!
//! | Variable             | Field              |
//! |----------------------|--------------------|
//! | `OCRGATE_HOST`       | `server.host`      |
//! | `OCRGATE_PORT`       | `server.port`      |
//! | `OCRGATE_ASSET_DIR`  | `engine.assetDir`  |
//! | `OCRGATE_LOG_LEVEL`  | `logging.level`    |

use std::collections::HashMap;

use crate::schema::{EngineConfig, LoggingConfig, OcrGateConfig, ServerConfig};
use crate::validation::ConfigValidationError;

pub const ENV_HOST: &str = "OCRGATE_HOST";
pub const ENV_PORT: &str = "OCRGATE_PORT";
pub const ENV_ASSET_DIR: &str = "OCRGATE_ASSET_DIR";
pub const ENV_LOG_LEVEL: &str = "OCRGATE_LOG_LEVEL";

/// Apply overrides from the process environment.
///
/// Values that cannot be applied come back as warnings keyed by variable
/// name, for the caller's validation report.
pub fn apply_env_overrides(config: OcrGateConfig) -> (OcrGateConfig, Vec<ConfigValidationError>) {
    apply_env_overrides_with(config, &std::env::vars().collect())
}

/// Apply overrides from a provided map (useful for testing).
pub fn apply_env_overrides_with(
    mut config: OcrGateConfig,
    env: &HashMap<String, String>,
) -> (OcrGateConfig, Vec<ConfigValidationError>) {
    let mut rejected = Vec::new();
    let get = |name: &str| env.get(name).map(|v| v.trim()).filter(|v| !v.is_empty());

    if let Some(host) = get(ENV_HOST) {
        config.server.get_or_insert_with(ServerConfig::default).host = Some(host.to_string());
    }
    if let Some(port) = get(ENV_PORT) {
        match port.parse::<u16>() {
            Ok(port) => {
                config.server.get_or_insert_with(ServerConfig::default).port = Some(port);
            }
            Err(_) => rejected.push(ConfigValidationError {
                path: ENV_PORT.to_string(),
                message: format!("Ignoring {port:?}: not a port number"),
            }),
        }
    }
    if let Some(dir) = get(ENV_ASSET_DIR) {
        config.engine.get_or_insert_with(EngineConfig::default).asset_dir = Some(dir.to_string());
    }
    if let Some(level) = get(ENV_LOG_LEVEL) {
        config.logging.get_or_insert_with(LoggingConfig::default).level = Some(level.to_string());
    }
    (config, rejected)
}
