//! Config validation with field paths in every message.

use std::path::Path;

use crate::schema::OcrGateConfig;
use thiserror::Error;

/// Engine backends the binary can construct. Model-backed engines are built
/// in code around `ocrgate_engine::PipelineEngine`, not selected here.
pub const KNOWN_BACKENDS: &[&str] = &["mock"];

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// A collection of validation errors found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &OcrGateConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_server(config, &mut report);
    validate_engine(config, &mut report);
    validate_dispatch(config, &mut report);
    report
}

/// The listener only ever binds loopback.
fn validate_server(config: &OcrGateConfig, report: &mut ValidationReport) {
    match config.bind_addr() {
        Ok(addr) if !addr.ip().is_loopback() => report.error(
            "server.host",
            format!("{} is not a loopback address", addr.ip()),
        ),
        Ok(addr) if addr.port() == 0 => {
            report.warn("server.port", "Port 0 picks a random port clients cannot predict")
        }
        Ok(_) => {}
        Err(e) => report.error("server.host", e.to_string()),
    }
}

fn validate_engine(config: &OcrGateConfig, report: &mut ValidationReport) {
    let backend = config.backend();
    if !KNOWN_BACKENDS.contains(&backend) {
        report.error(
            "engine.backend",
            format!("Unknown backend {backend:?}; expected one of {KNOWN_BACKENDS:?}"),
        );
    }

    let assets = config.asset_dir();
    if !Path::new(&assets).is_dir() {
        report.warn(
            "engine.assetDir",
            format!("{} does not exist; engine initialization may fail", assets.display()),
        );
    }
}

fn validate_dispatch(config: &OcrGateConfig, report: &mut ValidationReport) {
    if config.queue_timeout().is_zero() {
        report.error("dispatch.queueTimeoutMs", "Must be greater than 0");
    }
    if config.max_pending() == 0 {
        report.error("dispatch.maxPending", "Must be greater than 0");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{DispatchConfig, EngineConfig, ServerConfig};

    fn with_assets(mut config: OcrGateConfig, dir: &Path) -> OcrGateConfig {
        config.engine.get_or_insert_with(EngineConfig::default).asset_dir =
            Some(dir.to_string_lossy().into_owned());
        config
    }

    #[test]
    fn default_config_is_valid() {
        let dir = tempfile::tempdir().unwrap();
        let report = validate(&with_assets(OcrGateConfig::default(), dir.path()));
        assert!(report.is_valid(), "errors: {:?}", report.errors);
        assert!(report.warnings.is_empty(), "warnings: {:?}", report.warnings);
    }

    #[test]
    fn non_loopback_host_is_error() {
        let mut cfg = OcrGateConfig::default();
        cfg.server = Some(ServerConfig {
            host: Some("0.0.0.0".to_string()),
            ..Default::default()
        });
        let report = validate(&cfg);
        assert!(!report.is_valid());
        assert_eq!(report.errors[0].path, "server.host");
    }

    #[test]
    fn ipv6_loopback_is_fine() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = OcrGateConfig::default();
        cfg.server = Some(ServerConfig {
            host: Some("::1".to_string()),
            ..Default::default()
        });
        assert!(validate(&with_assets(cfg, dir.path())).is_valid());
    }

    #[test]
    fn zero_limits_and_unknown_backend_are_errors() {
        let mut cfg = OcrGateConfig::default();
        cfg.dispatch = Some(DispatchConfig {
            queue_timeout_ms: Some(0),
            max_pending: Some(0),
        });
        cfg.engine = Some(EngineConfig {
            backend: Some("tesseract".into()),
            ..Default::default()
        });
        let report = validate(&cfg);
        let paths: Vec<_> = report.errors.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(
            paths,
            ["engine.backend", "dispatch.queueTimeoutMs", "dispatch.maxPending"]
        );
    }

    #[test]
    fn pipeline_is_not_a_configurable_backend() {
        let dir = tempfile::tempdir().unwrap();
        let cfg: OcrGateConfig = serde_yaml::from_str("engine:\n  backend: pipeline\n").unwrap();
        let report = validate(&with_assets(crate::apply_all_defaults(cfg), dir.path()));
        assert!(!report.is_valid());
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].path, "engine.backend");
        assert!(report.errors[0].message.contains("\"mock\""));
    }

    #[test]
    fn missing_asset_dir_is_a_warning() {
        let mut cfg = OcrGateConfig::default();
        cfg.engine = Some(EngineConfig {
            asset_dir: Some("/definitely/not/a/dir".into()),
            ..Default::default()
        });
        let report = validate(&cfg);
        assert!(report.is_valid());
        assert_eq!(report.warnings[0].path, "engine.assetDir");
    }
}
