//! `ocrgate-config`: runtime configuration for the recognition service.
//!
//! Provides:
//! - Typed config schema with defaulting accessors
//! - YAML read/write
//! - `OCRGATE_*` environment overrides
//! - Default value application
//! - Validation (loopback-only listener, sane queue limits)

pub mod defaults;
pub mod env;
pub mod io;
pub mod schema;
pub mod validation;

pub use defaults::apply_all_defaults;
pub use env::{apply_env_overrides, apply_env_overrides_with};
pub use io::{config_dir, config_file_path, load_config, write_config};
pub use schema::OcrGateConfig;
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{bail, Result};
use std::collections::HashMap;
use std::path::Path;

/// Load a config file and apply env overrides and defaults, returning the
/// effective config with its validation report. Findings, including env
/// overrides that could not be applied, land in the report instead of the
/// log, so this is safe to call before the logger exists.
pub async fn load_effective(path: &Path) -> Result<(OcrGateConfig, ValidationReport)> {
    let config = load_config(path).await?;
    Ok(prepare_with(config, &std::env::vars().collect()))
}

/// Env overrides, defaults, and validation against an explicit environment.
/// Overrides that could not be applied are reported as warnings.
pub fn prepare_with(
    config: OcrGateConfig,
    env: &HashMap<String, String>,
) -> (OcrGateConfig, ValidationReport) {
    let (config, rejected) = apply_env_overrides_with(config, env);
    let config = apply_all_defaults(config);
    let mut report = validate(&config);
    report.warnings.extend(rejected);
    (config, report)
}

/// Log every finding in `report` and fail if it holds any error.
pub fn check_report(report: &ValidationReport) -> Result<()> {
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }
    if let Some(first) = report.errors.first() {
        bail!("invalid configuration ({} errors): {first}", report.errors.len());
    }
    Ok(())
}

/// Load, apply env overrides and defaults, and validate a config file.
///
/// This is the main entry point for loading a config at runtime. Warnings are
/// logged; any validation error fails the load.
pub async fn load_and_prepare(path: &Path) -> Result<OcrGateConfig> {
    let (config, report) = load_effective(path).await?;
    check_report(&report)?;
    Ok(config)
}
