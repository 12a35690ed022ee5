//! `ocrgate config`

use std::path::Path;

use anyhow::Result;

pub async fn run(config_path: &Path, init: bool) -> Result<()> {
    let (config, report) = ocrgate_config::load_effective(config_path).await?;

    println!("# {}", config_path.display());
    print!("{}", serde_yaml::to_string(&config)?);

    if report.is_valid() && report.warnings.is_empty() {
        println!("\nConfig OK");
    }
    for warning in &report.warnings {
        println!("warning: {}: {}", warning.path, warning.message);
    }
    for error in &report.errors {
        println!("error: {}: {}", error.path, error.message);
    }

    if init {
        if config_path.exists() {
            println!("\n{} already exists; leaving it untouched", config_path.display());
        } else {
            ocrgate_config::write_config(&config, config_path).await?;
            println!("\nWrote {}", config_path.display());
        }
    }
    Ok(())
}
