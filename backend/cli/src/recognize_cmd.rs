//! `ocrgate recognize`

use std::path::Path;

use anyhow::{Context, Result};

pub async fn run(config_path: &Path, image: &Path, mode: i64, port: Option<u16>) -> Result<()> {
    let config = ocrgate_config::load_and_prepare(config_path).await?;
    let mut addr = config.bind_addr()?;
    if let Some(port) = port {
        addr.set_port(port);
    }

    // The service resolves paths on its own; send an absolute one when we can
    // and let the service report anything that does not exist.
    let path = std::fs::canonicalize(image).unwrap_or_else(|_| image.to_path_buf());
    let path = path.to_string_lossy();
    let mode = mode.to_string();

    let client = reqwest::Client::new();
    let response = match client
        .post(format!("http://{addr}/"))
        .form(&[("path", path.as_ref()), ("type", mode.as_str())])
        .send()
        .await
    {
        Ok(response) => response,
        Err(_) => {
            println!("ocrgate is not running on {addr}");
            return Ok(());
        }
    };

    let body: serde_json::Value = response
        .json()
        .await
        .context("service returned a malformed payload")?;
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}
