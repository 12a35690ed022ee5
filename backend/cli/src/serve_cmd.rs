//! `ocrgate serve`

use std::path::Path;

use anyhow::{bail, Result};
use tracing::{info, warn};

use ocrgate_config::OcrGateConfig;
use ocrgate_core::{AssetSource, BufferTracker, RecognitionEngine};
use ocrgate_daemon::{ServiceManager, ServiceSettings};
use ocrgate_engine::MockEngine;
use ocrgate_gateway::{DispatchSettings, GatewayState, ImageDecoder, InferenceDispatcher};

pub async fn run(config_path: &Path, port: Option<u16>) -> Result<()> {
    let (config, report) = ocrgate_config::load_effective(config_path).await?;

    ocrgate_logging::init_logger(config.log_dir().as_deref(), config.log_level());
    ocrgate_config::check_report(&report)?;

    let mut addr = config.bind_addr()?;
    if let Some(port) = port {
        addr.set_port(port);
    }

    info!(
        config = %config_path.display(),
        backend = config.backend(),
        "Starting ocrgate"
    );

    let engine = build_engine(&config)?;
    let gateway = GatewayState {
        dispatcher: InferenceDispatcher::new(
            engine,
            DispatchSettings {
                queue_timeout: config.queue_timeout(),
                max_pending: config.max_pending(),
            },
        ),
        decoder: ImageDecoder::new(BufferTracker::new()),
    };
    let manager = ServiceManager::new(
        gateway,
        ServiceSettings {
            addr,
            assets: AssetSource::new(config.asset_dir()),
            grace: config.shutdown_grace(),
        },
    );

    let bound = manager.start().await?;
    info!(addr = %bound, "Listening; press Ctrl-C to stop");

    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Could not listen for Ctrl-C; stopping now");
    }
    manager.stop().await;
    Ok(())
}

/// Only the mock backend ships with this binary. Model-backed engines plug in
/// through `ocrgate_engine::PipelineEngine` with a `TextModel` implementation.
fn build_engine(config: &OcrGateConfig) -> Result<Box<dyn RecognitionEngine>> {
    match config.backend() {
        "mock" => Ok(Box::new(
            MockEngine::new().with_init_delay(config.mock_init_delay()),
        )),
        other => bail!("unsupported engine backend {other:?}"),
    }
}
