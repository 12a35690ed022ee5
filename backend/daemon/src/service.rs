//! Service lifecycle manager.
//!
//! `start()` kicks off engine initialization in the background and binds the
//! listener at the same time, so connections are accepted (and answered 503)
//! while models load. `stop()` refuses new work, drains the listener within a
//! grace period, and then releases the engine.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use ocrgate_core::AssetSource;
use ocrgate_gateway::{bind_loopback, serve, GatewayState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceState {
    Stopped,
    Starting,
    Running,
    Stopping,
}

#[derive(Debug, Clone)]
pub struct ServiceSettings {
    /// Loopback address to bind. Port 0 picks a free port.
    pub addr: SocketAddr,
    pub assets: AssetSource,
    /// Upper bound for draining in-flight requests and for releasing the engine.
    pub grace: Duration,
}

/// Snapshot for a host UI or the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatus {
    pub state: ServiceState,
    pub ready: bool,
    pub addr: Option<SocketAddr>,
    pub started_at: Option<DateTime<Utc>>,
}

struct Running {
    addr: SocketAddr,
    started_at: DateTime<Utc>,
    shutdown_tx: oneshot::Sender<()>,
    server: JoinHandle<()>,
    init: JoinHandle<bool>,
}

struct Inner {
    state: ServiceState,
    running: Option<Running>,
}

/// Owns the service state. All transitions happen under one lock, so
/// concurrent `start()`/`stop()` calls are applied one after another.
pub struct ServiceManager {
    gateway: GatewayState,
    settings: ServiceSettings,
    inner: Mutex<Inner>,
}

impl ServiceManager {
    pub fn new(gateway: GatewayState, settings: ServiceSettings) -> Self {
        Self {
            gateway,
            settings,
            inner: Mutex::new(Inner {
                state: ServiceState::Stopped,
                running: None,
            }),
        }
    }

    /// Start the service and return the bound address.
    ///
    /// Idempotent: when already running, returns the existing address without
    /// binding again or re-initializing the engine.
    pub async fn start(&self) -> Result<SocketAddr> {
        let mut inner = self.inner.lock().await;
        if let Some(running) = &inner.running {
            info!(addr = %running.addr, "Service already running");
            return Ok(running.addr);
        }

        inner.state = ServiceState::Starting;
        let dispatcher = self.gateway.dispatcher.clone();
        dispatcher.reopen();

        info!(engine = dispatcher.engine_name(), assets = %self.settings.assets.root().display(), "Starting engine initialization");
        let init = {
            let dispatcher = dispatcher.clone();
            let assets = self.settings.assets.clone();
            tokio::spawn(async move { dispatcher.initialize(assets).await })
        };

        let listener = match bind_loopback(self.settings.addr).await {
            Ok(listener) => listener,
            Err(e) => {
                error!(addr = %self.settings.addr, error = %e, "Listener bind failed");
                init.abort();
                dispatcher.begin_shutdown();
                inner.state = ServiceState::Stopped;
                return Err(e);
            }
        };
        let addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let state = self.gateway.clone();
        let server = tokio::spawn(async move {
            let shutdown = async move {
                let _ = shutdown_rx.await;
            };
            if let Err(e) = serve(listener, state, shutdown).await {
                error!(error = %e, "Listener exited with error");
            }
        });

        let started_at = Utc::now();
        inner.running = Some(Running {
            addr,
            started_at,
            shutdown_tx,
            server,
            init,
        });
        inner.state = ServiceState::Running;
        info!(%addr, "Service running");
        Ok(addr)
    }

    /// Stop the service. A no-op when not running.
    pub async fn stop(&self) {
        let mut inner = self.inner.lock().await;
        let Some(running) = inner.running.take() else {
            return;
        };
        inner.state = ServiceState::Stopping;
        info!(addr = %running.addr, "Stopping service");

        let dispatcher = &self.gateway.dispatcher;
        dispatcher.begin_shutdown();
        let _ = running.shutdown_tx.send(());

        let grace = self.settings.grace;
        let draining = Instant::now();
        let mut server = running.server;
        match tokio::time::timeout(grace, &mut server).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(error = %e, "Listener task failed"),
            Err(_) => {
                warn!(grace_ms = grace.as_millis() as u64, "In-flight requests outlived the grace period; abandoning them");
                server.abort();
            }
        }

        // One grace period covers both the drain and the engine release.
        dispatcher.release(grace.saturating_sub(draining.elapsed())).await;
        running.init.abort();

        inner.state = ServiceState::Stopped;
        info!("Service stopped");
    }

    pub async fn status(&self) -> ServiceStatus {
        let inner = self.inner.lock().await;
        ServiceStatus {
            state: inner.state,
            ready: self.gateway.dispatcher.is_ready(),
            addr: inner.running.as_ref().map(|r| r.addr),
            started_at: inner.running.as_ref().map(|r| r.started_at),
        }
    }
}
