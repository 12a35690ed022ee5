//! ocrgate configuration schema.
//!
//! Every field is optional on disk; [`crate::defaults`] fills the gaps after
//! loading, so code downstream of `load_and_prepare` may rely on `Some`.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::defaults::*;

/// Root configuration (`config.yaml`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrGateConfig {
    /// Listener settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerConfig>,

    /// Recognition engine selection and assets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<EngineConfig>,

    /// Inference queue limits
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dispatch: Option<DispatchConfig>,

    /// Logging configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// How long `stop` waits for in-flight requests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shutdown_grace_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// "mock"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mock_init_delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_timeout_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pending: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    /// Directory for rolling JSON log files; console only when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

// ---------------------------------------------------------------------------
// Typed accessors (fall back to defaults when a field is unset)
// ---------------------------------------------------------------------------

impl OcrGateConfig {
    pub fn host(&self) -> &str {
        self.server
            .as_ref()
            .and_then(|s| s.host.as_deref())
            .unwrap_or(DEFAULT_HOST)
    }

    pub fn port(&self) -> u16 {
        self.server.as_ref().and_then(|s| s.port).unwrap_or(DEFAULT_PORT)
    }

    /// Listener address. `localhost` resolves to the IPv4 loopback.
    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        let host = self.host();
        let ip: IpAddr = if host.eq_ignore_ascii_case("localhost") {
            IpAddr::from([127, 0, 0, 1])
        } else {
            host.parse()
                .map_err(|e| anyhow::anyhow!("invalid server.host {host:?}: {e}"))?
        };
        Ok(SocketAddr::new(ip, self.port()))
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(
            self.server
                .as_ref()
                .and_then(|s| s.shutdown_grace_ms)
                .unwrap_or(DEFAULT_SHUTDOWN_GRACE_MS),
        )
    }

    pub fn backend(&self) -> &str {
        self.engine
            .as_ref()
            .and_then(|e| e.backend.as_deref())
            .unwrap_or(DEFAULT_BACKEND)
    }

    pub fn asset_dir(&self) -> PathBuf {
        PathBuf::from(
            self.engine
                .as_ref()
                .and_then(|e| e.asset_dir.as_deref())
                .unwrap_or(DEFAULT_ASSET_DIR),
        )
    }

    pub fn mock_init_delay(&self) -> Duration {
        Duration::from_millis(
            self.engine
                .as_ref()
                .and_then(|e| e.mock_init_delay_ms)
                .unwrap_or(0),
        )
    }

    pub fn queue_timeout(&self) -> Duration {
        Duration::from_millis(
            self.dispatch
                .as_ref()
                .and_then(|d| d.queue_timeout_ms)
                .unwrap_or(DEFAULT_QUEUE_TIMEOUT_MS),
        )
    }

    pub fn max_pending(&self) -> usize {
        self.dispatch
            .as_ref()
            .and_then(|d| d.max_pending)
            .unwrap_or(DEFAULT_MAX_PENDING)
    }

    pub fn log_level(&self) -> &str {
        self.logging
            .as_ref()
            .and_then(|l| l.level.as_deref())
            .unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_dir(&self) -> Option<PathBuf> {
        self.logging
            .as_ref()
            .and_then(|l| l.dir.as_deref())
            .map(PathBuf::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_uses_camel_case() {
        let yaml = "server:\n  port: 2000\n  shutdownGraceMs: 50\nengine:\n  assetDir: /opt/models\n";
        let config: OcrGateConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.port(), 2000);
        assert_eq!(config.shutdown_grace(), Duration::from_millis(50));
        assert_eq!(config.asset_dir(), PathBuf::from("/opt/models"));
        assert_eq!(config.host(), DEFAULT_HOST);
    }

    #[test]
    fn bind_addr_accepts_localhost() {
        let mut config = OcrGateConfig::default();
        config.server = Some(ServerConfig {
            host: Some("localhost".into()),
            port: Some(1666),
            ..Default::default()
        });
        assert_eq!(config.bind_addr().unwrap(), "127.0.0.1:1666".parse().unwrap());

        config.server.as_mut().unwrap().host = Some("not a host".into());
        assert!(config.bind_addr().is_err());
    }
}
