//! Service lifecycle: one listener, one engine, started and stopped together.

pub mod service;

pub use service::{ServiceManager, ServiceSettings, ServiceState, ServiceStatus};
