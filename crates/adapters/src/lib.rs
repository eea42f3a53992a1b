//! # keos-adapters
//!
//! Adapter implementations for ports: structured loggers and an offline
//! inventory. This crate depends on `ports` and `shared`.

pub mod log_sink;
pub mod logger;
pub mod offline_metadata;
pub mod tracing_logger;

pub use log_sink::{BufferLogSink, LogSink, StderrLogSink};
pub use logger::JsonLogger;
pub use offline_metadata::{InventorySnapshot, OfflineCloudMetadata, OfflineConnector};
pub use tracing_logger::TracingLogger;

/// Returns the adapters crate version.
#[must_use]
pub const fn adapters_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
