//! # Rotorsim Telemetry
//!
//! Logging and metrics for the equipment simulator: the tracing subscriber,
//! the per-tick observability record and a Prometheus registry.

pub mod logging;
pub mod metrics;

pub use logging::EventLogger;
pub use metrics::MetricsRecorder;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Failed to install tracing subscriber: {0}")]
    Init(String),

    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}
