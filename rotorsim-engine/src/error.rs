use std::path::PathBuf;

use rotorsim_config::ConfigError;
use rotorsim_telemetry::TelemetryError;
use thiserror::Error;

use crate::scenario::ScenarioError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Scenario error: {0}")]
    Scenario(#[from] ScenarioError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),

    #[error("State hash mismatch: expected {expected}, got {actual}")]
    HashMismatch {
        expected: String,
        actual: String,
        report: Option<PathBuf>,
    },

    #[error("Failed to encode tick record: {0}")]
    Record(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
