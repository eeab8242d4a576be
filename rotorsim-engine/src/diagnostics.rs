//! Determinism hash and bug reports.

use std::fs;
use std::path::{Path, PathBuf};

use blake3::Hasher;
use chrono::Utc;
use rotorsim_core::TickRecord;
use serde::Serialize;

/// Running BLAKE3 hash over the canonical encoding of every tick record.
#[derive(Debug, Clone, Default)]
pub struct StateHasher {
    hasher: Hasher,
    ticks: u64,
}

impl StateHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, record: &TickRecord) {
        self.hasher.update(&record.to_le_bytes());
        self.ticks += 1;
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Hex digest of everything hashed so far. Does not reset the state.
    pub fn hex_digest(&self) -> String {
        hex::encode(self.hasher.finalize().as_bytes())
    }
}

/// Contents of a hash-mismatch report.
#[derive(Debug, Serialize)]
pub struct MismatchReport<'a> {
    pub expected_hash: &'a str,
    pub actual_hash: &'a str,
    pub profile: String,
    pub seed: u64,
    pub ticks: u64,
    pub last_record: Option<TickRecord>,
}

#[derive(Debug)]
pub struct DiagnosticsCollector {
    report_dir: PathBuf,
    bug_reports: Vec<PathBuf>,
}

impl Default for DiagnosticsCollector {
    fn default() -> Self {
        Self::new(".")
    }
}

impl DiagnosticsCollector {
    pub fn new(report_dir: impl Into<PathBuf>) -> Self {
        Self {
            report_dir: report_dir.into(),
            bug_reports: Vec::new(),
        }
    }

    pub fn report_dir(&self) -> &Path {
        &self.report_dir
    }

    /// Writes `report` as YAML into the report directory and returns its path.
    pub fn record_bug_report<T: Serialize>(&mut self, report: &T) -> std::io::Result<PathBuf> {
        let body = serde_yaml::to_string(report)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        fs::create_dir_all(&self.report_dir)?;
        let stamp = Utc::now().format("%Y%m%dT%H%M%S%.3fZ");
        let path = self.report_dir.join(format!("bug_report_{stamp}.yaml"));
        fs::write(&path, body)?;

        self.bug_reports.push(path.clone());
        Ok(path)
    }

    pub fn bug_reports(&self) -> &[PathBuf] {
        &self.bug_reports
    }
}
