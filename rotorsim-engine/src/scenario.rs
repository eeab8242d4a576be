//! Scripted client activity for deterministic replays.
//!
//! ```yaml
//! seed: 42
//! ticks: 600
//! writes:
//!   - { tick: 100, key: equipment.bearing.vibration, value: 9.0 }
//!   - { tick: 120, key: equipment.temperature, value: 999.0 }
//! expected_hash: 5f1c...
//! ```
//!
//! A write scheduled for tick `n` lands in the store just before tick `n`
//! runs, as if a client wrote between ticks `n - 1` and `n`.

use std::fs;
use std::path::{Path, PathBuf};

use rotorsim_core::Value;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("Failed to read scenario {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid scenario YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Write #{index} is invalid: {reason}")]
    InvalidWrite { index: usize, reason: String },
}

/// One client write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptedWrite {
    /// 1-based tick the write precedes.
    pub tick: u64,
    pub key: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub seed: Option<u64>,
    pub ticks: u64,
    #[serde(default)]
    pub writes: Vec<ScriptedWrite>,
    #[serde(default)]
    pub expected_hash: Option<String>,
}

impl Scenario {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, ScenarioError> {
        let mut scenario: Scenario = serde_yaml::from_str(raw)?;
        scenario.validate()?;
        scenario.writes.sort_by_key(|w| w.tick);
        Ok(scenario)
    }

    fn validate(&self) -> Result<(), ScenarioError> {
        for (index, write) in self.writes.iter().enumerate() {
            let reason = if write.tick == 0 || write.tick > self.ticks {
                format!("tick {} outside 1..={}", write.tick, self.ticks)
            } else if write.key.trim().is_empty() {
                "empty key".to_string()
            } else {
                continue;
            };
            return Err(ScenarioError::InvalidWrite { index, reason });
        }
        Ok(())
    }

    /// Writes scheduled right before `tick`, in file order.
    pub fn writes_before(&self, tick: u64) -> impl Iterator<Item = &ScriptedWrite> {
        let start = self.writes.partition_point(|w| w.tick < tick);
        self.writes[start..].iter().take_while(move |w| w.tick == tick)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rotorsim_core::keys;

    const SAMPLE: &str = r#"
seed: 42
ticks: 10
writes:
  - { tick: 5, key: equipment.temperature, value: 999.0 }
  - { tick: 2, key: equipment.bearing.vibration, value: 9.0 }
  - { tick: 5, key: equipment.bearing.alarm, value: true }
"#;

    #[test]
    fn parses_and_orders_writes() {
        let scenario = Scenario::from_yaml(SAMPLE).unwrap();
        assert_eq!(scenario.seed, Some(42));
        assert_eq!(scenario.expected_hash, None);

        let at_two: Vec<_> = scenario.writes_before(2).collect();
        assert_eq!(at_two.len(), 1);
        assert_eq!(at_two[0].value, Value::Double(9.0));

        let at_five: Vec<_> = scenario.writes_before(5).map(|w| w.key.as_str()).collect();
        assert_eq!(at_five, vec![keys::TEMPERATURE, keys::ALARM]);
        assert_eq!(scenario.writes_before(3).count(), 0);
    }

    #[test]
    fn rejects_writes_outside_the_run() {
        let err = Scenario::from_yaml("ticks: 3\nwrites:\n  - { tick: 4, key: k, value: 1.0 }\n")
            .unwrap_err();
        assert!(matches!(err, ScenarioError::InvalidWrite { index: 0, .. }));

        let err = Scenario::from_yaml("ticks: 3\nwrites:\n  - { tick: 0, key: k, value: 1.0 }\n")
            .unwrap_err();
        assert!(err.to_string().contains("outside"));
    }

    #[test]
    fn reports_missing_file() {
        let err = Scenario::load_from_file("/nonexistent/scenario.yaml").unwrap_err();
        assert!(matches!(err, ScenarioError::Io { .. }));
    }
}
