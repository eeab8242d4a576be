//! Simulator configuration.
//!
//! Every deployment of the equipment simulator is one [`Profile`] expanded
//! into a full [`SimulatorConfig`]; individual fields can then be overridden
//! from YAML or the environment.

use std::fmt;
use std::str::FromStr;

use rotorsim_core::{InitialReadings, SignalModel, ALARM_THRESHOLD_MM_S};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::validation;
use crate::ConfigError;

/// Known deployment profiles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Profile {
    /// 1 Hz wear drift without jitter.
    #[default]
    Baseline,
    /// 1 Hz wear drift with ±0.01 mm/s jitter.
    NoisyDrift,
    /// 10 Hz oscillating stream with rare spikes and overheats.
    HighRate,
}

impl Profile {
    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::Baseline => "baseline",
            Profile::NoisyDrift => "noisy-drift",
            Profile::HighRate => "high-rate",
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Profile {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "baseline" => Ok(Profile::Baseline),
            "noisy-drift" | "noisy_drift" => Ok(Profile::NoisyDrift),
            "high-rate" | "high_rate" => Ok(Profile::HighRate),
            other => Err(ConfigError::UnknownProfile(other.to_string())),
        }
    }
}

/// Simulator parameters.
#[derive(Debug, Serialize, Deserialize, Validate, Clone, PartialEq)]
#[validate(schema(function = validation::validate_simulator))]
pub struct SimulatorConfig {
    /// Profile these parameters were derived from.
    #[serde(default)]
    pub profile: Profile,

    /// Period at which the scheduler invokes a tick (milliseconds).
    #[validate(range(min = 1, max = 60000))]
    pub tick_interval_ms: u64,

    /// Seed for the noise source. A random seed is chosen and logged when absent.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Simulated time added per tick.
    pub clock_step: f64,

    /// Vibration level (mm/s) at which the alarm activates, inclusive.
    pub alarm_threshold: f64,

    /// Readings on process start.
    pub initial: InitialReadings,

    /// Signal recurrences.
    #[validate(custom(function = validation::validate_signal_model))]
    pub signal: SignalModel,
}

impl SimulatorConfig {
    /// Expands a profile into its full parameter set.
    pub fn for_profile(profile: Profile) -> Self {
        let baseline = Self {
            profile,
            tick_interval_ms: 1000,
            seed: None,
            clock_step: 0.1,
            alarm_threshold: ALARM_THRESHOLD_MM_S,
            initial: InitialReadings::default(),
            signal: SignalModel::baseline(),
        };
        match profile {
            Profile::Baseline => baseline,
            Profile::NoisyDrift => Self {
                signal: SignalModel::noisy_drift(),
                ..baseline
            },
            Profile::HighRate => Self {
                tick_interval_ms: 100,
                initial: InitialReadings {
                    temperature: 60.0,
                    ..InitialReadings::default()
                },
                signal: SignalModel::high_rate(),
                ..baseline
            },
        }
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self::for_profile(Profile::default())
    }
}
