//! ## rotorsim-core::signal
//! **Vibration, temperature and pressure recurrences**
//!
//! One engine covers the whole family of equipment profiles:
//! - vibration either drifts from the last observed reading (wear) or
//!   oscillates around a base level with rare spikes,
//! - temperature and pressure are sinusoids of the simulated clock with
//!   jitter and rare additive anomalies.
//!
//! Randomness is drawn from a [`NoiseSource`] in a fixed order, six draws
//! per tick, whether or not the corresponding term is enabled:
//! vibration noise, vibration spike, temperature noise, temperature anomaly,
//! pressure noise, pressure anomaly.

use serde::{Deserialize, Serialize};

use crate::noise::NoiseSource;
use crate::state::SimulationState;

/// How the vibration reading evolves from tick to tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "kebab-case")]
pub enum VibrationModel {
    /// `v' = observed + drift_per_tick + U(-noise, +noise)`.
    ///
    /// Seeded from the value observed in the store, so external writes
    /// become the new baseline.
    Drift {
        drift_per_tick: f64,
        noise_amplitude: f64,
    },
    /// `v' = base + amplitude * sin(clock * frequency) + U(-noise, +noise) + spike`.
    ///
    /// The observed value plays no part in the deterministic component.
    Oscillatory {
        base: f64,
        amplitude: f64,
        frequency: f64,
        noise_amplitude: f64,
        spike_probability: f64,
        spike_magnitude: f64,
    },
}

/// `offset + amplitude * sin(clock * frequency) + U(-noise, +noise) + anomaly`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waveform {
    pub offset: f64,
    #[serde(default)]
    pub amplitude: f64,
    #[serde(default)]
    pub frequency: f64,
    #[serde(default)]
    pub noise_amplitude: f64,
    #[serde(default)]
    pub anomaly_probability: f64,
    #[serde(default)]
    pub anomaly_magnitude: f64,
}

impl Waveform {
    /// A flat line at `offset`.
    pub const fn constant(offset: f64) -> Self {
        Self {
            offset,
            amplitude: 0.0,
            frequency: 0.0,
            noise_amplitude: 0.0,
            anomaly_probability: 0.0,
            anomaly_magnitude: 0.0,
        }
    }

    fn sample(&self, clock: f64, noise_draw: f64, anomaly_draw: f64) -> f64 {
        let value = self.offset
            + self.amplitude * (clock * self.frequency).sin()
            + symmetric(self.noise_amplitude, noise_draw)
            + impulse(self.anomaly_probability, self.anomaly_magnitude, anomaly_draw);
        if value.is_finite() {
            value
        } else {
            self.offset
        }
    }
}

/// Full parameter set of one deployment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalModel {
    pub vibration: VibrationModel,
    /// Lower clamp bound for vibration, mm/s.
    pub vibration_min: f64,
    /// Upper clamp bound for vibration, mm/s.
    pub vibration_max: f64,
    pub temperature: Waveform,
    pub pressure: Waveform,
}

impl SignalModel {
    /// Wear drift of +0.02 mm/s per tick clamped to [0, 10], temperature
    /// `25 + 5 sin(t)` and pressure `1.0 ± 0.1`.
    pub fn baseline() -> Self {
        Self {
            vibration: VibrationModel::Drift {
                drift_per_tick: 0.02,
                noise_amplitude: 0.0,
            },
            vibration_min: 0.0,
            vibration_max: 10.0,
            temperature: Waveform {
                amplitude: 5.0,
                frequency: 1.0,
                ..Waveform::constant(25.0)
            },
            pressure: Waveform {
                noise_amplitude: 0.1,
                ..Waveform::constant(1.0)
            },
        }
    }

    /// [`SignalModel::baseline`] with ±0.01 mm/s jitter on the drift.
    pub fn noisy_drift() -> Self {
        Self {
            vibration: VibrationModel::Drift {
                drift_per_tick: 0.02,
                noise_amplitude: 0.01,
            },
            ..Self::baseline()
        }
    }

    /// 10 Hz stream: oscillating vibration with rare +5 mm/s spikes clamped
    /// to [0, 15], slow temperature swing around 60 °C with rare +20 °C
    /// overheats, and a gentle pressure wave.
    pub fn high_rate() -> Self {
        Self {
            vibration: VibrationModel::Oscillatory {
                base: 2.0,
                amplitude: 0.5,
                frequency: 3.1,
                noise_amplitude: 0.1,
                spike_probability: 0.001,
                spike_magnitude: 5.0,
            },
            vibration_min: 0.0,
            vibration_max: 15.0,
            temperature: Waveform {
                offset: 60.0,
                amplitude: 10.0,
                frequency: 0.1,
                noise_amplitude: 0.25,
                anomaly_probability: 0.001,
                anomaly_magnitude: 20.0,
            },
            pressure: Waveform {
                offset: 1.0,
                amplitude: 0.1,
                frequency: 0.7,
                noise_amplitude: 0.01,
                anomaly_probability: 0.0,
                anomaly_magnitude: 0.0,
            },
        }
    }

    /// Clamps `value` into the vibration range.
    pub fn clamp_vibration(&self, value: f64) -> f64 {
        value.max(self.vibration_min).min(self.vibration_max)
    }
}

impl Default for SignalModel {
    fn default() -> Self {
        Self::baseline()
    }
}

/// New readings produced by one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Readings {
    pub vibration: f64,
    pub temperature: f64,
    pub pressure: f64,
}

/// Computes the next readings from the clock and the observed vibration.
#[derive(Debug, Clone)]
pub struct SignalGenerator<N> {
    model: SignalModel,
    noise: N,
}

impl<N: NoiseSource> SignalGenerator<N> {
    pub fn new(model: SignalModel, noise: N) -> Self {
        Self { model, noise }
    }

    pub fn model(&self) -> &SignalModel {
        &self.model
    }

    /// Produces the readings for `state.clock`.
    ///
    /// `observed_vibration` is the value last seen in the external store. A
    /// non-finite observation, or a non-finite result, falls back to
    /// `state.vibration`. The vibration is always clamped into range.
    pub fn step(&mut self, state: &SimulationState, observed_vibration: f64) -> Readings {
        let clock = state.clock;
        let vib_noise = self.noise.next_unit();
        let vib_spike = self.noise.next_unit();
        let temp_noise = self.noise.next_unit();
        let temp_anomaly = self.noise.next_unit();
        let press_noise = self.noise.next_unit();
        let press_anomaly = self.noise.next_unit();

        let fallback = if state.vibration.is_finite() {
            state.vibration
        } else {
            self.model.vibration_min
        };
        let observed = if observed_vibration.is_finite() {
            observed_vibration
        } else {
            fallback
        };

        let raw = match self.model.vibration {
            VibrationModel::Drift {
                drift_per_tick,
                noise_amplitude,
            } => observed + drift_per_tick + symmetric(noise_amplitude, vib_noise),
            VibrationModel::Oscillatory {
                base,
                amplitude,
                frequency,
                noise_amplitude,
                spike_probability,
                spike_magnitude,
            } => {
                base + amplitude * (clock * frequency).sin()
                    + symmetric(noise_amplitude, vib_noise)
                    + impulse(spike_probability, spike_magnitude, vib_spike)
            }
        };
        let vibration = self
            .model
            .clamp_vibration(if raw.is_finite() { raw } else { fallback });

        Readings {
            vibration,
            temperature: self.model.temperature.sample(clock, temp_noise, temp_anomaly),
            pressure: self.model.pressure.sample(clock, press_noise, press_anomaly),
        }
    }
}

/// Maps a unit draw onto `[-amplitude, +amplitude)`.
fn symmetric(amplitude: f64, draw: f64) -> f64 {
    amplitude * (2.0 * draw - 1.0)
}

/// `magnitude` with probability `probability`, otherwise zero.
fn impulse(probability: f64, magnitude: f64, draw: f64) -> f64 {
    if draw < probability {
        magnitude
    } else {
        0.0
    }
}
