//! The single mutable simulation state and the record emitted per tick.

use serde::{Deserialize, Serialize};

use crate::signal::Readings;

/// Readings the equipment starts with on process start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InitialReadings {
    /// mm/s
    pub vibration: f64,
    /// °C
    pub temperature: f64,
    /// bar
    pub pressure: f64,
}

impl Default for InitialReadings {
    fn default() -> Self {
        Self {
            vibration: 1.2,
            temperature: 25.0,
            pressure: 1.0,
        }
    }
}

/// Process-wide simulation state, owned by the tick driver.
///
/// `clock` only ever grows by the configured step. It is never wrapped or
/// renormalized, so precision degrades slowly over very long runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationState {
    pub clock: f64,
    pub vibration: f64,
    pub temperature: f64,
    pub pressure: f64,
    pub alarm_active: bool,
    /// Completed ticks.
    pub sequence: u64,
}

impl SimulationState {
    pub fn new(initial: &InitialReadings) -> Self {
        Self {
            clock: 0.0,
            vibration: initial.vibration,
            temperature: initial.temperature,
            pressure: initial.pressure,
            alarm_active: false,
            sequence: 0,
        }
    }

    /// Advances the simulated clock by `step` and returns the new time.
    /// Non-positive or non-finite steps leave the clock untouched.
    pub fn advance_clock(&mut self, step: f64) -> f64 {
        if step.is_finite() && step > 0.0 {
            self.clock += step;
        }
        self.clock
    }

    /// Commits the outcome of one tick.
    pub fn commit(&mut self, readings: Readings, alarm_active: bool) {
        self.vibration = readings.vibration;
        self.temperature = readings.temperature;
        self.pressure = readings.pressure;
        self.alarm_active = alarm_active;
        self.sequence = self.sequence.saturating_add(1);
    }

    /// Snapshot of the current state as an observability record.
    pub fn record(&self, alarm_changed: bool) -> TickRecord {
        TickRecord {
            sequence: self.sequence,
            clock: self.clock,
            vibration: self.vibration,
            temperature: self.temperature,
            pressure: self.pressure,
            alarm_active: self.alarm_active,
            alarm_changed,
        }
    }
}

/// One record per completed tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TickRecord {
    pub sequence: u64,
    pub clock: f64,
    pub vibration: f64,
    pub temperature: f64,
    pub pressure: f64,
    pub alarm_active: bool,
    pub alarm_changed: bool,
}

impl TickRecord {
    /// Canonical little-endian encoding, stable across runs and platforms.
    pub fn to_le_bytes(&self) -> [u8; 42] {
        let mut out = [0u8; 42];
        out[0..8].copy_from_slice(&self.sequence.to_le_bytes());
        out[8..16].copy_from_slice(&self.clock.to_bits().to_le_bytes());
        out[16..24].copy_from_slice(&self.vibration.to_bits().to_le_bytes());
        out[24..32].copy_from_slice(&self.temperature.to_bits().to_le_bytes());
        out[32..40].copy_from_slice(&self.pressure.to_bits().to_le_bytes());
        out[40] = u8::from(self.alarm_active);
        out[41] = u8::from(self.alarm_changed);
        out
    }
}
