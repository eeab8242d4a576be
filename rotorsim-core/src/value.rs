//! Values exchanged with the external variable store.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifiers of the simulated quantities in the external store.
pub mod keys {
    /// Bearing vibration velocity, mm/s. Read back every tick.
    pub const VIBRATION: &str = "equipment.bearing.vibration";
    /// Equipment temperature, °C. Overwritten every tick.
    pub const TEMPERATURE: &str = "equipment.temperature";
    /// System pressure, bar. Overwritten every tick.
    pub const PRESSURE: &str = "equipment.pressure";
    /// Vibration alarm flag. Written only when it changes.
    pub const ALARM: &str = "equipment.bearing.alarm";

    /// All keys the engine publishes, in write order.
    pub const ALL: [&str; 4] = [VIBRATION, TEMPERATURE, PRESSURE, ALARM];
}

/// A scalar held by the store: either a double or a boolean.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Double(f64),
    Boolean(bool),
}

impl Value {
    /// Returns the double payload, or `None` for a boolean.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(v) => Some(*v),
            Value::Boolean(_) => None,
        }
    }

    /// Returns the boolean payload, or `None` for a double.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            Value::Double(_) => None,
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Double(v) => write!(f, "{v}"),
            Value::Boolean(b) => write!(f, "{b}"),
        }
    }
}
