//! # rotorsim-core
//!
//! Time-stepped signal model for a simulated piece of rotating equipment.
//!
//! The core is passive: it advances nothing on its own. A tick driver owns a
//! [`SimulationState`], feeds it through the [`SignalGenerator`] and the
//! [`AlarmEvaluator`] once per tick, and exchanges values with an external
//! [`VariableStore`] that clients may also write to between ticks.
//!
//! ### Key Submodules:
//! - `signal`: vibration/temperature/pressure recurrences with clamping and spikes
//! - `alarm`: edge-triggered threshold alarm on the vibration reading
//! - `noise`: seedable uniform noise sources
//! - `store`: the key/value contract with the outside world
//! - `state`: the single mutable simulation state and its per-tick record

pub mod alarm;
pub mod error;
pub mod noise;
pub mod signal;
pub mod state;
pub mod store;
pub mod value;

pub mod prelude {
    pub use crate::alarm::*;
    pub use crate::error::*;
    pub use crate::noise::*;
    pub use crate::signal::*;
    pub use crate::state::*;
    pub use crate::store::*;
    pub use crate::value::*;
}

pub use alarm::{AlarmEvaluator, AlarmTransition, ALARM_THRESHOLD_MM_S};
pub use error::StoreError;
pub use noise::{NoiseSource, SeededNoise};
pub use signal::{Readings, SignalGenerator, SignalModel, VibrationModel, Waveform};
pub use state::{InitialReadings, SimulationState, TickRecord};
pub use store::VariableStore;
pub use value::{keys, Value};
