//! # Rotorsim Engine
//!
//! Drives the signal model against a variable store: the per-tick driver,
//! the in-memory reference store, the scheduler runtime and the
//! determinism tooling (scenario replay, state hash, record export).

pub mod diagnostics;
pub mod driver;
pub mod error;
pub mod record;
pub mod runtime;
pub mod scenario;
pub mod store;

pub use diagnostics::{DiagnosticsCollector, StateHasher};
pub use driver::{ReadFallback, TickDriver, TickReport, WriteFailure};
pub use error::EngineError;
pub use record::RecordWriter;
pub use runtime::{RunSummary, SimulationRuntime};
pub use scenario::{Scenario, ScenarioError, ScriptedWrite};
pub use store::InMemoryStore;

pub mod prelude {
    pub use super::{
        EngineError, InMemoryStore, RunSummary, Scenario, SimulationRuntime, TickDriver,
        TickReport,
    };
}
