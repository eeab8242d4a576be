//! ## rotorsim-engine::driver
//! **One tick of the simulation against a variable store**
//!
//! Per tick the driver advances the clock, reads the vibration back from the
//! store, runs the signal generator and the alarm evaluator, publishes the
//! results and commits the new state. It performs no timing; the caller
//! decides when a tick happens and must not overlap calls.
//!
//! Store failures never abort a tick. A failed read falls back to the last
//! internal vibration, a failed write is reported and dropped. The internal
//! alarm state follows the computed value even when its publication failed,
//! and is not re-published until it changes again.

use rotorsim_config::SimulatorConfig;
use rotorsim_core::{
    keys, AlarmEvaluator, InitialReadings, NoiseSource, SignalGenerator, SimulationState,
    StoreError, TickRecord, Value, VariableStore,
};
use thiserror::Error;
use tracing::warn;

/// Why the observed vibration was not taken from the store.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReadFallback {
    #[error("store read failed: {0}")]
    Store(StoreError),

    #[error("key is not present")]
    Missing,

    #[error("value is not a number")]
    WrongType,

    #[error("value {0} is not finite")]
    NonFinite(f64),
}

/// A write the store refused. Not retried.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteFailure {
    pub key: &'static str,
    pub error: StoreError,
}

/// Outcome of one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub record: TickRecord,
    pub read_fallback: Option<ReadFallback>,
    pub write_failures: Vec<WriteFailure>,
}

pub struct TickDriver<S, N> {
    store: S,
    generator: SignalGenerator<N>,
    evaluator: AlarmEvaluator,
    clock_step: f64,
    state: SimulationState,
}

impl<S: VariableStore, N: NoiseSource> TickDriver<S, N> {
    pub fn new(
        store: S,
        generator: SignalGenerator<N>,
        evaluator: AlarmEvaluator,
        clock_step: f64,
        initial: &InitialReadings,
    ) -> Self {
        Self {
            store,
            generator,
            evaluator,
            clock_step,
            state: SimulationState::new(initial),
        }
    }

    pub fn from_config(store: S, config: &SimulatorConfig, noise: N) -> Self {
        Self::new(
            store,
            SignalGenerator::new(config.signal, noise),
            AlarmEvaluator::new(config.alarm_threshold),
            config.clock_step,
            &config.initial,
        )
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Writes the initial readings and alarm flag so clients find every key
    /// populated before the first tick.
    pub fn publish_initial(&self) -> Vec<WriteFailure> {
        let mut failures = Vec::new();
        let state = &self.state;
        self.publish(keys::VIBRATION, state.vibration.into(), &mut failures);
        self.publish(keys::TEMPERATURE, state.temperature.into(), &mut failures);
        self.publish(keys::PRESSURE, state.pressure.into(), &mut failures);
        self.publish(keys::ALARM, state.alarm_active.into(), &mut failures);
        failures
    }

    pub fn on_tick(&mut self) -> TickReport {
        let mut next = self.state;
        next.advance_clock(self.clock_step);

        let (observed, read_fallback) = self.observe_vibration();
        if let Some(reason) = &read_fallback {
            warn!(
                key = keys::VIBRATION,
                %reason,
                fallback = self.state.vibration,
                "Using internal vibration"
            );
        }

        let readings = self.generator.step(&next, observed);
        let transition = self.evaluator.evaluate(readings.vibration, next.alarm_active);

        let mut write_failures = Vec::new();
        self.publish(keys::VIBRATION, readings.vibration.into(), &mut write_failures);
        self.publish(keys::TEMPERATURE, readings.temperature.into(), &mut write_failures);
        self.publish(keys::PRESSURE, readings.pressure.into(), &mut write_failures);
        if transition.changed {
            self.publish(keys::ALARM, transition.active.into(), &mut write_failures);
        }

        next.commit(readings, transition.active);
        self.state = next;

        TickReport {
            record: next.record(transition.changed),
            read_fallback,
            write_failures,
        }
    }

    fn observe_vibration(&self) -> (f64, Option<ReadFallback>) {
        let reason = match self.store.read_value(keys::VIBRATION) {
            Ok(Some(Value::Double(v))) if v.is_finite() => return (v, None),
            Ok(Some(Value::Double(v))) => ReadFallback::NonFinite(v),
            Ok(Some(Value::Boolean(_))) => ReadFallback::WrongType,
            Ok(None) => ReadFallback::Missing,
            Err(e) => ReadFallback::Store(e),
        };
        (self.state.vibration, Some(reason))
    }

    fn publish(&self, key: &'static str, value: Value, failures: &mut Vec<WriteFailure>) {
        if let Err(error) = self.store.write_value(key, value) {
            warn!(key, %value, %error, "Store write dropped");
            failures.push(WriteFailure { key, error });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use parking_lot::Mutex;
    use proptest::prelude::*;
    use rotorsim_config::Profile;
    use rotorsim_core::noise::{MidpointNoise, ScriptedNoise};
    use rotorsim_core::{SeededNoise, SignalModel, VibrationModel};
    use std::sync::Arc;

    fn baseline(store: Arc<InMemoryStore>) -> TickDriver<Arc<InMemoryStore>, MidpointNoise> {
        let driver = TickDriver::from_config(
            store,
            &SimulatorConfig::for_profile(Profile::Baseline),
            MidpointNoise,
        );
        assert!(driver.publish_initial().is_empty());
        driver
    }

    /// Wraps a store and remembers which keys were written.
    #[derive(Default)]
    struct RecordingStore {
        inner: InMemoryStore,
        writes: Mutex<Vec<&'static str>>,
    }

    impl VariableStore for RecordingStore {
        fn read_value(&self, key: &str) -> Result<Option<Value>, StoreError> {
            self.inner.read_value(key)
        }

        fn write_value(&self, key: &str, value: Value) -> Result<(), StoreError> {
            let key = keys::ALL
                .into_iter()
                .find(|k| *k == key)
                .expect("engine writes only known keys");
            self.writes.lock().push(key);
            self.inner.write_value(key, value)
        }
    }

    #[test]
    fn initial_publication_populates_every_key() {
        let store = Arc::new(InMemoryStore::new());
        let _driver = baseline(store.clone());
        assert_eq!(store.get(keys::VIBRATION), Some(Value::Double(1.2)));
        assert_eq!(store.get(keys::TEMPERATURE), Some(Value::Double(25.0)));
        assert_eq!(store.get(keys::PRESSURE), Some(Value::Double(1.0)));
        assert_eq!(store.get(keys::ALARM), Some(Value::Boolean(false)));
    }

    #[test]
    fn wear_drift_crosses_threshold_once_then_saturates() {
        let store = Arc::new(InMemoryStore::new());
        let mut driver = baseline(store.clone());

        let records: Vec<TickRecord> = (0..500).map(|_| driver.on_tick().record).collect();

        let flips: Vec<u64> = records
            .iter()
            .filter(|r| r.alarm_changed)
            .map(|r| r.sequence)
            .collect();
        assert_eq!(flips.len(), 1, "alarm flipped at {flips:?}");
        assert!((289..=291).contains(&flips[0]));
        assert!(records.iter().skip(flips[0] as usize).all(|r| r.alarm_active));

        assert!((records[439].vibration - 10.0).abs() < 1e-9);
        assert!(records[440..].iter().all(|r| r.vibration == 10.0));
        assert_eq!(store.get(keys::ALARM), Some(Value::Boolean(true)));
    }

    #[test]
    fn external_vibration_becomes_next_baseline() {
        let store = Arc::new(InMemoryStore::new());
        let mut driver = baseline(store.clone());
        driver.on_tick();

        store.set(keys::VIBRATION, 9.0);
        let report = driver.on_tick();

        assert!((report.record.vibration - 9.02).abs() < 1e-9);
        assert!(report.record.alarm_active);
        assert!(report.record.alarm_changed);
        assert_eq!(store.get(keys::ALARM), Some(Value::Boolean(true)));
    }

    #[test]
    fn external_temperature_is_overwritten() {
        let store = Arc::new(InMemoryStore::new());
        let mut driver = baseline(store.clone());

        store.set(keys::TEMPERATURE, 999.0);
        let report = driver.on_tick();

        let published = store.get(keys::TEMPERATURE).and_then(|v| v.as_f64());
        assert_eq!(published, Some(report.record.temperature));
        assert!((report.record.temperature - (25.0 + 5.0 * 0.1f64.sin())).abs() < 1e-12);
    }

    #[test]
    fn alarm_is_written_only_on_change() {
        let store = RecordingStore::default();
        let config = SimulatorConfig {
            initial: InitialReadings {
                vibration: 6.95,
                ..InitialReadings::default()
            },
            ..SimulatorConfig::for_profile(Profile::Baseline)
        };
        let mut driver = TickDriver::from_config(&store, &config, MidpointNoise);
        driver.publish_initial();
        store.writes.lock().clear();

        let mut changes = 0;
        for tick in 1..=10 {
            let before = store.writes.lock().len();
            let report = driver.on_tick();
            let written: Vec<_> = store.writes.lock()[before..].to_vec();

            assert_eq!(&written[..3], &[keys::VIBRATION, keys::TEMPERATURE, keys::PRESSURE]);
            if report.record.alarm_changed {
                changes += 1;
                assert_eq!(written.len(), 4, "tick {tick}");
                assert_eq!(written[3], keys::ALARM);
            } else {
                assert_eq!(written.len(), 3, "tick {tick}");
            }
        }
        assert_eq!(changes, 1);
    }

    #[test]
    fn failed_write_does_not_stop_the_tick() {
        let store = Arc::new(InMemoryStore::new());
        let mut driver = baseline(store.clone());
        store.fail_writes(keys::TEMPERATURE);

        let report = driver.on_tick();

        assert_eq!(report.write_failures.len(), 1);
        assert_eq!(report.write_failures[0].key, keys::TEMPERATURE);
        assert_eq!(store.get(keys::TEMPERATURE), Some(Value::Double(25.0)));
        assert_eq!(
            store.get(keys::PRESSURE),
            Some(Value::Double(report.record.pressure))
        );
        assert_eq!(
            store.get(keys::VIBRATION),
            Some(Value::Double(report.record.vibration))
        );
    }

    #[test]
    fn alarm_state_advances_when_publication_fails() {
        let store = Arc::new(InMemoryStore::new());
        let mut driver = baseline(store.clone());
        store.fail_writes(keys::ALARM);
        store.set(keys::VIBRATION, 9.0);

        let report = driver.on_tick();
        assert!(report.record.alarm_active);
        assert_eq!(report.write_failures[0].key, keys::ALARM);

        store.clear_faults();
        let report = driver.on_tick();
        assert!(report.record.alarm_active && !report.record.alarm_changed);
        assert_eq!(store.get(keys::ALARM), Some(Value::Boolean(false)));
    }

    #[test]
    fn unreadable_vibration_falls_back_to_internal_value() {
        let store = Arc::new(InMemoryStore::new());
        let mut driver = baseline(store.clone());
        driver.on_tick();
        let internal = driver.state().vibration;

        let cases = [
            (Some(Value::Boolean(true)), ReadFallback::WrongType),
            (None, ReadFallback::Missing),
        ];
        for (value, expected) in cases {
            store.remove(keys::VIBRATION);
            if let Some(value) = value {
                store.set(keys::VIBRATION, value);
            }
            let before = driver.state().vibration;
            let report = driver.on_tick();
            assert_eq!(report.read_fallback, Some(expected));
            assert!((report.record.vibration - (before + 0.02)).abs() < 1e-9);
        }

        store.set(keys::VIBRATION, f64::INFINITY);
        assert!(matches!(
            driver.on_tick().read_fallback,
            Some(ReadFallback::NonFinite(_))
        ));

        store.fail_reads(keys::VIBRATION);
        let report = driver.on_tick();
        assert!(matches!(report.read_fallback, Some(ReadFallback::Store(_))));
        assert!((report.record.vibration - (internal + 4.0 * 0.02)).abs() < 1e-9);
    }

    #[test]
    fn seeded_runs_are_bit_identical() {
        let run = |seed: u64| {
            let store = Arc::new(InMemoryStore::new());
            let mut driver = TickDriver::from_config(
                store.clone(),
                &SimulatorConfig::for_profile(Profile::HighRate),
                SeededNoise::new(seed),
            );
            driver.publish_initial();
            (1..=300u64)
                .map(|tick| {
                    if tick % 50 == 0 {
                        store.set(keys::VIBRATION, 12.5);
                    }
                    driver.on_tick().record.to_le_bytes()
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(run(7), run(7));
        assert_ne!(run(7), run(8));
    }

    #[test]
    fn spikes_are_clamped_to_range() {
        // vib noise, vib spike (fires), temp noise, temp anomaly, press noise, press anomaly
        let noise = ScriptedNoise::new(vec![0.99, 0.0, 0.5, 0.5, 0.5, 0.5]);
        let model = SignalModel {
            vibration: VibrationModel::Oscillatory {
                base: 12.0,
                amplitude: 0.0,
                frequency: 0.0,
                noise_amplitude: 0.1,
                spike_probability: 0.5,
                spike_magnitude: 5.0,
            },
            ..SignalModel::high_rate()
        };
        let store = InMemoryStore::new();
        let mut driver = TickDriver::new(
            &store,
            SignalGenerator::new(model, noise),
            AlarmEvaluator::default(),
            0.1,
            &InitialReadings::default(),
        );
        let report = driver.on_tick();
        assert_eq!(report.record.vibration, 15.0);
        assert!(report.record.alarm_active);
    }

    proptest! {
        #[test]
        fn invariants_hold_under_arbitrary_client_writes(
            writes in prop::collection::vec(prop::option::of(prop::num::f64::ANY), 1..60),
            seed in any::<u64>(),
        ) {
            let store = Arc::new(InMemoryStore::new());
            let mut driver = TickDriver::from_config(
                store.clone(),
                &SimulatorConfig::for_profile(Profile::NoisyDrift),
                SeededNoise::new(seed),
            );
            driver.publish_initial();
            let mut clock = 0.0;
            for write in writes {
                if let Some(v) = write {
                    store.set(keys::VIBRATION, v);
                }
                let record = driver.on_tick().record;
                prop_assert!((0.0..=10.0).contains(&record.vibration));
                prop_assert_eq!(record.alarm_active, record.vibration >= 7.0);
                prop_assert!(record.clock > clock);
                clock = record.clock;
            }
        }
    }
}
