//! ## rotorsim-engine::runtime
//! **Scheduler around the tick driver**
//!
//! Two ways of driving ticks:
//! - [`SimulationRuntime::run_realtime`] ticks at the configured interval
//!   until the shutdown signal flips,
//! - [`SimulationRuntime::run_ticks`] runs a fixed number of ticks back to
//!   back, optionally replaying scripted client writes, and is what the
//!   determinism hash is computed from.
//!
//! Every tick feeds the metrics, the state hash, the tick log and the
//! optional record file.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use opentelemetry::KeyValue;
use rotorsim_config::RotorsimConfig;
use rotorsim_core::{SeededNoise, SimulationState, TickRecord};
use rotorsim_telemetry::{EventLogger, MetricsRecorder, TelemetryError};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, instrument, warn};

use crate::diagnostics::{DiagnosticsCollector, MismatchReport, StateHasher};
use crate::driver::{TickDriver, TickReport};
use crate::error::EngineError;
use crate::record::RecordWriter;
use crate::scenario::Scenario;
use crate::store::InMemoryStore;

/// Totals of a finished run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub ticks: u64,
    pub seed: u64,
    pub final_hash: String,
    pub last_record: Option<TickRecord>,
    pub alarm_transitions: u64,
    pub write_failures: u64,
    pub read_fallbacks: u64,
}

#[derive(Debug, Default)]
struct Counters {
    alarm_transitions: u64,
    write_failures: u64,
    read_fallbacks: u64,
}

pub struct SimulationRuntime {
    config: Arc<RotorsimConfig>,
    store: Arc<InMemoryStore>,
    driver: TickDriver<Arc<InMemoryStore>, SeededNoise>,
    /// Shared so a scrape endpoint can read it while the run is going.
    pub metrics: Arc<MetricsRecorder>,
    hasher: StateHasher,
    counters: Counters,
    last_record: Option<TickRecord>,
    recorder: Option<RecordWriter>,
    diagnostics: DiagnosticsCollector,
    seed: u64,
}

impl SimulationRuntime {
    /// Builds the driver from `config` and publishes the initial readings.
    ///
    /// Without a configured seed a random one is drawn and logged, so the
    /// run can still be reproduced.
    pub fn new(config: RotorsimConfig, store: Arc<InMemoryStore>) -> Result<Self, EngineError> {
        let seed = config.simulator.seed.unwrap_or_else(rand::random);
        info!(
            profile = %config.simulator.profile,
            seed,
            interval_ms = config.simulator.tick_interval_ms,
            "Initializing simulation runtime"
        );
        debug!("Simulator config: {:?}", config.simulator);

        let metrics = MetricsRecorder::new().map_err(TelemetryError::from)?;
        let driver =
            TickDriver::from_config(store.clone(), &config.simulator, SeededNoise::new(seed));
        for failure in driver.publish_initial() {
            warn!(key = failure.key, error = %failure.error, "Initial value not published");
        }

        Ok(Self {
            config: Arc::new(config),
            store,
            driver,
            metrics: Arc::new(metrics),
            hasher: StateHasher::new(),
            counters: Counters::default(),
            last_record: None,
            recorder: None,
            diagnostics: DiagnosticsCollector::default(),
            seed,
        })
    }

    /// Appends every tick record to `recorder`.
    pub fn with_recorder(mut self, recorder: RecordWriter) -> Self {
        self.recorder = Some(recorder);
        self
    }

    /// Directory bug reports are written to. Defaults to the working directory.
    pub fn with_report_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.diagnostics = DiagnosticsCollector::new(dir);
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn config(&self) -> &RotorsimConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<InMemoryStore> {
        &self.store
    }

    pub fn state(&self) -> &SimulationState {
        self.driver.state()
    }

    /// Runs one tick and feeds its record to every sink.
    pub fn tick(&mut self) -> Result<TickReport, EngineError> {
        let started = Instant::now();
        let report = self.driver.on_tick();
        let elapsed = started.elapsed();

        let record = &report.record;
        self.metrics.observe_tick(record, elapsed);
        self.hasher.update(record);
        self.last_record = Some(*record);

        if !report.write_failures.is_empty() {
            self.metrics.inc_write_failures(report.write_failures.len());
            self.counters.write_failures += report.write_failures.len() as u64;
        }
        if report.read_fallback.is_some() {
            self.metrics.inc_read_fallbacks();
            self.counters.read_fallbacks += 1;
        }
        if record.alarm_changed {
            self.counters.alarm_transitions += 1;
            EventLogger::log_alarm_transition(record);
        }
        if self.config.telemetry.log_ticks {
            EventLogger::log_tick(record);
        }
        if let Some(recorder) = self.recorder.as_mut() {
            recorder.write(record)?;
        }

        Ok(report)
    }

    /// Runs `ticks` ticks without pausing, applying the scenario's client
    /// writes before the tick they are scheduled for.
    #[instrument(skip(self, scenario), fields(seed = self.seed))]
    pub async fn run_ticks(
        &mut self,
        ticks: u64,
        scenario: Option<&Scenario>,
    ) -> Result<RunSummary, EngineError> {
        info!("Running {ticks} ticks");

        for tick in 1..=ticks {
            if let Some(scenario) = scenario {
                for write in scenario.writes_before(tick) {
                    debug!(tick, key = %write.key, value = %write.value, "Scripted client write");
                    self.store.set(write.key.clone(), write.value);
                }
            }
            self.tick()?;
        }
        self.finish("simulation_complete").await
    }

    /// Ticks at the configured interval until `shutdown` turns true or its
    /// sender is dropped.
    #[instrument(skip_all, fields(seed = self.seed))]
    pub async fn run_realtime(
        &mut self,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<RunSummary, EngineError> {
        let period = Duration::from_millis(self.config.simulator.tick_interval_ms);
        info!("Ticking every {period:?}");

        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.tick()?;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Shutdown requested");
                        break;
                    }
                }
            }
        }
        self.finish("run_stopped").await
    }

    /// Compares the run hash against `expected`. On mismatch a bug report is
    /// written to the report directory.
    pub fn validate_hash(
        &mut self,
        expected: &str,
        summary: &RunSummary,
    ) -> Result<(), EngineError> {
        let expected = expected.trim();
        if summary.final_hash.eq_ignore_ascii_case(expected) {
            info!("State hash validated");
            return Ok(());
        }

        error!(expected, actual = %summary.final_hash, "State hash mismatch");
        let report = MismatchReport {
            expected_hash: expected,
            actual_hash: &summary.final_hash,
            profile: self.config.simulator.profile.to_string(),
            seed: summary.seed,
            ticks: summary.ticks,
            last_record: summary.last_record,
        };
        let path = match self.diagnostics.record_bug_report(&report) {
            Ok(path) => {
                error!("Bug report saved to: {}", path.display());
                Some(path)
            }
            Err(e) => {
                warn!("Failed to write bug report: {e}");
                None
            }
        };

        Err(EngineError::HashMismatch {
            expected: expected.to_string(),
            actual: summary.final_hash.clone(),
            report: path,
        })
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            ticks: self.hasher.ticks(),
            seed: self.seed,
            final_hash: self.hasher.hex_digest(),
            last_record: self.last_record,
            alarm_transitions: self.counters.alarm_transitions,
            write_failures: self.counters.write_failures,
            read_fallbacks: self.counters.read_fallbacks,
        }
    }

    async fn finish(&mut self, event: &str) -> Result<RunSummary, EngineError> {
        if let Some(recorder) = self.recorder.as_mut() {
            recorder.flush()?;
        }
        let summary = self.summary();
        info!(
            ticks = summary.ticks,
            alarm_transitions = summary.alarm_transitions,
            "Run complete. State hash: {}",
            summary.final_hash
        );
        EventLogger::log_event(
            event,
            vec![
                KeyValue::new("ticks", summary.ticks.to_string()),
                KeyValue::new("seed", summary.seed.to_string()),
                KeyValue::new("final_hash", summary.final_hash.clone()),
            ],
        )
        .await;
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rotorsim_config::Profile;
    use rotorsim_core::{keys, Value};
    use tracing_test::traced_test;

    fn config(profile: Profile, seed: u64) -> RotorsimConfig {
        let mut config = RotorsimConfig::for_profile(profile);
        config.simulator.seed = Some(seed);
        config.telemetry.log_ticks = false;
        config
    }

    fn runtime(profile: Profile, seed: u64) -> SimulationRuntime {
        SimulationRuntime::new(config(profile, seed), Arc::new(InMemoryStore::new())).unwrap()
    }

    #[tokio::test]
    async fn same_seed_same_hash() {
        let a = runtime(Profile::HighRate, 42).run_ticks(500, None).await.unwrap();
        let b = runtime(Profile::HighRate, 42).run_ticks(500, None).await.unwrap();
        let c = runtime(Profile::HighRate, 43).run_ticks(500, None).await.unwrap();

        assert_eq!(a.ticks, 500);
        assert_eq!(a.final_hash, b.final_hash);
        assert_ne!(a.final_hash, c.final_hash);
    }

    #[tokio::test]
    async fn scenario_writes_land_before_their_tick() {
        let scenario = Scenario::from_yaml(
            "ticks: 3\nwrites:\n  - { tick: 2, key: equipment.bearing.vibration, value: 9.0 }\n",
        )
        .unwrap();
        let mut rt = runtime(Profile::Baseline, 1);

        let summary = rt.run_ticks(scenario.ticks, Some(&scenario)).await.unwrap();

        assert_eq!(summary.ticks, 3);
        assert_eq!(summary.alarm_transitions, 1);
        let record = summary.last_record.unwrap();
        assert!((record.vibration - 9.04).abs() < 1e-9);
        assert_eq!(rt.store().get(keys::ALARM), Some(Value::Boolean(true)));
    }

    #[tokio::test]
    async fn counts_store_faults() {
        let mut rt = runtime(Profile::Baseline, 1);
        rt.store().fail_reads(keys::VIBRATION);
        rt.store().fail_writes(keys::PRESSURE);

        let summary = rt.run_ticks(5, None).await.unwrap();

        assert_eq!(summary.read_fallbacks, 5);
        assert_eq!(summary.write_failures, 5);
        assert_eq!(rt.metrics.store_write_failures.get(), 5);
        assert_eq!(rt.metrics.ticks.get(), 5);
    }

    #[tokio::test]
    async fn hash_mismatch_writes_bug_report() {
        let dir = std::env::temp_dir().join(format!("rotorsim-runtime-{}", std::process::id()));
        let mut rt = runtime(Profile::Baseline, 1).with_report_dir(&dir);
        let summary = rt.run_ticks(10, None).await.unwrap();

        assert!(rt.validate_hash(&summary.final_hash.to_uppercase(), &summary).is_ok());

        let err = rt.validate_hash("deadbeef", &summary).unwrap_err();
        match err {
            EngineError::HashMismatch { report, .. } => assert!(report.unwrap().exists()),
            other => panic!("unexpected error: {other}"),
        }
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[tokio::test]
    #[traced_test]
    async fn realtime_loop_stops_on_shutdown() {
        let mut config = config(Profile::Baseline, 3);
        config.simulator.tick_interval_ms = 5;
        let mut rt = SimulationRuntime::new(config, Arc::new(InMemoryStore::new())).unwrap();

        let (tx, rx) = watch::channel(false);
        let stopper = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(60)).await;
            tx.send(true).unwrap();
        });

        let summary = rt.run_realtime(rx).await.unwrap();
        stopper.await.unwrap();

        assert!(summary.ticks >= 1);
        assert_eq!(rt.state().sequence, summary.ticks);
        assert!(logs_contain("Shutdown requested"));
    }
}
