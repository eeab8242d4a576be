//! ## rotorsim-telemetry::metrics
//! **Prometheus registry for the simulated stream**
//!
//! Gauges mirror the latest readings so a scrape shows the same values a
//! store client would read; counters track tick health.

use std::time::Duration;

use prometheus::{Gauge, Histogram, HistogramOpts, IntCounter, IntGauge, Registry};
use rotorsim_core::TickRecord;

#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    pub registry: Registry,
    pub ticks: IntCounter,
    pub alarm_transitions: IntCounter,
    pub store_write_failures: IntCounter,
    pub store_read_fallbacks: IntCounter,
    pub vibration: Gauge,
    pub temperature: Gauge,
    pub pressure: Gauge,
    pub alarm_active: IntGauge,
    pub tick_duration: Histogram,
}

impl MetricsRecorder {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let ticks = IntCounter::new("rotorsim_ticks_total", "Completed simulation ticks")?;
        let alarm_transitions = IntCounter::new(
            "rotorsim_alarm_transitions_total",
            "Bearing alarm state changes",
        )?;
        let store_write_failures = IntCounter::new(
            "rotorsim_store_write_failures_total",
            "Store writes that failed and were dropped",
        )?;
        let store_read_fallbacks = IntCounter::new(
            "rotorsim_store_read_fallbacks_total",
            "Ticks that fell back to the internal vibration value",
        )?;
        let vibration = Gauge::new("rotorsim_vibration_mm_s", "Bearing vibration, mm/s")?;
        let temperature = Gauge::new("rotorsim_temperature_celsius", "Equipment temperature")?;
        let pressure = Gauge::new("rotorsim_pressure_bar", "System pressure")?;
        let alarm_active = IntGauge::new("rotorsim_alarm_active", "Bearing alarm flag")?;
        let tick_duration = Histogram::with_opts(
            HistogramOpts::new("rotorsim_tick_duration_ns", "Wall time spent in one tick")
                .buckets(vec![1_000.0, 10_000.0, 100_000.0, 1_000_000.0]),
        )?;

        registry.register(Box::new(ticks.clone()))?;
        registry.register(Box::new(alarm_transitions.clone()))?;
        registry.register(Box::new(store_write_failures.clone()))?;
        registry.register(Box::new(store_read_fallbacks.clone()))?;
        registry.register(Box::new(vibration.clone()))?;
        registry.register(Box::new(temperature.clone()))?;
        registry.register(Box::new(pressure.clone()))?;
        registry.register(Box::new(alarm_active.clone()))?;
        registry.register(Box::new(tick_duration.clone()))?;

        Ok(Self {
            registry,
            ticks,
            alarm_transitions,
            store_write_failures,
            store_read_fallbacks,
            vibration,
            temperature,
            pressure,
            alarm_active,
            tick_duration,
        })
    }

    /// Updates every metric from one completed tick.
    pub fn observe_tick(&self, record: &TickRecord, elapsed: Duration) {
        self.ticks.inc();
        if record.alarm_changed {
            self.alarm_transitions.inc();
        }
        self.vibration.set(record.vibration);
        self.temperature.set(record.temperature);
        self.pressure.set(record.pressure);
        self.alarm_active.set(i64::from(record.alarm_active));
        self.tick_duration.observe(elapsed.as_nanos() as f64);
    }

    pub fn inc_write_failures(&self, count: usize) {
        self.store_write_failures.inc_by(count as u64);
    }

    pub fn inc_read_fallbacks(&self) {
        self.store_read_fallbacks.inc();
    }

    pub fn gather_metrics(&self) -> Result<String, prometheus::Error> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::<u8>::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
