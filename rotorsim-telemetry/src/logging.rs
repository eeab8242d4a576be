//! ## rotorsim-telemetry::logging
//! **Structured logging with tracing**
//!
//! One info event per completed tick carries every reading as a structured
//! field, so any subscriber (text, JSON, OpenTelemetry) gets the full record.

use opentelemetry::KeyValue;
use rotorsim_config::TelemetryConfig;
use rotorsim_core::TickRecord;
use tracing::{info, info_span, warn, Instrument};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, EnvFilter};

use crate::TelemetryError;

#[derive(Clone)]
pub struct EventLogger;

impl EventLogger {
    /// Installs the global subscriber. `RUST_LOG` overrides the configured level.
    pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_lowercase()));

        let builder = fmt()
            .with_env_filter(filter)
            .with_thread_names(true)
            .with_span_events(FmtSpan::NONE);

        let result = if config.json {
            builder.json().try_init()
        } else {
            builder.try_init()
        };
        result.map_err(|e| TelemetryError::Init(e.to_string()))
    }

    /// Emits the observability record of one tick.
    pub fn log_tick(record: &TickRecord) {
        info!(
            sequence = record.sequence,
            clock = record.clock,
            vibration = record.vibration,
            temperature = record.temperature,
            pressure = record.pressure,
            alarm = record.alarm_active,
            "Vib: {:.2} mm/s  Temp: {:.2} °C  Press: {:.3} bar  Alarm: {}",
            record.vibration,
            record.temperature,
            record.pressure,
            if record.alarm_active { "ON" } else { "OFF" }
        );
    }

    /// Logs an alarm edge. Called only on ticks where the alarm changed.
    pub fn log_alarm_transition(record: &TickRecord) {
        if record.alarm_active {
            warn!(
                sequence = record.sequence,
                vibration = record.vibration,
                "Bearing vibration alarm raised"
            );
        } else {
            info!(
                sequence = record.sequence,
                vibration = record.vibration,
                "Bearing vibration alarm cleared"
            );
        }
    }

    /// Lifecycle events (run started/finished, hash checks).
    #[inline]
    pub async fn log_event(event_type: &str, metadata: Vec<KeyValue>) {
        let span = info_span!(
            "simulator_event",
            event_type = event_type,
            otel.kind = "INTERNAL"
        );

        async {
            info!(metadata = ?metadata, "Simulator event occurred");
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    fn record(alarm_active: bool) -> TickRecord {
        TickRecord {
            sequence: 290,
            clock: 29.0,
            vibration: 7.0,
            temperature: 26.2,
            pressure: 1.034,
            alarm_active,
            alarm_changed: true,
        }
    }

    #[traced_test]
    #[test]
    fn tick_record_is_logged() {
        EventLogger::log_tick(&record(true));
        assert!(logs_contain("Vib: 7.00 mm/s"));
        assert!(logs_contain("Alarm: ON"));
    }

    #[traced_test]
    #[test]
    fn alarm_edges_are_logged() {
        EventLogger::log_alarm_transition(&record(true));
        assert!(logs_contain("alarm raised"));
        EventLogger::log_alarm_transition(&record(false));
        assert!(logs_contain("alarm cleared"));
    }

    #[traced_test]
    #[test]
    fn test_logging() {
        tokio::runtime::Runtime::new()
            .unwrap()
            .block_on(EventLogger::log_event(
                "simulation_complete",
                vec![KeyValue::new("ticks", "10")],
            ));
        assert!(logs_contain("Simulator event occurred"));
    }
}
