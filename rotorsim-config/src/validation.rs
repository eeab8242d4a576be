//! Custom validation functions for configuration.
//!
//! Numeric checks live here rather than in `range(...)` attributes because
//! the signal parameters are floats and must also be finite.

use std::borrow::Cow;

use rotorsim_core::{SignalModel, VibrationModel, Waveform};
use validator::ValidationError;

use crate::simulator::SimulatorConfig;

fn invalid(code: &'static str, message: String) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Owned(message));
    error
}

fn finite(name: &str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(invalid("not_finite", format!("{name} must be finite")))
    }
}

fn non_negative(name: &str, value: f64) -> Result<(), ValidationError> {
    finite(name, value)?;
    if value < 0.0 {
        return Err(invalid("negative", format!("{name} must not be negative")));
    }
    Ok(())
}

fn probability(name: &str, value: f64) -> Result<(), ValidationError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(
            "invalid_probability",
            format!("{name} must be within [0, 1]"),
        ))
    }
}

fn validate_waveform(name: &str, waveform: &Waveform) -> Result<(), ValidationError> {
    finite(&format!("{name}.offset"), waveform.offset)?;
    non_negative(&format!("{name}.amplitude"), waveform.amplitude)?;
    finite(&format!("{name}.frequency"), waveform.frequency)?;
    non_negative(&format!("{name}.noise_amplitude"), waveform.noise_amplitude)?;
    probability(&format!("{name}.anomaly_probability"), waveform.anomaly_probability)?;
    finite(&format!("{name}.anomaly_magnitude"), waveform.anomaly_magnitude)
}

/// Validate that every signal parameter is finite and the clamp range is ordered.
pub fn validate_signal_model(model: &SignalModel) -> Result<(), ValidationError> {
    finite("vibration_min", model.vibration_min)?;
    finite("vibration_max", model.vibration_max)?;
    if model.vibration_min > model.vibration_max {
        return Err(invalid(
            "invalid_range",
            format!(
                "vibration_min ({}) exceeds vibration_max ({})",
                model.vibration_min, model.vibration_max
            ),
        ));
    }

    match model.vibration {
        VibrationModel::Drift {
            drift_per_tick,
            noise_amplitude,
        } => {
            finite("vibration.drift_per_tick", drift_per_tick)?;
            non_negative("vibration.noise_amplitude", noise_amplitude)?;
        }
        VibrationModel::Oscillatory {
            base,
            amplitude,
            frequency,
            noise_amplitude,
            spike_probability,
            spike_magnitude,
        } => {
            finite("vibration.base", base)?;
            non_negative("vibration.amplitude", amplitude)?;
            finite("vibration.frequency", frequency)?;
            non_negative("vibration.noise_amplitude", noise_amplitude)?;
            probability("vibration.spike_probability", spike_probability)?;
            finite("vibration.spike_magnitude", spike_magnitude)?;
        }
    }

    validate_waveform("temperature", &model.temperature)?;
    validate_waveform("pressure", &model.pressure)
}

/// Cross-field checks on the simulator section.
pub fn validate_simulator(config: &SimulatorConfig) -> Result<(), ValidationError> {
    finite("clock_step", config.clock_step)?;
    if config.clock_step <= 0.0 {
        return Err(invalid("invalid_clock_step", "clock_step must be positive".into()));
    }
    finite("alarm_threshold", config.alarm_threshold)?;
    finite("initial.temperature", config.initial.temperature)?;
    finite("initial.pressure", config.initial.pressure)?;

    let vibration = config.initial.vibration;
    let (min, max) = (config.signal.vibration_min, config.signal.vibration_max);
    if !vibration.is_finite() || vibration < min || vibration > max {
        return Err(invalid(
            "initial_out_of_range",
            format!("initial.vibration ({vibration}) must lie within [{min}, {max}]"),
        ));
    }
    Ok(())
}

/// Validate a tracing level name.
pub fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let re = regex::Regex::new("^(?i)(trace|debug|info|warn|error)$")
        .map_err(|_| ValidationError::new("invalid_regex"))?;
    if re.is_match(level) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_log_level"))
    }
}
