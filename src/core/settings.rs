//! Simulation settings - process, prior, spec and clock parameters

use chrono::TimeDelta;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Longest accepted window retention, in seconds (about 31 years)
pub const MAX_TIME_WINDOW_SECS: f64 = 1e9;

/// Longest accepted tick interval, in milliseconds (one day)
pub const MAX_INTERVAL_MS: u64 = 86_400_000;

/// Parameters for one simulation run
///
/// Settings are immutable for the duration of a tick and may be replaced
/// between ticks. The prior is deliberately held fixed even when the
/// production process drifts away from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    // Production
    /// Mean of the true-value generating distribution
    pub production_mean: f64,
    /// Std dev of the true-value generating distribution
    pub production_std: f64,

    // Measurement
    /// Nominal noise of the measuring instrument (τ)
    pub measurement_std: f64,
    /// Prior belief about the true value (μ₀)
    pub prior_mean: f64,
    /// Prior uncertainty (σ₀)
    pub prior_std: f64,

    // Spec & decision
    /// Lower specification limit (inclusive)
    pub spec_lower: f64,
    /// Upper specification limit (inclusive)
    pub spec_upper: f64,
    /// A unit is flagged when P(in spec) < alpha
    pub alpha: f64,

    // Error injection
    /// Probability that a tick measures with inflated noise
    pub measurement_error_rate: f64,
    /// Noise multiplier applied on a measurement error
    pub measurement_error_magnitude: f64,
    /// Probability that a unit is forced out of spec
    pub production_error_rate: f64,

    // Simulation control
    /// Tick period in milliseconds
    pub interval: u64,
    /// Sliding window retention in seconds
    pub time_window: f64,
    /// Whether the clock is ticking
    pub is_running: bool,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            production_mean: 185.0,
            production_std: 5.0,
            measurement_std: 2.0,
            prior_mean: 185.0,
            prior_std: 10.0,
            spec_lower: 180.0,
            spec_upper: 195.0,
            alpha: 0.05,
            measurement_error_rate: 0.2,
            measurement_error_magnitude: 3.0,
            production_error_rate: 0.1,
            interval: 1000,
            time_window: 60.0,
            is_running: false,
        }
    }
}

/// Reasons a settings value is rejected
#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
pub enum SettingsError {
    #[error("Setting '{field}' must be a finite number (got {value})")]
    #[diagnostic(code(qcsim::settings::not_finite))]
    NotFinite { field: &'static str, value: f64 },

    #[error("Setting '{field}' must be greater than zero (got {value})")]
    #[diagnostic(
        code(qcsim::settings::not_positive),
        help("the posterior divides by this value")
    )]
    NotPositive { field: &'static str, value: f64 },

    #[error("Setting '{field}' must not be negative (got {value})")]
    #[diagnostic(code(qcsim::settings::negative))]
    Negative { field: &'static str, value: f64 },

    #[error("Setting '{field}' must be within [0, 1] (got {value})")]
    #[diagnostic(code(qcsim::settings::out_of_range))]
    OutOfUnitRange { field: &'static str, value: f64 },

    #[error("Spec lower limit {lower} must be below spec upper limit {upper}")]
    #[diagnostic(code(qcsim::settings::spec_bounds))]
    SpecBounds { lower: f64, upper: f64 },

    #[error("Tick interval must be at least 1 ms")]
    #[diagnostic(code(qcsim::settings::interval))]
    ZeroInterval,

    #[error("Tick interval {value} ms exceeds the maximum of {max} ms")]
    #[diagnostic(code(qcsim::settings::interval_too_large))]
    IntervalTooLarge { value: u64, max: u64 },

    #[error("Setting 'time_window' {value} s exceeds the maximum of {max} s")]
    #[diagnostic(
        code(qcsim::settings::time_window_too_large),
        help("timestamps older than the window would fall outside the calendar range")
    )]
    TimeWindowTooLarge { value: f64, max: f64 },
}

impl SimulationSettings {
    /// Check every invariant the generator and the clock rely on
    pub fn validate(&self) -> Result<(), SettingsError> {
        let floats = [
            ("production_mean", self.production_mean),
            ("production_std", self.production_std),
            ("measurement_std", self.measurement_std),
            ("prior_mean", self.prior_mean),
            ("prior_std", self.prior_std),
            ("spec_lower", self.spec_lower),
            ("spec_upper", self.spec_upper),
            ("alpha", self.alpha),
            ("measurement_error_rate", self.measurement_error_rate),
            ("measurement_error_magnitude", self.measurement_error_magnitude),
            ("production_error_rate", self.production_error_rate),
            ("time_window", self.time_window),
        ];
        for (field, value) in floats {
            if !value.is_finite() {
                return Err(SettingsError::NotFinite { field, value });
            }
        }

        for (field, value) in [
            ("prior_std", self.prior_std),
            ("measurement_std", self.measurement_std),
            ("time_window", self.time_window),
        ] {
            if value <= 0.0 {
                return Err(SettingsError::NotPositive { field, value });
            }
        }

        for (field, value) in [
            ("production_std", self.production_std),
            ("measurement_error_magnitude", self.measurement_error_magnitude),
        ] {
            if value < 0.0 {
                return Err(SettingsError::Negative { field, value });
            }
        }

        for (field, value) in [
            ("alpha", self.alpha),
            ("measurement_error_rate", self.measurement_error_rate),
            ("production_error_rate", self.production_error_rate),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(SettingsError::OutOfUnitRange { field, value });
            }
        }

        if self.spec_lower >= self.spec_upper {
            return Err(SettingsError::SpecBounds {
                lower: self.spec_lower,
                upper: self.spec_upper,
            });
        }

        if self.time_window > MAX_TIME_WINDOW_SECS {
            return Err(SettingsError::TimeWindowTooLarge {
                value: self.time_window,
                max: MAX_TIME_WINDOW_SECS,
            });
        }

        if self.interval == 0 {
            return Err(SettingsError::ZeroInterval);
        }
        if self.interval > MAX_INTERVAL_MS {
            return Err(SettingsError::IntervalTooLarge {
                value: self.interval,
                max: MAX_INTERVAL_MS,
            });
        }

        Ok(())
    }

    /// Tick period as a std duration
    pub fn tick_period(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.interval)
    }

    /// Tick period as a calendar step, saturating for unvalidated values
    pub fn tick_step(&self) -> TimeDelta {
        i64::try_from(self.interval)
            .ok()
            .and_then(TimeDelta::try_milliseconds)
            .unwrap_or(TimeDelta::MAX)
    }

    /// Retention duration of the sliding window, saturating for unvalidated values
    pub fn retention(&self) -> TimeDelta {
        // `as` saturates at i64::MAX
        TimeDelta::try_milliseconds((self.time_window * 1000.0).round() as i64)
            .unwrap_or(TimeDelta::MAX)
    }
}
