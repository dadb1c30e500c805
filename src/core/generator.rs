//! Measurement event generator
//!
//! Produces one [`MeasurementRecord`] per call from the current settings and a
//! random source:
//!
//! 1. draw the true value from the production distribution
//! 2. maybe force it out of spec (production error)
//! 3. maybe inflate the instrument noise (measurement error)
//! 4. observe the true value through that noise
//! 5. update the fixed prior with the observation, assuming nominal noise
//! 6. flag the unit when the posterior probability of being in spec < alpha

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::core::normal::sample_normal;
use crate::core::posterior::Posterior;
use crate::core::record::MeasurementRecord;
use crate::core::settings::SimulationSettings;

/// Distance beyond the spec limit where forced production errors start
const PRODUCTION_ERROR_OFFSET: f64 = 5.0;

/// Spread of forced production errors beyond the offset
const PRODUCTION_ERROR_SPREAD: f64 = 3.0;

/// Stateless generator of measurement records
#[derive(Debug, Clone, Copy, Default)]
pub struct MeasurementGenerator;

impl MeasurementGenerator {
    /// Simulate one unit
    ///
    /// `settings` must have passed [`SimulationSettings::validate`].
    pub fn generate<R: Rng + ?Sized>(
        &self,
        settings: &SimulationSettings,
        rng: &mut R,
        id: u64,
        timestamp: DateTime<Utc>,
    ) -> MeasurementRecord {
        let (true_y, has_production_error) = Self::draw_true_value(settings, rng);

        let mut used_std = settings.measurement_std;
        let has_measurement_error = rng.random::<f64>() < settings.measurement_error_rate;
        if has_measurement_error {
            used_std *= settings.measurement_error_magnitude;
        }

        let measured_x = sample_normal(rng, true_y, used_std);

        // Nominal noise on purpose: the model is blind to injected errors
        let posterior = Posterior::compute(
            measured_x,
            settings.prior_mean,
            settings.prior_std,
            settings.measurement_std,
        );
        let p_in_spec = posterior.prob_in_range(settings.spec_lower, settings.spec_upper);

        MeasurementRecord {
            id,
            timestamp,
            true_y,
            has_production_error,
            measured_x,
            has_measurement_error,
            post_mean: posterior.mean,
            post_std: posterior.std,
            p_in_spec,
            flagged: p_in_spec < settings.alpha,
        }
    }

    fn draw_true_value<R: Rng + ?Sized>(settings: &SimulationSettings, rng: &mut R) -> (f64, bool) {
        let true_y = sample_normal(rng, settings.production_mean, settings.production_std);

        if rng.random::<f64>() >= settings.production_error_rate {
            return (true_y, false);
        }

        let low_side = rng.random::<f64>() < 0.5;
        let excess = sample_normal(rng, 0.0, PRODUCTION_ERROR_SPREAD).abs();
        let forced = if low_side {
            settings.spec_lower - PRODUCTION_ERROR_OFFSET - excess
        } else {
            settings.spec_upper + PRODUCTION_ERROR_OFFSET + excess
        };
        (forced, true)
    }
}
