//! Gaussian-conjugate posterior for a single noisy observation
//!
//! Model:
//!   Y ~ Normal(prior_mean, prior_std²)
//!   X | Y ~ Normal(Y, meas_std²)
//!
//! The posterior Y | X is Normal with a precision-weighted mean.

use serde::{Deserialize, Serialize};

/// Posterior belief about the true value after one measurement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Posterior {
    pub mean: f64,
    pub std: f64,
}

impl Posterior {
    /// Combine the prior with the measurement likelihood
    ///
    /// Both `prior_std` and `meas_std` must be strictly positive; settings
    /// validation guarantees this before any tick runs.
    pub fn compute(measured_x: f64, prior_mean: f64, prior_std: f64, meas_std: f64) -> Self {
        let prior_var = prior_std * prior_std;
        let meas_var = meas_std * meas_std;

        let var = 1.0 / (1.0 / prior_var + 1.0 / meas_var);
        let mean = var * (prior_mean / prior_var + measured_x / meas_var);

        Self {
            mean,
            std: var.sqrt(),
        }
    }

    /// Posterior probability that the true value lies in [lower, upper]
    pub fn prob_in_range(&self, lower: f64, upper: f64) -> f64 {
        super::normal::prob_in_range(self.mean, self.std, lower, upper)
    }
}
