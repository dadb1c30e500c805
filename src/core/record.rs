//! Measurement record - the output of one simulation tick

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One simulated unit: ground truth, observation and posterior decision
///
/// Records are never mutated after creation. `post_mean`/`post_std` are
/// computed under the nominal measurement noise and the fixed prior, even on
/// ticks where production or measurement errors were injected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    /// Sequence number within the current session (starts at 1)
    pub id: u64,

    /// Creation instant
    pub timestamp: DateTime<Utc>,

    /// True value of the unit
    pub true_y: f64,

    /// Whether `true_y` was forced outside the spec interval
    pub has_production_error: bool,

    /// Noisy observation of `true_y`
    pub measured_x: f64,

    /// Whether this measurement used inflated noise
    pub has_measurement_error: bool,

    /// Posterior mean of the true value
    pub post_mean: f64,

    /// Posterior standard deviation
    pub post_std: f64,

    /// Posterior probability the unit is within spec
    pub p_in_spec: f64,

    /// Out-of-spec decision (`p_in_spec < alpha`)
    pub flagged: bool,
}

impl MeasurementRecord {
    /// Whether the decision disagrees with the injected production state
    ///
    /// A flagged unit without a production error is a false alarm; an
    /// unflagged unit with one is a miss.
    pub fn is_misclassified(&self) -> bool {
        self.flagged != self.has_production_error
    }
}
