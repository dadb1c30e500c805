//! Aggregate statistics over a window snapshot

use serde::{Deserialize, Serialize};

use crate::core::record::MeasurementRecord;

/// Counts and averages shown alongside the live window
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowStats {
    pub count: usize,
    pub flagged: usize,

    /// Flagged units that really were forced out of spec
    pub flagged_production_errors: usize,

    /// Units forced out of spec that were not flagged
    pub missed_production_errors: usize,

    /// Units with inflated measurement noise but no production error
    pub measurement_error_only: usize,

    /// Of those, the ones that were flagged anyway
    pub flagged_measurement_error_only: usize,

    pub avg_measured: f64,
    pub avg_posterior: f64,
    pub min_measured: f64,
    pub max_measured: f64,
}

impl WindowStats {
    /// Reduce records in one pass; every field is zero when there are none
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a MeasurementRecord>,
    {
        let mut stats = Self {
            min_measured: f64::INFINITY,
            max_measured: f64::NEG_INFINITY,
            ..Default::default()
        };

        let mut sum_measured = 0.0;
        let mut sum_posterior = 0.0;

        for r in records {
            stats.count += 1;
            if r.flagged {
                stats.flagged += 1;
            }
            match (r.has_production_error, r.flagged) {
                (true, true) => stats.flagged_production_errors += 1,
                (true, false) => stats.missed_production_errors += 1,
                _ => {}
            }
            if r.has_measurement_error && !r.has_production_error {
                stats.measurement_error_only += 1;
                if r.flagged {
                    stats.flagged_measurement_error_only += 1;
                }
            }

            sum_measured += r.measured_x;
            sum_posterior += r.post_mean;
            stats.min_measured = stats.min_measured.min(r.measured_x);
            stats.max_measured = stats.max_measured.max(r.measured_x);
        }

        if stats.count == 0 {
            return Self::default();
        }

        let n = stats.count as f64;
        stats.avg_measured = sum_measured / n;
        stats.avg_posterior = sum_posterior / n;
        stats
    }

    /// Fraction of units flagged, 0 when empty
    pub fn flag_rate(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.flagged as f64 / self.count as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn rec(measured_x: f64, production: bool, measurement: bool, flagged: bool) -> MeasurementRecord {
        MeasurementRecord {
            id: 0,
            timestamp: Utc::now(),
            true_y: measured_x,
            has_production_error: production,
            measured_x,
            has_measurement_error: measurement,
            post_mean: measured_x - 1.0,
            post_std: 1.96,
            p_in_spec: if flagged { 0.01 } else { 0.99 },
            flagged,
        }
    }

    #[test]
    fn test_empty_stats_are_zero() {
        let stats = WindowStats::from_records(std::iter::empty());
        assert_eq!(stats, WindowStats::default());
        assert_eq!(stats.min_measured, 0.0);
        assert_eq!(stats.flag_rate(), 0.0);
    }

    #[test]
    fn test_counts_and_averages() {
        let records = vec![
            rec(180.0, false, false, false),
            rec(170.0, true, false, true),
            rec(200.0, true, true, false),
            rec(190.0, false, true, true),
            rec(186.0, false, true, false),
        ];
        let stats = WindowStats::from_records(&records);

        assert_eq!(stats.count, 5);
        assert_eq!(stats.flagged, 2);
        assert_eq!(stats.flagged_production_errors, 1);
        assert_eq!(stats.missed_production_errors, 1);
        assert_eq!(stats.measurement_error_only, 2);
        assert_eq!(stats.flagged_measurement_error_only, 1);
        assert!((stats.avg_measured - 185.2).abs() < 1e-9);
        assert!((stats.avg_posterior - 184.2).abs() < 1e-9);
        assert_eq!(stats.min_measured, 170.0);
        assert_eq!(stats.max_measured, 200.0);
        assert!((stats.flag_rate() - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_iterator_input_matches_slice_input() {
        let records = vec![rec(181.0, false, false, false), rec(176.0, true, false, true)];
        let from_iter = WindowStats::from_records(records.iter().filter(|r| r.id == 0));
        assert_eq!(from_iter, WindowStats::from_records(&records));
        assert_eq!(from_iter.count, 2);
    }
}
