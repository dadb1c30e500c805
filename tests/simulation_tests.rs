//! End-to-end simulation tests - generator, session and window together

mod common;

use chrono::TimeDelta;
use common::{epoch, scenario_a, FixedUniform};
use qcsim::core::{
    normal_cdf, prob_in_range, sample_normal, MeasurementGenerator, Posterior, SimulationSettings,
};
use qcsim::sim::{Clock, Session, SteppingClock};
use rand::rngs::StdRng;
use rand::SeedableRng;

// ============================================================================
// Numeric properties
// ============================================================================

#[test]
fn test_box_muller_moments_shrink_with_sample_size() {
    let mut rng = StdRng::seed_from_u64(2024);
    let (mean, std) = (-3.0, 0.5);

    for &n in &[10_000usize, 40_000] {
        let xs: Vec<f64> = (0..n).map(|_| sample_normal(&mut rng, mean, std)).collect();
        let m = xs.iter().sum::<f64>() / n as f64;
        let s = (xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (n as f64 - 1.0)).sqrt();

        // 5 standard errors for the mean, roughly 5 for the std
        let tol_mean = 5.0 * std / (n as f64).sqrt();
        let tol_std = 5.0 * std / (2.0 * n as f64).sqrt();
        assert!((m - mean).abs() < tol_mean, "n = {}: mean {}", n, m);
        assert!((s - std).abs() < tol_std, "n = {}: std {}", n, s);
    }
}

#[test]
fn test_cdf_properties() {
    assert!((normal_cdf(0.0) - 0.5).abs() < 1e-6);
    for i in 0..200 {
        let z = i as f64 * 0.05;
        assert!((normal_cdf(-z) - (1.0 - normal_cdf(z))).abs() < 1e-6);
        assert!(normal_cdf(z + 0.05) >= normal_cdf(z));
    }
}

#[test]
fn test_posterior_and_interval_properties() {
    let post = Posterior::compute(190.0, 185.0, 10.0, 2.0);
    assert!(post.std <= 2.0);

    let p = prob_in_range(post.mean, post.std, post.mean - 10.0 * post.std, post.mean + 10.0 * post.std);
    assert!((p - 1.0).abs() < 1e-6);
    assert!(prob_in_range(post.mean, post.std, post.mean, post.mean).abs() < 1e-9);
}

// ============================================================================
// Scenario A: no injected errors
// ============================================================================

#[test]
fn test_scenario_a_single_tick_deterministic() {
    let settings = scenario_a();
    let mut rng = FixedUniform::quarter();

    let rec = MeasurementGenerator.generate(&settings, &mut rng, 1, epoch());

    assert!(!rec.has_production_error);
    assert!(!rec.has_measurement_error);
    assert!((rec.true_y - 185.0).abs() < 1e-9);
    assert!((rec.measured_x - 185.0).abs() < 1e-9);
    assert!((rec.post_mean - 185.0).abs() < 1e-9);
    assert!(rec.p_in_spec > 0.9, "p_in_spec = {}", rec.p_in_spec);
    assert!(!rec.flagged);
    assert_eq!(rec.id, 1);
    assert_eq!(rec.timestamp, epoch());
}

#[test]
fn test_scenario_a_over_many_seeds() {
    let settings = scenario_a();
    let runs = 2000;
    let mut confident = 0;
    let mut flagged = 0;

    for seed in 0..runs {
        let mut session = Session::seeded(settings.clone(), seed).unwrap();
        let rec = session.tick(epoch());
        assert!(!rec.has_production_error);
        assert!(!rec.has_measurement_error);
        if rec.p_in_spec > 0.9 {
            confident += 1;
        }
        if rec.flagged {
            flagged += 1;
        }
    }

    // About 61% of units clear 0.9 and about 6% get flagged
    assert!(confident as f64 / runs as f64 > 0.5, "confident = {}", confident);
    assert!((flagged as f64 / runs as f64) < 0.12, "flagged = {}", flagged);
}

// ============================================================================
// Scenario B: every unit forced out of spec
// ============================================================================

#[test]
fn test_scenario_b_all_production_errors() {
    let settings = SimulationSettings {
        production_error_rate: 1.0,
        time_window: 1000.0,
        ..scenario_a()
    };
    let mut session = Session::seeded(settings.clone(), 77).unwrap();
    let clock = SteppingClock::new(epoch(), TimeDelta::seconds(1));

    for _ in 0..500 {
        let rec = session.tick(clock.now());
        assert!(rec.has_production_error);
        assert!(
            rec.true_y < settings.spec_lower || rec.true_y > settings.spec_upper,
            "true_y {} inside spec",
            rec.true_y
        );
    }

    // Roughly 92% are caught; near-boundary units can slip through
    let stats = session.stats();
    assert_eq!(stats.count, 500);
    assert!(stats.flagged_production_errors as f64 / stats.count as f64 > 0.8);
}

#[test]
fn test_scenario_b_deterministic_low_side() {
    let settings = SimulationSettings {
        production_error_rate: 1.0,
        ..scenario_a()
    };
    // Every uniform draw is 0.25: error fires, low side chosen, |N(0,3)| ≈ 0
    let rec = MeasurementGenerator.generate(&settings, &mut FixedUniform::quarter(), 1, epoch());
    assert!(rec.has_production_error);
    assert!((rec.true_y - 175.0).abs() < 1e-9);
    assert!(rec.flagged);
}

// ============================================================================
// Scenario C: sliding window retention
// ============================================================================

#[test]
fn test_scenario_c_window_retains_last_second() {
    let settings = SimulationSettings {
        interval: 100,
        time_window: 1.0,
        ..scenario_a()
    };
    let mut session = Session::seeded(settings, 5).unwrap();
    let clock = SteppingClock::new(epoch() + TimeDelta::milliseconds(100), TimeDelta::milliseconds(100));

    for _ in 0..15 {
        session.tick(clock.now());
    }

    let snap = session.snapshot();
    let now = epoch() + TimeDelta::milliseconds(1500);
    assert!(snap.len() <= 10, "window holds {}", snap.len());
    assert!(!snap.is_empty());
    assert!(snap.iter().all(|r| r.timestamp >= now - TimeDelta::seconds(1)));
    assert_eq!(snap.last().map(|r| r.id), Some(15));
}

#[test]
fn test_reset_yields_empty_snapshot_and_fresh_ids() {
    let mut session = Session::seeded(SimulationSettings::default(), 8).unwrap();
    let clock = SteppingClock::new(epoch(), TimeDelta::seconds(1));
    for _ in 0..10 {
        session.tick(clock.now());
    }
    session.reset();
    assert!(session.snapshot().is_empty());
    assert!(!session.settings().is_running);
    assert_eq!(session.tick(clock.now()).id, 1);
}
