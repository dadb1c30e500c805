//! Shared test helpers for integration tests
//!
//! This module provides common utilities used across all test files.

#![allow(dead_code)]

use assert_cmd::cargo;
use assert_cmd::Command;
use chrono::{DateTime, TimeZone, Utc};
use qcsim::core::SimulationSettings;
use tempfile::TempDir;

/// Helper to get a qcsim command isolated from the user's settings
pub fn qcsim(tmp: &TempDir) -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("qcsim"));
    cmd.current_dir(tmp.path())
        .env("QCSIM_CONFIG_DIR", tmp.path().join("config"))
        .env_remove("QCSIM_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}

/// Helper to create a scratch directory
pub fn setup_workspace() -> TempDir {
    TempDir::new().unwrap()
}

/// Settings of the reference scenario with error injection switched off
pub fn scenario_a() -> SimulationSettings {
    SimulationSettings {
        production_mean: 185.0,
        production_std: 5.0,
        measurement_std: 2.0,
        prior_mean: 185.0,
        prior_std: 10.0,
        spec_lower: 180.0,
        spec_upper: 195.0,
        alpha: 0.05,
        measurement_error_rate: 0.0,
        production_error_rate: 0.0,
        ..Default::default()
    }
}

/// Fixed reference instant for deterministic timestamps
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 15, 9, 30, 0).unwrap()
}

/// Random source that returns the same 64-bit word forever
///
/// `FixedUniform::quarter()` makes every uniform f64 draw exactly 0.25, which
/// puts the Box-Muller angle at π/2 and therefore z ≈ 0.
pub struct FixedUniform(pub u64);

impl FixedUniform {
    pub fn quarter() -> Self {
        Self(1u64 << 62)
    }
}

impl rand::RngCore for FixedUniform {
    fn next_u32(&mut self) -> u32 {
        (self.0 >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        self.0
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        let bytes = self.0.to_le_bytes();
        for (i, b) in dst.iter_mut().enumerate() {
            *b = bytes[i % 8];
        }
    }
}
