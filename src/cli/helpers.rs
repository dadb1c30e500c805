//! Shared helper functions for CLI commands
//!
//! This module contains utility functions that are used across multiple
//! command modules to avoid code duplication.

use chrono::{DateTime, Local, Utc};
use tracing::debug;

use crate::cli::{GlobalOpts, SettingsArgs};
use crate::core::{ConfigError, SettingsLoader, SimulationSettings};

/// Format a timestamp as local wall-clock time (H:M:S)
pub fn format_time(ts: &DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%H:%M:%S").to_string()
}

/// Format a measurement-scale value with two decimals
pub fn format_value(v: f64) -> String {
    format!("{:.2}", v)
}

/// Format a probability with three decimals
pub fn format_probability(p: f64) -> String {
    format!("{:.3}", p)
}

/// Resolve effective settings from files and flags
///
/// Layers: defaults, user settings file (unless `--no-user-config`),
/// `--config`, then individual flags.
pub fn load_settings(
    global: &GlobalOpts,
    args: &SettingsArgs,
) -> Result<SimulationSettings, ConfigError> {
    let mut loader = if global.no_user_config {
        SettingsLoader::empty()
    } else {
        SettingsLoader::new()
    };
    if let Some(path) = &global.config {
        loader = loader.with_file(path);
    }
    loader = loader.with_overrides(args.to_overrides());

    debug!(files = ?loader.files(), "loading settings");
    loader.load()
}

/// Render a duration in seconds compactly ("1.5s", "60s")
pub fn format_seconds(secs: f64) -> String {
    if secs.fract() == 0.0 {
        format!("{}s", secs as i64)
    } else {
        format!("{}s", secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(185.0), "185.00");
        assert_eq!(format_value(179.126), "179.13");
    }

    #[test]
    fn test_format_probability() {
        assert_eq!(format_probability(0.99460), "0.995");
        assert_eq!(format_probability(0.0), "0.000");
    }

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_seconds(60.0), "60s");
        assert_eq!(format_seconds(1.5), "1.5s");
    }
}
