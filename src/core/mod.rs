//! Core module - numeric model, records, window and settings

pub mod config;
pub mod generator;
pub mod normal;
pub mod posterior;
pub mod record;
pub mod settings;
pub mod stats;
pub mod window;

pub use config::{ConfigError, SettingsLoader, SettingsOverrides};
pub use generator::MeasurementGenerator;
pub use normal::{normal_cdf, prob_in_range, sample_normal};
pub use posterior::Posterior;
pub use record::MeasurementRecord;
pub use settings::{SettingsError, SimulationSettings};
pub use stats::WindowStats;
pub use window::SlidingWindow;
