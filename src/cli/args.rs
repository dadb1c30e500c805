//! Command-line argument definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::cli::commands::batch::BatchArgs;
use crate::cli::commands::completions::CompletionsArgs;
use crate::cli::commands::config::ConfigCommands;
use crate::cli::commands::run::RunArgs;
use crate::core::SettingsOverrides;

/// Streaming Bayesian quality-control simulator
#[derive(Parser, Debug)]
#[command(name = "qcsim", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every subcommand
#[derive(clap::Args, Debug, Clone)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'o', global = true, default_value = "auto")]
    pub output: OutputFormat,

    /// Settings file layered over the user settings file
    #[arg(long, global = true, env = "QCSIM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Ignore the user settings file
    #[arg(long, global = true)]
    pub no_user_config: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the simulator live on a timer, printing records as they arrive
    Run(RunArgs),

    /// Generate ticks back to back with simulated timestamps
    Batch(BatchArgs),

    /// Manage settings files
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Generate shell completion scripts
    Completions(CompletionsArgs),
}

/// Output format for records and settings
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Table for records, YAML for settings
    #[default]
    Auto,
    /// Human-readable table
    Table,
    /// JSON (one object per record when streaming)
    Json,
    /// YAML
    Yaml,
    /// CSV with a header row
    Csv,
}

/// Individual settings overrides, applied over every settings file
#[derive(clap::Args, Debug, Clone, Default)]
pub struct SettingsArgs {
    /// Tick period in milliseconds
    #[arg(long, help_heading = "Settings")]
    pub interval: Option<u64>,

    /// Sliding window retention in seconds
    #[arg(long = "window", allow_negative_numbers = true, help_heading = "Settings")]
    pub time_window: Option<f64>,

    /// Mean of the production process
    #[arg(long, allow_negative_numbers = true, help_heading = "Settings")]
    pub production_mean: Option<f64>,

    /// Std dev of the production process
    #[arg(long, allow_negative_numbers = true, help_heading = "Settings")]
    pub production_std: Option<f64>,

    /// Nominal measurement noise (τ)
    #[arg(long, allow_negative_numbers = true, help_heading = "Settings")]
    pub measurement_std: Option<f64>,

    /// Prior mean (μ₀)
    #[arg(long, allow_negative_numbers = true, help_heading = "Settings")]
    pub prior_mean: Option<f64>,

    /// Prior std dev (σ₀)
    #[arg(long, allow_negative_numbers = true, help_heading = "Settings")]
    pub prior_std: Option<f64>,

    /// Lower spec limit (L)
    #[arg(long, allow_negative_numbers = true, help_heading = "Settings")]
    pub spec_lower: Option<f64>,

    /// Upper spec limit (U)
    #[arg(long, allow_negative_numbers = true, help_heading = "Settings")]
    pub spec_upper: Option<f64>,

    /// Flag threshold on P(in spec)
    #[arg(long, allow_negative_numbers = true, help_heading = "Settings")]
    pub alpha: Option<f64>,

    /// Probability of a measurement error per tick
    #[arg(long, allow_negative_numbers = true, help_heading = "Settings")]
    pub measurement_error_rate: Option<f64>,

    /// Noise multiplier on a measurement error
    #[arg(long, allow_negative_numbers = true, help_heading = "Settings")]
    pub measurement_error_magnitude: Option<f64>,

    /// Probability of a production error per tick
    #[arg(long, allow_negative_numbers = true, help_heading = "Settings")]
    pub production_error_rate: Option<f64>,
}

impl SettingsArgs {
    pub fn to_overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            production_mean: self.production_mean,
            production_std: self.production_std,
            measurement_std: self.measurement_std,
            prior_mean: self.prior_mean,
            prior_std: self.prior_std,
            spec_lower: self.spec_lower,
            spec_upper: self.spec_upper,
            alpha: self.alpha,
            measurement_error_rate: self.measurement_error_rate,
            measurement_error_magnitude: self.measurement_error_magnitude,
            production_error_rate: self.production_error_rate,
            interval: self.interval,
            time_window: self.time_window,
        }
    }
}
