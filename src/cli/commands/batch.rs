//! `qcsim batch` command - offline run with simulated timestamps
//!
//! Ticks are generated back to back; timestamps advance by the configured
//! interval so the sliding window behaves exactly as in a live run.

use chrono::Utc;
use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::cli::helpers::load_settings;
use crate::cli::output::{
    effective_format, print_json, print_measured_histogram, print_record_header,
    print_record_row, print_stats, print_yaml, write_records_csv,
};
use crate::cli::{GlobalOpts, OutputFormat, SettingsArgs};
use crate::core::{MeasurementRecord, SimulationSettings, WindowStats};
use crate::sim::{Clock, Session, SteppingClock};

#[derive(clap::Args, Debug)]
pub struct BatchArgs {
    /// Number of ticks to simulate
    #[arg(long, short = 'n', default_value = "100")]
    pub ticks: u64,

    /// Random seed for a reproducible run
    #[arg(long)]
    pub seed: Option<u64>,

    /// Rows to show in table output (newest first)
    #[arg(long, short = 'l', default_value = "10")]
    pub limit: usize,

    /// Show ASCII histogram of measured values in the window
    #[arg(long)]
    pub histogram: bool,

    /// Number of histogram bins
    #[arg(long, default_value = "20")]
    pub bins: usize,

    #[command(flatten)]
    pub settings: SettingsArgs,
}

/// Machine-readable batch result
#[derive(Debug, Serialize)]
struct BatchReport<'a> {
    session: String,
    ticks: u64,
    settings: &'a SimulationSettings,
    stats: &'a WindowStats,
    records: &'a [MeasurementRecord],
}

/// Run the batch command
pub fn run(args: BatchArgs, global: &GlobalOpts) -> Result<()> {
    let settings = load_settings(global, &args.settings)?;

    let mut session = match args.seed {
        Some(seed) => Session::seeded(settings, seed)?,
        None => Session::new(settings)?,
    };

    let clock = SteppingClock::new(Utc::now(), session.settings().tick_step());
    for _ in 0..args.ticks {
        session.tick(clock.now());
    }

    let records = session.snapshot();
    let stats = WindowStats::from_records(&records);

    match effective_format(global.output, true) {
        OutputFormat::Json | OutputFormat::Yaml => {
            let report = BatchReport {
                session: session.id().to_string(),
                ticks: args.ticks,
                settings: session.settings(),
                stats: &stats,
                records: &records,
            };
            if global.output == OutputFormat::Json {
                print_json(&report)?;
            } else {
                print_yaml(&report)?;
            }
        }
        OutputFormat::Csv => {
            write_records_csv(std::io::stdout(), &records)?;
        }
        OutputFormat::Table | OutputFormat::Auto => {
            if records.is_empty() {
                println!("No records in the window. Run more ticks.");
                return Ok(());
            }

            println!(
                "{} {} ticks simulated, {} in window (session {})",
                style("●").cyan(),
                args.ticks,
                style(records.len()).cyan(),
                style(session.id()).dim()
            );
            println!();

            print_record_header();
            for record in records.iter().rev().take(args.limit) {
                print_record_row(record);
            }
            if records.len() > args.limit {
                println!(
                    "{}",
                    style(format!(
                        "Showing last {} of {} measurements",
                        args.limit,
                        records.len()
                    ))
                    .dim()
                );
            }

            print_stats(&stats, session.settings());

            if args.histogram {
                println!();
                print_measured_histogram(&records, args.bins, session.settings())
                    .into_diagnostic()?;
            }
        }
    }

    Ok(())
}
