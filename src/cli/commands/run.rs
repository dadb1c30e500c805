//! `qcsim run` command - live simulation on a timer

use std::time::Duration;

use console::style;
use miette::Result;
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

use crate::cli::helpers::{format_seconds, load_settings};
use crate::cli::output::{
    effective_format, print_json_line, print_record_header, print_record_row, print_stats,
    print_yaml, RecordCsvWriter,
};
use crate::cli::{GlobalOpts, OutputFormat, SettingsArgs};
use crate::core::{MeasurementRecord, WindowStats};
use crate::sim::SimulationController;

#[derive(clap::Args, Debug)]
pub struct RunArgs {
    /// Stop after this many seconds (runs until Ctrl-C when omitted)
    #[arg(long, short = 'd')]
    pub duration: Option<f64>,

    /// Random seed for a reproducible run
    #[arg(long)]
    pub seed: Option<u64>,

    /// Skip the statistics summary at the end
    #[arg(long)]
    pub no_summary: bool,

    #[command(flatten)]
    pub settings: SettingsArgs,
}

/// Streaming sink for records in the selected format
enum Sink {
    Table,
    Json,
    Yaml,
    Csv(RecordCsvWriter),
}

impl Sink {
    fn new(format: OutputFormat) -> Self {
        match effective_format(format, true) {
            OutputFormat::Json => Sink::Json,
            OutputFormat::Yaml => Sink::Yaml,
            OutputFormat::Csv => Sink::Csv(RecordCsvWriter::new()),
            OutputFormat::Table | OutputFormat::Auto => Sink::Table,
        }
    }

    fn begin(&self) {
        if let Sink::Table = self {
            print_record_header();
        }
    }

    fn record(&mut self, record: &MeasurementRecord) -> Result<()> {
        match self {
            Sink::Table => {
                print_record_row(record);
                Ok(())
            }
            Sink::Json => print_json_line(record),
            Sink::Yaml => {
                println!("---");
                print_yaml(record)
            }
            Sink::Csv(writer) => writer.write(record),
        }
    }

    fn summary(&self, stats: &WindowStats, controller: &SimulationController) -> Result<()> {
        match self {
            Sink::Table => {
                print_stats(stats, &controller.settings());
                Ok(())
            }
            Sink::Json => print_json_line(&serde_json::json!({ "stats": stats })),
            Sink::Yaml => {
                println!("---");
                print_yaml(&serde_json::json!({ "stats": stats }))
            }
            // CSV stays a single rectangular table
            Sink::Csv(_) => Ok(()),
        }
    }
}

/// Run the live simulation
pub async fn run(args: RunArgs, global: &GlobalOpts) -> Result<()> {
    let duration = args
        .duration
        .map(|secs| {
            Duration::try_from_secs_f64(secs).map_err(|_| {
                miette::miette!(
                    "--duration must be a non-negative number of seconds (got {})",
                    secs
                )
            })
        })
        .transpose()?;
    let settings = load_settings(global, &args.settings)?;

    let mut builder = SimulationController::builder(settings);
    if let Some(seed) = args.seed {
        builder = builder.seed(seed);
    }
    let controller = builder.build()?;
    let mut records = controller.subscribe();
    let mut sink = Sink::new(global.output);

    if matches!(sink, Sink::Table) {
        let settings = controller.settings();
        println!(
            "{} Simulating every {} ms, window {}, spec [{}, {}], α = {}",
            style("▶").green(),
            settings.interval,
            format_seconds(settings.time_window),
            settings.spec_lower,
            settings.spec_upper,
            settings.alpha
        );
        println!("  Press {} to stop.", style("Ctrl-C").cyan());
        println!();
    }

    sink.begin();
    controller.start();

    // A deadline past the end of the monotonic clock never fires
    let deadline = duration.and_then(|d| tokio::time::Instant::now().checked_add(d));
    let until_deadline = async {
        match deadline {
            Some(at) => tokio::time::sleep_until(at).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(until_deadline);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            received = records.recv() => match received {
                Ok(record) => sink.record(&record)?,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "output fell behind; records skipped");
                }
                Err(RecvError::Closed) => break,
            },
            _ = &mut until_deadline => break,
            _ = &mut ctrl_c => break,
        }
    }

    controller.stop();

    if !args.no_summary {
        sink.summary(&controller.stats(), &controller)?;
    }

    Ok(())
}
