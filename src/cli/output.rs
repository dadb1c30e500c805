//! Output formatting utilities

use std::io::Write;

use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::cli::helpers::{format_probability, format_seconds, format_time, format_value};
use crate::cli::OutputFormat;
use crate::core::{MeasurementRecord, SimulationSettings, WindowStats};

/// Determine the effective output format based on context
pub fn effective_format(format: OutputFormat, is_list: bool) -> OutputFormat {
    match format {
        OutputFormat::Auto => {
            if is_list {
                OutputFormat::Table
            } else {
                OutputFormat::Yaml
            }
        }
        other => other,
    }
}

/// Column header for record tables
pub fn print_record_header() {
    println!(
        "{:<6} {:<10} {:>9} {:<5} {:>11} {:<5} {:>17} {:>9} {:<12}",
        style("ID").bold(),
        style("TIME").bold(),
        style("TRUE Y").bold(),
        style("PROD").bold(),
        style("MEASURED X").bold(),
        style("MEAS").bold(),
        style("POSTERIOR").bold(),
        style("P(IN)").bold(),
        style("STATUS").bold()
    );
    println!("{}", "-".repeat(94));
}

/// One table row per record
pub fn print_record_row(record: &MeasurementRecord) {
    let yes_no = |flag: bool, yes: console::StyledObject<&'static str>| {
        if flag {
            yes
        } else {
            style("no").dim()
        }
    };

    let status = match (record.flagged, record.is_misclassified()) {
        (true, false) => style("OUT OF SPEC").red().bold(),
        (true, true) => style("FALSE ALARM").yellow().bold(),
        (false, true) => style("MISSED").magenta(),
        (false, false) => style("OK").green(),
    };

    println!(
        "{:<6} {:<10} {:>9} {:<5} {:>11} {:<5} {:>17} {:>9} {:<12}",
        style(record.id).cyan(),
        format_time(&record.timestamp),
        format_value(record.true_y),
        yes_no(record.has_production_error, style("YES").red()),
        format_value(record.measured_x),
        yes_no(record.has_measurement_error, style("YES").yellow()),
        format!(
            "{} ± {}",
            format_value(record.post_mean),
            format_value(record.post_std)
        ),
        format_probability(record.p_in_spec),
        status
    );
}

/// Summary block of window statistics
pub fn print_stats(stats: &WindowStats, settings: &SimulationSettings) {
    println!();
    println!(
        "   {} (last {}):",
        style("Window Statistics").bold(),
        format_seconds(settings.time_window)
    );
    println!("     Count: {}", stats.count);
    println!(
        "     Flagged: {} ({:.1}%)",
        stats.flagged,
        stats.flag_rate() * 100.0
    );
    println!(
        "     Measured: avg {}, min {}, max {}",
        format_value(stats.avg_measured),
        format_value(stats.min_measured),
        format_value(stats.max_measured)
    );
    println!(
        "     Avg Posterior Mean: {}",
        format_value(stats.avg_posterior)
    );
    println!();
    println!("   {}:", style("Error Detection").bold());
    println!(
        "     Flagged Production Errors: {}",
        stats.flagged_production_errors
    );
    println!(
        "     Missed Production Errors: {}",
        stats.missed_production_errors
    );
    println!(
        "     Measurement-Error Only: {} ({} flagged)",
        stats.measurement_error_only, stats.flagged_measurement_error_only
    );
}

/// Serialize a value as pretty JSON to stdout
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).into_diagnostic()?);
    Ok(())
}

/// Serialize a value as a single JSON line to stdout
pub fn print_json_line<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value).into_diagnostic()?);
    Ok(())
}

/// Serialize a value as YAML to stdout
pub fn print_yaml<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    print!("{}", serde_yml::to_string(value).into_diagnostic()?);
    Ok(())
}

/// CSV writer over stdout for streaming records
pub struct RecordCsvWriter {
    inner: csv::Writer<std::io::Stdout>,
}

impl RecordCsvWriter {
    pub fn new() -> Self {
        Self {
            inner: csv::Writer::from_writer(std::io::stdout()),
        }
    }

    /// Write one record; the header is emitted before the first row
    pub fn write(&mut self, record: &MeasurementRecord) -> Result<()> {
        self.inner.serialize(record).into_diagnostic()?;
        self.inner.flush().into_diagnostic()
    }
}

impl Default for RecordCsvWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Write records as CSV to any writer
pub fn write_records_csv<W: Write>(writer: W, records: &[MeasurementRecord]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for record in records {
        wtr.serialize(record).into_diagnostic()?;
    }
    wtr.flush().into_diagnostic()
}

/// Counts of measured values per bin, with the flagged share of each bin
#[derive(Debug, Clone, PartialEq)]
pub struct MeasuredHistogram {
    pub start: f64,
    pub bin_width: f64,
    pub total: Vec<usize>,
    pub flagged: Vec<usize>,
}

impl MeasuredHistogram {
    /// Bin measured values over a range that always shows the spec limits
    ///
    /// `None` when the range collapses (or is not finite).
    pub fn from_records(
        records: &[MeasurementRecord],
        bins: usize,
        lower: f64,
        upper: f64,
    ) -> Option<Self> {
        let bins = bins.max(1);
        let margin = (upper - lower) * 0.1;
        let (start, end) = records
            .iter()
            .map(|r| r.measured_x)
            .filter(|x| x.is_finite())
            .fold((lower - margin, upper + margin), |(lo, hi), x| {
                (lo.min(x), hi.max(x))
            });

        let bin_width = (end - start) / bins as f64;
        if !bin_width.is_finite() || bin_width <= 0.0 {
            return None;
        }

        let mut histogram = Self {
            start,
            bin_width,
            total: vec![0; bins],
            flagged: vec![0; bins],
        };
        for r in records {
            let i = histogram.bin_of(r.measured_x);
            histogram.total[i] += 1;
            if r.flagged {
                histogram.flagged[i] += 1;
            }
        }
        Some(histogram)
    }

    /// Bin index of a value; out-of-range values land in the edge bins
    pub fn bin_of(&self, x: f64) -> usize {
        let i = ((x - self.start) / self.bin_width).max(0.0) as usize;
        i.min(self.total.len() - 1)
    }

    pub fn center(&self, i: usize) -> f64 {
        self.start + (i as f64 + 0.5) * self.bin_width
    }
}

/// Render the histogram of measured values against the spec limits
///
/// Each bar is split into unflagged units (solid, green inside spec and red
/// outside) and flagged units (shaded).
pub fn write_measured_histogram<W: Write>(
    out: &mut W,
    records: &[MeasurementRecord],
    bins: usize,
    settings: &SimulationSettings,
) -> std::io::Result<()> {
    const BAR_WIDTH: usize = 50;

    let (lower, upper) = (settings.spec_lower, settings.spec_upper);
    let Some(histogram) = MeasuredHistogram::from_records(records, bins, lower, upper) else {
        return Ok(());
    };
    let peak = histogram.total.iter().copied().max().unwrap_or(0).max(1);
    let lsl_bin = histogram.bin_of(lower);
    let usl_bin = histogram.bin_of(upper);

    writeln!(
        out,
        "   {} ({} values, {} bins, {} = flagged):",
        style("Measured Distribution").bold(),
        records.len(),
        histogram.total.len(),
        style("▒").yellow()
    )?;
    writeln!(out)?;

    for (i, (&total, &flagged)) in histogram.total.iter().zip(&histogram.flagged).enumerate() {
        let width = total * BAR_WIDTH / peak;
        let flagged_width = if total == 0 { 0 } else { flagged * width / total };
        let center = histogram.center(i);

        let solid = "█".repeat(width - flagged_width);
        let solid = if (lower..=upper).contains(&center) {
            style(solid).green()
        } else {
            style(solid).red()
        };
        let shaded = style("▒".repeat(flagged_width)).yellow();

        let marker = match (i == lsl_bin, i == usl_bin) {
            (true, true) => " ◄LSL/USL",
            (true, false) => " ◄LSL",
            (false, true) => " ◄USL",
            (false, false) => "",
        };
        let count = if flagged > 0 {
            format!("{} ({} flagged)", total, flagged)
        } else {
            total.to_string()
        };

        writeln!(
            out,
            "   {:>9.2} │{}{} {}{}",
            center,
            solid,
            shaded,
            style(count).dim(),
            style(marker).yellow()
        )?;
    }

    Ok(())
}

/// Print the measured-value histogram to stdout
pub fn print_measured_histogram(
    records: &[MeasurementRecord],
    bins: usize,
    settings: &SimulationSettings,
) -> std::io::Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    write_measured_histogram(&mut out, records, bins, settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn measured(id: u64, measured_x: f64, flagged: bool) -> MeasurementRecord {
        MeasurementRecord {
            id,
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            true_y: measured_x,
            has_production_error: false,
            measured_x,
            has_measurement_error: false,
            post_mean: measured_x,
            post_std: 1.96,
            p_in_spec: if flagged { 0.01 } else { 0.99 },
            flagged,
        }
    }

    #[test]
    fn test_histogram_range_covers_spec_limits() {
        let records = vec![measured(1, 186.0, false), measured(2, 187.0, false)];
        let h = MeasuredHistogram::from_records(&records, 10, 180.0, 195.0).unwrap();

        assert!((h.start - 178.5).abs() < 1e-9);
        assert!((h.bin_width - 1.8).abs() < 1e-9);
        assert_eq!(h.total.iter().sum::<usize>(), 2);
        assert_eq!(h.bin_of(170.0), 0);
        assert_eq!(h.bin_of(500.0), 9);
    }

    #[test]
    fn test_histogram_splits_flagged_units() {
        let records = vec![
            measured(1, 170.0, true),
            measured(2, 170.2, false),
            measured(3, 187.0, false),
            measured(4, 210.0, true),
        ];
        let h = MeasuredHistogram::from_records(&records, 4, 180.0, 195.0).unwrap();

        // range 170..210, 10 wide per bin
        assert_eq!(h.total, vec![2, 1, 0, 1]);
        assert_eq!(h.flagged, vec![1, 0, 0, 1]);
        assert!((h.start - 170.0).abs() < 1e-9);
    }

    #[test]
    fn test_histogram_degenerate_range() {
        assert!(MeasuredHistogram::from_records(&[], 5, 185.0, 185.0).is_none());
    }

    #[test]
    fn test_histogram_rendering_marks_limits_and_flags() {
        let records = vec![measured(1, 170.0, true), measured(2, 186.0, false)];
        let settings = SimulationSettings::default();

        let mut buf = Vec::new();
        write_measured_histogram(&mut buf, &records, 10, &settings).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.contains("Measured Distribution"));
        assert!(text.contains("◄LSL"));
        assert!(text.contains("◄USL"));
        assert!(text.contains("1 flagged"));
        assert!(text.contains("▒"));
    }

    #[test]
    fn test_effective_format() {
        assert_eq!(effective_format(OutputFormat::Auto, true), OutputFormat::Table);
        assert_eq!(effective_format(OutputFormat::Auto, false), OutputFormat::Yaml);
        assert_eq!(effective_format(OutputFormat::Json, true), OutputFormat::Json);
    }

    #[test]
    fn test_csv_has_header_and_rows() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let records: Vec<MeasurementRecord> = (1..=2)
            .map(|id| MeasurementRecord {
                id,
                timestamp: ts,
                true_y: 185.0,
                has_production_error: false,
                measured_x: 186.5,
                has_measurement_error: id == 2,
                post_mean: 186.4,
                post_std: 1.96,
                p_in_spec: 0.99,
                flagged: false,
            })
            .collect();

        let mut buf = Vec::new();
        write_records_csv(&mut buf, &records).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("id,timestamp,true_y,has_production_error"));
        assert!(lines[2].contains(",true,"));
    }
}
