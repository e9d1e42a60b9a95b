//! Implementation of the `alog export` command.
//!
//! Writes one CSV report, either to `<out_dir>/<conventional file name>` or to
//! stdout. Distribution reports are ranked by count descending.

use std::fs::{self, File};
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};

use alog_core::report::{write_activity_log, write_distribution, write_person_summary};
use alog_core::{Event, Pipeline, ReportKind, sort_by_count_desc};
use anyhow::{Context, Result};

use crate::cli::FilterArgs;
use crate::commands::util::{build_pipeline, load_batch};
use crate::config::Config;

/// Options for one export run.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub report: ReportKind,
    pub window: Option<i64>,
    /// Skip deduplication entirely, for the activity log as well as aggregations.
    pub raw: bool,
    pub out_dir: Option<PathBuf>,
    pub to_stdout: bool,
}

/// Run the export command.
pub fn run(config: &Config, filters: &FilterArgs, options: &ExportOptions) -> Result<()> {
    let mut pipeline = build_pipeline(config, filters, options.window)?;
    if options.raw {
        pipeline = pipeline.with_dedup_before_aggregating(false);
    }
    let events = load_batch(config, filters)?;

    if options.to_stdout {
        let stdout = stdout();
        let mut writer = BufWriter::new(stdout.lock());
        let rows = write_report(&mut writer, options.report, &pipeline, &events, options.raw)?;
        writer.flush().context("failed to flush report to stdout")?;
        tracing::debug!(rows, report = %options.report, "exported report to stdout");
        return Ok(());
    }

    let out_dir = options.out_dir.as_deref().unwrap_or(&config.export_dir);
    let (path, rows) = export_to_dir(out_dir, options.report, &pipeline, &events, options.raw)?;
    println!("Wrote {rows} rows to {}", path.display());
    Ok(())
}

/// Writes `report` into `out_dir` under its conventional file name.
///
/// Returns the written path and the number of data rows.
pub fn export_to_dir(
    out_dir: &Path,
    report: ReportKind,
    pipeline: &Pipeline,
    events: &[Event],
    raw: bool,
) -> Result<(PathBuf, usize)> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create export directory: {}", out_dir.display()))?;
    let path = out_dir.join(report.file_name());
    let file = File::create(&path)
        .with_context(|| format!("failed to create report file: {}", path.display()))?;

    let mut writer = BufWriter::new(file);
    let rows = write_report(&mut writer, report, pipeline, events, raw)?;
    writer
        .flush()
        .with_context(|| format!("failed to write report file: {}", path.display()))?;

    tracing::debug!(path = %path.display(), rows, "exported report");
    Ok((path, rows))
}

/// Runs the pipeline stages `report` needs and writes the CSV.
///
/// The activity log is the deduplicated timeline (person, then time) unless
/// `raw` is set, in which case it is the filtered batch in input order.
/// Aggregated reports follow the pipeline's dedup-before-aggregating setting.
fn write_report<W: Write>(
    out: W,
    report: ReportKind,
    pipeline: &Pipeline,
    events: &[Event],
    raw: bool,
) -> Result<usize> {
    let offset = pipeline.offset();

    let rows = match report.dimension() {
        Some(dimension) => {
            let mut results = pipeline.distribution(events, dimension);
            sort_by_count_desc(&mut results);
            write_distribution(out, dimension, &results)?;
            results.len()
        }
        None if report == ReportKind::PersonSummary => {
            let people = pipeline.people(events);
            write_person_summary(out, &people, offset)?;
            people.len()
        }
        None => {
            let log = if raw {
                pipeline.filter.apply(events)
            } else {
                pipeline.timeline(events)
            };
            write_activity_log(out, &log, offset)?;
            log.len()
        }
    };
    Ok(rows)
}
