//! Distribution command: counts and shares per location, hour or person.

use std::fmt::Write;

use alog_core::report::format_percent;
use alog_core::{AggregationResult, Dimension, Overview, sort_by_count_desc};
use anyhow::Result;

use crate::cli::FilterArgs;
use crate::commands::util::{build_pipeline, load_batch};
use crate::config::Config;

/// Which distributions to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Single(Dimension),
    /// Location, hour and person together.
    Overview,
}

/// Runs the distribution command.
pub fn run(
    config: &Config,
    filters: &FilterArgs,
    view: View,
    window: Option<i64>,
    no_dedup: bool,
    json: bool,
) -> Result<()> {
    let mut pipeline = build_pipeline(config, filters, window)?;
    if no_dedup {
        pipeline = pipeline.with_dedup_before_aggregating(false);
    }
    let events = load_batch(config, filters)?;

    match view {
        View::Single(dimension) => {
            let mut results = pipeline.distribution(&events, dimension);
            sort_by_count_desc(&mut results);
            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                // Every event lands in exactly one group.
                let total = results.iter().map(|r| r.count).sum();
                print!("{}", format_distribution(dimension, &results, total));
            }
        }
        View::Overview => {
            let mut overview = pipeline.overview(&events);
            for results in [&mut overview.location, &mut overview.hour, &mut overview.person] {
                sort_by_count_desc(results);
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&overview)?);
            } else {
                print!("{}", format_overview(&overview));
            }
        }
    }
    Ok(())
}

/// Generates a 10-character bar.
/// Values <5% of max get a single block for visibility.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn progress_bar(value: usize, max: usize) -> String {
    if max == 0 {
        return "░░░░░░░░░░".to_string();
    }

    let ratio = value as f64 / max as f64;
    let filled = if ratio < 0.05 && value > 0 {
        1
    } else {
        (ratio * 10.0).round().min(10.0) as usize
    };

    let empty = 10 - filled;
    format!("{}{}", "█".repeat(filled), "░".repeat(empty))
}

/// Column label for a dimension's group key.
const fn key_label(dimension: Dimension) -> &'static str {
    match dimension {
        Dimension::Location => "LOCATION",
        Dimension::Hour => "HOUR",
        Dimension::Person => "PERSON ID",
    }
}

/// Formats results as a table; rows are printed in the order given.
pub fn format_distribution(
    dimension: Dimension,
    results: &[AggregationResult],
    total_events: usize,
) -> String {
    let mut output = String::new();
    let title = key_label(dimension);
    let _ = writeln!(output, "{title} DISTRIBUTION ({total_events} events)");

    if results.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "No activity found for the selected range.");
        return output;
    }

    let max = results.iter().map(|r| r.count).max().unwrap_or(0);
    let _ = writeln!(output);
    let _ = writeln!(output, "{:<12}  {:>6}  {:>7}", title, "EVENTS", "SHARE");
    for result in results {
        let share = format!("{}%", format_percent(result.percent_of_total));
        let _ = writeln!(
            output,
            "{:<12}  {:>6}  {:>7}  {}",
            result.group_key,
            result.count,
            share,
            progress_bar(result.count, max)
        );
    }
    output
}

/// Formats all three distributions, separated by blank lines.
pub fn format_overview(overview: &Overview) -> String {
    [
        (Dimension::Location, &overview.location),
        (Dimension::Hour, &overview.hour),
        (Dimension::Person, &overview.person),
    ]
    .into_iter()
    .map(|(dimension, results)| format_distribution(dimension, results, overview.total_events))
    .collect::<Vec<_>>()
    .join("\n")
}
