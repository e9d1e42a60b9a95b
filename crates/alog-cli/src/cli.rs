//! Command-line argument definitions.

use std::path::PathBuf;

use alog_core::{Dimension, ReportKind};
use clap::{Args, Parser, Subcommand};

/// Activity log aggregation.
///
/// Reads a fetched batch of presence events (JSON array or JSON Lines) and
/// produces deduplicated timelines, distributions and CSV exports.
#[derive(Debug, Parser)]
#[command(name = "alog", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show the deduplicated timeline, one row per visit.
    Timeline {
        #[command(flatten)]
        filters: FilterArgs,

        /// Dedup window in minutes (overrides config).
        #[arg(long)]
        window: Option<i64>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show event counts and percentages grouped by a dimension.
    Distribution {
        /// Dimension to group by.
        #[arg(long, value_parser = parse_dimension, default_value = "location")]
        by: Dimension,

        /// Show the location, hour and person distributions together.
        #[arg(long, conflicts_with = "by")]
        all: bool,

        #[command(flatten)]
        filters: FilterArgs,

        /// Dedup window in minutes (overrides config).
        #[arg(long)]
        window: Option<i64>,

        /// Count raw detections instead of deduplicated visits.
        #[arg(long)]
        no_dedup: bool,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show per-person activity summaries.
    Summary {
        #[command(flatten)]
        filters: FilterArgs,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Write a CSV report.
    Export {
        /// Report to write (activity-log, location-distribution, hour-distribution,
        /// person-distribution, person-summary).
        #[arg(value_parser = parse_report)]
        report: ReportKind,

        #[command(flatten)]
        filters: FilterArgs,

        /// Dedup window in minutes (overrides config).
        #[arg(long)]
        window: Option<i64>,

        /// Export filtered events without deduplication.
        #[arg(long)]
        raw: bool,

        /// Directory to write the report into (overrides config).
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Write the CSV to stdout instead of a file.
        #[arg(long, conflicts_with = "out_dir")]
        stdout: bool,
    },
}

/// Input and range filter options shared by all commands.
#[derive(Debug, Clone, Default, Args)]
pub struct FilterArgs {
    /// Event batch to read (JSON array or JSON Lines). Reads stdin if omitted.
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Only events for this person ID.
    #[arg(long)]
    pub person: Option<String>,

    /// Only events at this location.
    #[arg(long)]
    pub location: Option<String>,

    /// First day to include (YYYY-MM-DD, today, yesterday, "N days ago").
    #[arg(long)]
    pub from: Option<String>,

    /// Last day to include, inclusive.
    #[arg(long)]
    pub to: Option<String>,
}

fn parse_dimension(s: &str) -> Result<Dimension, String> {
    s.parse()
}

fn parse_report(s: &str) -> Result<ReportKind, String> {
    s.parse()
}
