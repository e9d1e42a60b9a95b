//! Shared utilities for CLI commands.

use std::sync::LazyLock;

use alog_core::{
    DedupWindow, Event, IngestOptions, PersonId, Pipeline, RangeFilter, offset_from_minutes,
};
use anyhow::Context;
use chrono::{Days, FixedOffset, NaiveDate, Utc};
use regex::Regex;

use crate::cli::FilterArgs;
use crate::config::Config;
use crate::input::load_events;

/// Pre-compiled regex for relative date parsing.
static RELATIVE_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s+(day|week)s?\s+ago$").unwrap());

/// Conservative bound for relative dates (~1000 years in days).
const MAX_RELATIVE_DAYS: u64 = 1000 * 365;

/// Today's date as seen from `offset`.
pub fn today_in(offset: FixedOffset) -> NaiveDate {
    Utc::now().with_timezone(&offset).date_naive()
}

/// Parse a date string as either ISO 8601 or a relative day.
///
/// Supports:
/// - ISO 8601: "2026-01-15"
/// - Keywords: "today", "yesterday"
/// - Relative: "3 days ago", "1 week ago"
pub fn parse_date(s: &str, today: NaiveDate) -> anyhow::Result<NaiveDate> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date);
    }

    match s {
        "today" => return Ok(today),
        "yesterday" => return days_before(today, 1),
        _ => {}
    }

    let Some(caps) = RELATIVE_DATE_RE.captures(s) else {
        anyhow::bail!(
            "Invalid date: {s}. Use YYYY-MM-DD (e.g., 2026-01-15), 'today', 'yesterday' or relative (e.g., '3 days ago')"
        );
    };

    let n: u64 = caps[1]
        .parse()
        .context("failed to parse number in relative date")?;

    let days_per_unit = match &caps[2] {
        "day" => 1,
        "week" => 7,
        unit => anyhow::bail!("Unknown date unit: {unit}"),
    };

    if n > MAX_RELATIVE_DAYS / days_per_unit {
        anyhow::bail!("Relative date value too large: {n} {}", &caps[2]);
    }

    days_before(today, n * days_per_unit)
}

fn days_before(today: NaiveDate, days: u64) -> anyhow::Result<NaiveDate> {
    today
        .checked_sub_days(Days::new(days))
        .context("relative date is out of range")
}

/// Builds the range filter from command-line filters, in the configured offset.
pub fn build_filter(config: &Config, filters: &FilterArgs) -> anyhow::Result<RangeFilter> {
    let offset = offset_from_minutes(config.utc_offset_minutes)
        .context("invalid utc_offset_minutes in configuration")?;
    let today = today_in(offset);

    let person = filters
        .person
        .as_deref()
        .map(PersonId::new)
        .transpose()
        .context("invalid --person")?;
    let from = filters
        .from
        .as_deref()
        .map(|s| parse_date(s, today))
        .transpose()
        .context("invalid --from")?;
    let to = filters
        .to
        .as_deref()
        .map(|s| parse_date(s, today))
        .transpose()
        .context("invalid --to")?;

    Ok(RangeFilter::new()
        .with_offset(offset)
        .with_person(person)
        .with_location(filters.location.as_deref())
        .with_date_from(from)
        .with_date_to(to))
}

/// Loads the input batch named by `filters`, reporting skipped records on stderr.
pub fn load_batch(config: &Config, filters: &FilterArgs) -> anyhow::Result<Vec<Event>> {
    let offset = offset_from_minutes(config.utc_offset_minutes)
        .context("invalid utc_offset_minutes in configuration")?;
    let ingested = load_events(filters.input.as_deref(), &IngestOptions { offset })?;
    let skipped = ingested.skipped_count();
    if skipped > 0 {
        eprintln!("Skipped {skipped} invalid record(s).");
    }
    Ok(ingested.events)
}

/// Builds the pipeline from config, with an optional window override in minutes.
pub fn build_pipeline(
    config: &Config,
    filters: &FilterArgs,
    window_minutes: Option<i64>,
) -> anyhow::Result<Pipeline> {
    let window = DedupWindow::from_minutes(window_minutes.unwrap_or(config.dedup_window_minutes))
        .context("invalid dedup window")?;
    let filter = build_filter(config, filters)?;
    Ok(Pipeline::new(filter, window).with_dedup_before_aggregating(config.dedup_before_aggregating))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parse_date_iso() {
        let today = day(2025, 1, 29);
        assert_eq!(parse_date("2025-01-15", today).unwrap(), day(2025, 1, 15));
    }

    #[test]
    fn parse_date_keywords_and_relative() {
        let today = day(2025, 1, 29);
        assert_eq!(parse_date("today", today).unwrap(), today);
        assert_eq!(parse_date("yesterday", today).unwrap(), day(2025, 1, 28));
        assert_eq!(parse_date("3 days ago", today).unwrap(), day(2025, 1, 26));
        assert_eq!(parse_date("1 day ago", today).unwrap(), day(2025, 1, 28));
        assert_eq!(parse_date("2 weeks ago", today).unwrap(), day(2025, 1, 15));
    }

    #[test]
    fn parse_date_rejects_garbage() {
        let today = day(2025, 1, 29);
        assert!(parse_date("last tuesday", today).is_err());
        assert!(parse_date("2025-02-30", today).is_err());
        assert!(parse_date("99999999 weeks ago", today).is_err());
    }

    #[test]
    fn build_pipeline_applies_overrides() {
        let config = Config {
            utc_offset_minutes: 330,
            ..Config::default()
        };
        let filters = FilterArgs {
            person: Some("FAC-1".into()),
            location: Some("R101".into()),
            from: Some("2025-01-01".into()),
            to: Some("2025-01-31".into()),
            ..FilterArgs::default()
        };
        let pipeline = build_pipeline(&config, &filters, Some(10)).unwrap();

        assert_eq!(pipeline.window, DedupWindow::from_minutes(10).unwrap());
        assert_eq!(pipeline.offset().local_minus_utc(), 330 * 60);
        assert_eq!(pipeline.filter.person_id.as_ref().unwrap().as_str(), "FAC-1");
        assert_eq!(pipeline.filter.location.as_deref(), Some("R101"));
        assert_eq!(pipeline.filter.date_from, Some(day(2025, 1, 1)));
        assert_eq!(pipeline.filter.date_to, Some(day(2025, 1, 31)));
    }

    #[test]
    fn build_pipeline_rejects_negative_window() {
        let err = build_pipeline(&Config::default(), &FilterArgs::default(), Some(-1)).unwrap_err();
        assert!(err.to_string().contains("invalid dedup window"));
    }

    #[test]
    fn build_pipeline_rejects_invalid_offset() {
        let config = Config {
            utc_offset_minutes: 5000,
            ..Config::default()
        };
        assert!(build_pipeline(&config, &FilterArgs::default(), None).is_err());
    }
}
