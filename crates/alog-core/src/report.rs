//! Delimited-text (CSV) exports.
//!
//! Every field is double-quoted, embedded quotes are doubled and rows end in
//! CRLF, which is what spreadsheet tools expect. Timestamps and numbers use
//! fixed, locale-independent formats.
//!
//! | Report | Columns |
//! |---|---|
//! | Activity log | `Person, ExternalId, Location, DeviceId, Timestamp` |
//! | Location distribution | `Location, EventCount, PercentOfTotal` |
//! | Hour distribution | `Hour, EventCount, PercentOfTotal` |
//! | Person distribution | `ExternalId, EventCount, PercentOfTotal` |
//! | Person summary | `ExternalId, Person, EventCount, FirstSeen, LastSeen, Locations` |

use std::fmt;
use std::io::Write;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, Utc};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use thiserror::Error;

use crate::aggregate::{AggregationResult, Dimension};
use crate::event::Event;
use crate::summary::PersonSummary;

/// MIME type for every export.
pub const CSV_MIME_TYPE: &str = "text/csv";

/// Timestamp layout used in every export.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Errors that can occur while writing a report.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to flush report: {0}")]
    Io(#[from] std::io::Error),

    #[error("report is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// The export types and their fixed column sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportKind {
    ActivityLog,
    LocationDistribution,
    HourDistribution,
    PersonDistribution,
    PersonSummary,
}

impl ReportKind {
    pub const ALL: [Self; 5] = [
        Self::ActivityLog,
        Self::LocationDistribution,
        Self::HourDistribution,
        Self::PersonDistribution,
        Self::PersonSummary,
    ];

    /// Header labels, in column order.
    pub const fn columns(self) -> &'static [&'static str] {
        match self {
            Self::ActivityLog => &["Person", "ExternalId", "Location", "DeviceId", "Timestamp"],
            Self::LocationDistribution => &["Location", "EventCount", "PercentOfTotal"],
            Self::HourDistribution => &["Hour", "EventCount", "PercentOfTotal"],
            Self::PersonDistribution => &["ExternalId", "EventCount", "PercentOfTotal"],
            Self::PersonSummary => &[
                "ExternalId",
                "Person",
                "EventCount",
                "FirstSeen",
                "LastSeen",
                "Locations",
            ],
        }
    }

    /// Conventional file name for the export.
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::ActivityLog => "activity_log.csv",
            Self::LocationDistribution => "location_distribution.csv",
            Self::HourDistribution => "hourly_distribution.csv",
            Self::PersonDistribution => "person_distribution.csv",
            Self::PersonSummary => "person_summary.csv",
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ActivityLog => "activity-log",
            Self::LocationDistribution => "location-distribution",
            Self::HourDistribution => "hour-distribution",
            Self::PersonDistribution => "person-distribution",
            Self::PersonSummary => "person-summary",
        }
    }

    /// The distribution report for a dimension.
    pub const fn for_dimension(dimension: Dimension) -> Self {
        match dimension {
            Dimension::Location => Self::LocationDistribution,
            Dimension::Hour => Self::HourDistribution,
            Dimension::Person => Self::PersonDistribution,
        }
    }

    /// The dimension behind a distribution report, if this is one.
    pub const fn dimension(self) -> Option<Dimension> {
        match self {
            Self::LocationDistribution => Some(Dimension::Location),
            Self::HourDistribution => Some(Dimension::Hour),
            Self::PersonDistribution => Some(Dimension::Person),
            Self::ActivityLog | Self::PersonSummary => None,
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("invalid report: {s}"))
    }
}

/// Formats an instant in `offset` using [`TIMESTAMP_FORMAT`].
pub fn format_timestamp(ts: DateTime<Utc>, offset: FixedOffset) -> String {
    ts.with_timezone(&offset).format(TIMESTAMP_FORMAT).to_string()
}

/// Formats a percentage with exactly two decimals.
pub fn format_percent(value: f64) -> String {
    format!("{value:.2}")
}

fn csv_writer<W: Write>(out: W) -> csv::Writer<W> {
    WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::CRLF)
        .from_writer(out)
}

/// Writes an event batch as an activity log, in the batch's order.
pub fn write_activity_log<W: Write>(
    out: W,
    events: &[Event],
    offset: FixedOffset,
) -> Result<(), ReportError> {
    let mut writer = csv_writer(out);
    writer.write_record(ReportKind::ActivityLog.columns())?;
    for event in events {
        writer.write_record([
            event.person_name.as_str(),
            event.person_id.as_str(),
            event.location.as_str(),
            event.device_id.as_str(),
            format_timestamp(event.timestamp, offset).as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes aggregation results for `dimension`, in the order given.
pub fn write_distribution<W: Write>(
    out: W,
    dimension: Dimension,
    results: &[AggregationResult],
) -> Result<(), ReportError> {
    let mut writer = csv_writer(out);
    writer.write_record(ReportKind::for_dimension(dimension).columns())?;
    for result in results {
        writer.write_record([
            result.group_key.clone(),
            result.count.to_string(),
            format_percent(result.percent_of_total),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes person summaries; locations are joined with `"; "`.
pub fn write_person_summary<W: Write>(
    out: W,
    summaries: &[PersonSummary],
    offset: FixedOffset,
) -> Result<(), ReportError> {
    let mut writer = csv_writer(out);
    writer.write_record(ReportKind::PersonSummary.columns())?;
    for summary in summaries {
        writer.write_record([
            summary.person_id.to_string(),
            summary.person_name.clone(),
            summary.event_count.to_string(),
            format_timestamp(summary.first_seen, offset),
            format_timestamp(summary.last_seen, offset),
            summary.locations.join("; "),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Renders an activity log into a string.
pub fn activity_log_csv(events: &[Event], offset: FixedOffset) -> Result<String, ReportError> {
    let mut buf = Vec::new();
    write_activity_log(&mut buf, events, offset)?;
    Ok(String::from_utf8(buf)?)
}

/// Renders a distribution into a string.
pub fn distribution_csv(
    dimension: Dimension,
    results: &[AggregationResult],
) -> Result<String, ReportError> {
    let mut buf = Vec::new();
    write_distribution(&mut buf, dimension, results)?;
    Ok(String::from_utf8(buf)?)
}

/// Renders person summaries into a string.
pub fn person_summary_csv(
    summaries: &[PersonSummary],
    offset: FixedOffset,
) -> Result<String, ReportError> {
    let mut buf = Vec::new();
    write_person_summary(&mut buf, summaries, offset)?;
    Ok(String::from_utf8(buf)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate_by;
    use crate::dedup::{DedupWindow, dedup_events};
    use crate::summary::summarize_people;
    use crate::types::{PersonId, utc_offset};
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 29, h, m, 0).unwrap()
    }

    fn event(name: &str, location: &str, ts: DateTime<Utc>) -> Event {
        Event::new(name, PersonId::new(name).unwrap(), location, "10.0.0.1", ts)
    }

    #[test]
    fn empty_activity_log_is_header_only() {
        let csv = activity_log_csv(&[], utc_offset()).unwrap();
        assert_eq!(
            csv,
            "\"Person\",\"ExternalId\",\"Location\",\"DeviceId\",\"Timestamp\"\r\n"
        );
    }

    #[test]
    fn empty_distribution_is_header_only() {
        let csv = distribution_csv(Dimension::Location, &[]).unwrap();
        assert_eq!(csv, "\"Location\",\"EventCount\",\"PercentOfTotal\"\r\n");
    }

    #[test]
    fn deduped_export_has_header_and_two_rows() {
        let events = vec![
            event("Alice", "R101", at(9, 0)),
            event("Alice", "R101", at(9, 10)),
            event("Bob", "R102", at(9, 5)),
        ];
        let deduped = dedup_events(&events, DedupWindow::default());
        let csv = activity_log_csv(&deduped, utc_offset()).unwrap();

        assert_eq!(csv.matches("\r\n").count(), 3);
        assert!(csv.ends_with("\r\n"));
        let lines: Vec<&str> = csv.split_terminator("\r\n").collect();
        assert_eq!(
            lines,
            vec![
                r#""Person","ExternalId","Location","DeviceId","Timestamp""#,
                r#""Alice","Alice","R101","10.0.0.1","2025-01-29 09:10:00""#,
                r#""Bob","Bob","R102","10.0.0.1","2025-01-29 09:05:00""#,
            ]
        );
    }

    #[test]
    fn embedded_quotes_are_doubled() {
        let events = vec![Event::new(
            "Dr. \"Ace\" Rao",
            PersonId::new("FAC-1").unwrap(),
            "Lab, North",
            "cam",
            at(9, 0),
        )];
        let csv = activity_log_csv(&events, utc_offset()).unwrap();
        let row = csv.split_terminator("\r\n").nth(1).unwrap();
        assert_eq!(
            row,
            r#""Dr. ""Ace"" Rao","FAC-1","Lab, North","cam","2025-01-29 09:00:00""#
        );
    }

    #[test]
    fn timestamps_render_in_report_offset() {
        let ist = FixedOffset::east_opt(330 * 60).unwrap();
        assert_eq!(format_timestamp(at(9, 0), ist), "2025-01-29 14:30:00");
    }

    #[test]
    fn location_distribution_rows() {
        let events = vec![
            event("A", "R101", at(9, 0)),
            event("B", "R101", at(9, 0)),
            event("C", "", at(9, 0)),
        ];
        let results = aggregate_by(&events, Dimension::Location, utc_offset());
        let csv = distribution_csv(Dimension::Location, &results).unwrap();
        assert_eq!(
            csv,
            concat!(
                "\"Location\",\"EventCount\",\"PercentOfTotal\"\r\n",
                "\"R101\",\"2\",\"66.67\"\r\n",
                "\"Unknown\",\"1\",\"33.33\"\r\n",
            )
        );
    }

    #[test]
    fn person_summary_rows() {
        let events = vec![
            event("A", "R2", at(9, 0)),
            event("A", "R1", at(10, 30)),
        ];
        let csv = person_summary_csv(&summarize_people(&events), utc_offset()).unwrap();
        assert_eq!(
            csv,
            concat!(
                "\"ExternalId\",\"Person\",\"EventCount\",\"FirstSeen\",\"LastSeen\",\"Locations\"\r\n",
                "\"A\",\"A\",\"2\",\"2025-01-29 09:00:00\",\"2025-01-29 10:30:00\",\"R1; R2\"\r\n",
            )
        );
    }

    #[test]
    fn report_kind_names_and_files() {
        for kind in ReportKind::ALL {
            assert_eq!(kind.as_str().parse::<ReportKind>().unwrap(), kind);
            assert!(kind.file_name().ends_with(".csv"));
        }
        assert_eq!(ReportKind::LocationDistribution.file_name(), "location_distribution.csv");
        assert_eq!(
            ReportKind::for_dimension(Dimension::Hour).dimension(),
            Some(Dimension::Hour)
        );
        assert!("pie-chart".parse::<ReportKind>().is_err());
    }
}
