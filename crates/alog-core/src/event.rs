//! Presence events and their ingestion from the upstream event source.
//!
//! The upstream dashboard API hands us loosely-typed records ([`RawEvent`]).
//! [`ingest`] turns a batch of them into validated [`Event`]s, setting aside
//! records that fail data-quality checks instead of aborting the batch.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{PersonId, utc_offset};

/// One observed presence: a person detected at a location at an instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Display name of the observed individual. Not unique, never used as a key.
    pub person_name: String,
    /// Stable identity key for dedup and per-person grouping.
    pub person_id: PersonId,
    /// Room or classroom code. May be empty when the source did not supply one.
    #[serde(default)]
    pub location: String,
    /// Observing device (e.g. camera address). Carried through, never grouped on.
    #[serde(default)]
    pub device_id: String,
    /// When the person was observed.
    pub timestamp: DateTime<Utc>,
}

impl Event {
    /// Creates an event from already-validated parts.
    pub fn new(
        person_name: impl Into<String>,
        person_id: PersonId,
        location: impl Into<String>,
        device_id: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            person_name: person_name.into(),
            person_id,
            location: location.into(),
            device_id: device_id.into(),
            timestamp,
        }
    }

    /// Calendar date of the event as seen from `offset`.
    pub fn local_date(&self, offset: FixedOffset) -> NaiveDate {
        self.timestamp.with_timezone(&offset).date_naive()
    }

    /// Hour of day (0-23) of the event as seen from `offset`.
    pub fn hour_of_day(&self, offset: FixedOffset) -> u32 {
        self.timestamp.with_timezone(&offset).hour()
    }
}

/// An activity record as delivered by the upstream API, before validation.
///
/// Field aliases cover the names used by the dashboard's REST endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    #[serde(default, alias = "personName", alias = "name", alias = "faculty_name")]
    pub person_name: Option<String>,

    #[serde(default, alias = "personId")]
    pub person_id: Option<String>,

    /// Institutional ID, used as the identity surrogate when `person_id` is absent.
    #[serde(
        default,
        alias = "externalId",
        alias = "facultyId",
        alias = "faculty_id",
        alias = "employee_id"
    )]
    pub external_id: Option<String>,

    #[serde(default, alias = "classroom", alias = "room")]
    pub location: Option<String>,

    #[serde(default, alias = "deviceId", alias = "camera_ip", alias = "cameraIp")]
    pub device_id: Option<String>,

    #[serde(default, alias = "time", alias = "detected_at")]
    pub timestamp: Option<String>,
}

/// Why a raw record was left out of the working batch.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// A required field was absent or blank.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// The timestamp could not be parsed as an instant.
    #[error("unparseable timestamp: {0:?}")]
    InvalidTimestamp(String),

    /// The record was not valid JSON for a raw event.
    #[error("malformed record: {0}")]
    Malformed(String),
}

/// A raw record that was excluded, with its position in the input batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    /// Zero-based index of the record in the input. For line-oriented input
    /// this is the line index, blank lines included.
    pub index: usize,
    pub reason: SkipReason,
}

/// Options controlling how raw records are interpreted.
#[derive(Debug, Clone, Copy)]
pub struct IngestOptions {
    /// Offset applied to timestamps that carry no zone information.
    pub offset: FixedOffset,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            offset: utc_offset(),
        }
    }
}

/// Result of ingesting a raw batch.
#[derive(Debug, Clone, Default)]
pub struct Ingested {
    /// Valid events, in input order.
    pub events: Vec<Event>,
    /// Records excluded for data-quality reasons.
    pub skipped: Vec<SkippedRecord>,
}

impl Ingested {
    /// Number of records excluded from the working batch.
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    fn push_skipped(&mut self, index: usize, reason: SkipReason) {
        tracing::debug!(index, %reason, "skipping activity record");
        self.skipped.push(SkippedRecord { index, reason });
    }
}

/// Naive timestamp layouts accepted in addition to RFC 3339.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parses a timestamp string.
///
/// RFC 3339 strings keep their own offset. Naive date-times are read in `offset`.
pub fn parse_timestamp(value: &str, offset: FixedOffset) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_FORMATS.iter().find_map(|fmt| {
        NaiveDateTime::parse_from_str(value, fmt)
            .ok()
            .and_then(|naive| naive.and_local_timezone(offset).single())
            .map(|dt| dt.with_timezone(&Utc))
    })
}

/// Returns the trimmed value if it is present and non-blank.
fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

impl RawEvent {
    /// Validates this record into an [`Event`].
    ///
    /// Identity comes from `person_id`, falling back to `external_id`. It is
    /// never derived from the display name.
    pub fn into_event(self, options: &IngestOptions) -> Result<Event, SkipReason> {
        let id = non_blank(self.person_id.as_ref())
            .or_else(|| non_blank(self.external_id.as_ref()))
            .ok_or(SkipReason::MissingField("person_id"))?;
        let person_id =
            PersonId::new(id).map_err(|_| SkipReason::MissingField("person_id"))?;

        let raw_timestamp =
            non_blank(self.timestamp.as_ref()).ok_or(SkipReason::MissingField("timestamp"))?;
        let timestamp = parse_timestamp(raw_timestamp, options.offset)
            .ok_or_else(|| SkipReason::InvalidTimestamp(raw_timestamp.to_string()))?;

        // Display fallback only; identity is already settled above.
        let person_name = non_blank(self.person_name.as_ref())
            .map_or_else(|| person_id.to_string(), str::to_string);

        Ok(Event {
            person_name,
            person_id,
            location: self.location.map(|l| l.trim().to_string()).unwrap_or_default(),
            device_id: self.device_id.map(|d| d.trim().to_string()).unwrap_or_default(),
            timestamp,
        })
    }
}

/// Converts a raw batch into validated events, collecting skipped records.
pub fn ingest(raw: impl IntoIterator<Item = RawEvent>, options: &IngestOptions) -> Ingested {
    ingest_records(raw.into_iter().map(Ok).enumerate(), options)
}

/// Like [`ingest`], but for records that may already have failed to decode.
///
/// Each record carries the index reported for it if skipped, so callers
/// that drop blank input can keep positions that match the source.
pub fn ingest_records(
    records: impl IntoIterator<Item = (usize, Result<RawEvent, SkipReason>)>,
    options: &IngestOptions,
) -> Ingested {
    let mut ingested = Ingested::default();
    for (index, record) in records {
        match record.and_then(|raw| raw.into_event(options)) {
            Ok(event) => ingested.events.push(event),
            Err(reason) => ingested.push_skipped(index, reason),
        }
    }
    if !ingested.skipped.is_empty() {
        tracing::warn!(
            skipped = ingested.skipped_count(),
            kept = ingested.events.len(),
            "excluded activity records that failed validation"
        );
    }
    ingested
}
