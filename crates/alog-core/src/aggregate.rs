//! Dimensional aggregation: counts and percentages per group key.
//!
//! One generic [`aggregate`] powers the location distribution, the hourly
//! activity chart and the per-person counts. Callers choose the key
//! extractor and whether the batch was deduplicated first.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use crate::event::Event;

/// Group key used for events whose extracted key is blank.
pub const UNKNOWN_KEY: &str = "Unknown";

/// Count and share of one group in a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationResult {
    pub group_key: String,
    pub count: usize,
    /// `count / batch size * 100`, rounded to two decimals. Zero for an empty batch.
    pub percent_of_total: f64,
}

/// Rounds a percentage to two decimal places.
fn percent(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss, reason = "event counts stay far below 2^52")]
    let raw = count as f64 / total as f64 * 100.0;
    (raw * 100.0).round() / 100.0
}

/// Groups `events` by `key_fn` and counts each group.
///
/// The denominator for percentages is `events.len()`. Blank keys are counted
/// under [`UNKNOWN_KEY`]. Results are ordered by key ascending; use
/// [`sort_by_count_desc`] for a ranked presentation.
pub fn aggregate<F>(events: &[Event], key_fn: F) -> Vec<AggregationResult>
where
    F: Fn(&Event) -> String,
{
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for event in events {
        let key = key_fn(event);
        let key = if key.trim().is_empty() {
            UNKNOWN_KEY.to_string()
        } else {
            key
        };
        *counts.entry(key).or_insert(0) += 1;
    }

    let total = events.len();
    counts
        .into_iter()
        .map(|(group_key, count)| AggregationResult {
            group_key,
            count,
            percent_of_total: percent(count, total),
        })
        .collect()
}

/// Aggregates by one of the built-in dimensions.
pub fn aggregate_by(
    events: &[Event],
    dimension: Dimension,
    offset: FixedOffset,
) -> Vec<AggregationResult> {
    let results = aggregate(events, |event| dimension.key(event, offset));
    tracing::debug!(
        %dimension,
        events = events.len(),
        groups = results.len(),
        "aggregated events"
    );
    results
}

/// Orders results by count descending, ties broken by key ascending.
pub fn sort_by_count_desc(results: &mut [AggregationResult]) {
    results.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.group_key.cmp(&b.group_key))
    });
}

/// Built-in grouping dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    /// Room or classroom code.
    Location,
    /// Hour of day, labelled `HH:00`.
    Hour,
    /// Person identifier.
    Person,
}

impl Dimension {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Location => "location",
            Self::Hour => "hour",
            Self::Person => "person",
        }
    }

    /// Extracts this dimension's key from an event.
    ///
    /// Hours are computed in `offset`.
    pub fn key(self, event: &Event, offset: FixedOffset) -> String {
        match self {
            Self::Location => event.location.clone(),
            Self::Hour => hour_label(event.hour_of_day(offset)),
            Self::Person => event.person_id.to_string(),
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dimension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "location" | "room" => Ok(Self::Location),
            "hour" => Ok(Self::Hour),
            "person" => Ok(Self::Person),
            _ => Err(format!("invalid dimension: {s}")),
        }
    }
}

/// Formats an hour of day as a sortable label (`09:00`).
pub fn hour_label(hour: u32) -> String {
    format!("{hour:02}:00")
}
