//! Per-person activity summaries ("last seen at" view).

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::aggregate::UNKNOWN_KEY;
use crate::event::Event;
use crate::types::PersonId;

/// What a batch says about one person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonSummary {
    pub person_id: PersonId,
    /// Display name from the most recent event.
    pub person_name: String,
    pub event_count: usize,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    /// Location of the most recent event.
    pub last_location: String,
    /// Distinct locations, sorted.
    pub locations: Vec<String>,
}

/// Running state while scanning one person's events.
struct Accumulator<'a> {
    latest: &'a Event,
    first_seen: DateTime<Utc>,
    event_count: usize,
    locations: BTreeSet<&'a str>,
}

fn location_key(event: &Event) -> &str {
    if event.location.trim().is_empty() {
        UNKNOWN_KEY
    } else {
        &event.location
    }
}

/// Summarizes each person in the batch, ordered by person ID.
///
/// When two events share the latest timestamp, the later one in input order
/// supplies the display name and last location.
pub fn summarize_people(events: &[Event]) -> Vec<PersonSummary> {
    let mut people: BTreeMap<&PersonId, Accumulator<'_>> = BTreeMap::new();

    for event in events {
        people
            .entry(&event.person_id)
            .and_modify(|acc| {
                acc.event_count += 1;
                acc.first_seen = acc.first_seen.min(event.timestamp);
                if event.timestamp >= acc.latest.timestamp {
                    acc.latest = event;
                }
                acc.locations.insert(location_key(event));
            })
            .or_insert_with(|| Accumulator {
                latest: event,
                first_seen: event.timestamp,
                event_count: 1,
                locations: BTreeSet::from([location_key(event)]),
            });
    }

    people
        .into_iter()
        .map(|(person_id, acc)| PersonSummary {
            person_id: person_id.clone(),
            person_name: acc.latest.person_name.clone(),
            event_count: acc.event_count,
            first_seen: acc.first_seen,
            last_seen: acc.latest.timestamp,
            last_location: location_key(acc.latest).to_string(),
            locations: acc.locations.into_iter().map(str::to_string).collect(),
        })
        .collect()
}
