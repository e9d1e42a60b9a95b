//! Dedup window reduction.
//!
//! A camera re-identifies the same person every few seconds while they stay in
//! a room. This module collapses those repeated detections into one
//! representative event per visit.
//!
//! # Algorithm
//!
//! 1. Group events by [`PersonId`].
//! 2. Sort each group by timestamp, most recent first (stable, so ties keep
//!    input order).
//! 3. Keep the first event. Keep each later event only if it is at least one
//!    window earlier than the last kept event; otherwise it belongs to the same
//!    visit and is dropped.
//!
//! Each event is compared with the last *kept* event, not with its immediate
//! neighbour, so a long run of detections spaced less than a window apart
//! collapses to its most recent member.

use std::collections::HashMap;

use chrono::Duration;

use crate::event::Event;
use crate::types::{PersonId, ValidationError};

/// Default dedup window in minutes.
pub const DEFAULT_WINDOW_MINUTES: i64 = 30;

/// Minimum gap between two kept events of the same person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DedupWindow(Duration);

impl DedupWindow {
    /// Creates a window, rejecting negative durations.
    pub fn new(duration: Duration) -> Result<Self, ValidationError> {
        if duration < Duration::zero() {
            // Round away from zero so sub-minute windows never report 0.
            let minutes = duration.num_milliseconds().div_euclid(60_000).min(-1);
            return Err(ValidationError::NegativeWindow { minutes });
        }
        Ok(Self(duration))
    }

    /// Creates a window of `minutes` minutes.
    pub fn from_minutes(minutes: i64) -> Result<Self, ValidationError> {
        if minutes < 0 {
            return Err(ValidationError::NegativeWindow { minutes });
        }
        Self::new(Duration::try_minutes(minutes).unwrap_or(Duration::MAX))
    }

    /// A zero window, which keeps every event.
    pub const fn zero() -> Self {
        Self(Duration::zero())
    }

    pub const fn duration(self) -> Duration {
        self.0
    }
}

impl Default for DedupWindow {
    fn default() -> Self {
        Self(Duration::minutes(DEFAULT_WINDOW_MINUTES))
    }
}

/// Collapses repeated detections of the same person within `window`.
///
/// Returns a new batch ordered by `person_id` ascending, then `timestamp`
/// ascending. Every person present in the input is present in the output.
pub fn dedup_events(events: &[Event], window: DedupWindow) -> Vec<Event> {
    let mut kept: Vec<&Event> = group_by_person(events)
        .into_values()
        .flat_map(|group| reduce_group(group, window.duration()))
        .collect();

    kept.sort_by(|a, b| {
        a.person_id
            .cmp(&b.person_id)
            .then_with(|| a.timestamp.cmp(&b.timestamp))
    });

    tracing::debug!(
        input = events.len(),
        kept = kept.len(),
        window_minutes = window.duration().num_minutes(),
        "reduced events by dedup window"
    );

    kept.into_iter().cloned().collect()
}

/// Buckets events by person, preserving input order inside each bucket.
fn group_by_person(events: &[Event]) -> HashMap<&PersonId, Vec<&Event>> {
    let mut groups: HashMap<&PersonId, Vec<&Event>> = HashMap::new();
    for event in events {
        groups.entry(&event.person_id).or_default().push(event);
    }
    groups
}

/// Reduces one person's events to visit representatives.
///
/// Returned events are most-recent-first.
fn reduce_group(mut group: Vec<&Event>, window: Duration) -> Vec<&Event> {
    // Stable sort: identical timestamps keep input order, so the earliest
    // input record wins the tie deterministically.
    group.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    let mut kept: Vec<&Event> = Vec::with_capacity(group.len());
    for event in group {
        match kept.last() {
            Some(last) if last.timestamp - event.timestamp < window => {}
            _ => kept.push(event),
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 29, h, m, 0).unwrap()
    }

    fn event(id: &str, location: &str, ts: DateTime<Utc>) -> Event {
        Event::new(id, PersonId::new(id).unwrap(), location, "cam", ts)
    }

    fn times(events: &[Event]) -> Vec<(String, DateTime<Utc>)> {
        events
            .iter()
            .map(|e| (e.person_id.to_string(), e.timestamp))
            .collect()
    }

    #[test]
    fn default_window_is_thirty_minutes() {
        assert_eq!(DedupWindow::default().duration(), Duration::minutes(30));
    }

    #[test]
    fn negative_window_fails_fast() {
        assert_eq!(
            DedupWindow::from_minutes(-5),
            Err(ValidationError::NegativeWindow { minutes: -5 })
        );
        assert!(DedupWindow::new(Duration::seconds(-1)).is_err());
    }

    #[test]
    fn sub_minute_negative_window_reports_nonzero_minutes() {
        assert_eq!(
            DedupWindow::new(Duration::seconds(-30)),
            Err(ValidationError::NegativeWindow { minutes: -1 })
        );
        assert_eq!(
            DedupWindow::new(Duration::seconds(-90)),
            Err(ValidationError::NegativeWindow { minutes: -2 })
        );
        let err = DedupWindow::new(Duration::milliseconds(-1)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "dedup window must not be negative, got -1 minutes"
        );
    }

    #[test]
    fn alice_and_bob_scenario() {
        let events = vec![
            event("Alice", "R101", at(9, 0)),
            event("Alice", "R101", at(9, 10)),
            event("Bob", "R102", at(9, 5)),
        ];
        let out = dedup_events(&events, DedupWindow::default());
        assert_eq!(
            times(&out),
            vec![("Alice".into(), at(9, 10)), ("Bob".into(), at(9, 5))]
        );
    }

    #[test]
    fn events_exactly_one_window_apart_are_both_kept() {
        let events = vec![event("A", "R1", at(9, 0)), event("A", "R1", at(9, 30))];
        let out = dedup_events(&events, DedupWindow::default());
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn events_just_inside_window_keep_only_the_later() {
        let events = vec![event("A", "R1", at(9, 0)), event("A", "R1", at(9, 29))];
        let out = dedup_events(&events, DedupWindow::default());
        assert_eq!(times(&out), vec![("A".into(), at(9, 29))]);
    }

    #[test]
    fn comparison_is_against_last_kept_event() {
        // 9:45 is kept. 9:30 and 9:20 fall within 30m of it and are dropped.
        // 9:00 is 45m before the last kept event, so it starts a new visit.
        let events = vec![
            event("A", "R1", at(9, 0)),
            event("A", "R1", at(9, 20)),
            event("A", "R1", at(9, 30)),
            event("A", "R1", at(9, 45)),
        ];
        let out = dedup_events(&events, DedupWindow::default());
        assert_eq!(times(&out), vec![("A".into(), at(9, 0)), ("A".into(), at(9, 45))]);
    }

    #[test]
    fn zero_window_keeps_everything() {
        let events = vec![
            event("A", "R1", at(9, 0)),
            event("A", "R1", at(9, 0)),
            event("A", "R1", at(9, 1)),
        ];
        let out = dedup_events(&events, DedupWindow::zero());
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn identical_timestamps_keep_first_input_record() {
        let events = vec![
            event("A", "R1", at(9, 0)),
            event("A", "R2", at(9, 0)),
        ];
        let out = dedup_events(&events, DedupWindow::default());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].location, "R1");

        // Repeated runs give identical output.
        assert_eq!(dedup_events(&events, DedupWindow::default()), out);
    }

    #[test]
    fn output_is_sorted_by_person_then_time() {
        let events = vec![
            event("B", "R1", at(12, 0)),
            event("A", "R1", at(11, 0)),
            event("B", "R1", at(8, 0)),
            event("A", "R1", at(7, 0)),
        ];
        let out = dedup_events(&events, DedupWindow::default());
        assert_eq!(
            times(&out),
            vec![
                ("A".into(), at(7, 0)),
                ("A".into(), at(11, 0)),
                ("B".into(), at(8, 0)),
                ("B".into(), at(12, 0)),
            ]
        );
    }

    #[test]
    fn dedup_is_idempotent() {
        let events: Vec<Event> = (0..40)
            .map(|i| {
                let person = if i % 3 == 0 { "A" } else { "B" };
                event(person, "R1", at(8, 0) + Duration::minutes(i * 7))
            })
            .collect();
        let once = dedup_events(&events, DedupWindow::default());
        let twice = dedup_events(&once, DedupWindow::default());
        assert_eq!(once, twice);
    }

    #[test]
    fn dedup_never_loses_a_person() {
        let events = vec![
            event("A", "R1", at(9, 0)),
            event("A", "R1", at(9, 1)),
            event("B", "R1", at(9, 2)),
            event("C", "R2", at(9, 3)),
            event("C", "R2", at(9, 4)),
        ];
        let ids = |batch: &[Event]| -> BTreeSet<String> {
            batch.iter().map(|e| e.person_id.to_string()).collect()
        };
        let out = dedup_events(&events, DedupWindow::default());
        assert_eq!(ids(&out), ids(&events));
    }

    #[test]
    fn empty_batch_is_fine() {
        assert!(dedup_events(&[], DedupWindow::default()).is_empty());
    }
}
