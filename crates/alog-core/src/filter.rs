//! Person, location and date-range filtering of an event batch.

use chrono::{DateTime, Days, FixedOffset, NaiveDate, NaiveTime, Utc};

use crate::event::Event;
use crate::types::{PersonId, utc_offset};

/// Constraint set restricting a batch to matching events.
///
/// Every constraint is optional; an absent constraint matches everything on
/// that dimension. Dates are calendar days in `offset` and are inclusive on
/// both ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeFilter {
    pub person_id: Option<PersonId>,
    pub location: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub offset: FixedOffset,
}

impl Default for RangeFilter {
    fn default() -> Self {
        Self {
            person_id: None,
            location: None,
            date_from: None,
            date_to: None,
            offset: utc_offset(),
        }
    }
}

impl RangeFilter {
    /// A filter that matches every event.
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_person(mut self, person_id: Option<PersonId>) -> Self {
        self.person_id = person_id;
        self
    }

    /// Restricts to one location. A blank value clears the constraint.
    #[must_use]
    pub fn with_location(mut self, location: Option<&str>) -> Self {
        self.location = location
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string);
        self
    }

    #[must_use]
    pub fn with_date_from(mut self, date: Option<NaiveDate>) -> Self {
        self.date_from = date;
        self
    }

    #[must_use]
    pub fn with_date_to(mut self, date: Option<NaiveDate>) -> Self {
        self.date_to = date;
        self
    }

    #[must_use]
    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    /// True when the date bounds can never match (`date_from` after `date_to`).
    pub fn is_empty_range(&self) -> bool {
        matches!((self.date_from, self.date_to), (Some(from), Some(to)) if from > to)
    }

    /// Returns the matching events, preserving input order.
    ///
    /// An inverted date range yields an empty batch rather than an error.
    pub fn apply(&self, events: &[Event]) -> Vec<Event> {
        if self.is_empty_range() {
            tracing::debug!(
                from = ?self.date_from,
                to = ?self.date_to,
                "date range is inverted, no events can match"
            );
            return Vec::new();
        }

        let bounds = self.instant_bounds();
        let matched: Vec<Event> = events
            .iter()
            .filter(|event| self.matches_with(event, bounds))
            .cloned()
            .collect();

        tracing::debug!(input = events.len(), matched = matched.len(), "applied range filter");
        matched
    }

    /// Checks a single event against every constraint.
    pub fn matches(&self, event: &Event) -> bool {
        !self.is_empty_range() && self.matches_with(event, self.instant_bounds())
    }

    fn matches_with(&self, event: &Event, (start, end): InstantBounds) -> bool {
        if self.person_id.as_ref().is_some_and(|id| *id != event.person_id) {
            return false;
        }
        if self.location.as_deref().is_some_and(|loc| loc != event.location) {
            return false;
        }
        if start.is_some_and(|start| event.timestamp < start) {
            return false;
        }
        // `end` is the start of the day after `date_to`, so the whole final day matches.
        if end.is_some_and(|end| event.timestamp >= end) {
            return false;
        }
        true
    }

    /// Converts the calendar bounds into a half-open `[start, end)` instant range.
    fn instant_bounds(&self) -> InstantBounds {
        let start = self.date_from.and_then(|d| start_of_day(d, self.offset));
        let end = self
            .date_to
            .and_then(|d| d.checked_add_days(Days::new(1)))
            .and_then(|d| start_of_day(d, self.offset));
        (start, end)
    }
}

type InstantBounds = (Option<DateTime<Utc>>, Option<DateTime<Utc>>);

/// Midnight at the start of `date` in `offset`, as a UTC instant.
///
/// `None` when the instant falls outside chrono's range, which leaves that
/// side of the range unbounded.
fn start_of_day(date: NaiveDate, offset: FixedOffset) -> Option<DateTime<Utc>> {
    let local = date.and_time(NaiveTime::MIN);
    // Fixed offsets have no gaps or folds, so the mapping is always unique.
    local.checked_sub_offset(offset).map(|utc| utc.and_utc())
}
