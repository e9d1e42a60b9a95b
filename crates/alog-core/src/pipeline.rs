//! Composition of the stages: filter first, then dedup and/or aggregation.

use chrono::FixedOffset;
use serde::Serialize;

use crate::aggregate::{AggregationResult, Dimension, aggregate_by};
use crate::dedup::{DedupWindow, dedup_events};
use crate::event::Event;
use crate::filter::RangeFilter;
use crate::summary::{PersonSummary, summarize_people};

/// A configured filter + dedup + aggregation run.
#[derive(Debug, Clone)]
pub struct Pipeline {
    pub filter: RangeFilter,
    pub window: DedupWindow,
    /// Whether distributions count visits (deduped) or raw detections.
    pub dedup_before_aggregating: bool,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self {
            filter: RangeFilter::default(),
            window: DedupWindow::default(),
            dedup_before_aggregating: true,
        }
    }
}

/// All three distributions over one filtered batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    /// Size of the batch the percentages are computed against.
    pub total_events: usize,
    pub location: Vec<AggregationResult>,
    pub hour: Vec<AggregationResult>,
    pub person: Vec<AggregationResult>,
}

impl Pipeline {
    pub fn new(filter: RangeFilter, window: DedupWindow) -> Self {
        Self {
            filter,
            window,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_dedup_before_aggregating(mut self, enabled: bool) -> Self {
        self.dedup_before_aggregating = enabled;
        self
    }

    /// Calendar offset used for day bounds and hour buckets.
    pub const fn offset(&self) -> FixedOffset {
        self.filter.offset
    }

    /// Filtered, deduplicated timeline ordered by person, then time ascending.
    pub fn timeline(&self, events: &[Event]) -> Vec<Event> {
        dedup_events(&self.filter.apply(events), self.window)
    }

    /// The batch that distributions and summaries are computed over.
    pub fn working_batch(&self, events: &[Event]) -> Vec<Event> {
        let filtered = self.filter.apply(events);
        if self.dedup_before_aggregating {
            dedup_events(&filtered, self.window)
        } else {
            filtered
        }
    }

    /// Distribution over one dimension, ordered by key.
    pub fn distribution(&self, events: &[Event], dimension: Dimension) -> Vec<AggregationResult> {
        aggregate_by(&self.working_batch(events), dimension, self.offset())
    }

    /// Per-person summaries over the working batch.
    pub fn people(&self, events: &[Event]) -> Vec<PersonSummary> {
        summarize_people(&self.working_batch(events))
    }

    /// Computes the location, hour and person distributions concurrently.
    pub fn overview(&self, events: &[Event]) -> Overview {
        let batch = self.working_batch(events);
        let offset = self.offset();

        let (location, (hour, person)) = rayon::join(
            || aggregate_by(&batch, Dimension::Location, offset),
            || {
                rayon::join(
                    || aggregate_by(&batch, Dimension::Hour, offset),
                    || aggregate_by(&batch, Dimension::Person, offset),
                )
            },
        );

        Overview {
            total_events: batch.len(),
            location,
            hour,
            person,
        }
    }
}
