//! Activity log aggregation engine.
//!
//! This crate turns a batch of presence events (a person detected at a
//! location at a timestamp) into:
//! - Filtered views: person, location and inclusive date range
//! - Deduplicated timelines: one representative event per visit
//! - Distributions: counts and percentages by location, hour or person
//! - CSV reports with fixed columns
//!
//! Every stage is a pure function over an in-memory batch. All inputs,
//! including the calendar offset, are explicit parameters.

pub mod aggregate;
pub mod dedup;
pub mod event;
pub mod filter;
pub mod pipeline;
pub mod report;
pub mod summary;
pub mod types;

pub use aggregate::{
    AggregationResult, Dimension, UNKNOWN_KEY, aggregate, aggregate_by, sort_by_count_desc,
};
pub use dedup::{DEFAULT_WINDOW_MINUTES, DedupWindow, dedup_events};
pub use event::{
    Event, IngestOptions, Ingested, RawEvent, SkipReason, SkippedRecord, ingest, ingest_records,
};
pub use filter::RangeFilter;
pub use pipeline::{Overview, Pipeline};
pub use report::{CSV_MIME_TYPE, ReportError, ReportKind};
pub use summary::{PersonSummary, summarize_people};
pub use types::{PersonId, ValidationError, offset_from_minutes, utc_offset};
