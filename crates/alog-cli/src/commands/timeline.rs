//! Timeline command: the deduplicated visit list.
//!
//! Rows are ordered by person ID, then time ascending, which is the order the
//! dedup reducer produces.

use std::fmt::Write;

use alog_core::report::format_timestamp;
use alog_core::{Event, UNKNOWN_KEY};
use anyhow::Result;
use chrono::FixedOffset;

use crate::cli::FilterArgs;
use crate::commands::util::{build_pipeline, load_batch};
use crate::config::Config;

/// Runs the timeline command.
pub fn run(config: &Config, filters: &FilterArgs, window: Option<i64>, json: bool) -> Result<()> {
    let pipeline = build_pipeline(config, filters, window)?;
    let events = load_batch(config, filters)?;
    let timeline = pipeline.timeline(&events);

    if json {
        println!("{}", serde_json::to_string_pretty(&timeline)?);
    } else {
        print!("{}", format_timeline(&timeline, pipeline.offset()));
    }
    Ok(())
}

/// Formats a timeline as a fixed-width table.
pub fn format_timeline(events: &[Event], offset: FixedOffset) -> String {
    let mut output = String::new();

    if events.is_empty() {
        let _ = writeln!(output, "No activity found for the selected range.");
        return output;
    }

    let _ = writeln!(
        output,
        "{:<19}  {:<20}  {:<10}  {:<10}  DEVICE",
        "TIME", "PERSON", "ID", "LOCATION"
    );
    for event in events {
        let location = if event.location.is_empty() {
            UNKNOWN_KEY
        } else {
            event.location.as_str()
        };
        let _ = writeln!(
            output,
            "{:<19}  {:<20}  {:<10}  {:<10}  {}",
            format_timestamp(event.timestamp, offset),
            event.person_name,
            event.person_id.as_str(),
            location,
            event.device_id
        );
    }

    let _ = writeln!(output);
    let visits = events.len();
    let noun = if visits == 1 { "visit" } else { "visits" };
    let _ = writeln!(output, "{visits} {noun}");
    output
}
