//! Summary command: per-person counts and last known location.

use std::fmt::Write;

use alog_core::PersonSummary;
use alog_core::report::format_timestamp;
use anyhow::Result;
use chrono::FixedOffset;

use crate::cli::FilterArgs;
use crate::commands::util::{build_pipeline, load_batch};
use crate::config::Config;

/// Runs the summary command.
pub fn run(config: &Config, filters: &FilterArgs, json: bool) -> Result<()> {
    let pipeline = build_pipeline(config, filters, None)?;
    let events = load_batch(config, filters)?;
    let people = pipeline.people(&events);

    if json {
        println!("{}", serde_json::to_string_pretty(&people)?);
    } else {
        print!("{}", format_people(&people, pipeline.offset()));
    }
    Ok(())
}

/// Formats person summaries as a fixed-width table.
pub fn format_people(people: &[PersonSummary], offset: FixedOffset) -> String {
    let mut output = String::new();

    if people.is_empty() {
        let _ = writeln!(output, "No activity found for the selected range.");
        return output;
    }

    let _ = writeln!(
        output,
        "{:<10}  {:<16}  {:>6}  {:<19}  LAST LOCATION",
        "ID", "PERSON", "EVENTS", "LAST SEEN"
    );
    for person in people {
        let _ = writeln!(
            output,
            "{:<10}  {:<16}  {:>6}  {:<19}  {}",
            person.person_id.as_str(),
            person.person_name,
            person.event_count,
            format_timestamp(person.last_seen, offset),
            person.last_location
        );
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use alog_core::{Event, PersonId, summarize_people, utc_offset};
    use chrono::{TimeZone, Utc};
    use insta::assert_snapshot;

    #[test]
    fn test_people_table() {
        let events = vec![
            Event::new(
                "Alice",
                PersonId::new("FAC-1").unwrap(),
                "R101",
                "cam",
                Utc.with_ymd_and_hms(2025, 1, 29, 9, 10, 0).unwrap(),
            ),
            Event::new(
                "Alice",
                PersonId::new("FAC-1").unwrap(),
                "R204",
                "cam",
                Utc.with_ymd_and_hms(2025, 1, 29, 14, 0, 0).unwrap(),
            ),
            Event::new(
                "Bob",
                PersonId::new("FAC-2").unwrap(),
                "",
                "cam",
                Utc.with_ymd_and_hms(2025, 1, 29, 9, 5, 0).unwrap(),
            ),
        ];
        let output = format_people(&summarize_people(&events), utc_offset());
        assert_snapshot!(output, @r"
        ID          PERSON            EVENTS  LAST SEEN            LAST LOCATION
        FAC-1       Alice                  2  2025-01-29 14:00:00  R204
        FAC-2       Bob                    1  2025-01-29 09:05:00  Unknown
        ");
    }
}
