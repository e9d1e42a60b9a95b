//! Reading a fetched event batch from a file or stdin.
//!
//! Accepts either a JSON array of records or JSON Lines. Records that fail
//! to decode are counted as skipped, like records that fail validation.

use std::fs;
use std::io::{Read, stdin};
use std::path::Path;

use alog_core::{IngestOptions, Ingested, RawEvent, SkipReason, ingest_records};
use anyhow::{Context, Result};

/// Loads and validates events from `path`, or stdin when `path` is `None`.
pub fn load_events(path: Option<&Path>, options: &IngestOptions) -> Result<Ingested> {
    let content = match path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read events file: {}", path.display()))?,
        None => {
            let mut buf = String::new();
            stdin()
                .lock()
                .read_to_string(&mut buf)
                .context("failed to read events from stdin")?;
            buf
        }
    };
    parse_events(&content, options)
}

/// Parses a JSON array or JSON Lines document into validated events.
pub fn parse_events(content: &str, options: &IngestOptions) -> Result<Ingested> {
    let trimmed = content.trim_start();
    let ingested = if trimmed.starts_with('[') {
        let values: Vec<serde_json::Value> =
            serde_json::from_str(trimmed).context("events file is not a valid JSON array")?;
        ingest_records(
            values
                .into_iter()
                .map(|value| serde_json::from_value::<RawEvent>(value).map_err(malformed))
                .enumerate(),
            options,
        )
    } else {
        ingest_records(
            content
                .lines()
                .enumerate()
                .filter(|(_, line)| !line.trim().is_empty())
                .map(|(line_num, line)| {
                    let record = serde_json::from_str::<RawEvent>(line).map_err(|e| {
                        tracing::debug!(
                            line = line_num + 1,
                            error = %e,
                            "skipping malformed line in events input"
                        );
                        malformed(e)
                    });
                    (line_num, record)
                }),
            options,
        )
    };
    Ok(ingested)
}

fn malformed(e: serde_json::Error) -> SkipReason {
    SkipReason::Malformed(e.to_string())
}
