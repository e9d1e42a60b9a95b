//! Core type definitions with validation.

use std::fmt;

use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for core types and call parameters.
///
/// These are programmer errors raised at the call boundary, never data-quality
/// problems in an event batch (those are reported as skipped records).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// A dedup window was given a negative length.
    #[error("dedup window must not be negative, got {minutes} minutes")]
    NegativeWindow { minutes: i64 },

    /// A UTC offset outside the range chrono accepts (strictly within +/- 24h).
    #[error("invalid UTC offset: {minutes} minutes")]
    InvalidOffset { minutes: i32 },
}

/// Generates a validated string ID newtype with common trait implementations.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new ID after validation.
            ///
            /// Surrounding whitespace is trimmed; a blank value is rejected.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                let trimmed = id.trim();
                if trimmed.is_empty() {
                    return Err(ValidationError::Empty { field: $field_name });
                }
                if trimmed.len() == id.len() {
                    Ok(Self(id))
                } else {
                    Ok(Self(trimmed.to_string()))
                }
            }

            /// Returns the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_string_id!(
    /// A validated person identifier.
    ///
    /// This is the institutional ID (or a stable surrogate supplied at ingestion),
    /// never a display name. It is the only identity key used for dedup and
    /// per-person grouping.
    PersonId, "person ID"
);

/// Builds a fixed UTC offset from a number of minutes east of UTC.
///
/// Used for every calendar-day and hour-of-day computation so that results
/// never depend on the host's local timezone.
pub fn offset_from_minutes(minutes: i32) -> Result<FixedOffset, ValidationError> {
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .ok_or(ValidationError::InvalidOffset { minutes })
}

/// The UTC offset, used as the default calendar for all computations.
pub fn utc_offset() -> FixedOffset {
    Utc.fix()
}
