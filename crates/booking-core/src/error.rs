//! Error types for the booking core.

use chrono::NaiveDate;
use thiserror::Error;

use crate::time::TimeOfDay;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error while reading the config file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parse error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A time string that is not `HH:MM` or is out of range.
    #[error("invalid time: {0}")]
    InvalidTime(String),

    /// A window whose start is after its end.
    #[error("window start {start} is after end {end}")]
    InvertedWindow { start: TimeOfDay, end: TimeOfDay },

    /// A window boundary that is not selectable on the minute grid.
    #[error("window boundary {0} is not on the {1}-minute grid")]
    OffGrid(TimeOfDay, u8),

    /// Weekly and default windows must start and end on the hour.
    #[error("general window boundary {0} must be on the hour")]
    NotHourAligned(TimeOfDay),

    /// A minute step that does not divide an hour.
    #[error("minute step {0} must be between 1 and 60 and divide 60")]
    InvalidMinuteStep(u8),

    /// A blackout range that ends before it starts.
    #[error("blackout range {from} to {to} is inverted")]
    InvertedBlackout { from: NaiveDate, to: NaiveDate },
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors raised by booking session operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BookingError {
    /// The offer is not part of the catalog.
    #[error("unknown offer: {0}")]
    UnknownOffer(String),

    /// The date lies before today.
    #[error("date {0} is in the past")]
    PastDate(NaiveDate),

    /// No date has been picked yet.
    #[error("no date selected")]
    NoDateSelected,

    /// The selected date has no bookable hours.
    #[error("date {0} is closed")]
    DateClosed(NaiveDate),
}
