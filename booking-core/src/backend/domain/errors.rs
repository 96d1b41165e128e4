//! Error taxonomy of the booking core.
//!
//! Validation and conflict errors are detected locally and always stop a
//! commit before any network call. Remote errors carry a message that is safe
//! to show to the user as-is.

use chrono::NaiveDate;
use thiserror::Error;

use super::models::weekday::WeekdayKey;

pub type BookingResult<T> = Result<T, BookingError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Conflict,
    Remote,
}

/// Input problems the user can fix on the spot
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("No student selected")]
    MissingStudent,
    #[error("Please choose a start and end date")]
    MissingDateRange,
    #[error("Start date {start} is after end date {end}")]
    StartAfterEnd { start: NaiveDate, end: NaiveDate },
    #[error("Please choose at least one weekday")]
    EmptyWeekdays,
    #[error("{weekday} does not fall between {start} and {end}")]
    WeekdayOutsideRange {
        weekday: WeekdayKey,
        start: NaiveDate,
        end: NaiveDate,
    },
    #[error("{weekday} is not offered for this timeframe")]
    WeekdayNotOffered { weekday: WeekdayKey },
    #[error("Please choose a room")]
    EmptyRoomSelection,
    #[error("Please choose a room for {slot}")]
    NoRoomChosen { slot: String },
    #[error("Please select at least one slot")]
    EmptySelection,
    #[error("Invalid weekday value {0}; expected 0-6")]
    InvalidWeekday(i64),
    #[error("Slot {template_id} recurs on {expected}, not on {date}")]
    WeekdayMismatch {
        template_id: String,
        expected: WeekdayKey,
        date: NaiveDate,
    },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Problems found against already-fetched ledger, catalog or package state
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConflictError {
    #[error("The student already has a booking for {slot}")]
    AlreadyBooked { slot: String, reservation_id: String },
    #[error("No active package covers {slot}")]
    Ineligible { slot: String },
    #[error("No rooms are available for {slot}")]
    NoRoomsAvailable { slot: String },
    #[error("Selected slots belong to different packages ({})", .subscription_ids.join(", "))]
    MixedSubscriptions { subscription_ids: Vec<String> },
    #[error("Existing bookings could not be loaded ({reason}); refresh before booking")]
    LedgerUnavailable { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookingError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Conflict(#[from] ConflictError),
    #[error("{0}")]
    Remote(String),
}

impl BookingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BookingError::Validation(_) => ErrorKind::Validation,
            BookingError::Conflict(_) => ErrorKind::Conflict,
            BookingError::Remote(_) => ErrorKind::Remote,
        }
    }

    /// Wrap a transport or server failure, keeping its message when it has one
    pub fn remote(error: &anyhow::Error, fallback: &str) -> Self {
        let message = error.to_string();
        if message.trim().is_empty() {
            BookingError::Remote(fallback.to_string())
        } else {
            BookingError::Remote(message)
        }
    }
}
