//! Recurring-slot scheduling and booking core for a children's activity center.
//!
//! The crate turns weekly slot templates into concrete occurrences, checks
//! them against a student's reservations and packages, and commits single,
//! à la carte and recurring bookings with per-date partial failure reporting.
//! Screens, authentication and payments live elsewhere; the remote backend is
//! reached through the traits in [`backend::storage`].

pub mod backend;
pub mod config;

pub use backend::domain::commands::booking::{
    RecurringBookingDraft, RecurringBookingPlan, RefreshReport, SelectAllResult, SubmitResult,
};
pub use backend::domain::models::booking::{BookingOutcome, BookingOutcomeKind, BookingSelection, FailedSlot};
pub use backend::domain::models::slot::{GroupedSlot, OccurrenceKey, RoomOption, SlotOccurrence, SlotTemplate};
pub use backend::domain::models::weekday::WeekdayKey;
pub use backend::domain::{
    BookingError, BookingOrchestrator, BookingResult, ConflictError, ErrorKind, SlotState, ValidationError,
    WeekdayCalendar,
};
pub use backend::storage::{Connection, InMemoryConnection};
pub use backend::BookingBackend;
#[cfg(feature = "rest-client")]
pub use backend::{initialize_rest_backend, storage::RestConnection};
pub use config::BookingConfig;
