//! # Domain Module
//!
//! Contains the scheduling and booking rules of the booking core.
//!
//! This module turns recurring weekly slot templates into concrete calendar
//! occurrences, reconciles them with a student's reservations and packages,
//! and drives single and batch booking commits. It works against the storage
//! traits only and never knows which backend sits behind them.
//!
//! ## Module Organization
//!
//! - **calendar**: Week offsets, weekday projection and occurrence counting
//! - **slot_catalog**: Paginated template fetch, weekday grouping and branch/timeframe grouping
//! - **reservation_ledger**: Existing reservations and cancellation lookups
//! - **eligibility**: Which subscription pays for a booking
//! - **conflict_resolver**: Per-occurrence state classification
//! - **booking_orchestrator**: Selection state, commits, refresh and stale-response guard
//!
//! ## Business Rules
//!
//! - A student never gets a second active reservation for the same template and date
//! - Only a cancelled reservation reopens an occurrence
//! - Only `ACTIVE` subscriptions can pay for bookings
//! - One commit never spans two subscriptions
//! - A batch commit may partially succeed; failed dates are reported verbatim

pub mod booking_orchestrator;
pub mod calendar;
pub mod commands;
pub mod conflict_resolver;
pub mod eligibility;
pub mod errors;
pub mod models;
pub mod reservation_ledger;
pub mod slot_catalog;

pub use booking_orchestrator::{BookingOrchestrator, SessionSnapshot, SnapshotLoader};
pub use calendar::{WeekRange, WeekdayCalendar};
pub use conflict_resolver::{Classification, ConflictResolver, SlotState};
pub use eligibility::{BatchEligibility, EligibilityResolver};
pub use errors::{BookingError, BookingResult, ConflictError, ErrorKind, ValidationError};
pub use reservation_ledger::ReservationLedger;
pub use slot_catalog::{SlotCatalog, SlotPaging};
