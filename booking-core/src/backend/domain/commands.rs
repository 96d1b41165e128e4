// booking-core/src/backend/domain/commands.rs

//! Domain-level command and result types
//! These structs are used by the booking services inside the domain layer.
//! Wire payloads live in the `shared` crate and are built by the io mappers.

pub mod booking {
    use chrono::NaiveDate;
    use std::collections::BTreeSet;

    use crate::backend::domain::models::booking::{BookingOutcome, BookingOutcomeKind};
    use crate::backend::domain::models::slot::GroupedSlot;
    use crate::backend::domain::models::weekday::WeekdayKey;

    /// Input of the date-range workflow before validation.
    #[derive(Debug, Clone)]
    pub struct RecurringBookingDraft {
        pub group: GroupedSlot,
        pub start_date: Option<NaiveDate>,
        pub end_date: Option<NaiveDate>,
        pub weekdays: BTreeSet<WeekdayKey>,
        pub room_id: Option<String>,
        pub parent_note: Option<String>,
    }

    /// A recurring request that passed every local check.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct RecurringBookingPlan {
        pub branch_id: String,
        pub timeframe_id: String,
        pub slot_type_id: Option<String>,
        pub room_id: String,
        pub start_date: NaiveDate,
        pub end_date: NaiveDate,
        pub weekdays: BTreeSet<WeekdayKey>,
        pub subscription_id: String,
        pub parent_note: Option<String>,
        /// Occurrences the server is expected to create
        pub estimate: u32,
    }

    /// Result of a commit that reached the server.
    #[derive(Debug, Clone)]
    pub struct SubmitResult {
        pub outcome: BookingOutcome,
        pub refresh: RefreshReport,
    }

    impl SubmitResult {
        pub fn kind(&self) -> BookingOutcomeKind {
            self.outcome.kind()
        }
    }

    /// Result of the "select all" toggle for one date.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SelectAllResult {
        /// True if the action selected, false if it cleared
        pub selected: bool,
        pub affected: usize,
    }

    /// What happened to one catalog/ledger/subscription refresh.
    #[derive(Debug, Clone, Default, PartialEq, Eq)]
    pub struct RefreshReport {
        pub generation: u64,
        /// False when the snapshot arrived after the session moved on
        pub applied: bool,
        pub catalog_error: Option<String>,
        pub reservations_error: Option<String>,
        pub subscriptions_error: Option<String>,
    }

    impl RefreshReport {
        pub fn is_clean(&self) -> bool {
            self.catalog_error.is_none()
                && self.reservations_error.is_none()
                && self.subscriptions_error.is_none()
        }
    }
}
