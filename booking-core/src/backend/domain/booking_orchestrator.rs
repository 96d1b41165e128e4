//! Booking orchestration for one student's booking session.
//!
//! The orchestrator owns the session state: the fetched catalog, ledger and
//! subscriptions, the caller's room choices and the à la carte selection. It
//! drives both booking workflows:
//!
//! - **À la carte**: individual occurrences are toggled into the selection
//!   and committed together, as one `book_one` call for a single entry or
//!   one `book_many` call otherwise.
//! - **Recurring**: a date range, weekday set and one timeframe group are
//!   validated locally and sent as a single range request. The server expands
//!   the dates and reports per-date failures.
//!
//! ## Refresh and stale responses
//!
//! Every successful commit triggers a refresh of catalog, ledger and
//! subscriptions, fetched concurrently. Each refresh is tagged with a
//! generation number; a snapshot whose generation is no longer current (a
//! newer refresh started, or the session was abandoned) is discarded on
//! arrival. The session is settled only once a current snapshot is applied.

use anyhow::Error as AnyError;
use chrono::NaiveDate;
use log::{error, info, warn};
use shared::DateRangeQuery;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::backend::domain::calendar::WeekdayCalendar;
use crate::backend::domain::commands::booking::{
    RecurringBookingDraft, RecurringBookingPlan, RefreshReport, SelectAllResult, SubmitResult,
};
use crate::backend::domain::conflict_resolver::{Classification, ConflictResolver};
use crate::backend::domain::eligibility::{group_label, EligibilityResolver};
use crate::backend::domain::errors::{BookingError, BookingResult, ConflictError, ValidationError};
use crate::backend::domain::models::booking::{BookingSelection, SelectionEntry};
use crate::backend::domain::models::slot::{GroupedSlot, OccurrenceKey, SlotOccurrence};
use crate::backend::domain::models::subscription::Subscription;
use crate::backend::domain::models::weekday::WeekdayKey;
use crate::backend::domain::reservation_ledger::ReservationLedger;
use crate::backend::domain::slot_catalog::{SlotCatalog, SlotPaging};
use crate::backend::io::mappers::{BookingMapper, SubscriptionMapper};
use crate::backend::storage::{BookingSink, Connection, SubscriptionSource};
use crate::config::BookingConfig;

/// Catalog, ledger and subscriptions fetched together for one generation
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub generation: u64,
    pub catalog: SlotCatalog,
    pub ledger: ReservationLedger,
    pub subscriptions: Vec<Subscription>,
    pub report: RefreshReport,
}

/// Fetches a session snapshot without borrowing the session.
///
/// Failed fetches degrade to empty data and are recorded in the report.
pub struct SnapshotLoader<C: Connection> {
    connection: Arc<C>,
    student_id: String,
    paging: SlotPaging,
    date_range: Option<DateRangeQuery>,
    generation: u64,
}

impl<C: Connection> SnapshotLoader<C> {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub async fn load(self) -> SessionSnapshot {
        let slots = self.connection.create_slot_repository();
        let reservations = self.connection.create_reservation_repository();
        let subscriptions = self.connection.create_subscription_repository();
        let student_id = self.student_id.as_str();

        let (catalog, ledger, subscription_rows) = tokio::join!(
            SlotCatalog::fetch(&slots, student_id, self.date_range.as_ref(), self.paging),
            ReservationLedger::fetch(&reservations, student_id),
            subscriptions.list_subscriptions(student_id),
        );

        let mut report = RefreshReport {
            generation: self.generation,
            ..Default::default()
        };

        let catalog = match catalog {
            Ok(catalog) => catalog,
            Err(e) => {
                warn!("Slot catalog fetch failed for student {}: {:#}", student_id, e);
                report.catalog_error = Some(format!("{:#}", e));
                SlotCatalog::default()
            }
        };
        let ledger = match ledger {
            Ok(ledger) => ledger,
            Err(e) => {
                warn!("Reservation fetch failed for student {}: {:#}", student_id, e);
                report.reservations_error = Some(format!("{:#}", e));
                ReservationLedger::default()
            }
        };
        let subscriptions = match subscription_rows {
            Ok(rows) => rows.into_iter().map(SubscriptionMapper::to_domain).collect(),
            Err(e) => {
                warn!("Subscription fetch failed for student {}: {:#}", student_id, e);
                report.subscriptions_error = Some(format!("{:#}", e));
                Vec::new()
            }
        };

        SessionSnapshot {
            generation: self.generation,
            catalog,
            ledger,
            subscriptions,
            report,
        }
    }
}

/// One student's booking session
pub struct BookingOrchestrator<C: Connection> {
    connection: Arc<C>,
    config: BookingConfig,
    student_id: String,
    calendar: WeekdayCalendar,
    catalog_window: Option<DateRangeQuery>,
    catalog: SlotCatalog,
    ledger: ReservationLedger,
    subscriptions: Vec<Subscription>,
    selected_subscription: Option<String>,
    eligibility: EligibilityResolver,
    room_choices: HashMap<OccurrenceKey, String>,
    selection: BookingSelection,
    generation: u64,
    settled: bool,
    last_refresh: Option<RefreshReport>,
}

impl<C: Connection> BookingOrchestrator<C> {
    /// Create an empty, unsettled session; call `refresh` to load it
    pub fn new(
        connection: Arc<C>,
        config: BookingConfig,
        student_id: impl Into<String>,
        calendar: WeekdayCalendar,
    ) -> BookingResult<Self> {
        let student_id = student_id.into();
        if student_id.trim().is_empty() {
            return Err(ValidationError::MissingStudent.into());
        }

        Ok(Self {
            connection,
            config,
            student_id,
            calendar,
            catalog_window: None,
            catalog: SlotCatalog::default(),
            ledger: ReservationLedger::default(),
            subscriptions: Vec::new(),
            selected_subscription: None,
            eligibility: EligibilityResolver::default(),
            room_choices: HashMap::new(),
            selection: BookingSelection::new(),
            generation: 0,
            settled: false,
            last_refresh: None,
        })
    }

    /// Create a session and load its first snapshot
    pub async fn open(
        connection: Arc<C>,
        config: BookingConfig,
        student_id: impl Into<String>,
        calendar: WeekdayCalendar,
    ) -> BookingResult<Self> {
        let mut session = Self::new(connection, config, student_id, calendar)?;
        session.refresh().await;
        Ok(session)
    }

    pub fn student_id(&self) -> &str {
        &self.student_id
    }

    pub fn calendar(&self) -> &WeekdayCalendar {
        &self.calendar
    }

    pub fn catalog(&self) -> &SlotCatalog {
        &self.catalog
    }

    pub fn ledger(&self) -> &ReservationLedger {
        &self.ledger
    }

    pub fn subscriptions(&self) -> &[Subscription] {
        &self.subscriptions
    }

    pub fn eligibility(&self) -> &EligibilityResolver {
        &self.eligibility
    }

    pub fn selection(&self) -> &BookingSelection {
        &self.selection
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// False from the start of a refresh until its snapshot is applied
    pub fn is_settled(&self) -> bool {
        self.settled
    }

    pub fn last_refresh(&self) -> Option<&RefreshReport> {
        self.last_refresh.as_ref()
    }

    /// Limit catalog fetches to slots offered within `[start, end]`; applies
    /// from the next refresh
    pub fn set_catalog_window(&mut self, start: NaiveDate, end: NaiveDate) -> BookingResult<()> {
        if start > end {
            return Err(ValidationError::StartAfterEnd { start, end }.into());
        }
        self.catalog_window = Some(DateRangeQuery {
            start_date: WeekdayCalendar::format_date(start),
            end_date: WeekdayCalendar::format_date(end),
        });
        Ok(())
    }

    pub fn clear_catalog_window(&mut self) {
        self.catalog_window = None;
    }

    pub fn catalog_window(&self) -> Option<&DateRangeQuery> {
        self.catalog_window.as_ref()
    }

    /// Pick the default subscription for bookings without a pinned one
    pub fn select_subscription(&mut self, subscription_id: Option<String>) {
        self.selected_subscription = subscription_id;
        self.eligibility = EligibilityResolver::new(&self.subscriptions, self.selected_subscription.as_deref());
    }

    // ---------- Refresh ----------

    /// Start a new refresh generation and hand out its loader
    pub fn snapshot_loader(&mut self) -> SnapshotLoader<C> {
        self.generation += 1;
        self.settled = false;
        SnapshotLoader {
            connection: Arc::clone(&self.connection),
            student_id: self.student_id.clone(),
            paging: self.config.slot_paging(),
            date_range: self.catalog_window.clone(),
            generation: self.generation,
        }
    }

    /// Apply a snapshot if it belongs to the current generation
    pub fn apply_snapshot(&mut self, snapshot: SessionSnapshot) -> RefreshReport {
        let mut report = snapshot.report;
        if snapshot.generation != self.generation {
            info!(
                "Discarding stale snapshot {} for student {} (current generation {})",
                snapshot.generation, self.student_id, self.generation
            );
            report.applied = false;
            return report;
        }

        self.catalog = snapshot.catalog;
        self.ledger = snapshot.ledger;
        self.subscriptions = snapshot.subscriptions;
        self.eligibility = EligibilityResolver::new(&self.subscriptions, self.selected_subscription.as_deref());
        self.settled = true;

        report.applied = true;
        self.last_refresh = Some(report.clone());
        report
    }

    /// The caller is leaving the session; in-flight snapshots are dropped
    pub fn abandon(&mut self) {
        self.generation += 1;
        self.settled = false;
        info!("Booking session for student {} abandoned", self.student_id);
    }

    pub async fn refresh(&mut self) -> RefreshReport {
        let loader = self.snapshot_loader();
        let snapshot = loader.load().await;
        self.apply_snapshot(snapshot)
    }

    /// À la carte bookings need a loaded ledger; an empty one after a failed
    /// reservation fetch would let a held occurrence look free
    pub fn ensure_ledger_loaded(&self) -> BookingResult<()> {
        let reason = match &self.last_refresh {
            None => Some("reservations not loaded yet".to_string()),
            Some(report) => report.reservations_error.clone(),
        };
        match reason {
            Some(reason) => Err(ConflictError::LedgerUnavailable { reason }.into()),
            None => Ok(()),
        }
    }

    // ---------- À la carte selection ----------

    pub fn conflict_resolver(&self) -> ConflictResolver<'_> {
        ConflictResolver::new(&self.ledger, &self.eligibility, &self.student_id)
    }

    pub fn room_choice(&self, key: &OccurrenceKey) -> Option<&str> {
        self.room_choices.get(key).map(String::as_str)
    }

    /// Record the room for an occurrence; a selected entry follows the choice
    pub fn choose_room(&mut self, key: OccurrenceKey, room_id: impl Into<String>) {
        let room_id = room_id.into();
        if let Some(entry) = self.selection.get(&key) {
            let mut updated = entry.clone();
            updated.room_id = room_id.clone();
            self.selection.insert(updated);
        }
        self.room_choices.insert(key, room_id);
    }

    /// Current state of an occurrence given the chosen room
    pub fn classify(&self, occurrence: &SlotOccurrence) -> Classification {
        self.conflict_resolver()
            .classify(occurrence, self.room_choice(&occurrence.key()))
    }

    pub fn visible_occurrences(&self, date: NaiveDate) -> Vec<SlotOccurrence> {
        self.catalog.occurrences_for_date(date)
    }

    /// Occurrences on `date` that could be selected right now
    pub fn selectable_occurrences(&self, date: NaiveDate) -> Vec<SlotOccurrence> {
        if self.ensure_ledger_loaded().is_err() {
            return Vec::new();
        }
        self.visible_occurrences(date)
            .into_iter()
            .filter(|occurrence| self.classify(occurrence).is_bookable())
            .collect()
    }

    /// Select or deselect one occurrence; returns whether it is now selected.
    ///
    /// Selecting is refused with the reason when the occurrence is not
    /// bookable or the ledger failed to load. Deselecting always works.
    pub fn toggle_occurrence(&mut self, occurrence: SlotOccurrence, parent_note: Option<String>) -> BookingResult<bool> {
        let key = occurrence.key();
        if self.selection.remove(&key).is_some() {
            return Ok(false);
        }

        self.ensure_ledger_loaded()?;
        let room_id = self.room_choice(&key).map(str::to_string);
        self.conflict_resolver()
            .ensure_bookable(&occurrence, room_id.as_deref())?;

        // ensure_bookable only passes with a valid room
        let room_id = room_id.unwrap_or_default();
        self.selection.insert(SelectionEntry {
            occurrence,
            room_id,
            parent_note,
        });
        Ok(true)
    }

    /// Select every selectable occurrence on `date`, or clear them all if
    /// they are already selected
    pub fn toggle_select_all(&mut self, date: NaiveDate) -> SelectAllResult {
        let selectable = self.selectable_occurrences(date);
        let all_selected = selectable.iter().all(|o| self.selection.contains(&o.key()));

        if selectable.is_empty() || all_selected {
            for occurrence in &selectable {
                self.selection.remove(&occurrence.key());
            }
            return SelectAllResult {
                selected: false,
                affected: selectable.len(),
            };
        }

        let mut affected = 0;
        for occurrence in selectable {
            let key = occurrence.key();
            if self.selection.contains(&key) {
                continue;
            }
            let room_id = self.room_choice(&key).map(str::to_string).unwrap_or_default();
            self.selection.insert(SelectionEntry {
                occurrence,
                room_id,
                parent_note: None,
            });
            affected += 1;
        }
        SelectAllResult {
            selected: true,
            affected,
        }
    }

    /// Commit the selection.
    ///
    /// Every entry is re-checked against the current ledger and eligibility
    /// before anything is sent. Entries that succeeded leave the selection;
    /// entries whose date failed stay for a retry.
    pub async fn submit_selection(&mut self) -> BookingResult<SubmitResult> {
        if self.selection.is_empty() {
            return Err(ValidationError::EmptySelection.into());
        }
        self.ensure_ledger_loaded()?;

        let resolver = self.conflict_resolver();
        for entry in self.selection.entries() {
            resolver.ensure_bookable(&entry.occurrence, Some(&entry.room_id))?;
        }

        let batch = self.eligibility.resolve_batch(self.selection.entries())?;
        if let Some(key) = batch.invalid.first() {
            return Err(ConflictError::Ineligible { slot: key.label() }.into());
        }

        let bookings = self.connection.create_booking_repository();
        let count = self.selection.len() as u32;
        info!(
            "Submitting {} selected slots for student {} on subscription {}",
            count, self.student_id, batch.subscription_id
        );

        let single = if count == 1 { self.selection.entries().next() } else { None };
        let outcome = match single {
            Some(entry) => {
                let request = BookingMapper::to_single_request(&self.student_id, &batch.subscription_id, entry);
                let response = bookings
                    .book_one(&request)
                    .await
                    .map_err(|e| self.remote_error(&e))?;
                BookingMapper::outcome_from_single(response)
            }
            None => {
                let request =
                    BookingMapper::to_slots_request(&self.student_id, &batch.subscription_id, self.selection.entries());
                let response = bookings
                    .book_many(&request)
                    .await
                    .map_err(|e| self.remote_error(&e))?;
                BookingMapper::outcome_from_many(response, count)
            }
        };

        self.selection.retain_dates(&outcome.failed_dates());
        info!(
            "Booked {} slots for student {}, {} failed",
            outcome.success_count,
            self.student_id,
            outcome.failed_slots.len()
        );

        let refresh = self.refresh().await;
        Ok(SubmitResult { outcome, refresh })
    }

    // ---------- Recurring workflow ----------

    /// Branch/timeframe groups offered for recurring booking
    pub fn recurring_groups(&self) -> Vec<GroupedSlot> {
        self.catalog.dedupe_by_branch_timeframe()
    }

    /// Weekdays that can still be picked for the draft's range and group
    pub fn pickable_weekdays(&self, draft: &RecurringBookingDraft) -> BTreeSet<WeekdayKey> {
        match (draft.start_date, draft.end_date) {
            (Some(start), Some(end)) => WeekdayCalendar::weekdays_in_range(start, end)
                .intersection(&draft.group.weekdays())
                .copied()
                .collect(),
            _ => BTreeSet::new(),
        }
    }

    /// Number of slots the draft would create, for display
    pub fn estimate_recurring(&self, draft: &RecurringBookingDraft) -> u32 {
        match (draft.start_date, draft.end_date) {
            (Some(start), Some(end)) => WeekdayCalendar::count_occurrences(start, end, &draft.weekdays),
            _ => 0,
        }
    }

    /// Run every local check on a recurring draft
    pub fn plan_recurring(&self, draft: &RecurringBookingDraft) -> BookingResult<RecurringBookingPlan> {
        let (start, end) = match (draft.start_date, draft.end_date) {
            (Some(start), Some(end)) => (start, end),
            _ => return Err(ValidationError::MissingDateRange.into()),
        };
        if start > end {
            return Err(ValidationError::StartAfterEnd { start, end }.into());
        }
        if draft.weekdays.is_empty() {
            return Err(ValidationError::EmptyWeekdays.into());
        }

        let reachable = WeekdayCalendar::weekdays_in_range(start, end);
        if let Some(weekday) = draft.weekdays.iter().find(|w| !reachable.contains(*w)) {
            return Err(ValidationError::WeekdayOutsideRange {
                weekday: *weekday,
                start,
                end,
            }
            .into());
        }
        let offered = draft.group.weekdays();
        if let Some(weekday) = draft.weekdays.iter().find(|w| !offered.contains(*w)) {
            return Err(ValidationError::WeekdayNotOffered { weekday: *weekday }.into());
        }

        if draft.group.rooms().is_empty() {
            return Err(ConflictError::NoRoomsAvailable {
                slot: group_label(&draft.group),
            }
            .into());
        }
        let room_id = draft
            .room_id
            .as_deref()
            .filter(|id| draft.group.rooms().iter().any(|r| r.room_id == *id))
            .ok_or(ValidationError::EmptyRoomSelection)?;

        let subscription_id = self
            .eligibility
            .resolve_group(&draft.group, draft.weekdays.iter().copied())?;

        let representative = draft.group.representative();
        Ok(RecurringBookingPlan {
            branch_id: representative.branch_id.clone(),
            timeframe_id: representative.timeframe_id.clone(),
            slot_type_id: representative.slot_type_id.clone(),
            room_id: room_id.to_string(),
            start_date: start,
            end_date: end,
            weekdays: draft.weekdays.clone(),
            subscription_id,
            parent_note: draft.parent_note.clone(),
            estimate: WeekdayCalendar::count_occurrences(start, end, &draft.weekdays),
        })
    }

    /// Send a recurring draft as one range request
    pub async fn submit_recurring(&mut self, draft: &RecurringBookingDraft) -> BookingResult<SubmitResult> {
        let plan = self.plan_recurring(draft)?;
        let request = BookingMapper::to_recurring_request(&self.student_id, &plan);
        info!(
            "Submitting recurring booking for student {}: {} to {}, {} expected slots",
            self.student_id, plan.start_date, plan.end_date, plan.estimate
        );

        let response = self
            .connection
            .create_booking_repository()
            .book_many(&request)
            .await
            .map_err(|e| self.remote_error(&e))?;
        let outcome = BookingMapper::outcome_from_many(response, plan.estimate);
        info!(
            "Recurring booking for student {}: {} booked, {} failed",
            self.student_id,
            outcome.success_count,
            outcome.failed_slots.len()
        );

        let refresh = self.refresh().await;
        Ok(SubmitResult { outcome, refresh })
    }

    fn remote_error(&self, e: &AnyError) -> BookingError {
        error!("Booking commit failed for student {}: {:#}", self.student_id, e);
        BookingError::remote(e, &self.config.generic_error_message)
    }
}
