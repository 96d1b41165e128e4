//! # In-Memory Backend
//!
//! A seeded, in-process stand-in for the booking backend. It serves slot
//! pages, reservations and subscriptions from memory and applies bookings the
//! way the real backend does:
//!
//! - a booking is refused when the student already holds an active
//!   reservation for the same template and date
//! - recurring requests are expanded server-side over the date range and
//!   weekday set
//! - every booked occurrence becomes a `booked` reservation row and uses one
//!   session of its subscription
//!
//! Failures can be injected per date (reported in `failedSlots`) or per
//! collaborator (the whole call fails). Every request is recorded so tests
//! can assert on what was sent, and on what was not.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use log::debug;
use shared::{
    BookManyResponse, BookOneResponse, BookSlotRequest, BulkBookingRequest, BulkSelection, DateRangeQuery,
    FailedSlotRow, ReservationListResponse, ReservationRow, SlotPage, SlotTemplateRow, SubscriptionRow,
};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use super::traits::{BookingSink, Connection, ReservationSource, SlotSource, SubscriptionSource};
use crate::backend::domain::calendar::WeekdayCalendar;
use crate::backend::domain::models::weekday::WeekdayKey;

/// Remote collaborator a whole-call failure can be injected into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collaborator {
    Slots,
    Reservations,
    Subscriptions,
    Bookings,
}

#[derive(Debug, Default)]
struct MemoryState {
    slots: Vec<SlotTemplateRow>,
    reservations: Vec<ReservationRow>,
    subscriptions: HashMap<String, Vec<SubscriptionRow>>,
    today: Option<NaiveDate>,
    failing_dates: HashMap<String, String>,
    call_failures: HashMap<Collaborator, String>,
    omit_success_count: bool,
    slot_page_requests: Vec<u32>,
    slot_date_ranges: Vec<Option<DateRangeQuery>>,
    single_requests: Vec<BookSlotRequest>,
    bulk_requests: Vec<BulkBookingRequest>,
    next_reservation_id: u64,
}

impl MemoryState {
    fn check_call(&self, collaborator: Collaborator) -> Result<()> {
        match self.call_failures.get(&collaborator) {
            Some(message) => Err(anyhow!("{}", message)),
            None => Ok(()),
        }
    }

    fn has_active_reservation(&self, student_id: &str, template_id: &str, date: NaiveDate) -> bool {
        self.reservations.iter().any(|r| {
            r.student_id == student_id
                && r.template_id == template_id
                && WeekdayCalendar::parse_date(&r.date) == Some(date)
                && !r.status.trim().eq_ignore_ascii_case("cancelled")
        })
    }

    /// Book one occurrence; the error is the per-date reason
    fn book(
        &mut self,
        student_id: &str,
        subscription_id: &str,
        template_id: &str,
        room_id: &str,
        date: &str,
        parent_note: Option<&str>,
    ) -> std::result::Result<(), String> {
        if let Some(reason) = self.failing_dates.get(date) {
            return Err(reason.clone());
        }
        let parsed = WeekdayCalendar::parse_date(date).ok_or_else(|| format!("Invalid date {}", date))?;
        if self.has_active_reservation(student_id, template_id, parsed) {
            return Err("Slot already booked".to_string());
        }

        self.next_reservation_id += 1;
        self.reservations.push(ReservationRow {
            id: format!("res-{}", self.next_reservation_id),
            template_id: template_id.to_string(),
            student_id: student_id.to_string(),
            date: WeekdayCalendar::format_date(parsed),
            status: "booked".to_string(),
            room_id: Some(room_id.to_string()),
            parent_note: parent_note.map(str::to_string),
        });

        if let Some(subscription) = self
            .subscriptions
            .get_mut(student_id)
            .and_then(|subs| subs.iter_mut().find(|s| s.id == subscription_id))
        {
            subscription.used_slot = Some(subscription.used_slot.unwrap_or(0) + 1);
        }
        Ok(())
    }

    /// Template of a branch/timeframe recurring on `date`'s weekday
    fn recurring_template(
        &self,
        branch_id: &str,
        timeframe_id: &str,
        slot_type_id: Option<&str>,
        date: NaiveDate,
    ) -> Option<String> {
        let weekday = i64::from(WeekdayKey::from_date(date).value());
        self.slots
            .iter()
            .find(|s| {
                s.branch_id == branch_id
                    && s.timeframe_id == timeframe_id
                    && s.weekday == weekday
                    && slot_type_id.map_or(true, |t| s.slot_type_id.as_deref() == Some(t))
            })
            .map(|s| s.id.clone())
    }
}

/// Shared handle to the in-memory backend
#[derive(Debug, Clone, Default)]
pub struct InMemoryConnection {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryConnection {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| anyhow!("In-memory booking store lock poisoned"))
    }

    pub fn seed_slots(&self, rows: impl IntoIterator<Item = SlotTemplateRow>) -> Result<()> {
        self.lock()?.slots.extend(rows);
        Ok(())
    }

    pub fn seed_reservation(&self, row: ReservationRow) -> Result<()> {
        self.lock()?.reservations.push(row);
        Ok(())
    }

    pub fn seed_subscription(&self, student_id: &str, row: SubscriptionRow) -> Result<()> {
        self.lock()?
            .subscriptions
            .entry(student_id.to_string())
            .or_default()
            .push(row);
        Ok(())
    }

    /// Date the "upcoming only" listing counts from
    pub fn set_today(&self, today: NaiveDate) -> Result<()> {
        self.lock()?.today = Some(today);
        Ok(())
    }

    /// Change the status of a stored reservation, as staff would
    pub fn set_reservation_status(&self, reservation_id: &str, status: &str) -> Result<()> {
        let mut state = self.lock()?;
        let reservation = state
            .reservations
            .iter_mut()
            .find(|r| r.id == reservation_id)
            .ok_or_else(|| anyhow!("Reservation {} not found", reservation_id))?;
        reservation.status = status.to_string();
        Ok(())
    }

    /// Refuse bookings on `date` (ISO) with `reason`
    pub fn fail_date(&self, date: &str, reason: &str) -> Result<()> {
        self.lock()?
            .failing_dates
            .insert(date.to_string(), reason.to_string());
        Ok(())
    }

    /// Make every call to `collaborator` fail with `message`
    pub fn fail_calls(&self, collaborator: Collaborator, message: &str) -> Result<()> {
        self.lock()?
            .call_failures
            .insert(collaborator, message.to_string());
        Ok(())
    }

    pub fn clear_failures(&self) -> Result<()> {
        let mut state = self.lock()?;
        state.failing_dates.clear();
        state.call_failures.clear();
        Ok(())
    }

    /// Leave `successCount` out of batch responses
    pub fn omit_success_count(&self, omit: bool) -> Result<()> {
        self.lock()?.omit_success_count = omit;
        Ok(())
    }

    pub fn reservations(&self) -> Result<Vec<ReservationRow>> {
        Ok(self.lock()?.reservations.clone())
    }

    pub fn subscriptions(&self, student_id: &str) -> Result<Vec<SubscriptionRow>> {
        Ok(self.lock()?.subscriptions.get(student_id).cloned().unwrap_or_default())
    }

    pub fn single_requests(&self) -> Result<Vec<BookSlotRequest>> {
        Ok(self.lock()?.single_requests.clone())
    }

    pub fn bulk_requests(&self) -> Result<Vec<BulkBookingRequest>> {
        Ok(self.lock()?.bulk_requests.clone())
    }

    /// Number of commit calls received, failed ones included
    pub fn booking_call_count(&self) -> Result<usize> {
        let state = self.lock()?;
        Ok(state.single_requests.len() + state.bulk_requests.len())
    }

    pub fn slot_page_requests(&self) -> Result<Vec<u32>> {
        Ok(self.lock()?.slot_page_requests.clone())
    }

    /// Date window sent with each slot page request
    pub fn slot_date_ranges(&self) -> Result<Vec<Option<DateRangeQuery>>> {
        Ok(self.lock()?.slot_date_ranges.clone())
    }
}

impl Connection for InMemoryConnection {
    type SlotRepository = MemorySlotRepository;
    type ReservationRepository = MemoryReservationRepository;
    type SubscriptionRepository = MemorySubscriptionRepository;
    type BookingRepository = MemoryBookingRepository;

    fn create_slot_repository(&self) -> Self::SlotRepository {
        MemorySlotRepository { connection: self.clone() }
    }

    fn create_reservation_repository(&self) -> Self::ReservationRepository {
        MemoryReservationRepository { connection: self.clone() }
    }

    fn create_subscription_repository(&self) -> Self::SubscriptionRepository {
        MemorySubscriptionRepository { connection: self.clone() }
    }

    fn create_booking_repository(&self) -> Self::BookingRepository {
        MemoryBookingRepository { connection: self.clone() }
    }
}

#[derive(Clone)]
pub struct MemorySlotRepository {
    connection: InMemoryConnection,
}

#[async_trait]
impl SlotSource for MemorySlotRepository {
    async fn list_available_slots(
        &self,
        _student_id: &str,
        page: u32,
        page_size: u32,
        date_range: Option<&DateRangeQuery>,
    ) -> Result<SlotPage> {
        let mut state = self.connection.lock()?;
        state.slot_page_requests.push(page);
        state.slot_date_ranges.push(date_range.cloned());
        state.check_call(Collaborator::Slots)?;

        let start = page.saturating_sub(1) as usize * page_size as usize;
        let items: Vec<SlotTemplateRow> = state
            .slots
            .iter()
            .skip(start)
            .take(page_size as usize)
            .cloned()
            .collect();
        let has_next_page = start + (page_size as usize) < state.slots.len();
        debug!("Serving slot page {} with {} rows", page, items.len());

        Ok(SlotPage { items, has_next_page })
    }
}

#[derive(Clone)]
pub struct MemoryReservationRepository {
    connection: InMemoryConnection,
}

#[async_trait]
impl ReservationSource for MemoryReservationRepository {
    async fn list_reservations(&self, student_id: &str, upcoming_only: bool) -> Result<ReservationListResponse> {
        let state = self.connection.lock()?;
        state.check_call(Collaborator::Reservations)?;

        let items = state
            .reservations
            .iter()
            .filter(|r| r.student_id == student_id)
            .filter(|r| match (upcoming_only, state.today) {
                (true, Some(today)) => WeekdayCalendar::parse_date(&r.date).map_or(false, |d| d >= today),
                _ => true,
            })
            .cloned()
            .collect();
        Ok(ReservationListResponse { items })
    }
}

#[derive(Clone)]
pub struct MemorySubscriptionRepository {
    connection: InMemoryConnection,
}

#[async_trait]
impl SubscriptionSource for MemorySubscriptionRepository {
    async fn list_subscriptions(&self, student_id: &str) -> Result<Vec<SubscriptionRow>> {
        let state = self.connection.lock()?;
        state.check_call(Collaborator::Subscriptions)?;
        Ok(state.subscriptions.get(student_id).cloned().unwrap_or_default())
    }
}

#[derive(Clone)]
pub struct MemoryBookingRepository {
    connection: InMemoryConnection,
}

#[async_trait]
impl BookingSink for MemoryBookingRepository {
    async fn book_one(&self, request: &BookSlotRequest) -> Result<BookOneResponse> {
        let mut state = self.connection.lock()?;
        state.single_requests.push(request.clone());
        state.check_call(Collaborator::Bookings)?;

        state
            .book(
                &request.student_id,
                &request.subscription_id,
                &request.template_id,
                &request.room_id,
                &request.date,
                request.parent_note.as_deref(),
            )
            .map_err(|reason| anyhow!("{}", reason))?;

        Ok(BookOneResponse {
            message: Some("Slot booked".to_string()),
        })
    }

    async fn book_many(&self, request: &BulkBookingRequest) -> Result<BookManyResponse> {
        let mut state = self.connection.lock()?;
        state.bulk_requests.push(request.clone());
        state.check_call(Collaborator::Bookings)?;

        let mut success_count = 0;
        let mut failed_slots = Vec::new();
        let mut record = |date: &str, result: std::result::Result<(), String>| match result {
            Ok(()) => success_count += 1,
            Err(error) => failed_slots.push(FailedSlotRow {
                date: date.to_string(),
                error,
            }),
        };

        match &request.selection {
            BulkSelection::Slots { slots } => {
                for slot in slots {
                    let result = state.book(
                        &request.student_id,
                        &request.subscription_id,
                        &slot.template_id,
                        &slot.room_id,
                        &slot.date,
                        slot.parent_note.as_deref(),
                    );
                    record(&slot.date, result);
                }
            }
            BulkSelection::Recurring {
                branch_id,
                timeframe_id,
                slot_type_id,
                room_id,
                start_date,
                end_date,
                weekdays,
                parent_note,
            } => {
                let start = WeekdayCalendar::parse_date(start_date)
                    .ok_or_else(|| anyhow!("Invalid start date {}", start_date))?;
                let end = WeekdayCalendar::parse_date(end_date)
                    .ok_or_else(|| anyhow!("Invalid end date {}", end_date))?;
                let weekdays: BTreeSet<WeekdayKey> = weekdays
                    .iter()
                    .filter_map(|w| WeekdayKey::try_from(*w).ok())
                    .collect();

                for date in WeekdayCalendar::dates_in_range(start, end, &weekdays) {
                    let iso = WeekdayCalendar::format_date(date);
                    let result = match state.recurring_template(branch_id, timeframe_id, slot_type_id.as_deref(), date) {
                        Some(template_id) => state.book(
                            &request.student_id,
                            &request.subscription_id,
                            &template_id,
                            room_id,
                            &iso,
                            parent_note.as_deref(),
                        ),
                        None => Err("No slot on this weekday".to_string()),
                    };
                    record(&iso, result);
                }
            }
        }

        let omit_success_count = state.omit_success_count;
        Ok(BookManyResponse {
            message: Some(format!("{} slots booked", success_count)),
            success_count: if omit_success_count { None } else { Some(success_count) },
            failed_slots,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(id: &str, weekday: i64) -> SlotTemplateRow {
        SlotTemplateRow {
            id: id.to_string(),
            branch_id: "B1".to_string(),
            branch_name: None,
            timeframe_id: "TF1".to_string(),
            timeframe_name: None,
            start_time: None,
            end_time: None,
            slot_type_id: None,
            slot_type_name: None,
            weekday,
            status: Some("available".to_string()),
            subscription_id: None,
            rooms: vec![],
        }
    }

    #[tokio::test]
    async fn test_slot_pages() {
        let connection = InMemoryConnection::new();
        connection.seed_slots((0..5).map(|i| slot(&format!("T{}", i), 1))).unwrap();
        let repository = connection.create_slot_repository();

        let first = repository.list_available_slots("ST1", 1, 2, None).await.unwrap();
        assert_eq!(first.items.len(), 2);
        assert!(first.has_next_page);
        let last = repository.list_available_slots("ST1", 3, 2, None).await.unwrap();
        assert_eq!(last.items.len(), 1);
        assert!(!last.has_next_page);
        assert_eq!(connection.slot_page_requests().unwrap(), vec![1, 3]);
    }

    #[tokio::test]
    async fn test_book_one_refuses_duplicates() {
        let connection = InMemoryConnection::new();
        let repository = connection.create_booking_repository();
        let request = BookSlotRequest {
            student_id: "ST1".to_string(),
            subscription_id: "S1".to_string(),
            template_id: "T1".to_string(),
            room_id: "R1".to_string(),
            date: "2024-06-03".to_string(),
            parent_note: None,
        };

        repository.book_one(&request).await.unwrap();
        let err = repository.book_one(&request).await.unwrap_err();
        assert_eq!(err.to_string(), "Slot already booked");
        assert_eq!(connection.reservations().unwrap().len(), 1);
        assert_eq!(connection.booking_call_count().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_recurring_request_is_expanded() {
        let connection = InMemoryConnection::new();
        connection.seed_slots(vec![slot("T-mon", 1), slot("T-wed", 3)]).unwrap();
        connection.fail_date("2024-06-12", "Holiday").unwrap();
        let request = BulkBookingRequest {
            student_id: "ST1".to_string(),
            subscription_id: "S1".to_string(),
            selection: BulkSelection::Recurring {
                branch_id: "B1".to_string(),
                timeframe_id: "TF1".to_string(),
                slot_type_id: None,
                room_id: "R1".to_string(),
                start_date: "2024-06-03".to_string(),
                end_date: "2024-06-16".to_string(),
                weekdays: vec![1, 3],
                parent_note: None,
            },
        };

        let response = connection.create_booking_repository().book_many(&request).await.unwrap();
        assert_eq!(response.success_count, Some(3));
        assert_eq!(
            response.failed_slots,
            vec![FailedSlotRow {
                date: "2024-06-12".to_string(),
                error: "Holiday".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_call_failures_and_upcoming_filter() {
        let connection = InMemoryConnection::new();
        connection.set_today(NaiveDate::from_ymd_opt(2024, 6, 5).unwrap()).unwrap();
        for (id, date) in [("old", "2024-06-03"), ("new", "2024-06-10T09:00:00Z")] {
            connection
                .seed_reservation(ReservationRow {
                    id: id.to_string(),
                    template_id: "T1".to_string(),
                    student_id: "ST1".to_string(),
                    date: date.to_string(),
                    status: "booked".to_string(),
                    room_id: None,
                    parent_note: None,
                })
                .unwrap();
        }
        let repository = connection.create_reservation_repository();

        assert_eq!(repository.list_reservations("ST1", false).await.unwrap().items.len(), 2);
        let upcoming = repository.list_reservations("ST1", true).await.unwrap();
        assert_eq!(upcoming.items.len(), 1);
        assert_eq!(upcoming.items[0].id, "new");

        connection.fail_calls(Collaborator::Reservations, "Service unavailable").unwrap();
        let err = repository.list_reservations("ST1", false).await.unwrap_err();
        assert_eq!(err.to_string(), "Service unavailable");
    }
}
