//! # Storage Traits
//!
//! The remote collaborators the booking core talks to. Each trait is the
//! client-side contract against one part of the booking backend; the backend
//! itself (and its wire format details) stays outside the core.
//!
//! Implementations return the raw wire rows from the `shared` crate. Mapping
//! to domain models, filtering and validation happen in the domain layer.

use anyhow::Result;
use async_trait::async_trait;
use shared::{
    BookManyResponse, BookOneResponse, BookSlotRequest, BulkBookingRequest, DateRangeQuery,
    ReservationListResponse, SlotPage, SubscriptionRow,
};

/// Source of the recurring slot templates offered to a student
#[async_trait]
pub trait SlotSource: Send + Sync {
    /// Fetch one page (1-based) of slot rows
    async fn list_available_slots(
        &self,
        student_id: &str,
        page: u32,
        page_size: u32,
        date_range: Option<&DateRangeQuery>,
    ) -> Result<SlotPage>;
}

/// Source of a student's reservations
#[async_trait]
pub trait ReservationSource: Send + Sync {
    /// List reservations; `upcoming_only` limits to today onward
    async fn list_reservations(&self, student_id: &str, upcoming_only: bool) -> Result<ReservationListResponse>;
}

/// Source of a student's purchased packages
#[async_trait]
pub trait SubscriptionSource: Send + Sync {
    async fn list_subscriptions(&self, student_id: &str) -> Result<Vec<SubscriptionRow>>;
}

/// Where booking commits are sent.
///
/// `book_one` fails as a whole. `book_many` may succeed for some dates and
/// report the rest in `failed_slots`.
#[async_trait]
pub trait BookingSink: Send + Sync {
    async fn book_one(&self, request: &BookSlotRequest) -> Result<BookOneResponse>;

    async fn book_many(&self, request: &BulkBookingRequest) -> Result<BookManyResponse>;
}

/// Trait defining the interface for backend connections
///
/// A connection hands out one repository per collaborator, so the domain
/// layer can run against the HTTP backend or the in-memory store without
/// knowing which.
pub trait Connection: Send + Sync + Clone + 'static {
    type SlotRepository: SlotSource + 'static;
    type ReservationRepository: ReservationSource + 'static;
    type SubscriptionRepository: SubscriptionSource + 'static;
    type BookingRepository: BookingSink + 'static;

    fn create_slot_repository(&self) -> Self::SlotRepository;

    fn create_reservation_repository(&self) -> Self::ReservationRepository;

    fn create_subscription_repository(&self) -> Self::SubscriptionRepository;

    fn create_booking_repository(&self) -> Self::BookingRepository;
}
