//! Reservation ledger for the booking core.
//!
//! A snapshot of one student's reservations, used to tell whether an
//! occurrence is free, already taken, or reopened after a cancellation.
//! Conflict checks always look at the full history, never at the
//! "upcoming only" view.

use anyhow::Result;
use chrono::NaiveDate;
use log::{info, warn};
use shared::ReservationListResponse;

use crate::backend::domain::models::reservation::{Reservation, ReservationStatus};
use crate::backend::io::mappers::ReservationMapper;
use crate::backend::storage::ReservationSource;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReservationLedger {
    reservations: Vec<Reservation>,
}

impl ReservationLedger {
    pub fn new(reservations: Vec<Reservation>) -> Self {
        Self { reservations }
    }

    /// Every reservation of the student, cancelled ones included
    pub async fn fetch<S: ReservationSource + ?Sized>(source: &S, student_id: &str) -> Result<Self> {
        let response = source.list_reservations(student_id, false).await?;
        let reservations = Self::map_rows(response);
        info!("Loaded {} reservations for student {}", reservations.len(), student_id);
        Ok(Self { reservations })
    }

    /// Today-onward reservations for dashboards
    pub async fn fetch_upcoming<S: ReservationSource + ?Sized>(
        source: &S,
        student_id: &str,
    ) -> Result<Vec<Reservation>> {
        let response = source.list_reservations(student_id, true).await?;
        Ok(Self::map_rows(response))
    }

    fn map_rows(response: ReservationListResponse) -> Vec<Reservation> {
        response
            .items
            .into_iter()
            .filter_map(|row| match ReservationMapper::to_domain(row) {
                Ok(reservation) => Some(reservation),
                Err(e) => {
                    warn!("Skipping reservation row: {:#}", e);
                    None
                }
            })
            .collect()
    }

    pub fn reservations(&self) -> &[Reservation] {
        &self.reservations
    }

    /// Non-cancelled reservations of the student across all time
    pub fn active_reservations(&self, student_id: &str) -> Vec<&Reservation> {
        self.reservations
            .iter()
            .filter(|r| r.student_id == student_id && r.is_active())
            .collect()
    }

    /// The most relevant reservation for one occurrence.
    ///
    /// Historic data may hold several rows for the same occurrence. A
    /// `Booked` row wins, then any other active row, then a cancelled one.
    pub fn find(&self, template_id: &str, date: NaiveDate, student_id: &str) -> Option<&Reservation> {
        self.reservations
            .iter()
            .filter(|r| r.matches(template_id, date, student_id))
            .min_by_key(|r| match r.status {
                ReservationStatus::Booked => 0,
                ReservationStatus::Cancelled => 2,
                _ => 1,
            })
    }

    /// True when the occurrence was booked and then cancelled, and nothing
    /// active has replaced it
    pub fn is_reopened(&self, template_id: &str, date: NaiveDate, student_id: &str) -> bool {
        self.find(template_id, date, student_id)
            .map(|r| r.status.is_cancelled())
            .unwrap_or(false)
    }
}
