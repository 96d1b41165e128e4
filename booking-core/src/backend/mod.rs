//! # Backend Module
//!
//! Contains all non-UI logic of the booking core.
//!
//! This module brings together:
//! - **Domain**: Scheduling, conflict and booking rules
//! - **Storage**: Access to the remote booking backend (HTTP or in-memory)
//! - **IO**: Mapping between wire rows and domain models
//!
//! ## Architecture
//!
//! ```text
//! UI screens (out of scope)
//!     ↓
//! BookingBackend / BookingOrchestrator
//!     ↓
//! Domain services (catalog, ledger, eligibility, conflicts)
//!     ↓
//! IO mappers
//!     ↓
//! Storage (REST client or in-memory backend)
//! ```

pub mod domain;
pub mod io;
pub mod storage;

use log::info;
use std::sync::Arc;

use crate::backend::domain::errors::{BookingError, BookingResult, ValidationError};
use crate::backend::domain::models::reservation::Reservation;
use crate::backend::domain::{BookingOrchestrator, ReservationLedger, WeekdayCalendar};
use crate::backend::storage::Connection;
use crate::config::BookingConfig;

#[cfg(feature = "rest-client")]
use crate::backend::storage::RestConnection;

/// A configured connection that booking sessions are opened from
#[derive(Clone)]
pub struct BookingBackend<C: Connection> {
    connection: Arc<C>,
    config: BookingConfig,
}

impl<C: Connection> BookingBackend<C> {
    pub fn new(connection: C, config: BookingConfig) -> Result<Self, ValidationError> {
        config.validate()?;
        Ok(Self {
            connection: Arc::new(connection),
            config,
        })
    }

    pub fn config(&self) -> &BookingConfig {
        &self.config
    }

    pub fn connection(&self) -> &C {
        &self.connection
    }

    /// Start a booking session for one student and load its data
    pub async fn open_session(
        &self,
        student_id: &str,
        calendar: WeekdayCalendar,
    ) -> BookingResult<BookingOrchestrator<C>> {
        info!("Opening booking session for student {}", student_id);
        BookingOrchestrator::open(Arc::clone(&self.connection), self.config.clone(), student_id, calendar).await
    }

    /// Today-onward reservations for dashboards
    pub async fn upcoming_reservations(&self, student_id: &str) -> BookingResult<Vec<Reservation>> {
        if student_id.trim().is_empty() {
            return Err(ValidationError::MissingStudent.into());
        }
        let repository = self.connection.create_reservation_repository();
        ReservationLedger::fetch_upcoming(&repository, student_id)
            .await
            .map_err(|e| BookingError::remote(&e, &self.config.generic_error_message))
    }
}

/// Set up a backend talking to the HTTP booking API
#[cfg(feature = "rest-client")]
pub fn initialize_rest_backend(config: BookingConfig) -> anyhow::Result<BookingBackend<RestConnection>> {
    info!("Setting up REST connection to {}", config.base_url());
    let connection = RestConnection::new(&config)?;
    Ok(BookingBackend::new(connection, config)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::storage::InMemoryConnection;
    use chrono::NaiveDate;
    use shared::ReservationRow;

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = BookingConfig {
            slot_page_size: 0,
            ..Default::default()
        };
        assert!(BookingBackend::new(InMemoryConnection::new(), config).is_err());
    }

    #[tokio::test]
    async fn test_open_session_requires_student() {
        let backend = BookingBackend::new(InMemoryConnection::new(), BookingConfig::default()).unwrap();
        let calendar = WeekdayCalendar::new(NaiveDate::from_ymd_opt(2024, 6, 5).unwrap());

        let err = backend.open_session(" ", calendar).await.err().unwrap();
        assert_eq!(err, BookingError::Validation(ValidationError::MissingStudent));

        let session = backend.open_session("ST1", calendar).await.unwrap();
        assert!(session.is_settled());
    }

    #[tokio::test]
    async fn test_upcoming_reservations() {
        let connection = InMemoryConnection::new();
        connection.set_today(NaiveDate::from_ymd_opt(2024, 6, 5).unwrap()).unwrap();
        connection
            .seed_reservation(ReservationRow {
                id: "R1".to_string(),
                template_id: "T1".to_string(),
                student_id: "ST1".to_string(),
                date: "2024-06-10".to_string(),
                status: "booked".to_string(),
                room_id: None,
                parent_note: None,
            })
            .unwrap();
        let backend = BookingBackend::new(connection, BookingConfig::default()).unwrap();

        let upcoming = backend.upcoming_reservations("ST1").await.unwrap();
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].id, "R1");
    }
}
