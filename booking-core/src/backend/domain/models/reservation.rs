//! Domain model for a student's reservation of a slot occurrence.
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::slot::OccurrenceKey;

/// Reservation lifecycle as reported by the backend.
///
/// Only `Cancelled` releases the occurrence. Every other status, including
/// ones we do not recognise, keeps it blocked for the student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReservationStatus {
    Booked,
    Cancelled,
    Completed,
    NoShow,
    Rescheduled,
    Other(String),
}

impl ReservationStatus {
    /// Parse a backend status string (case-insensitive)
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let normalized: String = trimmed
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "booked" => ReservationStatus::Booked,
            "cancelled" => ReservationStatus::Cancelled,
            "completed" => ReservationStatus::Completed,
            "noshow" => ReservationStatus::NoShow,
            "rescheduled" => ReservationStatus::Rescheduled,
            _ => ReservationStatus::Other(trimmed.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ReservationStatus::Booked => "booked",
            ReservationStatus::Cancelled => "cancelled",
            ReservationStatus::Completed => "completed",
            ReservationStatus::NoShow => "no_show",
            ReservationStatus::Rescheduled => "rescheduled",
            ReservationStatus::Other(raw) => raw,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ReservationStatus::Cancelled)
    }

    /// Anything that is not cancelled still holds the occurrence
    pub fn is_active(&self) -> bool {
        !self.is_cancelled()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: String,
    pub template_id: String,
    pub student_id: String,
    pub date: NaiveDate,
    pub status: ReservationStatus,
    pub room_id: Option<String>,
    pub parent_note: Option<String>,
}

impl Reservation {
    pub fn key(&self) -> OccurrenceKey {
        OccurrenceKey::new(self.template_id.clone(), self.date)
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    pub fn matches(&self, template_id: &str, date: NaiveDate, student_id: &str) -> bool {
        self.template_id == template_id && self.date == date && self.student_id == student_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status_is_case_insensitive() {
        assert_eq!(ReservationStatus::parse("BOOKED"), ReservationStatus::Booked);
        assert_eq!(ReservationStatus::parse(" Cancelled "), ReservationStatus::Cancelled);
        assert_eq!(ReservationStatus::parse("no_show"), ReservationStatus::NoShow);
        assert_eq!(ReservationStatus::parse("No-Show"), ReservationStatus::NoShow);
        assert_eq!(ReservationStatus::parse("Rescheduled"), ReservationStatus::Rescheduled);
        assert_eq!(
            ReservationStatus::parse("pending_review"),
            ReservationStatus::Other("pending_review".to_string())
        );
    }

    #[test]
    fn test_only_cancelled_releases_the_slot() {
        assert!(!ReservationStatus::Cancelled.is_active());
        assert!(ReservationStatus::Booked.is_active());
        assert!(ReservationStatus::NoShow.is_active());
        assert!(ReservationStatus::Rescheduled.is_active());
        assert!(ReservationStatus::Completed.is_active());
        assert!(ReservationStatus::Other("waitlisted".to_string()).is_active());
        // US spelling is not the backend's cancelled status
        assert!(ReservationStatus::parse("canceled").is_active());
    }
}
