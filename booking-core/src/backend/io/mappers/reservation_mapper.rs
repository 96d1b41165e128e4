//! Reservation rows to domain reservations. Only the date part of the row's
//! date is kept.

use anyhow::{anyhow, Result};
use shared::ReservationRow;

use crate::backend::domain::calendar::WeekdayCalendar;
use crate::backend::domain::models::reservation::{Reservation, ReservationStatus};

/// Mapper to convert reservation rows into domain reservations.
pub struct ReservationMapper;

impl ReservationMapper {
    /// Timestamps are truncated to their date part
    pub fn to_domain(row: ReservationRow) -> Result<Reservation> {
        let date = WeekdayCalendar::parse_date(&row.date)
            .ok_or_else(|| anyhow!("Reservation {} has an unreadable date '{}'", row.id, row.date))?;

        Ok(Reservation {
            status: ReservationStatus::parse(&row.status),
            id: row.id,
            template_id: row.template_id,
            student_id: row.student_id,
            date,
            room_id: row.room_id.filter(|r| !r.trim().is_empty()),
            parent_note: row.parent_note,
        })
    }
}
