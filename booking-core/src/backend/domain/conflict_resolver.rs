//! Occurrence classification for the booking core.
//!
//! Combines the reservation ledger, the caller's room choice and package
//! eligibility into one state per occurrence. States are checked in a fixed
//! priority order and the first match wins:
//!
//! 1. `AlreadyBooked`: an active reservation exists
//! 2. `Reopened`: only a cancelled reservation exists
//! 3. `NoRoomsAvailable` / `NoRoomChosen`
//! 4. `Ineligible`: no subscription pays for it
//! 5. `Free`
//!
//! A reopened occurrence still needs a room and a subscription before it can
//! be booked; those checks are carried as its blocker.
//!
//! Classifications are computed on demand from borrowed state and are never
//! stored, so they always reflect the latest ledger and room choices.

use crate::backend::domain::eligibility::EligibilityResolver;
use crate::backend::domain::errors::{BookingError, BookingResult, ConflictError, ValidationError};
use crate::backend::domain::models::slot::SlotOccurrence;
use crate::backend::domain::reservation_ledger::ReservationLedger;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotState {
    AlreadyBooked { reservation_id: String },
    /// Booking it creates a new reservation; the cancelled one stays as is
    Reopened { cancelled_reservation_id: String },
    NoRoomChosen,
    NoRoomsAvailable,
    Ineligible,
    Free,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub state: SlotState,
    /// Subscription that would pay for the booking
    pub subscription_id: Option<String>,
    /// For a reopened occurrence, the room or eligibility problem still in the way
    pub reopened_blocker: Option<SlotState>,
}

impl Classification {
    pub fn is_bookable(&self) -> bool {
        match self.state {
            SlotState::Free => true,
            SlotState::Reopened { .. } => self.reopened_blocker.is_none(),
            _ => false,
        }
    }
}

pub struct ConflictResolver<'a> {
    ledger: &'a ReservationLedger,
    eligibility: &'a EligibilityResolver,
    student_id: &'a str,
}

impl<'a> ConflictResolver<'a> {
    pub fn new(ledger: &'a ReservationLedger, eligibility: &'a EligibilityResolver, student_id: &'a str) -> Self {
        Self {
            ledger,
            eligibility,
            student_id,
        }
    }

    pub fn classify(&self, occurrence: &SlotOccurrence, room_id: Option<&str>) -> Classification {
        let template = occurrence.template();
        let subscription_id = self.eligibility.resolve(template, None);

        let existing = self.ledger.find(&template.id, occurrence.date(), self.student_id);
        if let Some(reservation) = existing.filter(|r| r.is_active()) {
            return Classification {
                state: SlotState::AlreadyBooked {
                    reservation_id: reservation.id.clone(),
                },
                subscription_id,
                reopened_blocker: None,
            };
        }

        let blocker = if template.rooms.is_empty() {
            Some(SlotState::NoRoomsAvailable)
        } else if !room_id.map(|id| template.has_room(id)).unwrap_or(false) {
            Some(SlotState::NoRoomChosen)
        } else if subscription_id.is_none() {
            Some(SlotState::Ineligible)
        } else {
            None
        };

        match existing {
            Some(cancelled) => Classification {
                state: SlotState::Reopened {
                    cancelled_reservation_id: cancelled.id.clone(),
                },
                subscription_id,
                reopened_blocker: blocker,
            },
            None => Classification {
                state: blocker.unwrap_or(SlotState::Free),
                subscription_id,
                reopened_blocker: None,
            },
        }
    }

    /// The subscription that pays for the occurrence, or the reason it
    /// cannot be booked
    pub fn ensure_bookable(&self, occurrence: &SlotOccurrence, room_id: Option<&str>) -> BookingResult<String> {
        let classification = self.classify(occurrence, room_id);
        let slot = occurrence.key().label();

        let blocking = match (&classification.state, &classification.reopened_blocker) {
            (SlotState::Reopened { .. }, Some(blocker)) => blocker.clone(),
            (state, _) => state.clone(),
        };

        match blocking {
            SlotState::Free | SlotState::Reopened { .. } => classification
                .subscription_id
                .ok_or(BookingError::Conflict(ConflictError::Ineligible { slot })),
            SlotState::AlreadyBooked { reservation_id } => {
                Err(ConflictError::AlreadyBooked { slot, reservation_id }.into())
            }
            SlotState::NoRoomChosen => Err(ValidationError::NoRoomChosen { slot }.into()),
            SlotState::NoRoomsAvailable => Err(ConflictError::NoRoomsAvailable { slot }.into()),
            SlotState::Ineligible => Err(ConflictError::Ineligible { slot }.into()),
        }
    }
}
