//! Domain models for the booking selection and commit outcomes.
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

use super::slot::{OccurrenceKey, SlotOccurrence};
use crate::backend::domain::calendar::WeekdayCalendar;

/// One occurrence the user has picked, with the room they picked for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionEntry {
    pub occurrence: SlotOccurrence,
    pub room_id: String,
    pub parent_note: Option<String>,
}

impl SelectionEntry {
    pub fn key(&self) -> OccurrenceKey {
        self.occurrence.key()
    }
}

/// Working set of the à la carte workflow, keyed by (template, date).
///
/// Owned by exactly one orchestrator; a key is present at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingSelection {
    entries: BTreeMap<OccurrenceKey, SelectionEntry>,
}

impl BookingSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace; returns true if the key was not selected before
    pub fn insert(&mut self, entry: SelectionEntry) -> bool {
        self.entries.insert(entry.key(), entry).is_none()
    }

    pub fn remove(&mut self, key: &OccurrenceKey) -> Option<SelectionEntry> {
        self.entries.remove(key)
    }

    /// Select if absent, deselect if present; returns whether it is now selected
    pub fn toggle(&mut self, entry: SelectionEntry) -> bool {
        let key = entry.key();
        if self.entries.remove(&key).is_some() {
            false
        } else {
            self.entries.insert(key, entry);
            true
        }
    }

    pub fn contains(&self, key: &OccurrenceKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &OccurrenceKey) -> Option<&SelectionEntry> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &SelectionEntry> {
        self.entries.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = &OccurrenceKey> {
        self.entries.keys()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Keep only entries whose date is in `dates`
    pub fn retain_dates(&mut self, dates: &BTreeSet<NaiveDate>) {
        self.entries.retain(|key, _| dates.contains(&key.date));
    }
}

/// A date the server refused, with its reason verbatim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedSlot {
    pub date: String,
    pub error: String,
}

impl FailedSlot {
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        WeekdayCalendar::parse_date(&self.date)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingOutcomeKind {
    Success,
    /// Some dates booked, some refused; shown as its own state, not an error
    PartialSuccess,
    AllFailed,
    /// The server booked nothing and reported no failures
    NothingBooked,
}

/// Result of a commit call that reached the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingOutcome {
    pub success_count: u32,
    pub failed_slots: Vec<FailedSlot>,
    pub message: Option<String>,
}

impl BookingOutcome {
    pub fn kind(&self) -> BookingOutcomeKind {
        match (self.success_count, self.failed_slots.is_empty()) {
            (0, true) => BookingOutcomeKind::NothingBooked,
            (0, false) => BookingOutcomeKind::AllFailed,
            (_, true) => BookingOutcomeKind::Success,
            (_, false) => BookingOutcomeKind::PartialSuccess,
        }
    }

    pub fn failed_dates(&self) -> BTreeSet<NaiveDate> {
        self.failed_slots
            .iter()
            .filter_map(FailedSlot::parsed_date)
            .collect()
    }
}
