//! Domain models for recurring slot templates and their concrete occurrences.
use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::weekday::WeekdayKey;
use crate::backend::domain::errors::ValidationError;

/// A room that can be booked for a slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomOption {
    pub room_id: String,
    pub room_name: Option<String>,
    pub facility_name: Option<String>,
    /// Assigned staff, when the backend could tell us
    pub staff_name: Option<String>,
}

impl RoomOption {
    /// Name to show for the room, falling back to its id
    pub fn display_name(&self) -> &str {
        self.room_name.as_deref().unwrap_or(&self.room_id)
    }
}

/// A branch's recurring weekly slot, as fetched for one student.
///
/// Templates are read-only snapshots; the core never mutates them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotTemplate {
    pub id: String,
    pub branch_id: String,
    pub branch_name: Option<String>,
    pub timeframe_id: String,
    pub timeframe_name: Option<String>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub slot_type_id: Option<String>,
    pub slot_type_name: Option<String>,
    pub weekday: WeekdayKey,
    /// Subscription pinned to this slot by the backend
    pub subscription_id: Option<String>,
    pub rooms: Vec<RoomOption>,
}

impl SlotTemplate {
    /// Minutes since midnight of the start time, used for display ordering
    pub fn start_minutes(&self) -> Option<u32> {
        self.start_time.map(|t| t.hour() * 60 + t.minute())
    }

    pub fn has_room(&self, room_id: &str) -> bool {
        self.rooms.iter().any(|r| r.room_id == room_id)
    }

    pub fn occurs_on(&self, date: NaiveDate) -> bool {
        WeekdayKey::from_date(date) == self.weekday
    }
}

/// Identity of a reservable unit: one template on one date
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OccurrenceKey {
    pub template_id: String,
    pub date: NaiveDate,
}

impl OccurrenceKey {
    pub fn new(template_id: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            template_id: template_id.into(),
            date,
        }
    }

    /// Human-readable label used in error messages
    pub fn label(&self) -> String {
        format!("slot {} on {}", self.template_id, self.date.format("%Y-%m-%d"))
    }
}

/// A template projected onto a concrete calendar date.
///
/// Construction checks that the date falls on the template's weekday, so an
/// occurrence in hand always satisfies that invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotOccurrence {
    template: SlotTemplate,
    date: NaiveDate,
}

impl SlotOccurrence {
    pub fn new(template: SlotTemplate, date: NaiveDate) -> Result<Self, ValidationError> {
        if !template.occurs_on(date) {
            return Err(ValidationError::WeekdayMismatch {
                template_id: template.id.clone(),
                expected: template.weekday,
                date,
            });
        }
        Ok(Self { template, date })
    }

    pub fn template(&self) -> &SlotTemplate {
        &self.template
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn key(&self) -> OccurrenceKey {
        OccurrenceKey::new(self.template.id.clone(), self.date)
    }
}

/// Templates sharing a branch and timeframe, collapsed for the recurring workflow.
///
/// The first template seen supplies the group's branch, timeframe and room
/// metadata. `members` keeps the first template seen for each weekday.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupedSlot {
    representative: SlotTemplate,
    members: BTreeMap<WeekdayKey, SlotTemplate>,
}

impl GroupedSlot {
    pub fn new(first: SlotTemplate) -> Self {
        let mut members = BTreeMap::new();
        members.insert(first.weekday, first.clone());
        Self {
            representative: first,
            members,
        }
    }

    /// Add another template of the same branch/timeframe; returns false if its
    /// weekday was already covered by an earlier template
    pub fn absorb(&mut self, template: SlotTemplate) -> bool {
        if self.members.contains_key(&template.weekday) {
            return false;
        }
        self.members.insert(template.weekday, template);
        true
    }

    pub fn group_key(&self) -> (&str, &str) {
        (&self.representative.branch_id, &self.representative.timeframe_id)
    }

    pub fn representative(&self) -> &SlotTemplate {
        &self.representative
    }

    pub fn branch_id(&self) -> &str {
        &self.representative.branch_id
    }

    pub fn timeframe_id(&self) -> &str {
        &self.representative.timeframe_id
    }

    pub fn rooms(&self) -> &[RoomOption] {
        &self.representative.rooms
    }

    /// Every weekday on which this timeframe recurs
    pub fn weekdays(&self) -> BTreeSet<WeekdayKey> {
        self.members.keys().copied().collect()
    }

    pub fn template_for(&self, weekday: WeekdayKey) -> Option<&SlotTemplate> {
        self.members.get(&weekday)
    }

    pub fn members(&self) -> impl Iterator<Item = &SlotTemplate> {
        self.members.values()
    }
}
