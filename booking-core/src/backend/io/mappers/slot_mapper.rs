//! Slot and room rows to domain templates. Room fields that several backend
//! versions name differently are resolved through ordered accessor lists.

use anyhow::{anyhow, Context, Result};
use chrono::NaiveTime;
use shared::{RoomRow, SlotTemplateRow};

use crate::backend::domain::models::slot::{RoomOption, SlotTemplate};
use crate::backend::domain::models::weekday::WeekdayKey;

/// Reads one optional field of a room row
pub type RoomAccessor = fn(&RoomRow) -> Option<&str>;

/// Where a room's id may live, most specific first
pub const ROOM_ID_ACCESSORS: [RoomAccessor; 2] = [room_id_field, id_field];

pub const ROOM_NAME_ACCESSORS: [RoomAccessor; 2] = [room_name_field, name_field];

pub const FACILITY_NAME_ACCESSORS: [RoomAccessor; 2] = [facility_name_field, nested_facility_name];

pub const STAFF_NAME_ACCESSORS: [RoomAccessor; 5] = [
    nested_staff_full_name,
    nested_staff_name,
    nested_staff_nickname,
    staff_name_field,
    teacher_name_field,
];

fn room_id_field(r: &RoomRow) -> Option<&str> {
    r.room_id.as_deref()
}

fn id_field(r: &RoomRow) -> Option<&str> {
    r.id.as_deref()
}

fn room_name_field(r: &RoomRow) -> Option<&str> {
    r.room_name.as_deref()
}

fn name_field(r: &RoomRow) -> Option<&str> {
    r.name.as_deref()
}

fn facility_name_field(r: &RoomRow) -> Option<&str> {
    r.facility_name.as_deref()
}

fn nested_facility_name(r: &RoomRow) -> Option<&str> {
    r.facility.as_ref().and_then(|f| f.name.as_deref())
}

fn nested_staff_full_name(r: &RoomRow) -> Option<&str> {
    r.staff.as_ref().and_then(|s| s.full_name.as_deref())
}

fn nested_staff_name(r: &RoomRow) -> Option<&str> {
    r.staff.as_ref().and_then(|s| s.name.as_deref())
}

fn nested_staff_nickname(r: &RoomRow) -> Option<&str> {
    r.staff.as_ref().and_then(|s| s.nickname.as_deref())
}

fn staff_name_field(r: &RoomRow) -> Option<&str> {
    r.staff_name.as_deref()
}

fn teacher_name_field(r: &RoomRow) -> Option<&str> {
    r.teacher_name.as_deref()
}

/// First accessor that yields a non-blank value
pub fn first_present(row: &RoomRow, accessors: &[RoomAccessor]) -> Option<String> {
    accessors
        .iter()
        .filter_map(|accessor| accessor(row))
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

/// Mapper to convert slot rows into domain slot templates.
pub struct SlotMapper;

impl SlotMapper {
    /// Only rows whose status is "available" (any case) are bookable
    pub fn is_available(row: &SlotTemplateRow) -> bool {
        row.status
            .as_deref()
            .map(|s| s.trim().eq_ignore_ascii_case("available"))
            .unwrap_or(false)
    }

    pub fn to_domain(row: SlotTemplateRow) -> Result<SlotTemplate> {
        if row.id.trim().is_empty() {
            return Err(anyhow!("Slot row without an id"));
        }
        let weekday = WeekdayKey::try_from(row.weekday)
            .with_context(|| format!("Slot {} has an invalid weekday", row.id))?;

        let rooms = row.rooms.iter().filter_map(Self::room_to_domain).collect();

        Ok(SlotTemplate {
            weekday,
            start_time: row.start_time.as_deref().and_then(Self::parse_time),
            end_time: row.end_time.as_deref().and_then(Self::parse_time),
            id: row.id,
            branch_id: row.branch_id,
            branch_name: non_blank(row.branch_name),
            timeframe_id: row.timeframe_id,
            timeframe_name: non_blank(row.timeframe_name),
            slot_type_id: non_blank(row.slot_type_id),
            slot_type_name: non_blank(row.slot_type_name),
            subscription_id: non_blank(row.subscription_id),
            rooms,
        })
    }

    /// Rooms without any id cannot be booked and are dropped; missing names,
    /// facilities and staff just stay unknown
    pub fn room_to_domain(row: &RoomRow) -> Option<RoomOption> {
        let room_id = first_present(row, &ROOM_ID_ACCESSORS)?;
        Some(RoomOption {
            room_id,
            room_name: first_present(row, &ROOM_NAME_ACCESSORS),
            facility_name: first_present(row, &FACILITY_NAME_ACCESSORS),
            staff_name: first_present(row, &STAFF_NAME_ACCESSORS),
        })
    }

    /// Local "HH:MM" or "HH:MM:SS"
    pub fn parse_time(raw: &str) -> Option<NaiveTime> {
        let raw = raw.trim();
        NaiveTime::parse_from_str(raw, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
            .ok()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
