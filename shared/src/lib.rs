//! Wire types exchanged with the activity center booking backend.
//!
//! Everything here mirrors the JSON the backend sends and accepts. Field names
//! are camelCase on the wire; where the backend is known to use several names
//! for the same field, the extra names are listed as serde aliases so the
//! domain layer never has to probe for them.

use serde::{Deserialize, Serialize};

/// A recurring weekly slot row from the slot listing endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotTemplateRow {
    #[serde(alias = "slotId")]
    pub id: String,
    pub branch_id: String,
    #[serde(default)]
    pub branch_name: Option<String>,
    pub timeframe_id: String,
    #[serde(default)]
    pub timeframe_name: Option<String>,
    /// Local wall-clock time, "HH:MM" (seconds tolerated)
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub slot_type_id: Option<String>,
    #[serde(default)]
    pub slot_type_name: Option<String>,
    /// 0 = Sunday, 1 = Monday, ..., 6 = Saturday
    #[serde(alias = "dayOfWeek")]
    pub weekday: i64,
    #[serde(default)]
    pub status: Option<String>,
    /// Subscription pinned to this slot by the backend, if any
    #[serde(default)]
    pub subscription_id: Option<String>,
    #[serde(default)]
    pub rooms: Vec<RoomRow>,
}

/// A bookable room attached to a slot row.
///
/// Room rows come from several backend versions, so most fields have
/// alternates. Resolution order lives in the room mapper.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomRow {
    #[serde(default)]
    pub room_id: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub room_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub facility_name: Option<String>,
    #[serde(default)]
    pub facility: Option<NamedRef>,
    #[serde(default)]
    pub staff_name: Option<String>,
    #[serde(default)]
    pub teacher_name: Option<String>,
    #[serde(default)]
    pub staff: Option<StaffRef>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NamedRef {
    #[serde(default)]
    pub name: Option<String>,
}

/// Staff member assigned to a room
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffRef {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
}

/// One page of the slot listing
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotPage {
    #[serde(default)]
    pub items: Vec<SlotTemplateRow>,
    #[serde(default)]
    pub has_next_page: bool,
}

/// Optional date window for the slot listing (ISO dates, inclusive)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeQuery {
    pub start_date: String,
    pub end_date: String,
}

/// A reservation as stored by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationRow {
    pub id: String,
    #[serde(alias = "slotId")]
    pub template_id: String,
    pub student_id: String,
    /// ISO date or RFC 3339 timestamp; only the date part is meaningful
    pub date: String,
    pub status: String,
    #[serde(default)]
    pub room_id: Option<String>,
    #[serde(default)]
    pub parent_note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReservationListResponse {
    #[serde(default)]
    pub items: Vec<ReservationRow>,
}

/// A purchased package of sessions
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRow {
    pub id: String,
    #[serde(default)]
    pub package_id: Option<String>,
    #[serde(default)]
    pub package_name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub used_slot: Option<u32>,
    #[serde(default)]
    pub remaining_slots: Option<u32>,
    #[serde(default)]
    pub total_slots: Option<u32>,
    #[serde(default)]
    pub total_slots_snapshot: Option<u32>,
}

/// Request for booking a single occurrence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookSlotRequest {
    pub student_id: String,
    pub subscription_id: String,
    pub template_id: String,
    pub room_id: String,
    /// ISO date (YYYY-MM-DD)
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_note: Option<String>,
}

/// One enumerated occurrence inside a batch request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkSlotEntry {
    pub template_id: String,
    pub room_id: String,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_note: Option<String>,
}

/// Request for booking several occurrences against one subscription
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkBookingRequest {
    pub student_id: String,
    pub subscription_id: String,
    #[serde(flatten)]
    pub selection: BulkSelection,
}

/// How the occurrences of a batch are described
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum BulkSelection {
    /// Individually chosen occurrences
    #[serde(rename_all = "camelCase")]
    Slots { slots: Vec<BulkSlotEntry> },
    /// A date range plus weekday filter; the server expands it
    #[serde(rename_all = "camelCase")]
    Recurring {
        branch_id: String,
        timeframe_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        slot_type_id: Option<String>,
        room_id: String,
        start_date: String,
        end_date: String,
        weekdays: Vec<u8>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent_note: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BookOneResponse {
    #[serde(default)]
    pub message: Option<String>,
}

/// Response to a batch booking; failures are per date
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookManyResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub success_count: Option<u32>,
    #[serde(default)]
    pub failed_slots: Vec<FailedSlotRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedSlotRow {
    pub date: String,
    #[serde(alias = "reason", alias = "message")]
    pub error: String,
}

/// Error payload returned by the backend on non-2xx responses
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    /// The most specific human-readable message in the body
    pub fn display_message(&self) -> Option<&str> {
        [self.message.as_deref(), self.error.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|m| !m.is_empty())
    }
}
