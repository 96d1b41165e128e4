//! Builds booking requests from the selection and recurring plans, and turns
//! booking responses into outcomes.

use shared::{
    BookManyResponse, BookOneResponse, BookSlotRequest, BulkBookingRequest, BulkSelection,
    BulkSlotEntry, FailedSlotRow,
};

use crate::backend::domain::calendar::WeekdayCalendar;
use crate::backend::domain::commands::booking::RecurringBookingPlan;
use crate::backend::domain::models::booking::{BookingOutcome, FailedSlot, SelectionEntry};

/// Mapper between booking commands and the booking sink's payloads.
pub struct BookingMapper;

impl BookingMapper {
    pub fn to_single_request(student_id: &str, subscription_id: &str, entry: &SelectionEntry) -> BookSlotRequest {
        BookSlotRequest {
            student_id: student_id.to_string(),
            subscription_id: subscription_id.to_string(),
            template_id: entry.occurrence.template().id.clone(),
            room_id: entry.room_id.clone(),
            date: WeekdayCalendar::format_date(entry.occurrence.date()),
            parent_note: entry.parent_note.clone(),
        }
    }

    pub fn to_slots_request<'a>(
        student_id: &str,
        subscription_id: &str,
        entries: impl IntoIterator<Item = &'a SelectionEntry>,
    ) -> BulkBookingRequest {
        let slots = entries
            .into_iter()
            .map(|entry| BulkSlotEntry {
                template_id: entry.occurrence.template().id.clone(),
                room_id: entry.room_id.clone(),
                date: WeekdayCalendar::format_date(entry.occurrence.date()),
                parent_note: entry.parent_note.clone(),
            })
            .collect();

        BulkBookingRequest {
            student_id: student_id.to_string(),
            subscription_id: subscription_id.to_string(),
            selection: BulkSelection::Slots { slots },
        }
    }

    /// Range plus weekdays; the server expands the dates
    pub fn to_recurring_request(student_id: &str, plan: &RecurringBookingPlan) -> BulkBookingRequest {
        BulkBookingRequest {
            student_id: student_id.to_string(),
            subscription_id: plan.subscription_id.clone(),
            selection: BulkSelection::Recurring {
                branch_id: plan.branch_id.clone(),
                timeframe_id: plan.timeframe_id.clone(),
                slot_type_id: plan.slot_type_id.clone(),
                room_id: plan.room_id.clone(),
                start_date: WeekdayCalendar::format_date(plan.start_date),
                end_date: WeekdayCalendar::format_date(plan.end_date),
                weekdays: plan.weekdays.iter().map(|w| w.value()).collect(),
                parent_note: plan.parent_note.clone(),
            },
        }
    }

    pub fn outcome_from_single(response: BookOneResponse) -> BookingOutcome {
        BookingOutcome {
            success_count: 1,
            failed_slots: Vec::new(),
            message: response.message,
        }
    }

    /// `expected` is how many occurrences the request should create; it fills
    /// in the success count when the server leaves it out
    pub fn outcome_from_many(response: BookManyResponse, expected: u32) -> BookingOutcome {
        let failed_slots: Vec<FailedSlot> = response
            .failed_slots
            .into_iter()
            .map(Self::failed_slot_to_domain)
            .collect();
        let success_count = response
            .success_count
            .unwrap_or_else(|| expected.saturating_sub(failed_slots.len() as u32));

        BookingOutcome {
            success_count,
            failed_slots,
            message: response.message,
        }
    }

    pub fn failed_slot_to_domain(row: FailedSlotRow) -> FailedSlot {
        FailedSlot {
            date: row.date,
            error: row.error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::domain::models::booking::BookingOutcomeKind;
    use crate::backend::domain::models::slot::{SlotOccurrence, SlotTemplate};
    use crate::backend::domain::models::weekday::WeekdayKey;
    use chrono::NaiveDate;
    use std::collections::BTreeSet;

    fn entry(date: NaiveDate) -> SelectionEntry {
        let template = SlotTemplate {
            id: "T1".to_string(),
            branch_id: "B1".to_string(),
            branch_name: None,
            timeframe_id: "TF1".to_string(),
            timeframe_name: None,
            start_time: None,
            end_time: None,
            slot_type_id: None,
            slot_type_name: None,
            weekday: WeekdayKey::MONDAY,
            subscription_id: None,
            rooms: vec![],
        };
        SelectionEntry {
            occurrence: SlotOccurrence::new(template, date).unwrap(),
            room_id: "R1".to_string(),
            parent_note: Some("Bring goggles".to_string()),
        }
    }

    #[test]
    fn test_single_request_formats_iso_date() {
        let monday = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        let request = BookingMapper::to_single_request("ST1", "S1", &entry(monday));
        assert_eq!(request.date, "2024-06-03");
        assert_eq!(request.template_id, "T1");
        assert_eq!(request.parent_note.as_deref(), Some("Bring goggles"));
    }

    #[test]
    fn test_recurring_request_carries_range_not_dates() {
        let plan = RecurringBookingPlan {
            branch_id: "B1".to_string(),
            timeframe_id: "TF1".to_string(),
            slot_type_id: None,
            room_id: "R1".to_string(),
            start_date: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 6, 16).unwrap(),
            weekdays: BTreeSet::from([WeekdayKey::WEDNESDAY, WeekdayKey::MONDAY]),
            subscription_id: "S1".to_string(),
            parent_note: None,
            estimate: 4,
        };
        let request = BookingMapper::to_recurring_request("ST1", &plan);
        match request.selection {
            BulkSelection::Recurring { start_date, end_date, weekdays, .. } => {
                assert_eq!(start_date, "2024-06-03");
                assert_eq!(end_date, "2024-06-16");
                assert_eq!(weekdays, vec![1, 3]);
            }
            other => panic!("unexpected selection {:?}", other),
        }
    }

    #[test]
    fn test_outcome_from_many_keeps_reasons_verbatim() {
        let outcome = BookingMapper::outcome_from_many(
            BookManyResponse {
                message: None,
                success_count: Some(3),
                failed_slots: vec![FailedSlotRow {
                    date: "2024-06-10".to_string(),
                    error: "Room full".to_string(),
                }],
            },
            4,
        );
        assert_eq!(outcome.kind(), BookingOutcomeKind::PartialSuccess);
        assert_eq!(outcome.failed_slots[0].error, "Room full");
    }

    #[test]
    fn test_missing_success_count_is_derived() {
        let outcome = BookingMapper::outcome_from_many(
            BookManyResponse {
                message: Some("done".to_string()),
                success_count: None,
                failed_slots: vec![FailedSlotRow {
                    date: "2024-06-10".to_string(),
                    error: "Room full".to_string(),
                }],
            },
            4,
        );
        assert_eq!(outcome.success_count, 3);

        let outcome = BookingMapper::outcome_from_many(BookManyResponse::default(), 0);
        assert_eq!(outcome.success_count, 0);
        assert_eq!(outcome.kind(), BookingOutcomeKind::Success);
    }
}
