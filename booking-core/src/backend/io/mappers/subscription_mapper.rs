//! Subscription rows to domain subscriptions, with the status normalized.

use shared::SubscriptionRow;

use crate::backend::domain::models::subscription::Subscription;

/// Mapper to convert subscription rows into domain subscriptions.
pub struct SubscriptionMapper;

impl SubscriptionMapper {
    pub fn to_domain(row: SubscriptionRow) -> Subscription {
        Subscription {
            status: Subscription::normalize_status(row.status.as_deref()),
            id: row.id,
            package_id: row.package_id,
            package_name: row.package_name.filter(|n| !n.trim().is_empty()),
            used_slot: row.used_slot.unwrap_or(0),
            remaining_slots: row.remaining_slots,
            total_slots: row.total_slots,
            total_slots_snapshot: row.total_slots_snapshot,
        }
    }
}
