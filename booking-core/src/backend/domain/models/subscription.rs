//! Domain model for a purchased session package.
use serde::{Deserialize, Serialize};

/// Status string of a bookable subscription after normalisation
pub const ACTIVE_STATUS: &str = "ACTIVE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub package_id: Option<String>,
    pub package_name: Option<String>,
    /// Trimmed and uppercased
    pub status: String,
    pub used_slot: u32,
    pub remaining_slots: Option<u32>,
    pub total_slots: Option<u32>,
    pub total_slots_snapshot: Option<u32>,
}

/// Total number of sessions a subscription entitles the student to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entitlement {
    Known { total: u32, source: &'static str },
    Unknown,
}

impl Entitlement {
    pub fn total(&self) -> Option<u32> {
        match self {
            Entitlement::Known { total, .. } => Some(*total),
            Entitlement::Unknown => None,
        }
    }
}

/// One way of reading the total entitlement off a subscription
#[derive(Clone, Copy)]
pub struct EntitlementStrategy {
    pub name: &'static str,
    pub resolve: fn(&Subscription) -> Option<u32>,
}

/// Tried in order; the first strategy that yields a value wins
pub const ENTITLEMENT_STRATEGIES: [EntitlementStrategy; 4] = [
    EntitlementStrategy {
        name: "remainingSlots",
        resolve: from_remaining_slots,
    },
    EntitlementStrategy {
        name: "totalSlots",
        resolve: from_total_slots,
    },
    EntitlementStrategy {
        name: "totalSlotsSnapshot",
        resolve: from_total_slots_snapshot,
    },
    EntitlementStrategy {
        name: "packageName",
        resolve: from_package_name,
    },
];

fn from_remaining_slots(s: &Subscription) -> Option<u32> {
    s.remaining_slots
}

fn from_total_slots(s: &Subscription) -> Option<u32> {
    s.total_slots
}

fn from_total_slots_snapshot(s: &Subscription) -> Option<u32> {
    s.total_slots_snapshot
}

fn from_package_name(s: &Subscription) -> Option<u32> {
    s.package_name.as_deref().and_then(leading_integer)
}

/// Leading run of digits in a package name, e.g. "12 sessions - Swim" -> 12
pub fn leading_integer(name: &str) -> Option<u32> {
    let digits: String = name
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

impl Subscription {
    pub fn normalize_status(raw: Option<&str>) -> String {
        raw.map(|s| s.trim().to_uppercase()).unwrap_or_default()
    }

    pub fn is_active(&self) -> bool {
        self.status == ACTIVE_STATUS
    }

    pub fn entitlement(&self) -> Entitlement {
        ENTITLEMENT_STRATEGIES
            .iter()
            .find_map(|strategy| {
                (strategy.resolve)(self).map(|total| Entitlement::Known {
                    total,
                    source: strategy.name,
                })
            })
            .unwrap_or(Entitlement::Unknown)
    }

    /// Sessions left to book, when the entitlement is known
    pub fn remaining(&self) -> Option<u32> {
        self.entitlement()
            .total()
            .map(|total| total.saturating_sub(self.used_slot))
    }

    pub fn display_name(&self) -> &str {
        self.package_name.as_deref().unwrap_or(&self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subscription() -> Subscription {
        Subscription {
            id: "SUB1".to_string(),
            package_id: Some("P1".to_string()),
            package_name: Some("10 sessions".to_string()),
            status: ACTIVE_STATUS.to_string(),
            used_slot: 3,
            remaining_slots: None,
            total_slots: None,
            total_slots_snapshot: None,
        }
    }

    #[test]
    fn test_normalize_status() {
        assert_eq!(Subscription::normalize_status(Some(" active ")), "ACTIVE");
        assert_eq!(Subscription::normalize_status(None), "");
    }

    #[test]
    fn test_each_strategy_independently() {
        let mut sub = subscription();
        sub.package_name = None;

        sub.remaining_slots = Some(4);
        assert_eq!((ENTITLEMENT_STRATEGIES[0].resolve)(&sub), Some(4));

        sub.total_slots = Some(8);
        assert_eq!((ENTITLEMENT_STRATEGIES[1].resolve)(&sub), Some(8));

        sub.total_slots_snapshot = Some(12);
        assert_eq!((ENTITLEMENT_STRATEGIES[2].resolve)(&sub), Some(12));

        sub.package_name = Some("20-pack".to_string());
        assert_eq!((ENTITLEMENT_STRATEGIES[3].resolve)(&sub), Some(20));
    }

    #[test]
    fn test_first_non_null_strategy_wins() {
        let mut sub = subscription();
        sub.total_slots = Some(8);
        sub.total_slots_snapshot = Some(12);
        assert_eq!(
            sub.entitlement(),
            Entitlement::Known { total: 8, source: "totalSlots" }
        );

        sub.total_slots = None;
        assert_eq!(sub.entitlement().total(), Some(12));
    }

    #[test]
    fn test_falls_back_to_package_name_then_unknown() {
        let mut sub = subscription();
        assert_eq!(
            sub.entitlement(),
            Entitlement::Known { total: 10, source: "packageName" }
        );
        assert_eq!(sub.remaining(), Some(7));

        sub.package_name = Some("Unlimited swim".to_string());
        assert_eq!(sub.entitlement(), Entitlement::Unknown);
        assert_eq!(sub.remaining(), None);
    }

    #[test]
    fn test_remaining_never_underflows() {
        let mut sub = subscription();
        sub.total_slots = Some(2);
        sub.used_slot = 5;
        assert_eq!(sub.remaining(), Some(0));
    }

    #[test]
    fn test_leading_integer() {
        assert_eq!(leading_integer("  24 sessions"), Some(24));
        assert_eq!(leading_integer("Sessions 24"), None);
        assert_eq!(leading_integer(""), None);
    }
}
