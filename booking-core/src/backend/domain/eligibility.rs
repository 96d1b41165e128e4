//! Package eligibility for the booking core.
//!
//! Decides which subscription pays for a booking. A subscription pinned on
//! the slot wins unless the student holds it in a non-active state. Otherwise the caller's choice applies when it is active,
//! then the student's only active subscription. Nothing else is guessed.
//!
//! Batches must resolve to one subscription; the check lives here only.

use log::debug;

use crate::backend::domain::errors::ConflictError;
use crate::backend::domain::models::booking::SelectionEntry;
use crate::backend::domain::models::slot::{GroupedSlot, OccurrenceKey, SlotTemplate};
use crate::backend::domain::models::subscription::Subscription;
use crate::backend::domain::models::weekday::WeekdayKey;

/// Outcome of resolving a whole selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEligibility {
    pub subscription_id: String,
    /// Entries no subscription covers
    pub invalid: Vec<OccurrenceKey>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EligibilityResolver {
    active: Vec<Subscription>,
    /// Ids the student holds that are not ACTIVE
    inactive_ids: Vec<String>,
    default_subscription_id: Option<String>,
}

impl EligibilityResolver {
    pub fn new(subscriptions: &[Subscription], selected: Option<&str>) -> Self {
        let (active, inactive): (Vec<Subscription>, Vec<Subscription>) =
            subscriptions.iter().cloned().partition(|s| s.is_active());
        let inactive_ids = inactive.into_iter().map(|s| s.id).collect();

        let default_subscription_id = match selected {
            Some(id) if active.iter().any(|s| s.id == id) => Some(id.to_string()),
            _ if active.len() == 1 => Some(active[0].id.clone()),
            _ => None,
        };
        debug!(
            "{} active subscriptions, default {:?}",
            active.len(),
            default_subscription_id
        );

        Self {
            active,
            inactive_ids,
            default_subscription_id,
        }
    }

    pub fn active_subscriptions(&self) -> &[Subscription] {
        &self.active
    }

    pub fn default_subscription_id(&self) -> Option<&str> {
        self.default_subscription_id.as_deref()
    }

    pub fn is_active(&self, subscription_id: &str) -> bool {
        self.active.iter().any(|s| s.id == subscription_id)
    }

    /// Subscription paying for `template`, if any.
    ///
    /// A pinned id the student holds as expired, paused and so on resolves
    /// to nothing. A pinned id missing from the student's list passes
    /// through; the backend owns that check. `override_id` is a caller
    /// choice for this booking only; it is ignored unless active.
    pub fn resolve(&self, template: &SlotTemplate, override_id: Option<&str>) -> Option<String> {
        if let Some(pinned) = template.subscription_id.as_deref() {
            if self.inactive_ids.iter().any(|id| id == pinned) {
                debug!("Slot {} is pinned to inactive subscription {}", template.id, pinned);
                return None;
            }
            return Some(pinned.to_string());
        }
        if let Some(id) = override_id.filter(|id| self.is_active(id)) {
            return Some(id.to_string());
        }
        self.default_subscription_id.clone()
    }

    /// Resolve each entry and require one shared subscription
    pub fn resolve_batch<'a>(
        &self,
        entries: impl IntoIterator<Item = &'a SelectionEntry>,
    ) -> Result<BatchEligibility, ConflictError> {
        let mut invalid = Vec::new();
        let mut resolved = Vec::new();

        for entry in entries {
            match self.resolve(entry.occurrence.template(), None) {
                Some(id) => resolved.push(id),
                None => invalid.push(entry.key()),
            }
        }

        let subscription_id = Self::single_subscription(resolved).ok_or_else(|| ConflictError::Ineligible {
            slot: invalid
                .first()
                .map(OccurrenceKey::label)
                .unwrap_or_else(|| "the selection".to_string()),
        })??;

        Ok(BatchEligibility {
            subscription_id,
            invalid,
        })
    }

    /// Subscription for a recurring request over the chosen weekdays of a group
    pub fn resolve_group(
        &self,
        group: &GroupedSlot,
        weekdays: impl IntoIterator<Item = WeekdayKey>,
    ) -> Result<String, ConflictError> {
        let ineligible = || ConflictError::Ineligible {
            slot: group_label(group),
        };

        let mut resolved = Vec::new();
        for weekday in weekdays {
            let template = group.template_for(weekday).unwrap_or(group.representative());
            resolved.push(self.resolve(template, None).ok_or_else(ineligible)?);
        }
        Self::single_subscription(resolved).ok_or_else(ineligible)?
    }

    /// None when nothing resolved; a conflict when more than one id did
    fn single_subscription(resolved: Vec<String>) -> Option<Result<String, ConflictError>> {
        let mut distinct: Vec<String> = Vec::new();
        for id in resolved {
            if !distinct.contains(&id) {
                distinct.push(id);
            }
        }
        match distinct.len() {
            0 => None,
            1 => distinct.pop().map(Ok),
            _ => Some(Err(ConflictError::MixedSubscriptions {
                subscription_ids: distinct,
            })),
        }
    }

    /// Sessions left on an active subscription, when known
    pub fn remaining_for(&self, subscription_id: &str) -> Option<u32> {
        self.active
            .iter()
            .find(|s| s.id == subscription_id)
            .and_then(Subscription::remaining)
    }
}

/// Human-readable name of a branch/timeframe group for error messages
pub fn group_label(group: &GroupedSlot) -> String {
    let representative = group.representative();
    format!(
        "timeframe {} at branch {}",
        representative
            .timeframe_name
            .as_deref()
            .unwrap_or(&representative.timeframe_id),
        representative
            .branch_name
            .as_deref()
            .unwrap_or(&representative.branch_id)
    )
}
