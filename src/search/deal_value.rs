//! Deal value scoring.
//!
//! A contact's deal value is derived from its base potential, its pipeline stage,
//! the interactions and deals recorded against it, and how long ago it was last
//! contacted. It is never stored; see `services::CachedDealValueService` for the
//! memoized wrapper.
//!
//! The steps are applied in a fixed order and only the final result is rounded:
//!
//! 1. start from the base potential value (0 when absent)
//! 2. multiply by the **sum** of the interaction multipliers
//! 3. multiply by the stage multiplier
//! 4. add every deal's estimated value
//! 5. decay by 1% per day beyond 30 days since last contact
//! 6. round to 2 decimal places, half to even

use crate::models::{Contact, Deal, DealStage, Interaction, InteractionType};
use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};

/// Days after last contact before decay starts.
pub const DECAY_GRACE_DAYS: i64 = 30;

/// Multiplier applied per day beyond the grace period.
pub fn daily_decay() -> Decimal {
    Decimal::new(99, 2)
}

/// Weight of a single interaction.
pub fn interaction_multiplier(kind: InteractionType) -> Decimal {
    match kind {
        InteractionType::Email => Decimal::new(101, 2),
        InteractionType::Call => Decimal::new(105, 2),
        InteractionType::Meeting => Decimal::new(115, 2),
        InteractionType::Demo => Decimal::new(125, 2),
        InteractionType::Other => Decimal::ONE,
    }
}

/// Weight of the pipeline stage. Contacts without a stage get 0.1.
pub fn stage_multiplier(stage: Option<DealStage>) -> Decimal {
    match stage {
        Some(DealStage::Prospect) => Decimal::new(3, 1),
        Some(DealStage::Qualified) => Decimal::new(6, 1),
        Some(DealStage::Proposal) => Decimal::new(8, 1),
        Some(DealStage::Negotiation) => Decimal::new(9, 1),
        Some(DealStage::ClosedWon) => Decimal::ONE,
        Some(DealStage::ClosedLost) => Decimal::ZERO,
        None => Decimal::new(1, 1),
    }
}

/// Sum of interaction multipliers. Two emails give 2.02, not 1.01².
pub fn interaction_weight(interactions: &[Interaction]) -> Decimal {
    interactions
        .iter()
        .map(|i| interaction_multiplier(i.interaction_type))
        .fold(Decimal::ZERO, |acc, m| acc.saturating_add(m))
}

/// Whole days between the last contact and `now`, truncated.
pub fn days_since_contact(contact: &Contact, now: DateTime<Utc>) -> i64 {
    (now - contact.last_contact_date).num_days()
}

/// Compute a contact's deal value as of `now`.
///
/// Deterministic for fixed inputs and a fixed `now`. The result is never negative.
/// Arithmetic saturates, so values past the `Decimal` range pin to `Decimal::MAX`.
pub fn compute_deal_value(
    contact: &Contact,
    interactions: &[Interaction],
    deals: &[Deal],
    now: DateTime<Utc>,
) -> Decimal {
    let deal_sum = deals
        .iter()
        .map(|d| d.estimated_value.unwrap_or(Decimal::ZERO))
        .fold(Decimal::ZERO, |acc, v| acc.saturating_add(v));

    let mut value = contact
        .base_potential_value
        .unwrap_or(Decimal::ZERO)
        .saturating_mul(interaction_weight(interactions))
        .saturating_mul(stage_multiplier(contact.deal_stage))
        .saturating_add(deal_sum);

    let days = days_since_contact(contact, now);
    if days > DECAY_GRACE_DAYS {
        let steps = (days - DECAY_GRACE_DAYS) as u64;
        // Underflow past 28 decimal places means the factor is effectively zero.
        let factor = daily_decay().checked_powu(steps).unwrap_or(Decimal::ZERO);
        value = value.saturating_mul(factor);
    }

    value
        .round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
        .max(Decimal::ZERO)
}
