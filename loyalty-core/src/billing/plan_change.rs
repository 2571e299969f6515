//! Plan change preview and application

use serde::Serialize;
use shared::models::{Plan, Subscription, SubscriptionStatus};
use shared::money::Money;

use super::BillingError;
use super::usage::{Usage, compute_usage, validate_plan};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanChangePreview {
    pub current_plan_id: String,
    pub candidate_plan_id: String,
    pub is_upgrade: bool,
    pub projected_excess_profiles: u32,
    pub projected_excess_amount: Money,
    pub current_usage: Usage,
    pub projected_usage: Usage,
    /// Plan price plus projected overage
    pub projected_monthly_total: Money,
}

/// Impact of moving `subscription` onto `candidate`
///
/// Rejects cancelled subscriptions and a candidate that is already the
/// current plan.
pub fn preview_plan_change(
    subscription: &Subscription,
    candidate: &Plan,
) -> Result<PlanChangePreview, BillingError> {
    if subscription.status == SubscriptionStatus::Cancelled {
        return Err(BillingError::SubscriptionCancelled);
    }
    if candidate.id == subscription.plan.id {
        return Err(BillingError::AlreadyOnPlan(candidate.id.clone()));
    }
    validate_plan(candidate)?;

    let count = subscription.current_profile_count;
    let projected_usage = compute_usage(candidate, count);

    Ok(PlanChangePreview {
        current_plan_id: subscription.plan.id.clone(),
        candidate_plan_id: candidate.id.clone(),
        is_upgrade: candidate.monthly_price > subscription.plan.monthly_price,
        projected_excess_profiles: projected_usage.excess_profiles,
        projected_excess_amount: projected_usage.excess_amount,
        current_usage: compute_usage(&subscription.plan, count),
        projected_monthly_total: candidate.monthly_price + projected_usage.excess_amount,
        projected_usage,
    })
}

/// New subscription value on `candidate`
///
/// Only the plan (and `updated_at`) changes. Overage is never carried on the
/// subscription; whoever persists this recomputes it from the new plan.
pub fn apply_plan_change(
    subscription: &Subscription,
    candidate: &Plan,
    now: i64,
) -> Result<Subscription, BillingError> {
    preview_plan_change(subscription, candidate)?;
    Ok(Subscription {
        plan: candidate.clone(),
        updated_at: now,
        ..subscription.clone()
    })
}
