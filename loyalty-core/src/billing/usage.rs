//! Profile usage and overage

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use shared::models::{PaymentRecord, PaymentStatus, Plan, Subscription};
use shared::money::Money;

use super::BillingError;

const WARNING_PERCENT: Decimal = Decimal::from_parts(70, 0, 0, false, 0);
const CRITICAL_PERCENT: Decimal = Decimal::from_parts(90, 0, 0, false, 0);

/// Display band for the usage bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageLevel {
    Normal,
    Warning,
    Critical,
}

/// Usage of a plan at a given profile count
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Usage {
    pub current_profiles: u32,
    pub included_profiles: u32,
    pub excess_profiles: u32,
    pub excess_amount: Money,
    /// 0..=100, capped even when over the limit
    pub percent_used: Decimal,
    pub level: UsageLevel,
}

impl Usage {
    pub fn is_over_limit(&self) -> bool {
        self.excess_profiles > 0
    }
}

/// Compute overage for `profile_count` customers on `plan`
pub fn compute_usage(plan: &Plan, profile_count: u32) -> Usage {
    let excess_profiles = profile_count.saturating_sub(plan.included_profiles);
    let excess_amount = plan.excess_profile_fee.times(excess_profiles);

    let percent_used = if plan.included_profiles == 0 {
        if profile_count > 0 {
            Decimal::ONE_HUNDRED
        } else {
            Decimal::ZERO
        }
    } else {
        let raw = Decimal::from(profile_count) / Decimal::from(plan.included_profiles)
            * Decimal::ONE_HUNDRED;
        raw.min(Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    };

    let level = if excess_profiles > 0 || percent_used > CRITICAL_PERCENT {
        UsageLevel::Critical
    } else if percent_used > WARNING_PERCENT {
        UsageLevel::Warning
    } else {
        UsageLevel::Normal
    };

    Usage {
        current_profiles: profile_count,
        included_profiles: plan.included_profiles,
        excess_profiles,
        excess_amount,
        percent_used,
        level,
    }
}

/// Reject plan definitions the engine cannot price
pub fn validate_plan(plan: &Plan) -> Result<(), BillingError> {
    if plan.id.trim().is_empty() {
        return Err(BillingError::InvalidPlan("plan id is empty".into()));
    }
    if !plan.monthly_price.is_positive() {
        return Err(BillingError::InvalidPlan(format!(
            "monthly price must be positive, got {}",
            plan.monthly_price
        )));
    }
    if plan.included_profiles == 0 {
        return Err(BillingError::InvalidPlan(
            "included profile limit must be positive".into(),
        ));
    }
    if plan.excess_profile_fee.is_negative() {
        return Err(BillingError::InvalidPlan(format!(
            "excess profile fee cannot be negative, got {}",
            plan.excess_profile_fee
        )));
    }
    Ok(())
}

/// Amounts billed for one cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InvoiceAmounts {
    pub base: Money,
    pub excess: Money,
    pub total: Money,
}

pub fn invoice_amounts(plan: &Plan, profile_count: u32) -> InvoiceAmounts {
    let excess = compute_usage(plan, profile_count).excess_amount;
    InvoiceAmounts {
        base: plan.monthly_price,
        excess,
        total: plan.monthly_price + excess,
    }
}

/// Re-derive usage from the subscription's plan and profile count, and
/// rewrite the amounts of its pending payment records to match
///
/// Persistence implementations call this after every write that changes
/// the plan or the profile count. Paid, failed and refunded records keep
/// their snapshots.
pub fn recompute_subscription_usage<'a>(
    subscription: &Subscription,
    payments: impl IntoIterator<Item = &'a mut PaymentRecord>,
) -> Usage {
    let usage = compute_usage(&subscription.plan, subscription.current_profile_count);
    for record in payments {
        if record.subscription_id == subscription.id && record.status == PaymentStatus::Pending {
            record.base_amount = subscription.plan.monthly_price;
            record.excess_amount = usage.excess_amount;
        }
    }
    usage
}
