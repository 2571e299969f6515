//! Subscription billing: usage, overage and plan changes

mod plan_change;
mod usage;
mod workflow;

pub use plan_change::{PlanChangePreview, apply_plan_change, preview_plan_change};
pub use usage::{
    InvoiceAmounts, Usage, UsageLevel, compute_usage, invoice_amounts,
    recompute_subscription_usage, validate_plan,
};
pub use workflow::{
    SubscriptionOverview, SubscriptionView, change_plan, preview_change, subscription_overview,
};

use shared::error::{AppError, ErrorCode};
use thiserror::Error;

/// Billing rule violations
///
/// `SubscriptionCancelled` and `AlreadyOnPlan` are the invalid plan
/// transitions.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BillingError {
    #[error("Cannot change plan on a cancelled subscription")]
    SubscriptionCancelled,

    #[error("Plan {0} is already the current plan")]
    AlreadyOnPlan(String),

    #[error("Invalid plan: {0}")]
    InvalidPlan(String),
}

impl BillingError {
    pub fn is_invalid_transition(&self) -> bool {
        matches!(self, Self::SubscriptionCancelled | Self::AlreadyOnPlan(_))
    }
}

impl From<BillingError> for AppError {
    fn from(err: BillingError) -> Self {
        match err {
            BillingError::SubscriptionCancelled => AppError::new(ErrorCode::SubscriptionCancelled),
            BillingError::AlreadyOnPlan(plan_id) => {
                AppError::new(ErrorCode::PlanAlreadyCurrent).with_detail("plan_id", plan_id)
            }
            BillingError::InvalidPlan(msg) => AppError::with_message(ErrorCode::PlanInvalid, msg),
        }
    }
}
