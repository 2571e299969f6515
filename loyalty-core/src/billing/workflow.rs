//! Subscription overview and plan change workflows

use serde::Serialize;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{PaymentRecord, Plan, Subscription};

use super::plan_change::{PlanChangePreview, apply_plan_change, preview_plan_change};
use super::usage::{Usage, compute_usage};
use crate::store::{PlanCatalog, StoreError, SubscriptionStore};

/// Subscription together with its derived usage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubscriptionView {
    #[serde(flatten)]
    pub subscription: Subscription,
    pub usage: Usage,
}

impl From<Subscription> for SubscriptionView {
    fn from(subscription: Subscription) -> Self {
        let usage = compute_usage(&subscription.plan, subscription.current_profile_count);
        Self {
            subscription,
            usage,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionOverview {
    pub plans: Vec<Plan>,
    pub subscription: Option<SubscriptionView>,
    pub payments: Vec<PaymentRecord>,
}

/// Everything the subscription page shows
pub async fn subscription_overview<S>(store: &S, merchant_id: &str) -> AppResult<SubscriptionOverview>
where
    S: PlanCatalog + SubscriptionStore + ?Sized,
{
    let plans = store.list_active_plans().await?;
    let subscription = store
        .find_subscription(merchant_id)
        .await?
        .map(SubscriptionView::from);
    let payments = store.list_payments(merchant_id).await?;

    Ok(SubscriptionOverview {
        plans,
        subscription,
        payments,
    })
}

async fn load_change_context<S>(
    store: &S,
    merchant_id: &str,
    plan_id: &str,
) -> AppResult<(Subscription, Plan)>
where
    S: PlanCatalog + SubscriptionStore + ?Sized,
{
    if plan_id.trim().is_empty() {
        return Err(AppError::required("plan_id"));
    }

    let plan = store
        .find_plan(plan_id)
        .await?
        .filter(|p| p.is_active)
        .ok_or_else(|| AppError::new(ErrorCode::PlanNotFound).with_detail("plan_id", plan_id))?;

    let subscription = store
        .find_subscription(merchant_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::SubscriptionNotFound))?;

    Ok((subscription, plan))
}

/// Preview a plan change for the merchant's subscription
pub async fn preview_change<S>(store: &S, merchant_id: &str, plan_id: &str) -> AppResult<PlanChangePreview>
where
    S: PlanCatalog + SubscriptionStore + ?Sized,
{
    let (subscription, plan) = load_change_context(store, merchant_id, plan_id).await?;
    Ok(preview_plan_change(&subscription, &plan)?)
}

/// Move the merchant's subscription onto `plan_id`
///
/// The write is conditional on the subscription still being on the plan it
/// was read with; the store re-checks the cancelled and already-on-plan
/// guards at commit time.
pub async fn change_plan<S>(
    store: &S,
    merchant_id: &str,
    plan_id: &str,
    now: i64,
) -> AppResult<SubscriptionView>
where
    S: PlanCatalog + SubscriptionStore + ?Sized,
{
    let (subscription, plan) = load_change_context(store, merchant_id, plan_id).await?;

    let updated = apply_plan_change(&subscription, &plan, now).map_err(|e| {
        tracing::warn!(merchant_id = %merchant_id, plan_id = %plan_id, %e, "Plan change rejected");
        AppError::from(e)
    })?;

    let committed = store
        .commit_plan_change(&updated, &subscription.plan.id)
        .await
        .map_err(|e| {
            if matches!(e, StoreError::PlanConflict { .. } | StoreError::Rejected(_)) {
                tracing::warn!(merchant_id = %merchant_id, plan_id = %plan_id, %e, "Plan change lost a race");
            }
            AppError::from(e)
        })?;

    tracing::info!(
        merchant_id = %merchant_id,
        from_plan = %subscription.plan.id,
        to_plan = %committed.plan.id,
        profiles = committed.current_profile_count,
        "Subscription plan changed"
    );

    Ok(SubscriptionView::from(committed))
}
