//! Subscription endpoints: overview, plan-change preview and apply

use axum::extract::State;
use axum::{Extension, Json};
use loyalty_core::billing::{self, PlanChangePreview, SubscriptionOverview, SubscriptionView};
use loyalty_core::session::MerchantSession;
use serde::Deserialize;
use shared::util::now_millis;

use super::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PlanChangeRequest {
    pub plan_id: String,
}

/// GET /api/subscription/data
pub async fn subscription_data(
    State(state): State<AppState>,
    Extension(session): Extension<MerchantSession>,
) -> ApiResult<SubscriptionOverview> {
    let overview = billing::subscription_overview(state.store.as_ref(), &session.merchant_id).await?;
    Ok(Json(overview))
}

/// POST /api/subscription/change-plan/preview
pub async fn preview_plan_change(
    State(state): State<AppState>,
    Extension(session): Extension<MerchantSession>,
    Json(req): Json<PlanChangeRequest>,
) -> ApiResult<PlanChangePreview> {
    let preview =
        billing::preview_change(state.store.as_ref(), &session.merchant_id, &req.plan_id).await?;
    Ok(Json(preview))
}

/// POST /api/subscription/change-plan
pub async fn change_plan(
    State(state): State<AppState>,
    Extension(session): Extension<MerchantSession>,
    Json(req): Json<PlanChangeRequest>,
) -> ApiResult<SubscriptionView> {
    let view = billing::change_plan(
        state.store.as_ref(),
        &session.merchant_id,
        &req.plan_id,
        now_millis(),
    )
    .await?;
    Ok(Json(view))
}
