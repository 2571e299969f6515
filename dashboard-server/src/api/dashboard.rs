//! Dashboard statistics

use axum::extract::State;
use axum::{Extension, Json};
use loyalty_core::cashback::{self, DashboardStats};
use loyalty_core::session::MerchantSession;
use shared::util::now_millis;

use super::ApiResult;
use crate::state::AppState;

/// GET /api/dashboard/stats
pub async fn stats(
    State(state): State<AppState>,
    Extension(session): Extension<MerchantSession>,
) -> ApiResult<DashboardStats> {
    let stats =
        cashback::load_dashboard_stats(state.store.as_ref(), &session.merchant_id, now_millis())
            .await?;
    Ok(Json(stats))
}
