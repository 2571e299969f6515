//! Sale endpoints

use axum::extract::State;
use axum::{Extension, Json};
use loyalty_core::cashback::{self, SaleQuote, SaleRequest};
use loyalty_core::session::MerchantSession;
use shared::models::Sale;
use shared::util::now_millis;

use super::ApiResult;
use crate::state::AppState;

/// POST /api/sales/quote
pub async fn quote(
    State(state): State<AppState>,
    Extension(session): Extension<MerchantSession>,
    Json(req): Json<SaleRequest>,
) -> ApiResult<SaleQuote> {
    let quote =
        cashback::quote_sale(state.store.as_ref(), &session.merchant_id, &req, now_millis()).await?;
    Ok(Json(quote))
}

/// POST /api/sales
pub async fn register(
    State(state): State<AppState>,
    Extension(session): Extension<MerchantSession>,
    Json(req): Json<SaleRequest>,
) -> ApiResult<Sale> {
    let sale =
        cashback::register_sale(state.store.as_ref(), &session.merchant_id, &req, now_millis())
            .await?;
    Ok(Json(sale))
}
