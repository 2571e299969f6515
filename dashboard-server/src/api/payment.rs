//! Plan checkout endpoints

use axum::extract::{Path, State};
use axum::{Extension, Json};
use loyalty_core::checkout::CreateChargeRequest;
use loyalty_core::gateway::{Charge, PixPayload};
use loyalty_core::session::MerchantSession;
use serde::Deserialize;
use shared::models::BillingMethod;

use super::ApiResult;
use crate::state::AppState;

/// POST /api/payment/create
#[derive(Debug, Deserialize)]
pub struct CreatePaymentRequest {
    pub plan_id: String,
    /// `PIX` or `CREDIT_CARD`; parsed here so bad values get a coded error
    pub billing_type: String,
    /// Minted by the client once per attempt; a fresh key is used when absent
    #[serde(default)]
    pub attempt_key: Option<String>,
}

pub async fn create_payment(
    State(state): State<AppState>,
    Extension(session): Extension<MerchantSession>,
    Json(req): Json<CreatePaymentRequest>,
) -> ApiResult<Charge> {
    let billing_type: BillingMethod = req.billing_type.parse()?;
    let attempt_key = req
        .attempt_key
        .filter(|k| !k.trim().is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let request = CreateChargeRequest {
        plan_id: req.plan_id,
        billing_type,
        attempt_key,
    };
    let charge = state
        .checkout
        .create_for_merchant(&session.merchant_id, &request)
        .await?;
    Ok(Json(charge))
}

/// GET /api/payment/{charge_id}/pix
pub async fn pix_payload(
    State(state): State<AppState>,
    Extension(session): Extension<MerchantSession>,
    Path(charge_id): Path<String>,
) -> ApiResult<PixPayload> {
    let pix = state
        .checkout
        .pix_for_charge(&session.merchant_id, &charge_id)
        .await?;
    Ok(Json(pix))
}
