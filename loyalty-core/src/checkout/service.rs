//! Server side of the checkout: plan, merchant and gateway customer
//! resolution, then charge creation

use std::sync::Arc;

use async_trait::async_trait;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::Plan;
use shared::util::{next_business_day, now_millis};

use super::attempt::{CheckoutBackend, CreateChargeRequest};
use crate::gateway::{Charge, NewCharge, PaymentGateway, PixPayload, resolve_gateway_customer};
use crate::session::{MerchantSession, SessionResolver, SessionToken};
use crate::store::{MerchantStore, PlanCatalog};

/// External reference tying a gateway charge to one checkout attempt
pub fn external_reference(merchant_id: &str, plan_id: &str, attempt_key: &str) -> String {
    format!("merchant_{merchant_id}_plan_{plan_id}_{attempt_key}")
}

pub struct CheckoutService<S: ?Sized, G: ?Sized, R: ?Sized> {
    store: Arc<S>,
    gateway: Arc<G>,
    sessions: Arc<R>,
}

impl<S: ?Sized, G: ?Sized, R: ?Sized> Clone for CheckoutService<S, G, R> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            gateway: self.gateway.clone(),
            sessions: self.sessions.clone(),
        }
    }
}

impl<S, G, R> CheckoutService<S, G, R>
where
    S: MerchantStore + PlanCatalog + ?Sized,
    G: PaymentGateway + ?Sized,
    R: SessionResolver + ?Sized,
{
    pub fn new(store: Arc<S>, gateway: Arc<G>, sessions: Arc<R>) -> Self {
        Self {
            store,
            gateway,
            sessions,
        }
    }

    fn authenticate(&self, token: &SessionToken) -> AppResult<MerchantSession> {
        self.sessions.resolve(token, now_millis()).map_err(|e| {
            tracing::debug!(%e, "Session rejected");
            AppError::from(e)
        })
    }

    async fn active_plan(&self, plan_id: &str) -> AppResult<Plan> {
        self.store
            .find_plan(plan_id)
            .await?
            .filter(|p| p.is_active)
            .ok_or_else(|| AppError::new(ErrorCode::PlanNotFound).with_detail("plan_id", plan_id))
    }

    /// Create (or return the already-created) charge for one attempt
    pub async fn create_for_merchant(
        &self,
        merchant_id: &str,
        request: &CreateChargeRequest,
    ) -> AppResult<Charge> {
        // 1. Validate input
        if request.plan_id.trim().is_empty() {
            return Err(AppError::required("plan_id"));
        }
        if request.attempt_key.trim().is_empty() {
            return Err(AppError::required("attempt_key"));
        }

        // 2. Plan and merchant
        let plan = self.active_plan(&request.plan_id).await?;
        let merchant = self
            .store
            .find_merchant(merchant_id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::MerchantNotFound))?;

        // 3. Gateway customer (cache-aside)
        let customer_id =
            resolve_gateway_customer(self.gateway.as_ref(), self.store.as_ref(), &merchant).await?;

        // 4. Same attempt already produced a charge?
        let reference = external_reference(&merchant.id, &plan.id, &request.attempt_key);
        let existing = self
            .gateway
            .find_charge_by_reference(&reference)
            .await
            .map_err(|e| {
                tracing::error!(merchant_id = %merchant.id, %e, "Charge lookup by reference failed");
                AppError::from(e)
            })?;
        if let Some(charge) = existing {
            tracing::info!(merchant_id = %merchant.id, charge_id = %charge.id, "Reusing charge for attempt");
            return Ok(charge);
        }

        // 5. Create
        let today = chrono::Utc::now().date_naive();
        let new_charge = NewCharge {
            customer_id,
            method: request.billing_type,
            amount: plan.monthly_price,
            due_date: next_business_day(today),
            description: format!("Subscription to plan {}", plan.name),
            external_reference: reference,
            idempotency_key: Some(request.attempt_key.clone()),
        };
        let charge = self.gateway.create_charge(&new_charge).await.map_err(|e| {
            tracing::error!(merchant_id = %merchant.id, plan_id = %plan.id, %e, "Charge creation failed");
            AppError::from(e)
        })?;

        tracing::info!(
            merchant_id = %merchant.id,
            plan_id = %plan.id,
            charge_id = %charge.id,
            method = %request.billing_type,
            amount = %charge.amount,
            "Charge created"
        );
        Ok(charge)
    }

    /// QR payload of a PIX charge created by this merchant; an empty
    /// payload counts as unavailable
    ///
    /// A charge owned by another merchant is reported as not found.
    pub async fn pix_for_charge(&self, merchant_id: &str, charge_id: &str) -> AppResult<PixPayload> {
        if charge_id.trim().is_empty() {
            return Err(AppError::required("charge_id"));
        }
        let charge = self.gateway.find_charge(charge_id).await.map_err(|e| {
            tracing::error!(charge_id = %charge_id, %e, "Charge lookup failed");
            AppError::from(e)
        })?;
        let owner_prefix = format!("merchant_{merchant_id}_plan_");
        let owned = charge
            .as_ref()
            .and_then(|c| c.external_reference.as_deref())
            .is_some_and(|r| r.starts_with(&owner_prefix));
        if !owned {
            tracing::warn!(merchant_id = %merchant_id, charge_id = %charge_id, "PIX payload requested for a charge the merchant does not own");
            return Err(AppError::new(ErrorCode::ChargeNotFound).with_detail("charge_id", charge_id));
        }

        let pix = self.gateway.pix_payload(charge_id).await.map_err(|e| {
            tracing::error!(charge_id = %charge_id, %e, "PIX payload lookup failed");
            AppError::from(e)
        })?;
        if pix.qr_text.trim().is_empty() {
            return Err(AppError::new(ErrorCode::PixPayloadUnavailable));
        }
        Ok(pix)
    }
}

#[async_trait]
impl<S, G, R> CheckoutBackend for CheckoutService<S, G, R>
where
    S: MerchantStore + PlanCatalog + ?Sized,
    G: PaymentGateway + ?Sized,
    R: SessionResolver + ?Sized,
{
    async fn create_charge(
        &self,
        token: &SessionToken,
        request: &CreateChargeRequest,
    ) -> Result<Charge, AppError> {
        let session = self.authenticate(token)?;
        self.create_for_merchant(&session.merchant_id, request).await
    }

    async fn pix_payload(&self, token: &SessionToken, charge_id: &str) -> Result<PixPayload, AppError> {
        let session = self.authenticate(token)?;
        self.pix_for_charge(&session.merchant_id, charge_id).await
    }
}
