//! Payment gateway contract
//!
//! The gateway is an external collaborator reached over HTTP. The core only
//! depends on [`PaymentGateway`]; the `asaas-client` crate implements it.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use shared::document::TaxId;
use shared::error::{AppError, ErrorCode};
use shared::models::{BillingMethod, Merchant};
use shared::money::Money;
use thiserror::Error;

use crate::store::MerchantStore;

/// Charge to be created at the gateway
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewCharge {
    pub customer_id: String,
    pub method: BillingMethod,
    pub amount: Money,
    pub due_date: NaiveDate,
    pub description: String,
    pub external_reference: String,
    /// Sent so a retried request cannot create a second charge
    pub idempotency_key: Option<String>,
}

/// Charge as the gateway reports it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Charge {
    pub id: String,
    pub status: String,
    pub amount: Money,
    /// Hosted invoice / card checkout page
    #[serde(default)]
    pub checkout_url: Option<String>,
    #[serde(default)]
    pub external_reference: Option<String>,
}

/// PIX QR code for a charge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PixPayload {
    /// PNG, base64 encoded
    pub qr_image_base64: String,
    /// Copy-and-paste payload
    pub qr_text: String,
    #[serde(default)]
    pub expires_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GatewayError {
    /// Validation errors reported by the gateway, in order
    #[error("Gateway rejected the request: {}", .0.join(", "))]
    Rejected(Vec<String>),

    #[error("Not found at gateway: {0}")]
    NotFound(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Gateway request timed out")]
    Timeout,

    #[error("Invalid gateway response: {0}")]
    InvalidResponse(String),
}

impl GatewayError {
    /// Rejection reasons joined for display
    pub fn user_message(&self) -> Option<String> {
        match self {
            Self::Rejected(reasons) if !reasons.is_empty() => Some(reasons.join(", ")),
            _ => None,
        }
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        match &err {
            GatewayError::Rejected(_) => match err.user_message() {
                Some(msg) => AppError::with_message(ErrorCode::GatewayRejected, msg),
                None => AppError::new(ErrorCode::GatewayRejected),
            },
            GatewayError::NotFound(what) => {
                AppError::new(ErrorCode::ChargeNotFound).with_detail("resource", what.clone())
            }
            GatewayError::Network(_) => AppError::new(ErrorCode::NetworkError),
            GatewayError::Timeout => AppError::new(ErrorCode::TimeoutError),
            GatewayError::InvalidResponse(_) => AppError::new(ErrorCode::PaymentFailed),
        }
    }
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Gateway customer id registered under this tax document
    async fn find_customer_by_tax_id(&self, tax_id: &TaxId) -> Result<Option<String>, GatewayError>;

    /// Existing charge created with this external reference
    async fn find_charge_by_reference(
        &self,
        external_reference: &str,
    ) -> Result<Option<Charge>, GatewayError>;

    /// Charge by gateway id; `None` when unknown or deleted
    async fn find_charge(&self, charge_id: &str) -> Result<Option<Charge>, GatewayError>;

    async fn create_charge(&self, charge: &NewCharge) -> Result<Charge, GatewayError>;

    /// QR payload of a PIX charge; `NotFound` when the charge has none
    async fn pix_payload(&self, charge_id: &str) -> Result<PixPayload, GatewayError>;
}

/// Gateway customer id for a merchant (cache-aside)
///
/// Uses the cached id when present. Otherwise looks the merchant up by CNPJ
/// and writes the result back. A merchant unknown to the gateway is an
/// onboarding gap: no customer is created on its behalf.
pub async fn resolve_gateway_customer<G, S>(
    gateway: &G,
    store: &S,
    merchant: &Merchant,
) -> Result<String, AppError>
where
    G: PaymentGateway + ?Sized,
    S: MerchantStore + ?Sized,
{
    if let Some(cached) = merchant
        .gateway_customer_id
        .as_deref()
        .filter(|id| !id.is_empty())
    {
        return Ok(cached.to_string());
    }

    let raw = merchant
        .cnpj
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| AppError::new(ErrorCode::MerchantTaxIdMissing))?;
    let tax_id = TaxId::parse(raw).map_err(|_| {
        tracing::warn!(merchant_id = %merchant.id, "Merchant tax document fails validation");
        AppError::new(ErrorCode::MerchantTaxIdMissing)
    })?;

    let customer_id = gateway
        .find_customer_by_tax_id(&tax_id)
        .await
        .map_err(|e| {
            tracing::error!(merchant_id = %merchant.id, %e, "Gateway customer lookup failed");
            AppError::from(e)
        })?
        .ok_or_else(|| {
            tracing::warn!(merchant_id = %merchant.id, "Merchant not registered at gateway");
            AppError::new(ErrorCode::MerchantNotRegistered)
        })?;

    if let Err(e) = store.set_gateway_customer_id(&merchant.id, &customer_id).await {
        // Lookup succeeded; the next request just repeats it
        tracing::warn!(merchant_id = %merchant.id, %e, "Failed to cache gateway customer id");
    }

    Ok(customer_id)
}
