//! Driver for one checkout interaction
//!
//! Owns the [`PaymentStep`], performs the backend calls and feeds their
//! results through [`transition`]. At most one charge-creation call is
//! issued per entry into `processing`; nothing is retried automatically.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared::error::AppError;
use shared::models::BillingMethod;
use tokio_util::sync::CancellationToken;

use super::message::{LOGIN_MESSAGE, user_message};
use super::state::{PaymentEvent, PaymentStep, TransitionError, transition};
use crate::gateway::{Charge, PixPayload};
use crate::session::SessionToken;

/// Body of a charge-creation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateChargeRequest {
    pub plan_id: String,
    pub billing_type: BillingMethod,
    /// Minted once per entry into `processing`
    pub attempt_key: String,
}

/// Server side of a checkout
#[async_trait]
pub trait CheckoutBackend: Send + Sync {
    async fn create_charge(
        &self,
        token: &SessionToken,
        request: &CreateChargeRequest,
    ) -> Result<Charge, AppError>;

    async fn pix_payload(&self, token: &SessionToken, charge_id: &str) -> Result<PixPayload, AppError>;
}

#[async_trait]
impl<T: CheckoutBackend + ?Sized> CheckoutBackend for std::sync::Arc<T> {
    async fn create_charge(
        &self,
        token: &SessionToken,
        request: &CreateChargeRequest,
    ) -> Result<Charge, AppError> {
        (**self).create_charge(token, request).await
    }

    async fn pix_payload(&self, token: &SessionToken, charge_id: &str) -> Result<PixPayload, AppError> {
        (**self).pix_payload(token, charge_id).await
    }
}

pub struct PaymentAttempt<B> {
    backend: B,
    plan_id: String,
    step: PaymentStep,
    cancel: CancellationToken,
}

impl<B: CheckoutBackend> PaymentAttempt<B> {
    pub fn new(backend: B, plan_id: impl Into<String>) -> Self {
        Self {
            backend,
            plan_id: plan_id.into(),
            step: PaymentStep::SelectMethod,
            cancel: CancellationToken::new(),
        }
    }

    pub fn step(&self) -> &PaymentStep {
        &self.step
    }

    pub fn plan_id(&self) -> &str {
        &self.plan_id
    }

    /// Token the UI cancels when the user closes the flow mid-request
    ///
    /// Cancellation is checked between transitions; an in-flight call runs
    /// to completion and its result is dropped.
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    fn apply(&mut self, event: PaymentEvent) -> Result<(), TransitionError> {
        self.step = transition(&self.step, event)?;
        Ok(())
    }

    fn fail(&mut self, err: &AppError) -> Result<(), TransitionError> {
        self.apply(PaymentEvent::Failed {
            message: user_message(err),
            requires_login: err.requires_login(),
        })
    }

    /// Replaces a token cancelled outside `processing` so it cannot leak
    /// into the next call
    fn rearm_cancellation(&mut self) {
        if self.cancel.is_cancelled() {
            self.cancel = CancellationToken::new();
        }
    }

    /// Returns true (and resets) if the user closed the flow while a call
    /// was in flight
    fn discard_if_cancelled(&mut self) -> bool {
        if !self.cancel.is_cancelled() {
            return false;
        }
        tracing::debug!(plan_id = %self.plan_id, "Checkout closed during processing, result discarded");
        self.step = PaymentStep::SelectMethod;
        self.cancel = CancellationToken::new();
        true
    }

    /// Choose a billing method and run the attempt to its next stable state
    pub async fn select_method(
        &mut self,
        method: BillingMethod,
        session: Option<&SessionToken>,
    ) -> Result<&PaymentStep, TransitionError> {
        self.rearm_cancellation();
        let attempt_key = uuid::Uuid::new_v4().to_string();
        self.apply(PaymentEvent::MethodSelected {
            method,
            attempt_key: attempt_key.clone(),
        })?;

        let Some(token) = session else {
            self.apply(PaymentEvent::Failed {
                message: LOGIN_MESSAGE.to_string(),
                requires_login: true,
            })?;
            return Ok(&self.step);
        };

        let request = CreateChargeRequest {
            plan_id: self.plan_id.clone(),
            billing_type: method,
            attempt_key,
        };
        if self.discard_if_cancelled() {
            return Ok(&self.step);
        }
        let created = self.backend.create_charge(token, &request).await;
        if self.discard_if_cancelled() {
            return Ok(&self.step);
        }

        match created {
            Ok(charge) => {
                tracing::info!(plan_id = %self.plan_id, charge_id = %charge.id, method = %method, "Charge created");
                self.apply(PaymentEvent::ChargeCreated(charge))?;
            }
            Err(e) => {
                tracing::warn!(plan_id = %self.plan_id, code = %e.code, error = %e.message, "Charge creation failed");
                self.fail(&e)?;
            }
        }

        if let Some(charge_id) = self.awaiting_pix() {
            self.fetch_pix(token, &charge_id).await?;
        }
        Ok(&self.step)
    }

    fn awaiting_pix(&self) -> Option<String> {
        match &self.step {
            PaymentStep::Processing {
                charge: Some(charge),
                ..
            } => Some(charge.id.clone()),
            _ => None,
        }
    }

    async fn fetch_pix(&mut self, token: &SessionToken, charge_id: &str) -> Result<(), TransitionError> {
        let result = self.backend.pix_payload(token, charge_id).await;
        if self.discard_if_cancelled() {
            return Ok(());
        }
        match result {
            Ok(pix) => self.apply(PaymentEvent::PixResolved(pix)),
            Err(e) => {
                tracing::warn!(charge_id = %charge_id, code = %e.code, error = %e.message, "PIX payload unavailable");
                self.apply(PaymentEvent::PixUnavailable)
            }
        }
    }

    /// Re-fetch the QR code of a pending PIX charge; never creates a charge
    pub async fn refresh_pix(&mut self, session: &SessionToken) -> Result<&PaymentStep, TransitionError> {
        let charge_id = match &self.step {
            PaymentStep::PixPending { charge } => charge.id.clone(),
            other => {
                return Err(TransitionError {
                    state: other.name(),
                    event: "refresh-pix",
                });
            }
        };
        self.rearm_cancellation();
        self.fetch_pix(session, &charge_id).await?;
        Ok(&self.step)
    }

    /// Back to method selection after an error
    pub fn retry(&mut self) -> Result<&PaymentStep, TransitionError> {
        self.apply(PaymentEvent::Retry)?;
        Ok(&self.step)
    }

    /// Discard all transient state
    ///
    /// An upstream charge that was already created is left alone.
    pub fn close(&mut self) -> Result<(), TransitionError> {
        self.apply(PaymentEvent::Closed)?;
        self.rearm_cancellation();
        Ok(())
    }
}
