//! Payment attempt states and the pure transition function

use serde::{Deserialize, Serialize};
use shared::error::AppError;
use shared::models::BillingMethod;
use thiserror::Error;

use crate::gateway::{Charge, PixPayload};

/// Where a single checkout interaction stands
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum PaymentStep {
    /// Initial state; nothing carried over from earlier attempts
    SelectMethod,
    /// A charge request is in flight; `charge` is set once a PIX charge exists
    /// and its QR code is being fetched
    Processing {
        method: BillingMethod,
        attempt_key: String,
        charge: Option<Charge>,
    },
    PixDisplay { charge: Charge, pix: PixPayload },
    /// PIX charge exists but its QR code could not be fetched
    PixPending { charge: Charge },
    RedirectCard { charge: Charge, checkout_url: String },
    Error { message: String, requires_login: bool },
}

impl PaymentStep {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SelectMethod => "select-method",
            Self::Processing { .. } => "processing",
            Self::PixDisplay { .. } => "pix-display",
            Self::PixPending { .. } => "pix-pending",
            Self::RedirectCard { .. } => "redirect-card",
            Self::Error { .. } => "error",
        }
    }

    /// Method selection controls are disabled while this is true
    pub fn is_processing(&self) -> bool {
        matches!(self, Self::Processing { .. })
    }

    /// Charge created by this attempt, if any
    pub fn charge(&self) -> Option<&Charge> {
        match self {
            Self::Processing { charge, .. } => charge.as_ref(),
            Self::PixDisplay { charge, .. }
            | Self::PixPending { charge }
            | Self::RedirectCard { charge, .. } => Some(charge),
            Self::SelectMethod | Self::Error { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PaymentEvent {
    MethodSelected {
        method: BillingMethod,
        attempt_key: String,
    },
    ChargeCreated(Charge),
    PixResolved(PixPayload),
    PixUnavailable,
    Failed {
        message: String,
        requires_login: bool,
    },
    /// User asks to try again after an error
    Retry,
    /// User closes the flow
    Closed,
}

impl PaymentEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::MethodSelected { .. } => "method-selected",
            Self::ChargeCreated(_) => "charge-created",
            Self::PixResolved(_) => "pix-resolved",
            Self::PixUnavailable => "pix-unavailable",
            Self::Failed { .. } => "failed",
            Self::Retry => "retry",
            Self::Closed => "closed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Event {event} is not valid in state {state}")]
pub struct TransitionError {
    pub state: &'static str,
    pub event: &'static str,
}

impl From<TransitionError> for AppError {
    fn from(err: TransitionError) -> Self {
        AppError::invalid_transition(err.to_string())
            .with_detail("state", err.state)
            .with_detail("event", err.event)
    }
}

const CARD_URL_MISSING: &str = "Card checkout link is unavailable. Please try again.";

/// Next state for `event` in `step`
///
/// Pure: the driver performs the I/O and feeds results back in as events.
pub fn transition(step: &PaymentStep, event: PaymentEvent) -> Result<PaymentStep, TransitionError> {
    use PaymentEvent as E;
    use PaymentStep as S;

    let next = match (step, event) {
        (S::SelectMethod, E::MethodSelected { method, attempt_key }) => S::Processing {
            method,
            attempt_key,
            charge: None,
        },

        // Charge creation result
        (
            S::Processing {
                method: BillingMethod::CreditCard,
                charge: None,
                ..
            },
            E::ChargeCreated(charge),
        ) => match charge.checkout_url.clone().filter(|u| !u.is_empty()) {
            Some(checkout_url) => S::RedirectCard {
                charge,
                checkout_url,
            },
            None => S::Error {
                message: CARD_URL_MISSING.into(),
                requires_login: false,
            },
        },
        (
            S::Processing {
                method: BillingMethod::Pix,
                attempt_key,
                charge: None,
            },
            E::ChargeCreated(charge),
        ) => S::Processing {
            method: BillingMethod::Pix,
            attempt_key: attempt_key.clone(),
            charge: Some(charge),
        },
        (S::Processing { charge: None, .. }, E::Failed {
            message,
            requires_login,
        }) => S::Error {
            message,
            requires_login,
        },

        // QR lookup result; the charge already exists upstream, so a failure
        // here never leads to the error state
        (
            S::Processing {
                charge: Some(charge),
                ..
            }
            | S::PixPending { charge },
            E::PixResolved(pix),
        ) => {
            if pix.qr_text.trim().is_empty() {
                S::PixPending {
                    charge: charge.clone(),
                }
            } else {
                S::PixDisplay {
                    charge: charge.clone(),
                    pix,
                }
            }
        }
        (
            S::Processing {
                charge: Some(charge),
                ..
            }
            | S::PixPending { charge },
            E::PixUnavailable | E::Failed { .. },
        ) => S::PixPending {
            charge: charge.clone(),
        },

        (S::Error { .. }, E::Retry) => S::SelectMethod,

        (step, E::Closed) if !step.is_processing() => S::SelectMethod,

        (step, event) => {
            return Err(TransitionError {
                state: step.name(),
                event: event.name(),
            });
        }
    };

    Ok(next)
}
