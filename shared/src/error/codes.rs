//! Numeric error codes
//!
//! The thousands digit selects the domain (see [`super::ErrorCategory`]).
//! Numbers are part of the wire contract with the dashboard frontend and
//! must not be reused once published.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    Success = 0,
    Unknown = 1,
    ValidationFailed = 2,
    NotFound = 3,
    InvalidRequest = 5,
    InvalidFormat = 6,
    RequiredField = 7,
    ValueOutOfRange = 8,
    /// Event not accepted by the payment attempt in its current step
    InvalidStateTransition = 9,

    NotAuthenticated = 1001,
    TokenInvalid = 1004,
    SessionExpired = 1005,

    MerchantNotFound = 3001,
    /// No customer record at the payment gateway for the merchant's CNPJ
    MerchantNotRegistered = 3002,
    MerchantTaxIdMissing = 3003,

    CustomerNotFound = 4001,
    /// Customer balance moved between quote and commit
    BalanceConflict = 4002,
    InvalidAmount = 4003,
    InvalidCashbackPercent = 4004,

    PaymentFailed = 5001,
    PaymentInvalidMethod = 5003,
    /// Unknown or inactive plan
    PlanNotFound = 5101,
    PlanInvalid = 5102,
    SubscriptionNotFound = 5201,
    SubscriptionCancelled = 5202,
    PlanAlreadyCurrent = 5203,
    /// Subscription moved between preview and commit
    PlanChangeConflict = 5204,
    GatewayRejected = 5301,
    PixPayloadUnavailable = 5302,
    ChargeNotFound = 5303,

    InternalError = 9001,
    DatabaseError = 9002,
    NetworkError = 9003,
    TimeoutError = 9004,
    ConfigError = 9005,
}

impl ErrorCode {
    /// Every defined code, in numeric order
    pub const ALL: [ErrorCode; 35] = [
        Self::Success,
        Self::Unknown,
        Self::ValidationFailed,
        Self::NotFound,
        Self::InvalidRequest,
        Self::InvalidFormat,
        Self::RequiredField,
        Self::ValueOutOfRange,
        Self::InvalidStateTransition,
        Self::NotAuthenticated,
        Self::TokenInvalid,
        Self::SessionExpired,
        Self::MerchantNotFound,
        Self::MerchantNotRegistered,
        Self::MerchantTaxIdMissing,
        Self::CustomerNotFound,
        Self::BalanceConflict,
        Self::InvalidAmount,
        Self::InvalidCashbackPercent,
        Self::PaymentFailed,
        Self::PaymentInvalidMethod,
        Self::PlanNotFound,
        Self::PlanInvalid,
        Self::SubscriptionNotFound,
        Self::SubscriptionCancelled,
        Self::PlanAlreadyCurrent,
        Self::PlanChangeConflict,
        Self::GatewayRejected,
        Self::PixPayloadUnavailable,
        Self::ChargeNotFound,
        Self::InternalError,
        Self::DatabaseError,
        Self::NetworkError,
        Self::TimeoutError,
        Self::ConfigError,
    ];

    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Default user-facing text, used when the error site has nothing better
    pub const fn message(&self) -> &'static str {
        use ErrorCode::*;
        match self {
            Success => "OK",
            Unknown => "Something went wrong",
            ValidationFailed => "Validation failed",
            NotFound => "Not found",
            InvalidRequest => "Invalid request",
            InvalidFormat => "Invalid format",
            RequiredField => "A required field is missing",
            ValueOutOfRange => "Value out of range",
            InvalidStateTransition => "Not allowed at this step",

            NotAuthenticated => "Please log in",
            TokenInvalid => "Your session is not valid, please log in again",
            SessionExpired => "Your session has expired, please log in again",

            MerchantNotFound => "Merchant not found",
            MerchantNotRegistered => {
                "Merchant is not registered with the payment system, please contact support"
            }
            MerchantTaxIdMissing => "Merchant CNPJ is not on file, please contact support",

            CustomerNotFound => "Customer not found",
            BalanceConflict => "Customer balance changed, please retry",
            InvalidAmount => "Invalid amount",
            InvalidCashbackPercent => "Invalid cashback percent",

            PaymentFailed => "Payment could not be processed",
            PaymentInvalidMethod => "Unsupported billing type",
            PlanNotFound => "Plan not found or inactive",
            PlanInvalid => "Plan is misconfigured",
            SubscriptionNotFound => "No subscription found",
            SubscriptionCancelled => "Cannot change plan on a cancelled subscription",
            PlanAlreadyCurrent => "This is already your current plan",
            PlanChangeConflict => "Subscription changed, please retry",
            GatewayRejected => "Payment gateway rejected the request",
            PixPayloadUnavailable => "PIX QR code is not available yet",
            ChargeNotFound => "Charge not found",

            InternalError => "Internal error",
            DatabaseError => "Storage error",
            NetworkError => "Could not reach the payment service",
            TimeoutError => "The payment service took too long to answer",
            ConfigError => "Server misconfigured",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.code())
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// A number with no [`ErrorCode`] assigned
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unassigned error code {0}")]
pub struct InvalidErrorCode(pub u16);

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.code() == value)
            .ok_or(InvalidErrorCode(value))
    }
}
