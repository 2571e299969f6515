//! Payment Model

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, ErrorCode};
use crate::money::Money;

/// Payment record status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

/// How the merchant pays for the plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BillingMethod {
    #[serde(rename = "PIX")]
    Pix,
    #[serde(rename = "CREDIT_CARD")]
    CreditCard,
}

impl BillingMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pix => "PIX",
            Self::CreditCard => "CREDIT_CARD",
        }
    }
}

impl fmt::Display for BillingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BillingMethod {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PIX" => Ok(Self::Pix),
            "CREDIT_CARD" => Ok(Self::CreditCard),
            other => Err(AppError::with_message(
                ErrorCode::PaymentInvalidMethod,
                "Invalid billing type. Use PIX or CREDIT_CARD",
            )
            .with_detail("billing_type", other)),
        }
    }
}

/// One billing-cycle charge for a subscription
///
/// Amounts are snapshots taken when the record is created; a pending record
/// is re-derived after plan or profile-count changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: String,
    pub merchant_id: String,
    pub subscription_id: String,
    pub base_amount: Money,
    pub excess_amount: Money,
    pub due_date: NaiveDate,
    pub status: PaymentStatus,
    #[serde(default)]
    pub gateway_reference: Option<String>,
    #[serde(default)]
    pub paid_at: Option<i64>,
    pub created_at: i64,
}

impl PaymentRecord {
    pub fn total(&self) -> Money {
        self.base_amount + self.excess_amount
    }
}
