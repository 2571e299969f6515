//! Customer Balance Model

use serde::{Deserialize, Serialize};

use crate::money::Money;

/// End customer enrolled in one or more merchants' programs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub cpf: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Cashback balance of one customer at one merchant
///
/// The aggregates are informational; only `current_balance` is authoritative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerBalance {
    pub customer_id: String,
    pub merchant_id: String,
    pub current_balance: Money,
    #[serde(default)]
    pub last_purchase_at: Option<i64>,
    #[serde(default)]
    pub total_purchases: u32,
    #[serde(default)]
    pub total_spent: Money,
    #[serde(default)]
    pub total_cashback: Money,
}

impl CustomerBalance {
    /// Fresh balance for a customer's first purchase at a merchant
    pub fn new(customer_id: impl Into<String>, merchant_id: impl Into<String>) -> Self {
        Self {
            customer_id: customer_id.into(),
            merchant_id: merchant_id.into(),
            current_balance: Money::ZERO,
            last_purchase_at: None,
            total_purchases: 0,
            total_spent: Money::ZERO,
            total_cashback: Money::ZERO,
        }
    }
}
