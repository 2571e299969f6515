//! Sale Model

use serde::{Deserialize, Serialize};

use crate::money::{Money, Percent};

/// Registered sale (immutable once created)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    pub id: String,
    pub merchant_id: String,
    pub customer_id: String,
    pub purchase_amount: Money,
    pub redemption_used: Money,
    pub amount_payable: Money,
    pub cashback_earned: Money,
    /// Merchant rate at the time of the sale
    pub cashback_percent: Percent,
    pub created_at: i64,
}
