//! Merchant Model

use serde::{Deserialize, Serialize};

use crate::money::{Money, Percent};

/// Merchant (company) running a cashback program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Merchant {
    pub id: String,
    pub name: String,
    /// Tax document as entered; validated when used
    #[serde(default)]
    pub cnpj: Option<String>,
    pub cashback_percent: Percent,
    /// Purchases below this value earn no cashback
    #[serde(default)]
    pub min_purchase_value: Option<Money>,
    /// Days a balance stays valid after the last purchase
    #[serde(default)]
    pub cashback_expiration_days: Option<u32>,
    /// Cached customer id at the payment gateway
    #[serde(default)]
    pub gateway_customer_id: Option<String>,
}
