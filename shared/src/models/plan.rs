//! Plan Model

use serde::{Deserialize, Serialize};

use crate::money::Money;

/// Subscription tier offered to merchants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub monthly_price: Money,
    /// Customer profiles included in the monthly price
    #[serde(alias = "user_limit")]
    pub included_profiles: u32,
    /// Fee charged per profile above `included_profiles`
    #[serde(alias = "excess_user_fee")]
    pub excess_profile_fee: Money,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}
