//! Subscription Model

use serde::{Deserialize, Serialize};

use super::plan::Plan;

/// Subscription status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Overdue,
    Cancelled,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Overdue => "overdue",
            Self::Cancelled => "cancelled",
        }
    }

    /// Cancelled is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// One subscription per merchant
///
/// Excess profile count and amount are not fields here; they are derived
/// from `plan` and `current_profile_count` whenever they are needed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub merchant_id: String,
    pub plan: Plan,
    pub status: SubscriptionStatus,
    /// Distinct customers with a relationship to the merchant (supplied externally)
    pub current_profile_count: u32,
    pub started_at: i64,
    pub updated_at: i64,
}
