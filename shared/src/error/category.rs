//! Error code ranges

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};

/// Domain of an error, taken from the thousands digit of its code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// 0xxx
    General,
    /// 1xxx
    Auth,
    /// 3xxx
    Merchant,
    /// 4xxx, sales and cashback balances
    Sale,
    /// 5xxx, plans, subscriptions and gateway charges
    Billing,
    /// 9xxx; unassigned ranges land here too
    System,
}

impl ErrorCategory {
    pub fn from_code(code: u16) -> Self {
        match code / 1000 {
            0 => Self::General,
            1 => Self::Auth,
            3 => Self::Merchant,
            4 => Self::Sale,
            5 => Self::Billing,
            _ => Self::System,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Auth => "auth",
            Self::Merchant => "merchant",
            Self::Sale => "sale",
            Self::Billing => "billing",
            Self::System => "system",
        }
    }
}

impl ErrorCode {
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }
}
