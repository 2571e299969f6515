//! Balance bookkeeping around a settled sale

use shared::models::{CustomerBalance, Merchant};
use shared::money::Money;

use super::settlement::{Settlement, SettlementError};

const DAY_MS: i64 = 86_400_000;

/// Whether a balance has passed its validity window
///
/// No window configured, or no purchase yet, means nothing can expire.
pub fn is_expired(last_purchase_at: Option<i64>, window_days: Option<u32>, now: i64) -> bool {
    match (last_purchase_at, window_days) {
        (Some(last), Some(days)) => now - last > i64::from(days) * DAY_MS,
        _ => false,
    }
}

/// Balance the customer can actually spend right now
///
/// An expired balance is treated as zero even before the sweep has run.
pub fn spendable_balance(balance: &CustomerBalance, merchant: &Merchant, now: i64) -> Money {
    if is_expired(
        balance.last_purchase_at,
        merchant.cashback_expiration_days,
        now,
    ) {
        Money::ZERO
    } else {
        balance.current_balance
    }
}

/// New balance after a sale: `balance − redemption + cashback`
///
/// Aggregates are bumped and the last-purchase timestamp moves to `now`.
/// Fails if the settlement redeems more than `available`, which means it was
/// computed against a different balance.
pub fn apply_settlement(
    balance: &CustomerBalance,
    available: Money,
    settlement: &Settlement,
    now: i64,
) -> Result<CustomerBalance, SettlementError> {
    if settlement.redemption_used > available {
        return Err(SettlementError::RedemptionExceedsBalance {
            requested: settlement.redemption_used,
            available,
        });
    }

    let purchase = settlement.amount_payable + settlement.redemption_used;
    Ok(CustomerBalance {
        current_balance: available - settlement.redemption_used + settlement.cashback_earned,
        last_purchase_at: Some(now),
        total_purchases: balance.total_purchases.saturating_add(1),
        total_spent: balance.total_spent + purchase,
        total_cashback: balance.total_cashback + settlement.cashback_earned,
        ..balance.clone()
    })
}
