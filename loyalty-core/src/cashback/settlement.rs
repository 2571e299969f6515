//! Sale settlement arithmetic
//!
//! Turns {purchase amount, available balance, requested redemption, rate}
//! into {redemption used, amount payable, cashback earned}. Pure: no I/O, no
//! clock, no hidden state.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use shared::money::{Money, Percent};
use thiserror::Error;

/// Largest purchase accepted in a single sale (R$ 1.000.000,00)
pub const MAX_PURCHASE_AMOUNT: Decimal = Decimal::from_parts(100_000_000, 0, 0, false, 2);

/// How much of the customer's balance the merchant wants to apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", content = "amount", rename_all = "snake_case")]
pub enum Redemption {
    /// Customer pays the full purchase amount
    #[default]
    None,
    /// Apply as much balance as the caps allow
    Max,
    /// Apply up to this amount; anything above the caps is silently capped
    Amount(Money),
}

/// Outcome of settling one sale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub redemption_used: Money,
    pub amount_payable: Money,
    pub cashback_earned: Money,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SettlementError {
    #[error("Purchase amount must be greater than zero, got {0}")]
    NonPositivePurchase(Money),

    #[error("Purchase amount exceeds maximum allowed ({MAX_PURCHASE_AMOUNT}), got {0}")]
    PurchaseTooLarge(Money),

    #[error("Available balance cannot be negative, got {0}")]
    NegativeBalance(Money),

    #[error("Cashback percent cannot be negative, got {0}")]
    NegativePercent(Percent),

    #[error("Redemption amount cannot be negative, got {0}")]
    NegativeRedemption(Money),

    #[error("Cashback of {percent} on {amount} is out of range")]
    CashbackOverflow { percent: Percent, amount: Money },

    #[error("Redemption of {requested} exceeds the balance of {available}")]
    RedemptionExceedsBalance { requested: Money, available: Money },
}

impl From<SettlementError> for AppError {
    fn from(err: SettlementError) -> Self {
        let code = match &err {
            SettlementError::NegativePercent(_) | SettlementError::CashbackOverflow { .. } => {
                ErrorCode::InvalidCashbackPercent
            }
            SettlementError::RedemptionExceedsBalance { .. } => ErrorCode::BalanceConflict,
            _ => ErrorCode::InvalidAmount,
        };
        AppError::with_message(code, err.to_string())
    }
}

/// Settle a sale
///
/// Redemption is clamped to `min(available, purchase)`, so an over-request is
/// never an error. Cashback is earned on the payable part only and rounded
/// half-up to centavos.
pub fn settle_sale(
    purchase: Money,
    available: Money,
    redemption: Redemption,
    percent: Percent,
) -> Result<Settlement, SettlementError> {
    if !purchase.is_positive() {
        return Err(SettlementError::NonPositivePurchase(purchase));
    }
    if purchase.amount() > MAX_PURCHASE_AMOUNT {
        return Err(SettlementError::PurchaseTooLarge(purchase));
    }
    if available.is_negative() {
        return Err(SettlementError::NegativeBalance(available));
    }
    if percent.is_negative() {
        return Err(SettlementError::NegativePercent(percent));
    }

    let cap = available.min(purchase);
    let redemption_used = match redemption {
        Redemption::None => Money::ZERO,
        Redemption::Max => cap,
        Redemption::Amount(requested) if requested.is_negative() => {
            return Err(SettlementError::NegativeRedemption(requested));
        }
        Redemption::Amount(requested) => requested.min(cap),
    };

    let amount_payable = purchase - redemption_used;
    let cashback_earned = percent
        .of(amount_payable)
        .map(Money::new)
        .ok_or(SettlementError::CashbackOverflow {
            percent,
            amount: amount_payable,
        })?;

    Ok(Settlement {
        redemption_used,
        amount_payable,
        cashback_earned,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn money(d: Decimal) -> Money {
        Money::new(d)
    }

    #[test]
    fn test_redemption_capped_to_purchase() {
        let s = settle_sale(
            money(dec!(150.00)),
            money(dec!(200.00)),
            Redemption::Amount(money(dec!(300.00))),
            Percent::from(10),
        )
        .unwrap();

        assert_eq!(s.redemption_used, money(dec!(150.00)));
        assert_eq!(s.amount_payable, Money::ZERO);
        assert_eq!(s.cashback_earned, Money::ZERO);
    }

    #[test]
    fn test_no_balance_full_cashback() {
        let s = settle_sale(
            money(dec!(100.00)),
            Money::ZERO,
            Redemption::Max,
            Percent::from(10),
        )
        .unwrap();

        assert_eq!(s.redemption_used, Money::ZERO);
        assert_eq!(s.amount_payable, money(dec!(100.00)));
        assert_eq!(s.cashback_earned, money(dec!(10.00)));
    }

    #[test]
    fn test_redemption_capped_to_balance() {
        let s = settle_sale(
            money(dec!(80.00)),
            money(dec!(12.50)),
            Redemption::Amount(money(dec!(50.00))),
            Percent::from(5),
        )
        .unwrap();

        assert_eq!(s.redemption_used, money(dec!(12.50)));
        assert_eq!(s.amount_payable, money(dec!(67.50)));
        // 67.50 × 5% = 3.375 → 3.38
        assert_eq!(s.cashback_earned, money(dec!(3.38)));
    }

    #[test]
    fn test_max_uses_lesser_cap() {
        let s = settle_sale(
            money(dec!(40.00)),
            money(dec!(25.00)),
            Redemption::Max,
            Percent::from(10),
        )
        .unwrap();
        assert_eq!(s.redemption_used, money(dec!(25.00)));
        assert_eq!(s.amount_payable, money(dec!(15.00)));
        assert_eq!(s.cashback_earned, money(dec!(1.50)));
    }

    #[test]
    fn test_half_cent_rounds_up() {
        // 0.25 × 10% = 0.025
        let s = settle_sale(
            money(dec!(0.25)),
            Money::ZERO,
            Redemption::None,
            Percent::from(10),
        )
        .unwrap();
        assert_eq!(s.cashback_earned, money(dec!(0.03)));

        // 0.24 × 10% = 0.024
        let s = settle_sale(
            money(dec!(0.24)),
            Money::ZERO,
            Redemption::None,
            Percent::from(10),
        )
        .unwrap();
        assert_eq!(s.cashback_earned, money(dec!(0.02)));
    }

    #[test]
    fn test_fractional_percent() {
        let s = settle_sale(
            money(dec!(99.90)),
            Money::ZERO,
            Redemption::None,
            Percent::new(dec!(2.5)),
        )
        .unwrap();
        // 99.90 × 2.5% = 2.4975 → 2.50
        assert_eq!(s.cashback_earned, money(dec!(2.50)));
    }

    #[test]
    fn test_invariants_hold_across_inputs() {
        let purchases = [dec!(0.01), dec!(1.99), dec!(10.00), dec!(150.00), dec!(999.99)];
        let balances = [dec!(0), dec!(0.50), dec!(10.00), dec!(500.00)];
        let requests = [
            Redemption::None,
            Redemption::Max,
            Redemption::Amount(money(dec!(0))),
            Redemption::Amount(money(dec!(7.77))),
            Redemption::Amount(money(dec!(10000))),
        ];
        let rates = [dec!(0), dec!(3), dec!(12.5), dec!(100)];

        for p in purchases {
            for b in balances {
                for r in requests {
                    for rate in rates {
                        let purchase = money(p);
                        let balance = money(b);
                        let s = settle_sale(purchase, balance, r, Percent::new(rate)).unwrap();

                        assert!(s.redemption_used <= balance.min(purchase));
                        assert!(!s.amount_payable.is_negative());
                        assert_eq!(s.amount_payable + s.redemption_used, purchase);
                        assert_eq!(
                            s.cashback_earned,
                            Money::new(s.amount_payable.amount() * rate / dec!(100))
                        );
                        assert!(!s.cashback_earned.is_negative());

                        // same inputs, same outputs
                        let again = settle_sale(purchase, balance, r, Percent::new(rate)).unwrap();
                        assert_eq!(s, again);
                    }
                }
            }
        }
    }

    #[test]
    fn test_rejects_invalid_inputs() {
        assert_eq!(
            settle_sale(Money::ZERO, Money::ZERO, Redemption::None, Percent::from(10)),
            Err(SettlementError::NonPositivePurchase(Money::ZERO))
        );
        assert!(matches!(
            settle_sale(
                money(dec!(10)),
                money(dec!(-1)),
                Redemption::None,
                Percent::from(10)
            ),
            Err(SettlementError::NegativeBalance(_))
        ));
        assert!(matches!(
            settle_sale(
                money(dec!(10)),
                Money::ZERO,
                Redemption::None,
                Percent::new(dec!(-0.5))
            ),
            Err(SettlementError::NegativePercent(_))
        ));
        assert!(matches!(
            settle_sale(
                money(dec!(10)),
                money(dec!(5)),
                Redemption::Amount(money(dec!(-2))),
                Percent::from(10)
            ),
            Err(SettlementError::NegativeRedemption(_))
        ));
        assert!(matches!(
            settle_sale(
                money(dec!(1000000.01)),
                Money::ZERO,
                Redemption::None,
                Percent::from(10)
            ),
            Err(SettlementError::PurchaseTooLarge(_))
        ));
    }

    #[test]
    fn test_large_percent_is_an_error_not_a_panic() {
        let huge = Percent::new(Decimal::from_i128_with_scale(10_i128.pow(25), 0));
        let err = settle_sale(money(dec!(1000000)), Money::ZERO, Redemption::None, huge).unwrap_err();
        assert!(matches!(err, SettlementError::CashbackOverflow { .. }));
        assert_eq!(AppError::from(err).code, ErrorCode::InvalidCashbackPercent);

        // above 100% is still a valid rate
        let s = settle_sale(money(dec!(10.00)), Money::ZERO, Redemption::None, Percent::from(250)).unwrap();
        assert_eq!(s.cashback_earned, money(dec!(25.00)));
    }

    #[test]
    fn test_error_codes() {
        let err: AppError = SettlementError::NegativePercent(Percent::new(dec!(-1))).into();
        assert_eq!(err.code, ErrorCode::InvalidCashbackPercent);
        let err: AppError = SettlementError::NonPositivePurchase(Money::ZERO).into();
        assert_eq!(err.code, ErrorCode::InvalidAmount);
    }

    #[test]
    fn test_redemption_serde() {
        let r: Redemption = serde_json::from_str(r#"{"mode":"amount","amount":"12.50"}"#).unwrap();
        assert_eq!(r, Redemption::Amount(money(dec!(12.50))));
        let r: Redemption = serde_json::from_str(r#"{"mode":"max"}"#).unwrap();
        assert_eq!(r, Redemption::Max);
    }
}
