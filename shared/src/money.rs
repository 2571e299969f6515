//! Money and percentage types using rust_decimal for precision
//!
//! Amounts are held as `Decimal` at two decimal places (BRL centavos) and are
//! never converted through binary floating point. Rounding is half-up
//! (midpoint away from zero), which for the non-negative amounts this system
//! handles never rounds in the platform's favor.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};
use std::str::FromStr;

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, ErrorCode};

/// Currency minor-unit precision (centavos)
pub const DECIMAL_PLACES: u32 = 2;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Round a decimal to currency precision using round-half-up
#[inline]
pub fn round_money(value: Decimal) -> Decimal {
    let mut rounded =
        value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(DECIMAL_PLACES);
    rounded
}

/// Monetary amount in BRL, fixed at two decimal places
///
/// Serialized as a decimal string (`"150.00"`); deserializes from either a
/// string or a JSON number and is normalized on the way in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "Decimal", into = "Decimal")]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Create from a decimal, rounding half-up to centavos
    pub fn new(value: Decimal) -> Self {
        Money(round_money(value))
    }

    /// Create from minor units (centavos)
    pub fn from_minor(centavos: i64) -> Self {
        Money(Decimal::new(centavos, DECIMAL_PLACES))
    }

    /// Create from whole reais
    pub fn from_major(reais: i64) -> Self {
        Money::new(Decimal::from(reais))
    }

    /// Underlying decimal value
    #[inline]
    pub fn amount(&self) -> Decimal {
        self.0
    }

    /// Value in minor units (centavos), `None` if it does not fit in i64
    pub fn to_minor(&self) -> Option<i64> {
        self.0.checked_mul(HUNDRED)?.trunc().to_i64()
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    /// Subtract, flooring the result at zero
    pub fn saturating_sub(self, other: Money) -> Money {
        if other >= self {
            Money::ZERO
        } else {
            self - other
        }
    }

    /// Multiply by a count (e.g. excess profiles × per-profile fee),
    /// saturating at `Decimal::MAX`
    pub fn times(self, count: u32) -> Money {
        Money::new(self.0.saturating_mul(Decimal::from(count)))
    }

    /// Parse masked currency input the way the sale form does it: every
    /// non-digit is dropped and the remaining digits are read as centavos.
    ///
    /// `"R$ 1.234,56"` → 1234.56, `""` → 0.00
    pub fn parse_input(input: &str) -> Result<Money, AppError> {
        let digits: String = input.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.is_empty() {
            return Ok(Money::ZERO);
        }
        let centavos = Decimal::from_str(&digits).map_err(|_| {
            AppError::with_message(ErrorCode::InvalidAmount, format!("amount too large: {input}"))
        })?;
        Ok(Money::new(centavos / HUNDRED))
    }

    /// Format as Brazilian currency: `R$ 1.234,56`
    pub fn format_brl(&self) -> String {
        let sign = if self.is_negative() { "-" } else { "" };
        let abs = self.0.abs();
        let text = format!("{:.2}", abs);
        let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), "00"));

        let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
        for (i, ch) in int_part.chars().enumerate() {
            if i > 0 && (int_part.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }

        format!("{sign}R$ {grouped},{frac_part}")
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::ZERO
    }
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Money::new(value)
    }
}

impl From<Money> for Decimal {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl FromStr for Money {
    type Err = AppError;

    /// Parse a plain decimal string (`"150.00"`, `"49.9"`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim())
            .map(Money::new)
            .map_err(|_| AppError::with_message(ErrorCode::InvalidAmount, format!("invalid amount: {s}")))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, m| acc + *m)
    }
}

/// Percentage expressed as a whole-number decimal: `10` means 10%
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Percent(Decimal);

impl Percent {
    pub const ZERO: Percent = Percent(Decimal::ZERO);

    pub fn new(value: Decimal) -> Self {
        Percent(value)
    }

    #[inline]
    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// `amount × percent / 100`, unrounded; `None` on overflow
    pub fn of(&self, amount: Money) -> Option<Decimal> {
        amount.amount().checked_mul(self.0)?.checked_div(HUNDRED)
    }
}

impl From<u32> for Percent {
    fn from(value: u32) -> Self {
        Percent(Decimal::from(value))
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0.normalize())
    }
}
