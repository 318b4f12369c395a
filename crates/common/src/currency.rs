//! Money amounts
//!
//! Every amount is quantized to a 0.05 step on construction. The step is the
//! smallest coin in circulation for CHF and is not configurable; other
//! currencies would need their own rounding rule.

use std::fmt;
use std::iter::Sum;
use std::ops::Add;
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest representable amount: `NUMERIC(10, 2)` leaves 8 integer digits.
const MAX_INTEGER_DIGITS: u32 = 8;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CurrencyError {
    #[error("Enter a valid amount: '{0}'")]
    Invalid(String),

    #[error("Amount is too large: {0}")]
    TooLarge(Decimal),
}

/// A decimal amount rounded to the nearest 0.05, always carrying two decimals.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[serde(try_from = "Decimal", into = "Decimal")]
#[sqlx(transparent)]
pub struct Currency(Decimal);

impl Currency {
    pub const ZERO: Currency = Currency(Decimal::ZERO);

    /// Build from a decimal, rounding half away from zero onto the 0.05 grid.
    pub fn from_decimal(value: Decimal) -> Result<Self, CurrencyError> {
        let limit = Decimal::from(10u64.pow(MAX_INTEGER_DIGITS));
        if value.abs() >= limit {
            return Err(CurrencyError::TooLarge(value));
        }

        let step = Decimal::new(5, 2);
        let mut rounded = value
            .checked_div(step)
            .and_then(|steps| {
                steps
                    .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
                    .checked_mul(step)
            })
            .ok_or(CurrencyError::TooLarge(value))?;
        rounded.rescale(2);

        // Rounding can still carry 99999999.98 over the limit.
        if rounded.abs() >= limit {
            return Err(CurrencyError::TooLarge(value));
        }

        Ok(Currency(rounded))
    }

    /// Parse user input such as `"20"`, `" 12.5 "` or `"7.33"`.
    pub fn parse(input: &str) -> Result<Self, CurrencyError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(CurrencyError::Invalid(input.to_string()));
        }
        let value =
            Decimal::from_str(trimmed).map_err(|_| CurrencyError::Invalid(input.to_string()))?;
        Self::from_decimal(value)
    }

    /// Whole units, e.g. `Currency::units(20)` is 20.00
    pub fn units(amount: i64) -> Self {
        let mut value = Decimal::from(amount);
        value.rescale(2);
        Currency(value)
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Integer percentage of `goal` reached, rounded down. Zero goal yields 0.
    pub fn percent_of(&self, goal: Currency) -> i64 {
        if goal.0.is_zero() {
            return 0;
        }
        (self.0 * Decimal::ONE_HUNDRED / goal.0)
            .floor()
            .to_i64()
            .unwrap_or(0)
    }
}

impl TryFrom<Decimal> for Currency {
    type Error = CurrencyError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Currency::from_decimal(value)
    }
}

impl From<Currency> for Decimal {
    fn from(value: Currency) -> Self {
        value.0
    }
}

impl FromStr for Currency {
    type Err = CurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Currency::parse(s)
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add for Currency {
    type Output = Currency;

    // Sums of grid values stay on the grid.
    fn add(self, rhs: Self) -> Self::Output {
        Currency(self.0 + rhs.0)
    }
}

impl Sum for Currency {
    fn sum<I: Iterator<Item = Currency>>(iter: I) -> Self {
        iter.fold(Currency::ZERO, |acc, c| acc + c)
    }
}

impl Default for Currency {
    fn default() -> Self {
        Currency::ZERO
    }
}
