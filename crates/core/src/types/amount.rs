//! Ringgit amounts using decimal arithmetic.
//!
//! Prices arrive as free-form numeric strings from form inputs. Anything
//! that does not parse as a number is treated as zero, matching how the
//! quote and extra-charge fields have always been read.
//!
//! Stored amounts are `NUMERIC(12,2)`: coerced amounts are rounded to sen the
//! way `PostgreSQL` rounds (half away from zero), and sums are checked against
//! the column range instead of overflowing.

use std::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Digits after the decimal point in a stored amount.
const SCALE: u32 = 2;

/// Errors that can occur when parsing a quoted [`Amount`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    /// The input is not a number.
    #[error("amount must be a number")]
    NotANumber,
    /// The input is below zero.
    #[error("amount cannot be negative")]
    Negative,
    /// The input does not fit a stored amount.
    #[error("amount must be at most {max}")]
    TooLarge {
        /// Largest storable amount.
        max: Decimal,
    },
}

/// A decimal amount in ringgit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(Decimal);

impl Amount {
    /// Zero ringgit.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Wrap a decimal value.
    #[must_use]
    pub const fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Largest amount a `NUMERIC(12,2)` column holds: `9999999999.99`.
    #[must_use]
    pub fn max_storable() -> Self {
        Self(Decimal::new(999_999_999_999, SCALE))
    }

    /// Read an amount from form text, falling back to zero.
    ///
    /// The result is rounded to two decimal places.
    #[must_use]
    pub fn coerce(input: &str) -> Self {
        Self(round_sen(coerce_amount(input)))
    }

    /// Read a charge that can never be negative; negative input becomes zero.
    #[must_use]
    pub fn coerce_non_negative(input: &str) -> Self {
        Self(round_sen(coerce_amount(input).max(Decimal::ZERO)))
    }

    /// Parse a quoted price strictly.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a number, is negative, or does
    /// not fit a stored amount.
    pub fn parse(input: &str) -> Result<Self, AmountError> {
        let trimmed = input.trim();
        let value = Decimal::from_str(trimmed)
            .or_else(|_| Decimal::from_scientific(trimmed))
            .map_err(|_| AmountError::NotANumber)?;
        if value.is_sign_negative() && !value.is_zero() {
            return Err(AmountError::Negative);
        }

        let amount = Self(round_sen(value));
        if !amount.is_storable() {
            return Err(AmountError::TooLarge {
                max: Self::max_storable().0,
            });
        }
        Ok(amount)
    }

    /// Whether the amount fits a `NUMERIC(12,2)` column.
    #[must_use]
    pub fn is_storable(self) -> bool {
        self.0.abs() <= Self::max_storable().0
    }

    /// Sum of two amounts, or `None` if either side or the sum is not
    /// storable.
    #[must_use]
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        if !self.is_storable() || !rhs.is_storable() {
            return None;
        }
        let sum = Self(self.0.checked_add(rhs.0)?);
        sum.is_storable().then_some(sum)
    }

    /// The underlying decimal.
    #[must_use]
    pub const fn value(self) -> Decimal {
        self.0
    }

    /// Formatted with two decimal places, e.g. `RM 120.50`.
    #[must_use]
    pub fn display_rm(self) -> String {
        format!("RM {:.2}", self.0.round_dp(2))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

fn round_sen(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Parse numeric form text into a decimal.
///
/// Blank, non-numeric, and non-finite inputs all yield zero. Scientific
/// notation (`1e2`) is accepted.
#[must_use]
pub fn coerce_amount(input: &str) -> Decimal {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Decimal::ZERO;
    }

    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .unwrap_or(Decimal::ZERO)
}
