//! Value objects shared by both domains.
//!
//! `Money` lives here because both customers (credit limit) and invoices
//! (amount) carry the same two-decimal currency value.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a decimal could not become `Money`.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MoneyError {
    #[error("must have at most {max} fractional digits")]
    TooManyFractionDigits { max: u32 },

    #[error("must have at most {max} integer digits")]
    TooLarge { max: u32 },
}

/// Currency amount with exactly two fractional digits.
///
/// Stored at scale 2 so `0`, `0.0` and `0.00` all serialize as `"0.00"`.
/// The sign is not restricted here; each rule decides what range it accepts.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Money(Decimal);

impl Money {
    pub const SCALE: u32 = 2;
    /// Integer digits allowed (column is `NUMERIC(10, 2)`).
    pub const MAX_INTEGER_DIGITS: u32 = 8;

    pub fn zero() -> Self {
        Self(Decimal::new(0, Self::SCALE))
    }

    /// Validate and rescale a decimal.
    pub fn from_decimal(value: Decimal) -> Result<Self, MoneyError> {
        if value.normalize().scale() > Self::SCALE {
            return Err(MoneyError::TooManyFractionDigits { max: Self::SCALE });
        }

        let limit = Decimal::from(10u64.pow(Self::MAX_INTEGER_DIGITS));
        if value.abs() >= limit {
            return Err(MoneyError::TooLarge {
                max: Self::MAX_INTEGER_DIGITS,
            });
        }

        let mut scaled = value;
        scaled.rescale(Self::SCALE);
        Ok(Self(scaled))
    }

    pub fn amount(&self) -> Decimal {
        self.0
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
}

impl TryFrom<Decimal> for Money {
    type Error = MoneyError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::from_decimal(value)
    }
}

impl From<Money> for Decimal {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn zero_renders_with_two_decimals() {
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn rescales_to_two_decimals() {
        assert_eq!(Money::from_decimal(dec("1000")).unwrap().to_string(), "1000.00");
        assert_eq!(Money::from_decimal(dec("12.5")).unwrap().to_string(), "12.50");
        // Trailing zeros beyond the scale are not real precision.
        assert_eq!(Money::from_decimal(dec("3.1400")).unwrap().to_string(), "3.14");
    }

    #[test]
    fn rejects_extra_fraction_digits() {
        assert_eq!(
            Money::from_decimal(dec("1.005")),
            Err(MoneyError::TooManyFractionDigits { max: 2 })
        );
    }

    #[test]
    fn rejects_values_beyond_column_precision() {
        assert!(Money::from_decimal(dec("99999999.99")).is_ok());
        assert_eq!(
            Money::from_decimal(dec("100000000")),
            Err(MoneyError::TooLarge { max: 8 })
        );
    }

    #[test]
    fn sign_helpers() {
        assert!(Money::zero().is_zero());
        assert!(!Money::zero().is_negative());
        assert!(!Money::zero().is_positive());
        assert!(Money::from_decimal(dec("-0.01")).unwrap().is_negative());
        assert!(Money::from_decimal(dec("0.01")).unwrap().is_positive());
    }

    #[test]
    fn serde_goes_through_validation() {
        let m: Money = serde_json::from_value(serde_json::json!("10.1")).unwrap();
        assert_eq!(serde_json::to_value(m).unwrap(), serde_json::json!("10.10"));

        let bad: Result<Money, _> = serde_json::from_value(serde_json::json!("0.001"));
        assert!(bad.is_err());
    }
}
