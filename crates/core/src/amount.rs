//! Amount - Non-negative decimal wrapper for ledger values
//!
//! Every value moved through FlightSure (stakes, premiums, oracle fees,
//! payouts) is denominated in ether units and MUST be non-negative.
//! This is enforced at the type level.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Number of decimal places in one ether (1 wei = 10^-18 ether)
pub const WEI_SCALE: u32 = 18;

/// Errors that can occur when working with amounts
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("Amount cannot be negative: {0}")]
    NegativeAmount(Decimal),

    #[error("Amount overflow")]
    Overflow,
}

/// A non-negative amount of ether.
///
/// # Invariant
/// The inner value is always >= 0. This is enforced by the constructor.
///
/// # Example
/// ```
/// use flightsure_core::Amount;
/// use rust_decimal::Decimal;
///
/// let amount = Amount::new(Decimal::new(15, 1)).unwrap();
/// assert_eq!(amount.value(), Decimal::new(15, 1));
///
/// // Negative amounts are rejected
/// assert!(Amount::new(Decimal::new(-1, 0)).is_err());
///
/// // One ether is 10^18 wei
/// assert_eq!(Amount::ether(1), Amount::wei(1_000_000_000_000_000_000));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    /// Zero amount constant
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new Amount from a Decimal.
    ///
    /// Returns an error if the value is negative.
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value < Decimal::ZERO {
            Err(AmountError::NegativeAmount(value))
        } else {
            Ok(Self(value))
        }
    }

    /// Whole ether units
    pub fn ether(units: u64) -> Self {
        Self(Decimal::from(units))
    }

    /// Smallest denomination (10^-18 ether)
    pub fn wei(wei: u64) -> Self {
        // u64 always fits the 96-bit mantissa
        Self(Decimal::from_i128_with_scale(i128::from(wei), WEI_SCALE).normalize())
    }

    /// Wei counts beyond `u64`; fails once the mantissa exceeds 96 bits
    pub fn try_from_wei(wei: u128) -> Result<Self, AmountError> {
        let mantissa = i128::try_from(wei).map_err(|_| AmountError::Overflow)?;
        let value = Decimal::try_from_i128_with_scale(mantissa, WEI_SCALE)
            .map_err(|_| AmountError::Overflow)?;
        Ok(Self(value.normalize()))
    }

    /// Get the inner Decimal value
    #[inline]
    pub const fn value(&self) -> Decimal {
        self.0
    }

    /// Check if the amount is zero
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checked addition - returns None on overflow
    pub fn checked_add(&self, other: &Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    /// Checked subtraction - returns None if result would be negative
    pub fn checked_sub(&self, other: &Amount) -> Option<Amount> {
        let result = self.0.checked_sub(other.0)?;
        if result < Decimal::ZERO {
            None
        } else {
            Some(Amount(result))
        }
    }

    /// Scale by a non-negative factor (e.g. a payout multiplier)
    pub fn checked_mul(&self, factor: Decimal) -> Option<Amount> {
        if factor < Decimal::ZERO {
            return None;
        }
        self.0.checked_mul(factor).map(Amount)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ETH", self.0.normalize())
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl Default for Amount {
    fn default() -> Self {
        Self::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_amount_negative_rejected() {
        let result = Amount::new(dec!(-0.5));
        assert!(matches!(result, Err(AmountError::NegativeAmount(_))));
    }

    #[test]
    fn test_wei_precision() {
        let one_wei = Amount::wei(1);
        assert_eq!(one_wei.value(), dec!(0.000000000000000001));

        let almost_ten = Amount::ether(10).checked_sub(&one_wei).unwrap();
        assert!(almost_ten < Amount::ether(10));
        assert_eq!(almost_ten.checked_add(&one_wei).unwrap(), Amount::ether(10));
    }

    #[test]
    fn test_wei_mantissa_boundary() {
        let max_mantissa: u128 = (1 << 96) - 1;
        let largest = Amount::try_from_wei(max_mantissa).unwrap();
        assert!(largest > Amount::ether(1));

        assert_eq!(Amount::try_from_wei(1 << 96), Err(AmountError::Overflow));
        assert_eq!(Amount::try_from_wei(u128::MAX / 2), Err(AmountError::Overflow));
        assert_eq!(Amount::try_from_wei(u128::MAX), Err(AmountError::Overflow));

        assert_eq!(Amount::try_from_wei(u128::from(u64::MAX)).unwrap(), Amount::wei(u64::MAX));
    }

    #[test]
    fn test_checked_sub_prevents_negative() {
        assert!(Amount::ether(1).checked_sub(&Amount::ether(2)).is_none());
    }

    #[test]
    fn test_checked_mul_payout() {
        let half = Amount::new(dec!(0.5)).unwrap();
        assert_eq!(half.checked_mul(dec!(1.5)).unwrap().value(), dec!(0.75));
        assert!(half.checked_mul(dec!(-1)).is_none());
    }

    #[test]
    fn test_display_normalizes_scale() {
        let amount = Amount::new(dec!(1.500)).unwrap();
        assert_eq!(amount.to_string(), "1.5 ETH");
    }

    #[test]
    fn test_serde_rejects_negative() {
        let parsed: Result<Amount, _> = serde_json::from_str("\"-1\"");
        assert!(parsed.is_err());

        let parsed: Amount = serde_json::from_str("\"0.25\"").unwrap();
        assert_eq!(parsed.value(), dec!(0.25));
    }
}
