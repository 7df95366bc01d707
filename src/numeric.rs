//! Fixed-width numbers used across the crate.
//!
//! [`I256`] is a signed 256-bit integer stored in two's complement form on top
//! of [`U256`], which is exactly how signed ABI words look on the wire.
//! [`Amount`] is a TRX amount expressed in sun, the indivisible unit.

use crate::U256;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of sun in one TRX.
pub const SUN_PER_TRX: u64 = 1_000_000;
/// Number of fraction digits of a TRX amount.
pub const TRX_DECIMALS: usize = 6;

fn twos_negate(value: U256) -> U256 {
    (!value).overflowing_add(U256::one()).0
}

/// Signed 256-bit integer in two's complement representation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct I256(U256);

impl I256 {
    /// Zero.
    pub const ZERO: Self = Self(U256::zero());

    pub const fn from_raw(raw: U256) -> Self {
        //! Interpret raw 256 bits as a two's complement number.
        Self(raw)
    }
    pub const fn into_raw(self) -> U256 {
        //! Raw two's complement bits.
        self.0
    }

    pub fn from_i128(value: i128) -> Self {
        //! Create from a primitive signed integer.
        let magnitude = U256::from(value.unsigned_abs());
        if value < 0 {
            Self(twos_negate(magnitude))
        } else {
            Self(magnitude)
        }
    }

    pub fn from_sign_magnitude(negative: bool, magnitude: U256) -> Option<Self> {
        //! Create from sign and absolute value.
        //!
        //! Returns [`None`] if the value does not fit into 256 signed bits.
        let limit = U256::one() << 255;
        if negative {
            (magnitude <= limit).then(|| Self(twos_negate(magnitude)))
        } else {
            (magnitude < limit).then_some(Self(magnitude))
        }
    }

    pub fn is_negative(&self) -> bool {
        //! Check the sign bit.
        self.0.bit(255)
    }

    pub fn unsigned_abs(&self) -> U256 {
        //! Absolute value. `-2^255` maps to `2^255`, which still fits [`U256`].
        if self.is_negative() {
            twos_negate(self.0)
        } else {
            self.0
        }
    }

    pub fn abs(&self) -> Option<Self> {
        //! Absolute value as a signed integer.
        //!
        //! Returns [`None`] for `-2^255`, whose absolute value is not
        //! representable; use [`I256::unsigned_abs`] there.
        Self::from_sign_magnitude(false, self.unsigned_abs())
    }

    pub fn fits_in_bits(&self, bits: usize) -> bool {
        //! Check that `-2^(bits-1) <= self < 2^(bits-1)`.
        if bits >= 256 {
            return true;
        }
        if bits == 0 {
            return self.0.is_zero();
        }
        let bound = U256::one() << (bits - 1);
        if self.is_negative() {
            self.unsigned_abs() <= bound
        } else {
            self.0 < bound
        }
    }

    pub fn to_i128(&self) -> Option<i128> {
        //! Convert to a primitive signed integer, if it fits.
        if !self.fits_in_bits(128) {
            return None;
        }
        let magnitude = self.unsigned_abs().low_u128();
        if self.is_negative() {
            Some(0i128.wrapping_sub_unsigned(magnitude))
        } else {
            Some(magnitude as i128)
        }
    }
}

impl From<i128> for I256 {
    fn from(value: i128) -> Self {
        Self::from_i128(value)
    }
}
impl From<i64> for I256 {
    fn from(value: i64) -> Self {
        Self::from_i128(value.into())
    }
}

impl fmt::Display for I256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_negative() {
            f.write_str("-")?;
        }
        write!(f, "{}", self.unsigned_abs())
    }
}

impl FromStr for I256 {
    type Err = NumberParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let magnitude = U256::from_dec_str(digits)
            .map_err(|_| NumberParseError::InvalidNumber(s.to_string()))?;
        Self::from_sign_magnitude(negative, magnitude)
            .ok_or_else(|| NumberParseError::Overflow(s.to_string()))
    }
}

/// Failures of textual number parsing.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum NumberParseError {
    /// Not a number at all.
    #[error("not a valid number: {0:?}")]
    InvalidNumber(String),
    /// More fraction digits than the unit allows.
    #[error("too many decimal places in {0:?} (at most {TRX_DECIMALS} allowed)")]
    TooManyDecimals(String),
    /// Does not fit the target width.
    #[error("number out of range: {0:?}")]
    Overflow(String),
}

/// An amount of TRX, stored in sun.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(u64);

impl Amount {
    /// Zero amount.
    pub const ZERO: Self = Self(0);

    pub const fn from_sun(sun: u64) -> Self {
        //! Create from an amount of sun.
        Self(sun)
    }

    pub fn from_trx(trx: u64) -> Option<Self> {
        //! Create from a whole number of TRX.
        trx.checked_mul(SUN_PER_TRX).map(Self)
    }

    pub fn from_trx_str(text: &str) -> Result<Self, NumberParseError> {
        //! Parse a decimal TRX amount like `"12.5"` exactly, without floats.
        let invalid = || NumberParseError::InvalidNumber(text.to_string());
        let (whole, fraction) = match text.split_once('.') {
            Some((w, f)) => (w, f),
            None => (text, ""),
        };
        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }
        if !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        if fraction.len() > TRX_DECIMALS {
            return Err(NumberParseError::TooManyDecimals(text.to_string()));
        }
        let overflow = || NumberParseError::Overflow(text.to_string());
        let whole: u64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| overflow())?
        };
        let fraction: u64 = format!("{fraction:0<width$}", width = TRX_DECIMALS)
            .parse()
            .map_err(|_| invalid())?;
        whole
            .checked_mul(SUN_PER_TRX)
            .and_then(|w| w.checked_add(fraction))
            .map(Self)
            .ok_or_else(overflow)
    }

    pub const fn sun(&self) -> u64 {
        //! Amount in sun.
        self.0
    }

    pub const fn is_zero(&self) -> bool {
        //! Is this amount zero?
        self.0 == 0
    }

    pub fn trx_string(&self) -> String {
        //! Render in TRX with trailing zeros of the fraction stripped.
        let whole = self.0 / SUN_PER_TRX;
        let fraction = self.0 % SUN_PER_TRX;
        if fraction == 0 {
            whole.to_string()
        } else {
            let digits = format!("{fraction:0width$}", width = TRX_DECIMALS);
            format!("{whole}.{}", digits.trim_end_matches('0'))
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} sun", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_i256_small_values() {
        assert_eq!(I256::from_i128(-1).into_raw(), U256::MAX);
        assert_eq!(I256::from_i128(-1).to_i128(), Some(-1));
        assert_eq!(I256::from_i128(42).to_i128(), Some(42));
        assert_eq!(I256::from_i128(i128::MIN).to_i128(), Some(i128::MIN));
        assert_eq!(I256::from_i128(i128::MAX).to_i128(), Some(i128::MAX));
        assert!(I256::from_i128(-1).is_negative());
        assert!(!I256::ZERO.is_negative());
    }

    #[test]
    fn test_i256_abs() {
        assert_eq!(I256::from_i128(-42).abs(), Some(I256::from_i128(42)));
        assert_eq!(I256::from_i128(42).abs(), Some(I256::from_i128(42)));
        assert_eq!(I256::ZERO.abs(), Some(I256::ZERO));
        let min = I256::from_raw(U256::one() << 255);
        assert_eq!(min.abs(), None);
        assert_eq!(min.unsigned_abs(), U256::one() << 255);
    }

    #[test]
    fn test_i256_fits() {
        assert!(I256::from_i128(127).fits_in_bits(8));
        assert!(!I256::from_i128(128).fits_in_bits(8));
        assert!(I256::from_i128(-128).fits_in_bits(8));
        assert!(!I256::from_i128(-129).fits_in_bits(8));
        assert!(I256::from_raw(U256::MAX).fits_in_bits(8));
        let min = I256::from_sign_magnitude(true, U256::one() << 255).unwrap();
        assert!(min.fits_in_bits(256));
        assert!(!min.fits_in_bits(255));
        assert_eq!(min.to_i128(), None);
        assert_eq!(I256::from_sign_magnitude(false, U256::one() << 255), None);
    }

    #[test]
    fn test_i256_text() {
        assert_eq!("-1".parse::<I256>().unwrap(), I256::from_i128(-1));
        assert_eq!(I256::from_i128(-300).to_string(), "-300");
        assert_eq!(I256::from_i128(300).to_string(), "300");
        assert!("abc".parse::<I256>().is_err());
    }

    #[test]
    fn test_amount_from_trx_str() {
        assert_eq!(Amount::from_trx_str("1").unwrap().sun(), 1_000_000);
        assert_eq!(Amount::from_trx_str("1.5").unwrap().sun(), 1_500_000);
        assert_eq!(Amount::from_trx_str("0.000001").unwrap().sun(), 1);
        assert_eq!(Amount::from_trx_str(".25").unwrap().sun(), 250_000);
        assert_eq!(
            Amount::from_trx_str("0.0000001").unwrap_err(),
            NumberParseError::TooManyDecimals("0.0000001".to_string())
        );
        assert!(Amount::from_trx_str("-1").is_err());
        assert!(Amount::from_trx_str("").is_err());
        assert!(Amount::from_trx_str("1e6").is_err());
        assert_eq!(
            Amount::from_trx_str("18446744073709551615").unwrap_err(),
            NumberParseError::Overflow("18446744073709551615".to_string())
        );
    }

    #[test]
    fn test_amount_render() {
        assert_eq!(Amount::from_sun(1_500_000).trx_string(), "1.5");
        assert_eq!(Amount::from_sun(1).trx_string(), "0.000001");
        assert_eq!(Amount::from_trx(3).unwrap().trx_string(), "3");
        assert_eq!(Amount::from_trx(u64::MAX), None);
    }
}
