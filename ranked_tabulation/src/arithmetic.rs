//! Fixed-precision arithmetic for vote weights.
//!
//! Tallies, thresholds, surplus fractions and ballot weights are non-negative
//! decimals stored as an integer scaled by `10^scale`, where the scale is
//! chosen once per contest. Addition and subtraction are exact; multiplication
//! and division truncate toward zero at the scale. The engine tracks the
//! truncated remainder in a separate residual bucket, so no weight is ever
//! silently lost.

use serde::{Serialize, Serializer};
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

/// A multiplication, division or conversion exceeded the representable range
/// at the configured scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArithmeticOverflow;

/// A decimal literal could not be read back at the requested scale.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid decimal literal {literal:?} at scale {scale}")]
pub struct ParseFixedDecimalError {
    pub literal: String,
    pub scale: u8,
}

/// A non-negative decimal with a fixed number of fractional digits.
///
/// All binary operations require both operands to carry the same scale; the
/// engine guarantees this by deriving every value from the contest scale.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FixedDecimal {
    units: u128,
    scale: u8,
}

impl FixedDecimal {
    pub const MIN_SCALE: u8 = 1;
    pub const MAX_SCALE: u8 = 20;

    fn unit_factor(scale: u8) -> u128 {
        debug_assert!(scale >= Self::MIN_SCALE && scale <= Self::MAX_SCALE);
        10u128.pow(scale as u32)
    }

    pub fn zero(scale: u8) -> FixedDecimal {
        FixedDecimal { units: 0, scale }
    }

    pub fn one(scale: u8) -> FixedDecimal {
        FixedDecimal {
            units: Self::unit_factor(scale),
            scale,
        }
    }

    /// The whole number `value` expressed at the given scale.
    pub fn from_integer(value: u64, scale: u8) -> Result<FixedDecimal, ArithmeticOverflow> {
        let units = (value as u128)
            .checked_mul(Self::unit_factor(scale))
            .ok_or(ArithmeticOverflow)?;
        Ok(FixedDecimal { units, scale })
    }

    pub fn scale(&self) -> u8 {
        self.scale
    }

    pub fn is_zero(&self) -> bool {
        self.units == 0
    }

    /// The integer part, discarding all fractional digits.
    pub fn floor_integer(&self) -> u128 {
        self.units / Self::unit_factor(self.scale)
    }

    /// `floor(self / divisor)` as a plain integer. Used for whole-number
    /// winning thresholds.
    pub fn floor_div_integer(&self, divisor: u64) -> u128 {
        debug_assert!(divisor > 0);
        self.units / (Self::unit_factor(self.scale) * divisor as u128)
    }

    /// `self * rhs`, truncated toward zero at the common scale.
    pub fn mul_truncating(&self, rhs: &FixedDecimal) -> Result<FixedDecimal, ArithmeticOverflow> {
        debug_assert_eq!(self.scale, rhs.scale);
        let wide = self
            .units
            .checked_mul(rhs.units)
            .ok_or(ArithmeticOverflow)?;
        Ok(FixedDecimal {
            units: wide / Self::unit_factor(self.scale),
            scale: self.scale,
        })
    }

    /// `self / rhs`, truncated toward zero at the common scale. Division by
    /// zero is reported as an overflow rather than a panic so that a
    /// malformed contest aborts cleanly.
    pub fn div_truncating(&self, rhs: &FixedDecimal) -> Result<FixedDecimal, ArithmeticOverflow> {
        debug_assert_eq!(self.scale, rhs.scale);
        if rhs.units == 0 {
            return Err(ArithmeticOverflow);
        }
        let wide = self
            .units
            .checked_mul(Self::unit_factor(self.scale))
            .ok_or(ArithmeticOverflow)?;
        Ok(FixedDecimal {
            units: wide / rhs.units,
            scale: self.scale,
        })
    }

    /// Reads a decimal literal such as `"12"` or `"0.3333"` back at the given
    /// scale. More fractional digits than the scale allows is an error, so the
    /// conversion is lossless in both directions.
    pub fn parse_with_scale(text: &str, scale: u8) -> Result<FixedDecimal, ParseFixedDecimalError> {
        let err = || ParseFixedDecimalError {
            literal: text.to_string(),
            scale,
        };
        let (int_part, frac_part) = match text.split_once('.') {
            Some((i, f)) => (i, f),
            None => (text, ""),
        };
        if int_part.is_empty() || frac_part.len() > scale as usize {
            return Err(err());
        }
        let int_value: u128 = int_part.parse().map_err(|_| err())?;
        let mut frac_value: u128 = if frac_part.is_empty() {
            0
        } else {
            frac_part.parse().map_err(|_| err())?
        };
        for _ in frac_part.len()..scale as usize {
            frac_value = frac_value.checked_mul(10).ok_or_else(err)?;
        }
        let units = int_value
            .checked_mul(Self::unit_factor(scale))
            .and_then(|v| v.checked_add(frac_value))
            .ok_or_else(err)?;
        Ok(FixedDecimal { units, scale })
    }
}

impl Add for FixedDecimal {
    type Output = FixedDecimal;
    fn add(self, rhs: FixedDecimal) -> FixedDecimal {
        debug_assert_eq!(self.scale, rhs.scale);
        FixedDecimal {
            units: self.units + rhs.units,
            scale: self.scale,
        }
    }
}

impl AddAssign for FixedDecimal {
    fn add_assign(&mut self, rhs: FixedDecimal) {
        debug_assert_eq!(self.scale, rhs.scale);
        self.units += rhs.units;
    }
}

impl Sub for FixedDecimal {
    type Output = FixedDecimal;
    fn sub(self, rhs: FixedDecimal) -> FixedDecimal {
        debug_assert_eq!(self.scale, rhs.scale);
        FixedDecimal {
            units: self.units - rhs.units,
            scale: self.scale,
        }
    }
}

impl SubAssign for FixedDecimal {
    fn sub_assign(&mut self, rhs: FixedDecimal) {
        debug_assert_eq!(self.scale, rhs.scale);
        self.units -= rhs.units;
    }
}

impl fmt::Display for FixedDecimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let factor = Self::unit_factor(self.scale);
        let int_portion = self.units / factor;
        let frac_portion = self.units % factor;
        if frac_portion == 0 {
            write!(f, "{}", int_portion)
        } else {
            let digits = format!("{:0width$}", frac_portion, width = self.scale as usize);
            write!(f, "{}.{}", int_portion, digits.trim_end_matches('0'))
        }
    }
}

impl fmt::Debug for FixedDecimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl Serialize for FixedDecimal {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
