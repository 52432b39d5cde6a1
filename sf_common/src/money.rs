use std::{
    fmt::Display,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const DEFAULT_CURRENCY_CODE: &str = "EUR";

//--------------------------------------       Money         ---------------------------------------------------------
/// An amount of money in the minor unit of its currency (e.g. cents).
///
/// Money is always an integer, so totals computed from line items are exact. The currency is carried alongside the
/// amount by the owning record, not by this type.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct Money(i64);

op!(binary Money, Add, add);
op!(binary Money, Sub, sub);
op!(inplace Money, AddAssign, add_assign);
op!(inplace Money, SubAssign, sub_assign);
op!(unary Money, Neg, neg);

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented as a money amount: {0}")]
pub struct MoneyConversionError(String);

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl TryFrom<u64> for Money {
    type Error = MoneyConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(MoneyConversionError(format!("Value {value} is too large to convert to Money")))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

/// Parses decimal strings such as `"12"`, `"12.5"` or `"12.34"` into minor units. More than two decimal places is an
/// error, since it cannot be represented exactly.
impl FromStr for Money {
    type Err = MoneyConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let (whole, frac) = digits.split_once('.').unwrap_or((digits, ""));
        if whole.is_empty() || frac.len() > 2 {
            return Err(MoneyConversionError(s.to_string()));
        }
        let whole = whole.parse::<i64>().map_err(|e| MoneyConversionError(format!("{s}: {e}")))?;
        let frac = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(|e| MoneyConversionError(format!("{s}: {e}")))? * 10,
            _ => frac.parse::<i64>().map_err(|e| MoneyConversionError(format!("{s}: {e}")))?,
        };
        let value = whole
            .checked_mul(100)
            .and_then(|v| v.checked_add(frac))
            .ok_or_else(|| MoneyConversionError(format!("{s} overflows")))?;
        Ok(Self(if negative { -value } else { value }))
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl Money {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn from_major(units: i64) -> Self {
        Self(units.saturating_mul(100))
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    pub fn checked_mul(self, quantity: i64) -> Option<Self> {
        self.0.checked_mul(quantity).map(Self)
    }

    /// Adds up `amounts`, or returns `None` if the total cannot be represented.
    pub fn checked_sum<I: IntoIterator<Item = Self>>(amounts: I) -> Option<Self> {
        amounts.into_iter().try_fold(Self::default(), Self::checked_add)
    }

    /// The amount with `percent` taken off, rounded down to the nearest minor unit.
    pub fn discounted(&self, percent: u8) -> Self {
        let percent = i128::from(percent.min(100));
        let off = i128::from(self.0) * percent / 100;
        // |off| <= |self.0|, so the difference always fits
        #[allow(clippy::cast_possible_truncation)]
        Self((i128::from(self.0) - off) as i64)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(Money::from(1234).to_string(), "12.34");
        assert_eq!(Money::from(5).to_string(), "0.05");
        assert_eq!(Money::from(-250).to_string(), "-2.50");
        assert_eq!(Money::from_major(7).to_string(), "7.00");
    }

    #[test]
    fn parse() {
        assert_eq!("12.34".parse::<Money>().unwrap(), Money::from(1234));
        assert_eq!("12.5".parse::<Money>().unwrap(), Money::from(1250));
        assert_eq!("3".parse::<Money>().unwrap(), Money::from(300));
        assert_eq!("-0.99".parse::<Money>().unwrap(), Money::from(-99));
        assert!("1.234".parse::<Money>().is_err());
        assert!("abc".parse::<Money>().is_err());
        assert!(".5".parse::<Money>().is_err());
    }

    #[test]
    fn arithmetic() {
        let items = [Money::from(100), Money::from(250), Money::from(5)];
        assert_eq!(Money::checked_sum(items), Some(Money::from(355)));
        assert_eq!(Money::from(199).checked_mul(3), Some(Money::from(597)));
        let mut m = Money::from(10);
        m -= Money::from(4);
        assert_eq!(m, Money::from(6));
        assert_eq!(Money::from(1000).discounted(25), Money::from(750));
        assert_eq!(Money::from(999).discounted(150), Money::from(0));
    }

    #[test]
    fn overflow_is_reported() {
        assert_eq!(Money::from(3).checked_mul(i64::MAX / 2), None);
        assert_eq!(Money::from(i64::MAX).checked_add(Money::from(1)), None);
        assert_eq!(Money::checked_sum([Money::from(i64::MAX), Money::from(1)]), None);
        assert_eq!(Money::checked_sum(Vec::new()), Some(Money::default()));
        assert_eq!(Money::from(i64::MAX).discounted(50), Money::from(i64::MAX / 2 + 1));
    }

    #[test]
    fn serializes_as_integer() {
        let json = serde_json::to_string(&Money::from(4200)).unwrap();
        assert_eq!(json, "4200");
    }
}
