use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const BRL_CURRENCY_CODE: &str = "BRL";
pub const BRL_CURRENCY_CODE_LOWER: &str = "brl";

//--------------------------------------        Brl          ---------------------------------------------------------

/// An amount of Brazilian Reais, stored as an integer number of centavos.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Brl(i64);

op!(binary Brl, Add, add);
op!(binary Brl, Sub, sub);
op!(inplace Brl, SubAssign, sub_assign);
op!(unary Brl, Neg, neg);

impl Mul<i64> for Brl {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Brl {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in centavos: {0}")]
pub struct BrlConversionError(String);

impl From<i64> for Brl {
    fn from(cents: i64) -> Self {
        Self(cents)
    }
}

impl PartialEq for Brl {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Brl {}

impl TryFrom<f64> for Brl {
    type Error = BrlConversionError;

    /// Converts a floating-point amount of Reais (as delivered in marketplace JSON) to centavos,
    /// rounding to the nearest centavo.
    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() {
            return Err(BrlConversionError(format!("{value} is not a finite amount")));
        }
        let cents = (value * 100.0).round();
        if cents.abs() >= i64::MAX as f64 {
            return Err(BrlConversionError(format!("{value} is too large to convert to centavos")));
        }
        #[allow(clippy::cast_possible_truncation)]
        Ok(Self(cents as i64))
    }
}

impl Display for Brl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let cents = self.0.abs();
        write!(f, "{sign}R$ {},{:02}", cents / 100, cents % 100)
    }
}

impl Brl {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn from_reais(reais: i64) -> Self {
        Self(reais * 100)
    }

    /// The amount as a floating-point number of Reais.
    pub fn to_f64(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Divides the amount into `n` equal parts, rounding to the nearest centavo.
    /// Returns the amount unchanged when `n < 1`.
    pub fn split(&self, n: i64) -> Self {
        if n < 1 {
            return *self;
        }
        #[allow(clippy::cast_possible_truncation)]
        Self((self.0 as f64 / n as f64).round() as i64)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn display_uses_comma_decimals() {
        assert_eq!(Brl::from(12990).to_string(), "R$ 129,90");
        assert_eq!(Brl::from(5).to_string(), "R$ 0,05");
        assert_eq!(Brl::from(-1550).to_string(), "-R$ 15,50");
        assert_eq!(Brl::from_reais(1234).to_string(), "R$ 1234,00");
    }

    #[test]
    fn converts_from_marketplace_floats() {
        assert_eq!(Brl::try_from(129.9).unwrap(), Brl::from(12990));
        assert_eq!(Brl::try_from(0.1 + 0.2).unwrap(), Brl::from(30));
        assert!(Brl::try_from(f64::NAN).is_err());
        assert!(Brl::try_from(f64::INFINITY).is_err());
    }

    #[test]
    fn splits_with_centavo_rounding() {
        assert_eq!(Brl::from(10000).split(3), Brl::from(3333));
        assert_eq!(Brl::from(20000).split(3), Brl::from(6667));
        assert_eq!(Brl::from(10000).split(0), Brl::from(10000));
    }

    #[test]
    fn sums_and_scales() {
        let total: Brl = [Brl::from(100), Brl::from(250), Brl::from(50)].into_iter().sum();
        assert_eq!(total, Brl::from(400));
        assert_eq!(Brl::from(250) * 4, Brl::from(1000));
    }
}
