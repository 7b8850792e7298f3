// core/src/money.rs

//! Fixed-point currency stored as whole cents.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;
use std::str::FromStr;
use thiserror::Error;

/// Largest price a form may set: ten significant digits, two of them cents.
const MAX_PARSED_CENTS: i64 = 9_999_999_999;
const CENT_SCALE: u32 = 2;

/// An amount of money in cents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, sqlx::Type)]
#[sqlx(transparent)]
pub struct Money(i64);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyParseError {
  #[error("amount is empty")]
  Empty,
  #[error("amount '{0}' is not a valid decimal number")]
  Malformed(String),
  #[error("amount '{0}' has more than two decimal places")]
  TooPrecise(String),
  #[error("amount '{0}' has more than 10 digits")]
  TooLarge(String),
}

impl Money {
  pub const ZERO: Money = Money(0);

  pub const fn from_cents(cents: i64) -> Self {
    Money(cents)
  }

  pub const fn cents(self) -> i64 {
    self.0
  }

  pub fn is_zero(self) -> bool {
    self.0 == 0
  }

  /// `self * quantity`, or `None` when the product does not fit.
  pub fn checked_mul(self, quantity: u32) -> Option<Money> {
    self.0.checked_mul(i64::from(quantity)).map(Money)
  }

  pub fn checked_add(self, rhs: Money) -> Option<Money> {
    self.0.checked_add(rhs.0).map(Money)
  }

  /// Sums `amounts`, or `None` on overflow.
  pub fn checked_sum<I>(amounts: I) -> Option<Money>
  where
    I: IntoIterator<Item = Money>,
  {
    amounts
      .into_iter()
      .try_fold(Money::ZERO, |acc, amount| acc.checked_add(amount))
  }

  pub fn to_decimal(self) -> Decimal {
    Decimal::new(self.0, CENT_SCALE)
  }
}

impl Add for Money {
  type Output = Money;

  fn add(self, rhs: Money) -> Money {
    Money(self.0.saturating_add(rhs.0))
  }
}

impl Sum for Money {
  fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
    iter.fold(Money::ZERO, Add::add)
  }
}

impl<'a> Sum<&'a Money> for Money {
  fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
    iter.copied().sum()
  }
}

impl fmt::Display for Money {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Display::fmt(&self.to_decimal(), f)
  }
}

impl FromStr for Money {
  type Err = MoneyParseError;

  /// Parses `12`, `12.5` or `12.50`. Signs, exponents and separators are rejected.
  fn from_str(raw: &str) -> Result<Self, Self::Err> {
    let s = raw.trim();
    if s.is_empty() {
      return Err(MoneyParseError::Empty);
    }
    let malformed = || MoneyParseError::Malformed(s.to_string());
    if !s.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
      return Err(malformed());
    }

    let amount = Decimal::from_str_exact(s).map_err(|_| malformed())?;
    if amount.is_sign_negative() {
      return Err(malformed());
    }
    if amount.scale() > CENT_SCALE {
      return Err(MoneyParseError::TooPrecise(s.to_string()));
    }

    let cents = amount
      .checked_mul(Decimal::new(100, 0))
      .and_then(|value| value.to_i64())
      .ok_or_else(|| MoneyParseError::TooLarge(s.to_string()))?;
    if cents > MAX_PARSED_CENTS {
      return Err(MoneyParseError::TooLarge(s.to_string()));
    }
    Ok(Money(cents))
  }
}

impl Serialize for Money {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}

impl<'de> Deserialize<'de> for Money {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(de::Error::custom)
  }
}
