//! Deterministic fixed-point helpers for representing percentages and rates
//! without floats.
//!
//! Values are stored as integers scaled by [`SCALE`] (`10^18`) so that
//! `1.0 == SCALE` and `0.5 == SCALE / 2`. Every product is computed as
//! multiply-then-divide and truncates toward zero, so boundary results are
//! reproducible bit-for-bit.

use core::fmt;
use core::str::FromStr;
use num_bigint::BigUint;
use num_traits::ToPrimitive;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Token amount in base units.
pub type Amount = u128;

/// Number of fractional decimal digits carried by [`FixedPoint`].
pub const DECIMALS: u32 = 18;

/// Fixed-point unit representing 100%.
pub const SCALE: u128 = 10u128.pow(DECIMALS);

/// Errors produced when parsing a decimal string into a [`FixedPoint`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FixedPointError {
    #[error("fixed-point value is empty")]
    Empty,
    #[error("invalid character in fixed-point value {0:?}")]
    InvalidDigit(String),
    #[error("fixed-point value has more than {DECIMALS} fractional digits")]
    TooPrecise,
    #[error("fixed-point value does not fit in 128 bits")]
    Overflow,
}

/// Compute `floor(a * b / d)` without intermediate overflow.
///
/// Returns `None` when `d == 0` or when the final quotient does not fit in
/// `u128`.
pub fn mul_div(a: u128, b: u128, d: u128) -> Option<u128> {
    if d == 0 {
        return None;
    }
    if let Some(product) = a.checked_mul(b) {
        return Some(product / d);
    }

    let wide = BigUint::from(a) * BigUint::from(b) / BigUint::from(d);
    wide.to_u128()
}

/// Scaled-integer fraction with 18 decimal places.
///
/// Serialized as a decimal string (`"0.25"`) so configuration files and JSON
/// snapshots stay exact and human readable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FixedPoint(u128);

impl FixedPoint {
    pub const ZERO: Self = Self(0);
    pub const ONE: Self = Self(SCALE);

    /// Wrap a raw scaled integer.
    pub const fn from_raw(raw: u128) -> Self {
        Self(raw)
    }

    /// Whole percentage points (`40` → `0.40`).
    pub const fn from_percent(percent: u32) -> Self {
        Self(percent as u128 * (SCALE / 100))
    }

    /// Basis points (`250` → `0.025`).
    pub const fn from_bps(bps: u32) -> Self {
        Self(bps as u128 * (SCALE / 10_000))
    }

    /// The underlying scaled integer.
    pub const fn raw(self) -> u128 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// True when the value is strictly greater than 1.0.
    pub const fn exceeds_one(self) -> bool {
        self.0 > SCALE
    }

    /// `floor(amount * self / SCALE)`.
    pub fn apply(self, amount: Amount) -> Option<Amount> {
        mul_div(amount, self.0, SCALE)
    }

    /// Like [`apply`](Self::apply), but clamps to `Amount::MAX` on overflow.
    pub fn saturating_apply(self, amount: Amount) -> Amount {
        self.apply(amount).unwrap_or(Amount::MAX)
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }
}

impl fmt::Display for FixedPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / SCALE;
        let fractional = self.0 % SCALE;

        if fractional == 0 {
            write!(f, "{}", whole)
        } else {
            let mut frac_str = format!("{fractional:018}");
            while frac_str.ends_with('0') {
                frac_str.pop();
            }
            write!(f, "{}.{}", whole, frac_str)
        }
    }
}

impl FromStr for FixedPoint {
    type Err = FixedPointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(FixedPointError::Empty);
        }

        let (whole, fractional) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };
        if whole.is_empty() && fractional.is_empty() {
            return Err(FixedPointError::Empty);
        }
        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(whole) || !all_digits(fractional) {
            return Err(FixedPointError::InvalidDigit(s.to_string()));
        }
        if fractional.len() > DECIMALS as usize {
            return Err(FixedPointError::TooPrecise);
        }

        let whole_value: u128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| FixedPointError::Overflow)?
        };
        let fractional_value: u128 = if fractional.is_empty() {
            0
        } else {
            let padding = DECIMALS - fractional.len() as u32;
            let digits: u128 = fractional.parse().map_err(|_| FixedPointError::Overflow)?;
            digits * 10u128.pow(padding)
        };

        whole_value
            .checked_mul(SCALE)
            .and_then(|scaled| scaled.checked_add(fractional_value))
            .map(Self)
            .ok_or(FixedPointError::Overflow)
    }
}

impl Serialize for FixedPoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DecimalRepr {
    Text(String),
    Whole(u64),
}

impl<'de> Deserialize<'de> for FixedPoint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match DecimalRepr::deserialize(deserializer)? {
            DecimalRepr::Text(text) => text.parse().map_err(serde::de::Error::custom),
            DecimalRepr::Whole(whole) => (whole as u128)
                .checked_mul(SCALE)
                .map(FixedPoint)
                .ok_or_else(|| serde::de::Error::custom(FixedPointError::Overflow)),
        }
    }
}

/// Serde adapter for [`Amount`] values that must survive formats limited to
/// 64-bit integers (TOML, environment variables). Written as a decimal
/// string, read from either a string or an integer.
pub mod amount_string {
    use super::Amount;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum AmountRepr {
        Text(String),
        Int(u64),
    }

    pub fn serialize<S: Serializer>(amount: &Amount, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&amount.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Amount, D::Error> {
        match AmountRepr::deserialize(deserializer)? {
            AmountRepr::Text(text) => text
                .trim()
                .replace('_', "")
                .parse()
                .map_err(serde::de::Error::custom),
            AmountRepr::Int(value) => Ok(value as Amount),
        }
    }
}
