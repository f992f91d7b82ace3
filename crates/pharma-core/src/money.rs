//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Cents Inside, Decimals at the Edge
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Stored documents carry prices as decimal numbers (10.5, 3.75 ...)     │
//! │                                                                         │
//! │     JSON 12.345 ──► Money::from_decimal ──► 1235 cents (half away      │
//! │                                              from zero)                 │
//! │                                                                         │
//! │  All arithmetic after that boundary is integer cents, saturating at    │
//! │  the i64 bounds. Serialization writes a two-decimal number.            │
//! │                                                                         │
//! │  Unit prices are the exception: `UnitPrice` keeps the stored decimal   │
//! │  as-is (0.333 stays 0.333) and only a line total is rounded.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use pharma_core::money::Money;
//!
//! let price = Money::from_cents(1099); // $10.99
//! let line = price.multiply_quantity(3);
//! assert_eq!(line.cents(), 3297);
//!
//! // Decimal input is rounded to the cent exactly once
//! assert_eq!(Money::from_decimal(3.745).cents(), 375);
//! ```

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in cents.
///
/// ## Design Decisions
/// - **i64 (signed)**: change due may be negative (amount still owed)
/// - **Decimal serde**: persisted documents keep the `10.5` shape the
///   stored data already uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Rounds a decimal amount to the nearest cent, half away from zero.
    ///
    /// Non-finite input (NaN, ±∞) yields zero.
    ///
    /// ## Example
    /// ```rust
    /// use pharma_core::money::Money;
    ///
    /// assert_eq!(Money::from_decimal(48.75).cents(), 4875);
    /// assert_eq!(Money::from_decimal(-0.005).cents(), -1);
    /// assert_eq!(Money::from_decimal(f64::NAN).cents(), 0);
    /// ```
    pub fn from_decimal(value: f64) -> Self {
        if !value.is_finite() {
            return Money::zero();
        }
        Money(round_half_away(value * 100.0))
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the value as a decimal number (for math against raw decimals).
    #[inline]
    pub fn to_decimal(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Returns the major unit (dollars) portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit (cents) portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies money by a quantity, saturating at the i64 bounds.
    ///
    /// ## Example
    /// ```rust
    /// use pharma_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299); // $2.99
    /// assert_eq!(unit_price.multiply_quantity(3).cents(), 897);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// Multiplies money by a quantity, `None` on overflow.
    #[inline]
    pub const fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Adds two amounts, `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }
}

/// Rounds to the nearest integer, ties away from zero.
///
/// `value * 100.0` can land a hair under an exact tie (e.g. 0.285 * 100 =
/// 28.499999999999996); a relative epsilon pulls those back onto the tie.
fn round_half_away(value: f64) -> i64 {
    let nudge = value.abs() * f64::EPSILON * 4.0;
    let adjusted = if value >= 0.0 { value + nudge } else { value - nudge };
    // `as` saturates, so huge products land on i64::MAX instead of wrapping.
    adjusted.round() as i64
}

/// Largest product `round_half_away` can represent exactly; anything at or
/// beyond it saturated.
const CENTS_LIMIT: f64 = 9.2e18;

// =============================================================================
// Unit Price
// =============================================================================

/// A unit price as stored on a drug or a sale line.
///
/// Kept at full decimal precision so a catalog price of `0.333` survives a
/// load/save cycle unchanged. Rounding to the cent happens once, on the
/// line total (`round2(qty × price)`).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct UnitPrice(f64);

impl UnitPrice {
    /// Creates a unit price from a decimal; non-finite input yields zero.
    pub fn new(value: f64) -> Self {
        if value.is_finite() {
            UnitPrice(value)
        } else {
            UnitPrice(0.0)
        }
    }

    pub fn from_cents(cents: i64) -> Self {
        UnitPrice(cents as f64 / 100.0)
    }

    #[inline]
    pub fn value(&self) -> f64 {
        self.0
    }

    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0 < 0.0
    }

    /// Unrounded `qty × price`.
    #[inline]
    pub fn raw_total(&self, qty: i64) -> f64 {
        self.0 * qty as f64
    }

    /// `round2(qty × price)`, saturating for absurd quantities.
    ///
    /// ## Example
    /// ```rust
    /// use pharma_core::money::UnitPrice;
    ///
    /// assert_eq!(UnitPrice::new(0.333).line_total(3).cents(), 100);
    /// assert_eq!(UnitPrice::from_cents(299).line_total(3).cents(), 897);
    /// ```
    pub fn line_total(&self, qty: i64) -> Money {
        Money::from_decimal(self.raw_total(qty))
    }

    /// `round2(qty × price)`, or `None` when the total does not fit in cents.
    pub fn checked_line_total(&self, qty: i64) -> Option<Money> {
        let cents = self.raw_total(qty) * 100.0;
        if cents.abs() >= CENTS_LIMIT {
            return None;
        }
        Some(self.line_total(qty))
    }
}

impl From<Money> for UnitPrice {
    fn from(money: Money) -> Self {
        UnitPrice::from_cents(money.cents())
    }
}

impl fmt::Display for UnitPrice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = Money::from_decimal(self.0);
        if rounded.to_decimal() == self.0 {
            write!(f, "{}", rounded)
        } else {
            let sign = if self.0 < 0.0 { "-" } else { "" };
            write!(f, "{}${}", sign, self.0.abs())
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows money with two decimals. UI formatting (symbols, locale)
/// lives in `EngineConfig::format_currency`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.dollars().abs(),
            self.cents_part()
        )
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(self.0.saturating_neg())
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.multiply_quantity(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Serde: decimal numbers on the wire
// =============================================================================

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0 % 100 == 0 {
            serializer.serialize_i64(self.0 / 100)
        } else {
            serializer.serialize_f64(self.to_decimal())
        }
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(MoneyVisitor)
    }
}

struct MoneyVisitor;

impl<'de> Visitor<'de> for MoneyVisitor {
    type Value = Money;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a decimal amount as a number or numeric string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
        Ok(Money(v.saturating_mul(100)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
        Ok(Money(i64::try_from(v).unwrap_or(i64::MAX).saturating_mul(100)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Money, E> {
        Ok(Money::from_decimal(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Money, E> {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            return Ok(Money::zero());
        }
        trimmed
            .parse::<f64>()
            .map(Money::from_decimal)
            .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Money, E> {
        Ok(Money::zero())
    }
}

impl Serialize for UnitPrice {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0.fract() == 0.0 && self.0.abs() < 9.0e15 {
            serializer.serialize_i64(self.0 as i64)
        } else {
            serializer.serialize_f64(self.0)
        }
    }
}

impl<'de> Deserialize<'de> for UnitPrice {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(UnitPriceVisitor)
    }
}

struct UnitPriceVisitor;

impl<'de> Visitor<'de> for UnitPriceVisitor {
    type Value = UnitPrice;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a unit price as a number or numeric string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<UnitPrice, E> {
        Ok(UnitPrice::new(v as f64))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<UnitPrice, E> {
        Ok(UnitPrice::new(v as f64))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<UnitPrice, E> {
        Ok(UnitPrice::new(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<UnitPrice, E> {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            return Ok(UnitPrice::default());
        }
        trimmed
            .parse::<f64>()
            .map(UnitPrice::new)
            .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
    }

    fn visit_unit<E: de::Error>(self) -> Result<UnitPrice, E> {
        Ok(UnitPrice::default())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
