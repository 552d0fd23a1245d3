//! Fixed-point numerical type used for outline coordinates.

use core::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

/// 32-bit signed fixed point number with 8 bits of fraction.
///
/// Outline coordinates, segment locations and stem widths are all expressed
/// in this type so that equality tests between locations are exact.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct Fixed(i32);

impl Fixed {
    /// Minimum value.
    pub const MIN: Self = Self(i32::MIN);

    /// Maximum value.
    pub const MAX: Self = Self(i32::MAX);

    /// This type's smallest representable value.
    pub const EPSILON: Self = Self(1);

    /// Zero.
    pub const ZERO: Self = Self(0);

    /// One unit.
    pub const ONE: Self = Self(1 << Self::FRACT_BITS);

    const FRACT_BITS: u32 = 8;
    const ROUND: i32 = 1 << (Self::FRACT_BITS - 1);
    const INT_MASK: i32 = !0 << Self::FRACT_BITS;

    /// Creates a value from the raw bit representation.
    pub const fn from_bits(bits: i32) -> Self {
        Self(bits)
    }

    /// Returns the raw bit representation.
    pub const fn to_bits(self) -> i32 {
        self.0
    }

    /// Creates a value from an integer.
    pub const fn from_i32(value: i32) -> Self {
        Self(value.wrapping_shl(Self::FRACT_BITS))
    }

    /// Creates a fixed point value from an f64.
    ///
    /// This operation is lossy; the float will be rounded to the nearest
    /// representable value and saturated to the representable range.
    pub fn from_f64(value: f64) -> Self {
        // `as` saturates and maps NaN to zero
        Self((value * (1 << Self::FRACT_BITS) as f64).round() as i32)
    }

    /// Returns the value as an f64.
    ///
    /// This operation is lossless.
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / (1 << Self::FRACT_BITS) as f64
    }

    /// Returns the nearest integer.
    pub fn to_i32(self) -> i32 {
        self.0.wrapping_add(Self::ROUND) >> Self::FRACT_BITS
    }

    /// Returns the nearest integer value.
    pub fn round(self) -> Self {
        Self(self.0.wrapping_add(Self::ROUND) & Self::INT_MASK)
    }

    /// Returns the largest integer less than or equal to the number.
    pub fn floor(self) -> Self {
        Self(self.0 & Self::INT_MASK)
    }

    /// Returns the absolute value of the number.
    pub fn abs(self) -> Self {
        Self(self.0.saturating_abs())
    }

    /// Returns half of the value, rounding toward negative infinity.
    pub fn half(self) -> Self {
        Self(self.0 >> 1)
    }

    /// Returns the midpoint of `self` and `other`.
    pub fn midpoint(self, other: Self) -> Self {
        Self(((self.0 as i64 + other.0 as i64) >> 1) as i32)
    }

    /// Returns true if the signs of `self` and `other` are both non-zero
    /// and differ.
    pub fn opposite_sign(self, other: Self) -> bool {
        (self.0 < 0 && other.0 > 0) || (self.0 > 0 && other.0 < 0)
    }

    /// Division that returns `None` on a zero divisor.
    pub fn checked_div(self, other: Self) -> Option<Self> {
        if other.0 == 0 {
            return None;
        }
        let quotient = ((self.0 as i64) << Self::FRACT_BITS) / other.0 as i64;
        Some(Self(saturate(quotient)))
    }

    /// Saturating addition.
    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Saturating subtraction.
    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }
}

fn saturate(value: i64) -> i32 {
    value.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

impl Add for Fixed {
    type Output = Self;
    #[inline(always)]
    fn add(self, other: Self) -> Self {
        // same overflow semantics as std: panic in debug, wrap in release
        Self(self.0 + other.0)
    }
}

impl AddAssign for Fixed {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Sub for Fixed {
    type Output = Self;
    #[inline(always)]
    fn sub(self, other: Self) -> Self {
        Self(self.0 - other.0)
    }
}

impl SubAssign for Fixed {
    fn sub_assign(&mut self, other: Self) {
        *self = *self - other;
    }
}

impl Neg for Fixed {
    type Output = Self;
    #[inline(always)]
    fn neg(self) -> Self {
        Self(self.0.wrapping_neg())
    }
}

impl Mul for Fixed {
    type Output = Self;
    fn mul(self, other: Self) -> Self {
        Self(saturate((self.0 as i64 * other.0 as i64) >> Self::FRACT_BITS))
    }
}

impl Mul<i32> for Fixed {
    type Output = Self;
    fn mul(self, other: i32) -> Self {
        Self(saturate(self.0 as i64 * other as i64))
    }
}

/// Integer division; a zero divisor yields zero.
impl Div<i32> for Fixed {
    type Output = Self;
    fn div(self, other: i32) -> Self {
        if other == 0 {
            return Self::ZERO;
        }
        Self(self.0 / other)
    }
}

impl core::fmt::Display for Fixed {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        self.to_f64().fmt(f)
    }
}

impl core::fmt::Debug for Fixed {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        self.to_f64().fmt(f)
    }
}

// Serialized as a plain number in font units so configuration files stay
// readable.
#[cfg(feature = "serde")]
impl serde::Serialize for Fixed {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_f64())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Fixed {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        <f64 as serde::Deserialize>::deserialize(deserializer).map(Self::from_f64)
    }
}
