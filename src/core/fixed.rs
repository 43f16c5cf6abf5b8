//! Q31.32 Fixed-Point Arithmetic
//!
//! Deterministic scalar type underneath every physics computation.
//! All operations use integer arithmetic only - no floats on the solver path.
//!
//! ## Format: Q31.32
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Bit Layout: Q31.32 (64-bit signed integer)                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │  [S][IIII...31 bits...IIII][FFFF...32 bits...FFFF]          │
//! │   │  └──── integer part ───┘└──── fraction ─────┘           │
//! │   └─ Sign bit                                               │
//! │                                                             │
//! │  Range: about ±2147483648.0                                 │
//! │  Precision: 1/2^32 ≈ 0.00000000023 units                    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Overflow rules
//!
//! - `+`, `-`, `*`, `/` and unary `-` saturate at [`FixedScalar::MIN`] / [`FixedScalar::MAX`]
//! - `fast_*` variants wrap, `overflowing_*` report, `checked_*` return `None`
//! - `/` by zero returns [`FixedScalar::MAX`]
//!
//! Transcendental functions live in [`super::trig`] and [`super::math`].

use std::fmt;
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Rem, Sub, SubAssign};

use serde::{Deserialize, Serialize};

use crate::error::PhysicsError;

/// Number of fractional bits (32)
pub const FRACTIONAL_BITS: u32 = 32;

/// Mask selecting the fractional bits of a raw value.
pub(crate) const FRACTION_MASK: i64 = 0xFFFF_FFFF;

/// Mask selecting the integer bits of a raw value.
const INTEGER_MASK: i64 = !FRACTION_MASK;

const ONE_RAW: i64 = 1 << FRACTIONAL_BITS;
const HALF_RAW: i64 = ONE_RAW >> 1;

/// Q31.32 fixed-point number stored as i64.
///
/// Equality, ordering and hashing act on the raw integer, so they are exact.
/// Serializes as the bare raw integer.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FixedScalar(i64);

impl FixedScalar {
    /// 0.0
    pub const ZERO: Self = Self(0);
    /// 1.0 (raw 2^32)
    pub const ONE: Self = Self(ONE_RAW);
    /// 2.0
    pub const TWO: Self = Self(ONE_RAW << 1);
    /// 0.5
    pub const HALF: Self = Self(HALF_RAW);
    /// Largest representable value. Also the division-by-zero result.
    pub const MAX: Self = Self(i64::MAX);
    /// Smallest representable value.
    pub const MIN: Self = Self(i64::MIN);

    /// 0.1
    pub const EN1: Self = Self::from_ratio(1, 10);
    /// 0.01
    pub const EN2: Self = Self::from_ratio(1, 100);
    /// 0.001
    pub const EN3: Self = Self::from_ratio(1, 1_000);
    /// 0.0001
    pub const EN4: Self = Self::from_ratio(1, 10_000);
    /// 0.00001
    pub const EN5: Self = Self::from_ratio(1, 100_000);
    /// 0.000001
    pub const EN6: Self = Self::from_ratio(1, 1_000_000);
    /// 0.0000001
    pub const EN7: Self = Self::from_ratio(1, 10_000_000);
    /// 0.00000001
    pub const EN8: Self = Self::from_ratio(1, 100_000_000);
    /// General-purpose small tolerance (0.0001).
    pub const EPSILON: Self = Self::EN4;

    /// π
    pub const PI: Self = Self(0x3_243F_6A88);
    /// π / 2
    pub const PI_OVER_2: Self = Self(0x1_921F_B544);
    /// 2π
    pub const PI_TIMES_2: Self = Self(0x6_487E_D511);
    /// 1 / π
    pub const PI_INV: Self = Self(0x517C_C1B7);
    /// 2 / π
    pub const PI_OVER_2_INV: Self = Self(0xA2F9_836E);
    /// ln(2)
    pub const LN2: Self = Self(0xB172_17F7);
    /// Exponent at which `pow2` saturates (31).
    pub const LOG2_MAX: Self = Self(0x1F_0000_0000);
    /// Exponent below which `pow2` underflows (-32).
    pub const LOG2_MIN: Self = Self(-0x20_0000_0000);
    /// 180 / π
    pub const RAD_TO_DEG: Self = Self(0x39_4BB8_34C8);
    /// π / 180
    pub const DEG_TO_RAD: Self = Self(0x477_D1A9);

    /// Wrap a raw Q31.32 integer.
    #[inline]
    pub const fn from_raw(raw: i64) -> Self {
        Self(raw)
    }

    /// The raw Q31.32 integer. This is the persisted form of the value.
    #[inline]
    pub const fn raw(self) -> i64 {
        self.0
    }

    /// Convert an integer.
    #[inline]
    pub const fn from_int(value: i32) -> Self {
        Self((value as i64) << FRACTIONAL_BITS)
    }

    /// `num / den` rounded to the nearest raw value (half away from zero).
    ///
    /// Integer-only, usable in constants.
    ///
    /// # Panics
    /// Panics if `den` is zero.
    pub const fn from_ratio(num: i64, den: i64) -> Self {
        let negative = (num < 0) != (den < 0);
        let n = (num as i128).abs() << FRACTIONAL_BITS;
        let d = (den as i128).abs();
        let q = (n + d / 2) / d;
        let q = if negative { -q } else { q };
        Self(q as i64)
    }

    /// Convert from f64 (setup, tests and tooling only - never on the solver path).
    #[inline]
    pub fn from_f64(value: f64) -> Self {
        Self((value * ONE_RAW as f64).round() as i64)
    }

    /// Convert to f64 (for display only).
    #[inline]
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / ONE_RAW as f64
    }

    /// Integer part, rounded toward negative infinity.
    #[inline]
    pub const fn to_int(self) -> i64 {
        self.0 >> FRACTIONAL_BITS
    }

    // =========================================================================
    // Addition / subtraction
    // =========================================================================

    /// Wrapping addition.
    #[inline]
    pub const fn fast_add(self, rhs: Self) -> Self {
        Self(self.0.wrapping_add(rhs.0))
    }

    /// Wrapping subtraction.
    #[inline]
    pub const fn fast_sub(self, rhs: Self) -> Self {
        Self(self.0.wrapping_sub(rhs.0))
    }

    /// Wrapping addition plus an overflow flag.
    #[inline]
    pub const fn overflowing_add(self, rhs: Self) -> (Self, bool) {
        let (raw, overflowed) = self.0.overflowing_add(rhs.0);
        (Self(raw), overflowed)
    }

    /// Wrapping subtraction plus an overflow flag.
    #[inline]
    pub const fn overflowing_sub(self, rhs: Self) -> (Self, bool) {
        let (raw, overflowed) = self.0.overflowing_sub(rhs.0);
        (Self(raw), overflowed)
    }

    /// Addition returning `None` on overflow.
    #[inline]
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// Subtraction returning `None` on overflow.
    #[inline]
    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    // =========================================================================
    // Multiplication
    // =========================================================================

    /// Wrapping multiplication (split multiply-accumulate truncated to 64 bits).
    #[inline]
    pub fn fast_mul(self, rhs: Self) -> Self {
        Self(split_mul(self.0, rhs.0) as i64)
    }

    /// Wrapping multiplication plus an overflow flag.
    #[inline]
    pub fn overflowing_mul(self, rhs: Self) -> (Self, bool) {
        let wide = split_mul(self.0, rhs.0);
        (Self(wide as i64), i64::try_from(wide).is_err())
    }

    /// Multiplication returning `None` on overflow.
    #[inline]
    pub fn checked_mul(self, rhs: Self) -> Option<Self> {
        i64::try_from(split_mul(self.0, rhs.0)).ok().map(Self)
    }

    // =========================================================================
    // Division
    // =========================================================================

    /// Division returning `None` for a zero divisor. Saturates on overflow.
    #[inline]
    pub fn checked_div(self, rhs: Self) -> Option<Self> {
        if rhs.0 == 0 {
            return None;
        }
        Some(Self(div_round(self.0, rhs.0)))
    }

    // =========================================================================
    // Sign, rounding
    // =========================================================================

    /// Absolute value, saturating (`abs(MIN) == MAX`).
    #[inline]
    pub const fn abs(self) -> Self {
        Self(self.0.saturating_abs())
    }

    /// Absolute value, wrapping (`fast_abs(MIN) == MIN`).
    #[inline]
    pub const fn fast_abs(self) -> Self {
        Self(self.0.wrapping_abs())
    }

    /// -1, 0 or 1.
    #[inline]
    pub const fn sign(self) -> i32 {
        self.0.signum() as i32
    }

    /// True if the raw value is exactly zero.
    #[inline]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// True if strictly below zero.
    #[inline]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Largest integer not greater than the value.
    #[inline]
    pub const fn floor(self) -> Self {
        Self(self.0 & INTEGER_MASK)
    }

    /// Smallest integer not less than the value.
    #[inline]
    pub fn ceil(self) -> Self {
        if self.0 & FRACTION_MASK != 0 {
            self.floor() + Self::ONE
        } else {
            self
        }
    }

    /// Nearest integer; exact halves go to the even neighbour.
    pub fn round(self) -> Self {
        let fraction = self.0 & FRACTION_MASK;
        let integral = self.floor();
        if fraction < HALF_RAW {
            return integral;
        }
        if fraction > HALF_RAW {
            return integral + Self::ONE;
        }
        if integral.0 & ONE_RAW == 0 {
            integral
        } else {
            integral + Self::ONE
        }
    }

    /// Digit-by-digit integer square root.
    ///
    /// Two passes over the remainder (integer bits, then the low fraction
    /// bits) so that no intermediate needs more than 64 bits.
    ///
    /// # Errors
    /// [`PhysicsError::NegativeSqrt`] if the value is negative.
    pub fn sqrt(self) -> Result<Self, PhysicsError> {
        if self.0 < 0 {
            return Err(PhysicsError::NegativeSqrt(self));
        }

        let mut num = self.0 as u64;
        let mut result: u64 = 0;
        let mut bit: u64 = 1 << 62;

        while bit > num {
            bit >>= 2;
        }

        for pass in 0..2 {
            while bit != 0 {
                let trial = result.wrapping_add(bit);
                if num >= trial {
                    num = num.wrapping_sub(trial);
                    result = (result >> 1).wrapping_add(bit);
                } else {
                    result >>= 1;
                }
                bit >>= 2;
            }

            if pass == 0 {
                if num > (1u64 << 32) - 1 {
                    // Remainder too wide to shift: fold in the half bit by hand.
                    num = num.wrapping_sub(result);
                    num = (num << 32).wrapping_sub(0x8000_0000);
                    result = (result << 32).wrapping_add(0x8000_0000);
                } else {
                    num <<= 32;
                    result <<= 32;
                }
                bit = 1 << 30;
            }
        }

        if num > result {
            result += 1;
        }

        Ok(Self(result as i64))
    }

    /// Degrees to radians.
    #[inline]
    pub fn to_radians(self) -> Self {
        self * Self::DEG_TO_RAD
    }

    /// Radians to degrees.
    #[inline]
    pub fn to_degrees(self) -> Self {
        self * Self::RAD_TO_DEG
    }
}

/// floor(x * y / 2^32) via 32-bit halves accumulated in 128 bits.
#[inline]
fn split_mul(x: i64, y: i64) -> i128 {
    let xlo = (x & FRACTION_MASK) as u64;
    let xhi = x >> FRACTIONAL_BITS;
    let ylo = (y & FRACTION_MASK) as u64;
    let yhi = y >> FRACTIONAL_BITS;

    let lolo = xlo * ylo;
    let lohi = xlo as i64 * yhi;
    let hilo = xhi * ylo as i64;
    let hihi = xhi * yhi;

    ((hihi as i128) << FRACTIONAL_BITS)
        + lohi as i128
        + hilo as i128
        + (lolo >> FRACTIONAL_BITS) as i128
}

/// Clamp a wide intermediate into the i64 range.
#[inline]
pub(crate) fn saturate(wide: i128) -> i64 {
    if wide > i64::MAX as i128 {
        i64::MAX
    } else if wide < i64::MIN as i128 {
        i64::MIN
    } else {
        wide as i64
    }
}

/// Quotient of raw values rounded half away from zero, saturating.
///
/// The magnitude is computed with one extra quotient bit and rounded by
/// `(q + 1) >> 1`, same as a long division carried one bit further.
#[inline]
fn div_round(x: i64, y: i64) -> i64 {
    let dividend = (x.unsigned_abs() as u128) << (FRACTIONAL_BITS + 1);
    let quotient = dividend / y.unsigned_abs() as u128;
    let magnitude = ((quotient + 1) >> 1) as i128;
    if (x ^ y) < 0 {
        saturate(-magnitude)
    } else {
        saturate(magnitude)
    }
}

// =============================================================================
// OPERATORS
// =============================================================================

impl Add for FixedScalar {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sub for FixedScalar {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl Mul for FixedScalar {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: Self) -> Self {
        Self(saturate(split_mul(self.0, rhs.0)))
    }
}

impl Div for FixedScalar {
    type Output = Self;
    #[inline]
    fn div(self, rhs: Self) -> Self {
        self.checked_div(rhs).unwrap_or(Self::MAX)
    }
}

impl Rem for FixedScalar {
    type Output = Self;
    /// Truncating remainder (sign follows the dividend). `x % 0 == 0`.
    #[inline]
    fn rem(self, rhs: Self) -> Self {
        if rhs.0 == 0 {
            return Self::ZERO;
        }
        Self(self.0.wrapping_rem(rhs.0))
    }
}

impl Neg for FixedScalar {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Self(self.0.saturating_neg())
    }
}

impl AddAssign for FixedScalar {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl SubAssign for FixedScalar {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl MulAssign for FixedScalar {
    #[inline]
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl DivAssign for FixedScalar {
    #[inline]
    fn div_assign(&mut self, rhs: Self) {
        *self = *self / rhs;
    }
}

impl From<i32> for FixedScalar {
    #[inline]
    fn from(value: i32) -> Self {
        Self::from_int(value)
    }
}

impl fmt::Debug for FixedScalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fixed({:.9})", self.to_f64())
    }
}

impl fmt::Display for FixedScalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}", self.to_f64())
    }
}

// =============================================================================
// TESTS
// =============================================================================
