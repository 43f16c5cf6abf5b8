//! Trigonometry on [`FixedScalar`].
//!
//! `sin`/`cos`/`tan` reduce the angle into the first quadrant and read a
//! table spanning [0, π/2], interpolating linearly between neighbours.
//! `atan` sums a series; `asin`/`acos` are built on it.
//!
//! ```text
//! angle ──► % 2π ──► ≥ π ? flip vertical ──► ≥ π/2 ? mirror horizontal ──► table
//! ```
//!
//! The tables are generated on first use from an integer Taylor series
//! evaluated in Q2.62, so every host builds bit-identical tables.

use once_cell::sync::Lazy;

use super::fixed::{saturate, FixedScalar, FRACTIONAL_BITS, FRACTION_MASK};
use crate::error::PhysicsError;

/// Number of entries in the sine and tangent tables.
pub const LUT_SIZE: usize = (FixedScalar::PI_OVER_2.raw() >> 15) as usize;

const PI: i64 = FixedScalar::PI.raw();
const PI_OVER_2: i64 = FixedScalar::PI_OVER_2.raw();
const PI_TIMES_2: i64 = FixedScalar::PI_TIMES_2.raw();

/// π/2 in Q2.62.
const HALF_PI_Q62: i128 = 0x6487_ED51_10B4_611A;
const Q62_ONE: i128 = 1 << 62;

static SIN_LUT: Lazy<Vec<i64>> = Lazy::new(|| {
    (0..LUT_SIZE)
        .map(|i| q62_to_raw(sin_q62(table_angle_q62(i))))
        .collect()
});

static TAN_LUT: Lazy<Vec<i64>> = Lazy::new(|| {
    (0..LUT_SIZE)
        .map(|i| {
            let angle = table_angle_q62(i);
            let (sin, cos) = (sin_q62(angle), cos_q62(angle));
            if cos <= 0 {
                return i64::MAX;
            }
            saturate(((sin << FRACTIONAL_BITS) + cos / 2) / cos)
        })
        .collect()
});

// =============================================================================
// TABLE GENERATION
// =============================================================================

#[inline]
fn table_angle_q62(index: usize) -> i128 {
    HALF_PI_Q62 * index as i128 / (LUT_SIZE as i128 - 1)
}

#[inline]
fn q62_to_raw(value: i128) -> i64 {
    ((value + (1 << 29)) >> 30) as i64
}

/// Taylor series for sin on [0, π/2], Q2.62 in and out.
fn sin_q62(x: i128) -> i128 {
    let x_sq = (x * x) >> 62;
    let mut term = x;
    let mut sum = x;
    let mut n: i128 = 1;
    loop {
        term = -((term * x_sq) >> 62) / ((2 * n) * (2 * n + 1));
        if term == 0 {
            return sum;
        }
        sum += term;
        n += 1;
    }
}

/// Taylor series for cos on [0, π/2], Q2.62 in and out.
fn cos_q62(x: i128) -> i128 {
    let x_sq = (x * x) >> 62;
    let mut term = Q62_ONE;
    let mut sum = Q62_ONE;
    let mut n: i128 = 1;
    loop {
        term = -((term * x_sq) >> 62) / ((2 * n - 1) * (2 * n));
        if term == 0 {
            return sum;
        }
        sum += term;
        n += 1;
    }
}

// =============================================================================
// LOOKUP
// =============================================================================

/// Position of a first-quadrant angle in table space, Q32.
#[inline]
fn lut_position(angle: i64) -> i128 {
    ((angle as i128 * (LUT_SIZE as i128 - 1)) << FRACTIONAL_BITS) / PI_OVER_2 as i128
}

/// Linear interpolation between the two table entries around `angle`.
fn interpolate(table: &[i64], angle: i64) -> i64 {
    let position = lut_position(angle);
    let index = (position >> FRACTIONAL_BITS) as usize;
    let last = table.len() - 1;
    if index >= last {
        return table[last];
    }
    let fraction = position & FRACTION_MASK as i128;
    let low = table[index] as i128;
    let high = table[index + 1] as i128;
    saturate(low + (((high - low) * fraction) >> FRACTIONAL_BITS))
}

/// Reduce an angle to [0, π/2) and report the mirroring it went through.
///
/// Uses a truncating remainder: negative inputs get 2π added back, so an
/// exact negative multiple of 2π lands on 2π rather than 0.
///
/// Returns `(angle, flip_horizontal, flip_vertical)`.
fn clamp_sin_value(angle: i64) -> (i64, bool, bool) {
    let mut clamped_2pi = angle % PI_TIMES_2;
    if angle < 0 {
        clamped_2pi += PI_TIMES_2;
    }

    let flip_vertical = clamped_2pi >= PI;

    let mut clamped_pi = clamped_2pi;
    while clamped_pi >= PI {
        clamped_pi -= PI;
    }

    let flip_horizontal = clamped_pi >= PI_OVER_2;

    let mut clamped_pi_over_2 = clamped_pi;
    if flip_horizontal {
        clamped_pi_over_2 -= PI_OVER_2;
    }

    (clamped_pi_over_2, flip_horizontal, flip_vertical)
}

/// cos(x) = sin(x + π/2), shifted by -3π/2 for positive x to stay in range.
#[inline]
fn cos_to_sin_angle(x: i64) -> i64 {
    x + if x > 0 { -PI - PI_OVER_2 } else { PI_OVER_2 }
}

impl FixedScalar {
    /// Sine with linear interpolation between table entries.
    pub fn sin(self) -> Self {
        let (angle, flip_horizontal, flip_vertical) = clamp_sin_value(self.raw());
        let angle = if flip_horizontal { PI_OVER_2 - angle } else { angle };
        let value = Self::from_raw(interpolate(&SIN_LUT, angle));
        if flip_vertical {
            -value
        } else {
            value
        }
    }

    /// Sine from the nearest lower table entry, no interpolation.
    pub fn fast_sin(self) -> Self {
        let (angle, flip_horizontal, flip_vertical) = clamp_sin_value(self.raw());
        let index = ((angle >> 15) as usize).min(LUT_SIZE - 1);
        let index = if flip_horizontal { LUT_SIZE - 1 - index } else { index };
        let value = Self::from_raw(SIN_LUT[index]);
        if flip_vertical {
            -value
        } else {
            value
        }
    }

    /// Cosine via [`FixedScalar::sin`].
    #[inline]
    pub fn cos(self) -> Self {
        Self::from_raw(cos_to_sin_angle(self.raw())).sin()
    }

    /// Cosine via [`FixedScalar::fast_sin`].
    #[inline]
    pub fn fast_cos(self) -> Self {
        Self::from_raw(cos_to_sin_angle(self.raw())).fast_sin()
    }

    /// Tangent. Saturates to ±MAX next to ±π/2.
    pub fn tan(self) -> Self {
        let mut clamped_pi = self.raw() % PI;
        let mut flip = false;
        if clamped_pi < 0 {
            clamped_pi = -clamped_pi;
            flip = true;
        }
        if clamped_pi > PI_OVER_2 {
            flip = !flip;
            clamped_pi = PI_OVER_2 - (clamped_pi - PI_OVER_2);
        }

        let value = Self::from_raw(interpolate(&TAN_LUT, clamped_pi));
        if flip {
            -value
        } else {
            value
        }
    }

    /// Arctangent by Euler's series.
    ///
    /// At most 30 terms, stopping early once a term's raw value is zero.
    /// Arguments above 1 are inverted first. About 7 correct decimals.
    pub fn atan(self) -> Self {
        if self.is_zero() {
            return Self::ZERO;
        }

        let negative = self.is_negative();
        let mut z = if negative { -self } else { self };

        let invert = z > Self::ONE;
        if invert {
            z = Self::ONE / z;
        }

        let three = Self::from_int(3);
        let z_sq = z * z;
        let z_sq_2 = z_sq * Self::TWO;
        let z_sq_plus_one = z_sq + Self::ONE;
        let z_sq_plus_one_2 = z_sq_plus_one * Self::TWO;
        let mut dividend = z_sq_2;
        let mut divisor = z_sq_plus_one * three;

        let mut result = Self::ONE;
        let mut term = Self::ONE;
        for _ in 2..30 {
            term *= dividend / divisor;
            result += term;

            dividend += z_sq_2;
            divisor += z_sq_plus_one_2;

            if term.is_zero() {
                break;
            }
        }

        result = result * z / z_sq_plus_one;

        if invert {
            result = Self::PI_OVER_2 - result;
        }
        if negative {
            -result
        } else {
            result
        }
    }

    /// Four-quadrant arctangent of `self / x`, in (-π, π].
    pub fn atan2(self, x: Self) -> Self {
        let y = self;
        if x.is_zero() {
            return match y.sign() {
                1 => Self::PI_OVER_2,
                -1 => -Self::PI_OVER_2,
                _ => Self::ZERO,
            };
        }

        let angle = (y / x).atan();
        if x > Self::ZERO {
            angle
        } else if y >= Self::ZERO {
            angle + Self::PI
        } else {
            angle - Self::PI
        }
    }

    /// Rational approximation of atan2 (error up to about 0.005 rad).
    pub fn fast_atan2(self, x: Self) -> Self {
        let y = self;
        if x.is_zero() {
            return match y.sign() {
                1 => Self::PI_OVER_2,
                -1 => -Self::PI_OVER_2,
                _ => Self::ZERO,
            };
        }

        let z = y / x;
        let sm = Self::EN2 * Self::from_int(28);
        let denominator = Self::ONE + sm * z * z;
        if denominator == Self::MAX {
            return if y < Self::ZERO {
                -Self::PI_OVER_2
            } else {
                Self::PI_OVER_2
            };
        }

        if z.abs() < Self::ONE {
            let atan = z / denominator;
            if x < Self::ZERO {
                if y < Self::ZERO {
                    return atan - Self::PI;
                }
                return atan + Self::PI;
            }
            atan
        } else {
            let atan = Self::PI_OVER_2 - z / (z * z + sm);
            if y < Self::ZERO {
                return atan - Self::PI;
            }
            atan
        }
    }

    /// Arccosine in [0, π].
    ///
    /// # Errors
    /// [`PhysicsError::AcosOutOfRange`] outside [-1, 1].
    pub fn acos(self) -> Result<Self, PhysicsError> {
        if self < -Self::ONE || self > Self::ONE {
            return Err(PhysicsError::AcosOutOfRange(self));
        }
        if self.is_zero() {
            return Ok(Self::PI_OVER_2);
        }

        let root = (Self::ONE - self * self).sqrt()?;
        let result = (root / self).atan();
        Ok(if self.is_negative() {
            result + Self::PI
        } else {
            result
        })
    }

    /// Arcsine in [-π/2, π/2].
    ///
    /// # Errors
    /// [`PhysicsError::AcosOutOfRange`] outside [-1, 1].
    pub fn asin(self) -> Result<Self, PhysicsError> {
        Ok(Self::PI_OVER_2 - self.acos()?)
    }
}

// =============================================================================
// TESTS
// =============================================================================
