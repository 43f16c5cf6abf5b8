//! Scalar helpers built on [`FixedScalar`].
//!
//! Exponentials and logarithms plus the clamping/interpolation toolkit
//! used by gameplay code sitting on top of the physics core.

use super::fixed::{FixedScalar, FRACTIONAL_BITS, FRACTION_MASK};
use crate::error::PhysicsError;

// =============================================================================
// EXPONENTIALS / LOGARITHMS
// =============================================================================

/// 2 raised to `x`.
///
/// Power series for the fractional part, shift for the integer part;
/// negative exponents go through the reciprocal. At least 6 correct decimals.
/// Saturates to `MAX` from `LOG2_MAX` upward.
pub fn pow2(x: FixedScalar) -> FixedScalar {
    if x.is_zero() {
        return FixedScalar::ONE;
    }

    let negative = x.is_negative();
    let x = if negative { -x } else { x };

    if x == FixedScalar::ONE {
        return if negative {
            FixedScalar::HALF
        } else {
            FixedScalar::TWO
        };
    }
    if x >= FixedScalar::LOG2_MAX {
        return if negative {
            FixedScalar::ONE / FixedScalar::MAX
        } else {
            FixedScalar::MAX
        };
    }

    let integer_part = x.to_int() as u32;
    let fraction = FixedScalar::from_raw(x.raw() & FRACTION_MASK);

    let mut result = FixedScalar::ONE;
    let mut term = FixedScalar::ONE;
    let mut i = 1;
    while !term.is_zero() {
        term = fraction.fast_mul(term).fast_mul(FixedScalar::LN2) / FixedScalar::from_int(i);
        result += term;
        i += 1;
    }

    let result = FixedScalar::from_raw(result.raw() << integer_part);
    if negative {
        FixedScalar::ONE / result
    } else {
        result
    }
}

/// Base-2 logarithm (Turner's fast binary logarithm). At least 9 decimals.
///
/// # Errors
/// [`PhysicsError::NonPositiveLogarithm`] for `x <= 0`.
pub fn log2(x: FixedScalar) -> Result<FixedScalar, PhysicsError> {
    if x.raw() <= 0 {
        return Err(PhysicsError::NonPositiveLogarithm(x));
    }

    let one = FixedScalar::ONE.raw();
    let mut b: i64 = 1 << (FRACTIONAL_BITS - 1);
    let mut y: i64 = 0;

    let mut raw = x.raw();
    while raw < one {
        raw <<= 1;
        y -= one;
    }
    while raw >= one << 1 {
        raw >>= 1;
        y += one;
    }

    let mut z = FixedScalar::from_raw(raw);
    for _ in 0..FRACTIONAL_BITS {
        z = z.fast_mul(z);
        if z.raw() >= one << 1 {
            z = FixedScalar::from_raw(z.raw() >> 1);
            y += b;
        }
        b >>= 1;
    }

    Ok(FixedScalar::from_raw(y))
}

/// Natural logarithm. At least 7 decimals.
///
/// # Errors
/// [`PhysicsError::NonPositiveLogarithm`] for `x <= 0`.
pub fn ln(x: FixedScalar) -> Result<FixedScalar, PhysicsError> {
    Ok(log2(x)?.fast_mul(FixedScalar::LN2))
}

/// `base` raised to `exponent`. About 5 digits for moderate results.
///
/// A zero base with a negative exponent returns `MAX`.
///
/// # Errors
/// [`PhysicsError::NonPositiveLogarithm`] for a negative base with a non-zero exponent.
pub fn pow(base: FixedScalar, exponent: FixedScalar) -> Result<FixedScalar, PhysicsError> {
    if base == FixedScalar::ONE || exponent.is_zero() {
        return Ok(FixedScalar::ONE);
    }
    if base.is_zero() {
        return Ok(if exponent.is_negative() {
            FixedScalar::MAX
        } else {
            FixedScalar::ZERO
        });
    }
    Ok(pow2(exponent * log2(base)?))
}

// =============================================================================
// CLAMPING / SELECTION
// =============================================================================

/// Larger of two values.
#[inline]
pub fn max(a: FixedScalar, b: FixedScalar) -> FixedScalar {
    if a > b { a } else { b }
}

/// Smaller of two values.
#[inline]
pub fn min(a: FixedScalar, b: FixedScalar) -> FixedScalar {
    if a < b { a } else { b }
}

/// Largest of three values.
#[inline]
pub fn max3(a: FixedScalar, b: FixedScalar, c: FixedScalar) -> FixedScalar {
    max(max(a, b), c)
}

/// Clamp `value` into `[lo, hi]`. `lo` wins if the bounds cross.
#[inline]
pub fn clamp(value: FixedScalar, lo: FixedScalar, hi: FixedScalar) -> FixedScalar {
    if value < lo {
        return lo;
    }
    if value > hi {
        return hi;
    }
    value
}

/// Clamp into `[0, 1]`.
#[inline]
pub fn clamp01(value: FixedScalar) -> FixedScalar {
    clamp(value, FixedScalar::ZERO, FixedScalar::ONE)
}

/// `|a - b|`
#[inline]
pub fn distance(a: FixedScalar, b: FixedScalar) -> FixedScalar {
    (a - b).abs()
}

// =============================================================================
// INTERPOLATION
// =============================================================================

/// Linear interpolation with `amount` clamped to [0, 1].
#[inline]
pub fn lerp(a: FixedScalar, b: FixedScalar, amount: FixedScalar) -> FixedScalar {
    a + (b - a) * clamp01(amount)
}

/// Where `value` sits between `a` and `b`, clamped to [0, 1]. Zero if `a == b`.
pub fn inverse_lerp(a: FixedScalar, b: FixedScalar, value: FixedScalar) -> FixedScalar {
    if a == b {
        return FixedScalar::ZERO;
    }
    clamp01((value - a) / (b - a))
}

/// Point in a triangle from barycentric weights of the 2nd and 3rd vertex.
#[inline]
pub fn barycentric(
    value1: FixedScalar,
    value2: FixedScalar,
    value3: FixedScalar,
    amount1: FixedScalar,
    amount2: FixedScalar,
) -> FixedScalar {
    value1 + (value2 - value1) * amount1 + (value3 - value1) * amount2
}

/// Catmull-Rom spline through `value2`..`value3`.
pub fn catmull_rom(
    value1: FixedScalar,
    value2: FixedScalar,
    value3: FixedScalar,
    value4: FixedScalar,
    amount: FixedScalar,
) -> FixedScalar {
    let n = FixedScalar::from_int;
    let amount_sq = amount * amount;
    let amount_cu = amount_sq * amount;

    let linear = (value3 - value1) * amount;
    let quadratic = (n(2) * value1 - n(5) * value2 + n(4) * value3 - value4) * amount_sq;
    let cubic = (n(3) * value2 - value1 - n(3) * value3 + value4) * amount_cu;

    FixedScalar::HALF * (n(2) * value2 + linear + quadratic + cubic)
}

/// Cubic Hermite spline.
pub fn hermite(
    value1: FixedScalar,
    tangent1: FixedScalar,
    value2: FixedScalar,
    tangent2: FixedScalar,
    amount: FixedScalar,
) -> FixedScalar {
    if amount.is_zero() {
        return value1;
    }
    if amount == FixedScalar::ONE {
        return value2;
    }

    let n = FixedScalar::from_int;
    let s = amount;
    let s_sq = s * s;
    let s_cu = s_sq * s;

    (n(2) * value1 - n(2) * value2 + tangent2 + tangent1) * s_cu
        + (n(3) * value2 - n(3) * value1 - n(2) * tangent1 - tangent2) * s_sq
        + tangent1 * s
        + value1
}

/// Hermite ease between `a` and `b`, `amount` clamped to [0, 1].
#[inline]
pub fn smooth_step(a: FixedScalar, b: FixedScalar, amount: FixedScalar) -> FixedScalar {
    hermite(a, FixedScalar::ZERO, b, FixedScalar::ZERO, clamp01(amount))
}

// =============================================================================
// STEPPING / ANGLES
// =============================================================================

/// Move `current` toward `target` by at most `max_delta`.
pub fn move_towards(current: FixedScalar, target: FixedScalar, max_delta: FixedScalar) -> FixedScalar {
    if (target - current).abs() <= max_delta {
        return target;
    }
    current + FixedScalar::from_int((target - current).sign()) * max_delta
}

/// Wrap `t` into `[0, length)`.
#[inline]
pub fn repeat(t: FixedScalar, length: FixedScalar) -> FixedScalar {
    t - (t / length).floor() * length
}

/// Shortest signed difference between two angles in degrees.
pub fn delta_angle(current: FixedScalar, target: FixedScalar) -> FixedScalar {
    let full = FixedScalar::from_int(360);
    let mut delta = repeat(target - current, full);
    if delta > FixedScalar::from_int(180) {
        delta -= full;
    }
    delta
}

/// [`move_towards`] for angles in degrees, taking the short way around.
pub fn move_towards_angle(current: FixedScalar, target: FixedScalar, max_delta: FixedScalar) -> FixedScalar {
    let target = current + delta_angle(current, target);
    move_towards(current, target, max_delta)
}

/// Critically damped spring toward `target`.
///
/// Updates `velocity` in place. `smooth_time` is floored at 0.0001.
pub fn smooth_damp(
    current: FixedScalar,
    target: FixedScalar,
    velocity: &mut FixedScalar,
    smooth_time: FixedScalar,
    max_speed: FixedScalar,
    delta_time: FixedScalar,
) -> FixedScalar {
    let smooth_time = max(FixedScalar::EN4, smooth_time);
    let omega = FixedScalar::TWO / smooth_time;
    let x = omega * delta_time;
    let k1 = FixedScalar::from_ratio(48, 100);
    let k2 = FixedScalar::from_ratio(235, 1000);
    let exp = FixedScalar::ONE / (FixedScalar::ONE + x + k1 * x * x + k2 * x * x * x);

    let original_target = target;
    let max_change = max_speed * smooth_time;
    let change = clamp(current - target, -max_change, max_change);
    let target = current - change;

    let temp = (*velocity + omega * change) * delta_time;
    *velocity = (*velocity - omega * temp) * exp;
    let mut output = target + (change + temp) * exp;

    if (original_target - current > FixedScalar::ZERO) == (output > original_target) {
        output = original_target;
        *velocity = (output - original_target) / delta_time;
    }
    output
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn fx(value: f64) -> FixedScalar {
        FixedScalar::from_f64(value)
    }

    fn close(actual: FixedScalar, expected: f64, tolerance: f64) -> bool {
        (actual.to_f64() - expected).abs() <= tolerance
    }

    #[test]
    fn test_pow2() {
        assert_eq!(pow2(FixedScalar::ZERO), FixedScalar::ONE);
        assert_eq!(pow2(FixedScalar::ONE), FixedScalar::TWO);
        assert_eq!(pow2(-FixedScalar::ONE), FixedScalar::HALF);
        assert_eq!(pow2(FixedScalar::from_int(10)), FixedScalar::from_int(1024));
        assert!(close(pow2(FixedScalar::HALF), std::f64::consts::SQRT_2, 1e-6));
        assert!(close(pow2(fx(-2.5)), 2f64.powf(-2.5), 1e-6));
        assert_eq!(pow2(FixedScalar::from_int(40)), FixedScalar::MAX);
    }

    #[test]
    fn test_log2_ln() {
        assert_eq!(log2(FixedScalar::from_int(8)), Ok(FixedScalar::from_int(3)));
        assert_eq!(log2(FixedScalar::ONE), Ok(FixedScalar::ZERO));
        assert!(close(log2(fx(0.1)).unwrap(), 0.1f64.log2(), 1e-8));
        assert!(close(ln(fx(std::f64::consts::E)).unwrap(), 1.0, 1e-7));
        assert_eq!(
            log2(FixedScalar::ZERO),
            Err(PhysicsError::NonPositiveLogarithm(FixedScalar::ZERO))
        );
        assert!(ln(-FixedScalar::ONE).is_err());
    }

    #[test]
    fn test_pow() {
        assert_eq!(pow(FixedScalar::ONE, fx(123.0)), Ok(FixedScalar::ONE));
        assert_eq!(pow(fx(5.0), FixedScalar::ZERO), Ok(FixedScalar::ONE));
        assert_eq!(pow(FixedScalar::ZERO, -FixedScalar::ONE), Ok(FixedScalar::MAX));
        assert_eq!(pow(FixedScalar::ZERO, FixedScalar::TWO), Ok(FixedScalar::ZERO));
        assert_eq!(
            pow(FixedScalar::TWO, FixedScalar::from_int(10)),
            Ok(FixedScalar::from_int(1024))
        );
        assert!(close(pow(fx(3.0), fx(2.0)).unwrap(), 9.0, 1e-4));
        assert!(close(pow(fx(10.0), fx(0.5)).unwrap(), 10f64.sqrt(), 1e-5));
        assert!(pow(fx(-2.0), fx(2.0)).is_err());
    }

    #[test]
    fn test_clamp_family() {
        let (a, b, c) = (fx(1.0), fx(-2.0), fx(3.5));
        assert_eq!(max(a, b), a);
        assert_eq!(min(a, b), b);
        assert_eq!(max3(a, b, c), c);
        assert_eq!(clamp(c, b, a), a);
        assert_eq!(clamp(b, FixedScalar::ZERO, a), FixedScalar::ZERO);
        assert_eq!(clamp01(fx(0.25)), fx(0.25));
        assert_eq!(clamp01(fx(7.0)), FixedScalar::ONE);
        assert_eq!(distance(b, c), fx(5.5));
    }

    #[test]
    fn test_interpolation() {
        let (a, b) = (fx(2.0), fx(6.0));
        assert_eq!(lerp(a, b, FixedScalar::HALF), fx(4.0));
        assert_eq!(lerp(a, b, fx(3.0)), b);
        assert_eq!(inverse_lerp(a, b, fx(5.0)), fx(0.75));
        assert_eq!(inverse_lerp(a, a, fx(5.0)), FixedScalar::ZERO);
        assert_eq!(smooth_step(a, b, FixedScalar::ZERO), a);
        assert_eq!(smooth_step(a, b, FixedScalar::ONE), b);
        assert!(close(smooth_step(a, b, FixedScalar::HALF), 4.0, 1e-9));
        assert_eq!(
            barycentric(fx(1.0), fx(3.0), fx(5.0), FixedScalar::HALF, FixedScalar::ZERO),
            fx(2.0)
        );
        let mid = catmull_rom(fx(0.0), fx(1.0), fx(2.0), fx(3.0), FixedScalar::HALF);
        assert!(close(mid, 1.5, 1e-9));
        assert_eq!(
            catmull_rom(fx(0.0), fx(1.0), fx(2.0), fx(3.0), FixedScalar::ZERO),
            fx(1.0)
        );
    }

    #[test]
    fn test_angles_and_steps() {
        assert_eq!(move_towards(fx(0.0), fx(10.0), fx(3.0)), fx(3.0));
        assert_eq!(move_towards(fx(0.0), fx(-1.0), fx(3.0)), fx(-1.0));
        assert_eq!(repeat(fx(7.5), fx(5.0)), fx(2.5));
        assert_eq!(repeat(fx(-1.0), fx(5.0)), fx(4.0));
        assert_eq!(delta_angle(fx(10.0), fx(350.0)), fx(-20.0));
        assert_eq!(delta_angle(fx(350.0), fx(10.0)), fx(20.0));
        assert_eq!(move_towards_angle(fx(350.0), fx(10.0), fx(5.0)), fx(355.0));
    }

    #[test]
    fn test_smooth_damp_approaches_target() {
        let target = fx(10.0);
        let mut current = FixedScalar::ZERO;
        let mut velocity = FixedScalar::ZERO;
        let dt = FixedScalar::EN2;
        let mut last_gap = (target - current).abs();
        for _ in 0..500 {
            current = smooth_damp(current, target, &mut velocity, fx(0.3), FixedScalar::MAX, dt);
            let gap = (target - current).abs();
            if last_gap > fx(1e-6) {
                assert!(gap <= last_gap, "gap grew from {last_gap:?} to {gap:?}");
            }
            last_gap = gap;
        }
        assert!(last_gap < fx(0.01));
    }
}
