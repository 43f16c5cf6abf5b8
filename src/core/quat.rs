//! Fixed-point quaternion, used to build and integrate orientations.

use std::fmt;
use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

use super::fixed::FixedScalar;
use super::mat3::FixedMat3;
use super::vec3::FixedVec3;

/// Quaternion `(x, y, z, w)` with fixed-point components.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct FixedQuat {
    pub x: FixedScalar,
    pub y: FixedScalar,
    pub z: FixedScalar,
    pub w: FixedScalar,
}

impl Default for FixedQuat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl FixedQuat {
    /// No rotation.
    pub const IDENTITY: Self = Self::new(
        FixedScalar::ZERO,
        FixedScalar::ZERO,
        FixedScalar::ZERO,
        FixedScalar::ONE,
    );

    /// Create from components.
    #[inline]
    pub const fn new(x: FixedScalar, y: FixedScalar, z: FixedScalar, w: FixedScalar) -> Self {
        Self { x, y, z, w }
    }

    /// Rotation of `angle` radians about `axis`. A zero axis gives identity.
    pub fn from_axis_angle(axis: FixedVec3, angle: FixedScalar) -> Self {
        let axis = axis.normalize();
        if axis.is_zero() {
            return Self::IDENTITY;
        }
        let half = angle * FixedScalar::HALF;
        let s = half.sin();
        let v = axis * s;
        Self::new(v.x, v.y, v.z, half.cos())
    }

    /// Rotation from yaw (about Y), pitch (about X) and roll (about Z).
    pub fn from_yaw_pitch_roll(yaw: FixedScalar, pitch: FixedScalar, roll: FixedScalar) -> Self {
        let half_roll = roll * FixedScalar::HALF;
        let (sr, cr) = (half_roll.sin(), half_roll.cos());
        let half_pitch = pitch * FixedScalar::HALF;
        let (sp, cp) = (half_pitch.sin(), half_pitch.cos());
        let half_yaw = yaw * FixedScalar::HALF;
        let (sy, cy) = (half_yaw.sin(), half_yaw.cos());

        Self::new(
            cy * sp * cr + sy * cp * sr,
            sy * cp * cr - cy * sp * sr,
            cy * cp * sr - sy * sp * cr,
            cy * cp * cr + sy * sp * sr,
        )
    }

    /// Quaternion of a rotation matrix (row-vector convention).
    pub fn from_matrix(m: &FixedMat3) -> Self {
        let one = FixedScalar::ONE;
        let half = FixedScalar::HALF;
        let trace = m.trace();

        // Each radicand is >= 1 for a rotation matrix on its branch.
        let root = |value: FixedScalar| value.sqrt().unwrap_or(FixedScalar::ZERO);

        if trace > FixedScalar::ZERO {
            let s = root(trace + one);
            let k = half / s;
            Self::new(
                (m.m23 - m.m32) * k,
                (m.m31 - m.m13) * k,
                (m.m12 - m.m21) * k,
                s * half,
            )
        } else if m.m11 >= m.m22 && m.m11 >= m.m33 {
            let s = root(one + m.m11 - m.m22 - m.m33);
            let k = half / s;
            Self::new(
                s * half,
                (m.m12 + m.m21) * k,
                (m.m13 + m.m31) * k,
                (m.m23 - m.m32) * k,
            )
        } else if m.m22 > m.m33 {
            let s = root(one + m.m22 - m.m11 - m.m33);
            let k = half / s;
            Self::new(
                (m.m21 + m.m12) * k,
                s * half,
                (m.m32 + m.m23) * k,
                (m.m31 - m.m13) * k,
            )
        } else {
            let s = root(one + m.m33 - m.m11 - m.m22);
            let k = half / s;
            Self::new(
                (m.m31 + m.m13) * k,
                (m.m32 + m.m23) * k,
                s * half,
                (m.m12 - m.m21) * k,
            )
        }
    }

    /// Scale every component.
    #[inline]
    pub fn scale(self, s: FixedScalar) -> Self {
        Self::new(self.x * s, self.y * s, self.z * s, self.w * s)
    }

    /// Conjugate (inverse for unit quaternions).
    #[inline]
    pub fn conjugate(self) -> Self {
        Self::new(-self.x, -self.y, -self.z, self.w)
    }

    /// Squared norm.
    #[inline]
    pub fn length_squared(self) -> FixedScalar {
        self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w
    }

    /// Norm.
    #[inline]
    pub fn length(self) -> FixedScalar {
        self.length_squared().sqrt().unwrap_or(FixedScalar::ZERO)
    }

    /// Unit quaternion in the same direction. Zero stays zero.
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len.is_zero() {
            return self;
        }
        let inv = FixedScalar::ONE / len;
        self.scale(inv)
    }

    /// Rotation matrix (row-vector convention).
    #[inline]
    pub fn to_matrix(self) -> FixedMat3 {
        FixedMat3::from_quaternion(self)
    }
}

impl Mul for FixedQuat {
    type Output = Self;

    /// Hamilton product: `a * b` rotates by `b`, then by `a`.
    fn mul(self, rhs: Self) -> Self {
        let cx = self.y * rhs.z - self.z * rhs.y;
        let cy = self.z * rhs.x - self.x * rhs.z;
        let cz = self.x * rhs.y - self.y * rhs.x;
        let dot = self.x * rhs.x + self.y * rhs.y + self.z * rhs.z;

        Self::new(
            self.x * rhs.w + rhs.x * self.w + cx,
            self.y * rhs.w + rhs.y * self.w + cy,
            self.z * rhs.w + rhs.z * self.w + cz,
            self.w * rhs.w - dot,
        )
    }
}

impl Add for FixedQuat {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z, self.w + rhs.w)
    }
}

impl Sub for FixedQuat {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z, self.w - rhs.w)
    }
}

impl fmt::Debug for FixedQuat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Quat({:.4}, {:.4}, {:.4}, {:.4})",
            self.x.to_f64(),
            self.y.to_f64(),
            self.z.to_f64(),
            self.w.to_f64()
        )
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn quat_close(a: FixedQuat, b: FixedQuat, tolerance: f64) -> bool {
        // q and -q are the same rotation.
        let d1 = (a - b).length().to_f64();
        let d2 = (a + b).length().to_f64();
        d1.min(d2) <= tolerance
    }

    #[test]
    fn test_identity_and_conjugate() {
        let q = FixedQuat::from_axis_angle(FixedVec3::from_ints(1, 2, 3), FixedScalar::from_f64(0.7));
        assert!(quat_close(q * FixedQuat::IDENTITY, q, 1e-9));
        assert!(quat_close(q * q.conjugate(), FixedQuat::IDENTITY, 1e-8));
        assert_eq!(FixedQuat::from_axis_angle(FixedVec3::ZERO, FixedScalar::ONE), FixedQuat::IDENTITY);
    }

    #[test]
    fn test_matrix_round_trip() {
        let angles = [0.3, 1.2, 2.5, 3.0];
        let axes = [
            FixedVec3::UNIT_X,
            FixedVec3::UNIT_Y,
            FixedVec3::UNIT_Z,
            FixedVec3::from_ints(1, -1, 2),
        ];
        for angle in angles {
            for axis in axes {
                let q = FixedQuat::from_axis_angle(axis, FixedScalar::from_f64(angle));
                let back = FixedQuat::from_matrix(&q.to_matrix());
                assert!(quat_close(q, back, 1e-7), "{q:?} vs {back:?}");
            }
        }
    }

    #[test]
    fn test_product_composes_rotations() {
        let a = FixedQuat::from_axis_angle(FixedVec3::UNIT_Z, FixedScalar::PI_OVER_2);
        let b = FixedQuat::from_axis_angle(FixedVec3::UNIT_X, FixedScalar::PI_OVER_2);
        // b * a: rotate by a first, then b. Row convention: M(b * a) = M(a) * M(b).
        let composed = (b * a).to_matrix();
        let chained = a.to_matrix() * b.to_matrix();
        let p = FixedVec3::UNIT_X;
        assert!((p.transform(&composed) - p.transform(&chained)).length().to_f64() < 1e-8);
    }

    #[test]
    fn test_yaw_pitch_roll_single_axes() {
        let angle = FixedScalar::from_f64(0.8);
        let yaw = FixedQuat::from_yaw_pitch_roll(angle, FixedScalar::ZERO, FixedScalar::ZERO);
        assert!(quat_close(yaw, FixedQuat::from_axis_angle(FixedVec3::UNIT_Y, angle), 1e-8));
        let pitch = FixedQuat::from_yaw_pitch_roll(FixedScalar::ZERO, angle, FixedScalar::ZERO);
        assert!(quat_close(pitch, FixedQuat::from_axis_angle(FixedVec3::UNIT_X, angle), 1e-8));
        let roll = FixedQuat::from_yaw_pitch_roll(FixedScalar::ZERO, FixedScalar::ZERO, angle);
        assert!(quat_close(roll, FixedQuat::from_axis_angle(FixedVec3::UNIT_Z, angle), 1e-8));
    }

    #[test]
    fn test_normalize() {
        let q = FixedQuat::new(
            FixedScalar::ONE,
            FixedScalar::ONE,
            FixedScalar::ONE,
            FixedScalar::ONE,
        )
        .normalize();
        assert!((q.length() - FixedScalar::ONE).abs().to_f64() < 1e-9);
        assert_eq!(q.w, FixedScalar::HALF);
    }
}
