//! Fixed-Point 3×3 Matrix
//!
//! Row-vector convention: a vector is transformed as `v · M`, so the rows
//! of an orientation matrix are the images of the local X, Y and Z axes,
//! and `A * B` applies `A` first.

use std::fmt;
use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

use super::fixed::FixedScalar;
use super::quat::FixedQuat;
use super::vec3::FixedVec3;

/// 3×3 matrix with fixed-point entries, `mRC` = row R, column C.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct FixedMat3 {
    pub m11: FixedScalar,
    pub m12: FixedScalar,
    pub m13: FixedScalar,
    pub m21: FixedScalar,
    pub m22: FixedScalar,
    pub m23: FixedScalar,
    pub m31: FixedScalar,
    pub m32: FixedScalar,
    pub m33: FixedScalar,
}

impl FixedMat3 {
    /// All zeros.
    pub const ZERO: Self = Self::diagonal(FixedScalar::ZERO, FixedScalar::ZERO, FixedScalar::ZERO);

    /// Identity.
    pub const IDENTITY: Self = Self::diagonal(FixedScalar::ONE, FixedScalar::ONE, FixedScalar::ONE);

    /// Build from three rows.
    #[inline]
    pub const fn new(row1: FixedVec3, row2: FixedVec3, row3: FixedVec3) -> Self {
        Self {
            m11: row1.x,
            m12: row1.y,
            m13: row1.z,
            m21: row2.x,
            m22: row2.y,
            m23: row2.z,
            m31: row3.x,
            m32: row3.y,
            m33: row3.z,
        }
    }

    /// Diagonal matrix.
    #[inline]
    pub const fn diagonal(d1: FixedScalar, d2: FixedScalar, d3: FixedScalar) -> Self {
        let z = FixedScalar::ZERO;
        Self {
            m11: d1,
            m12: z,
            m13: z,
            m21: z,
            m22: d2,
            m23: z,
            m31: z,
            m32: z,
            m33: d3,
        }
    }

    /// Rotation matrix of a unit quaternion.
    pub fn from_quaternion(q: FixedQuat) -> Self {
        let one = FixedScalar::ONE;
        let two = FixedScalar::TWO;

        let xx = q.x * q.x;
        let yy = q.y * q.y;
        let zz = q.z * q.z;
        let xy = q.x * q.y;
        let zw = q.z * q.w;
        let zx = q.z * q.x;
        let yw = q.y * q.w;
        let yz = q.y * q.z;
        let xw = q.x * q.w;

        Self {
            m11: one - two * (yy + zz),
            m12: two * (xy + zw),
            m13: two * (zx - yw),
            m21: two * (xy - zw),
            m22: one - two * (zz + xx),
            m23: two * (yz + xw),
            m31: two * (zx + yw),
            m32: two * (yz - xw),
            m33: one - two * (yy + xx),
        }
    }

    /// Rotation of `angle` radians about `axis` (normalized internally).
    #[inline]
    pub fn from_axis_angle(axis: FixedVec3, angle: FixedScalar) -> Self {
        Self::from_quaternion(FixedQuat::from_axis_angle(axis, angle))
    }

    /// Rows as vectors.
    #[inline]
    pub fn rows(&self) -> [FixedVec3; 3] {
        [
            FixedVec3::new(self.m11, self.m12, self.m13),
            FixedVec3::new(self.m21, self.m22, self.m23),
            FixedVec3::new(self.m31, self.m32, self.m33),
        ]
    }

    /// Transpose.
    #[inline]
    pub fn transpose(&self) -> Self {
        Self {
            m11: self.m11,
            m12: self.m21,
            m13: self.m31,
            m21: self.m12,
            m22: self.m22,
            m23: self.m32,
            m31: self.m13,
            m32: self.m23,
            m33: self.m33,
        }
    }

    /// Sum of the diagonal.
    #[inline]
    pub fn trace(&self) -> FixedScalar {
        self.m11 + self.m22 + self.m33
    }

    /// Determinant.
    pub fn determinant(&self) -> FixedScalar {
        self.m11 * self.m22 * self.m33 - self.m11 * self.m23 * self.m32
            - self.m12 * self.m21 * self.m33
            + self.m12 * self.m23 * self.m31
            + self.m13 * self.m21 * self.m32
            - self.m13 * self.m22 * self.m31
    }

    /// True if every off-diagonal entry is exactly zero.
    #[inline]
    pub fn is_diagonal(&self) -> bool {
        [self.m12, self.m13, self.m21, self.m23, self.m31, self.m32]
            .iter()
            .all(|m| m.is_zero())
    }

    /// Inverse. A singular matrix yields [`FixedMat3::ZERO`].
    ///
    /// Diagonal matrices invert entry by entry, which keeps inertia
    /// tensors exact to the last bit.
    pub fn inverse(&self) -> Self {
        if self.is_diagonal() {
            if self.m11.is_zero() || self.m22.is_zero() || self.m33.is_zero() {
                return Self::ZERO;
            }
            let one = FixedScalar::ONE;
            return Self::diagonal(one / self.m11, one / self.m22, one / self.m33);
        }

        let det = self.determinant();
        if det.is_zero() {
            return Self::ZERO;
        }

        let num11 = self.m22 * self.m33 - self.m23 * self.m32;
        let num12 = self.m13 * self.m32 - self.m12 * self.m33;
        let num13 = self.m12 * self.m23 - self.m22 * self.m13;
        let num21 = self.m23 * self.m31 - self.m33 * self.m21;
        let num22 = self.m11 * self.m33 - self.m31 * self.m13;
        let num23 = self.m13 * self.m21 - self.m23 * self.m11;
        let num31 = self.m21 * self.m32 - self.m31 * self.m22;
        let num32 = self.m12 * self.m31 - self.m32 * self.m11;
        let num33 = self.m11 * self.m22 - self.m21 * self.m12;

        Self {
            m11: num11 / det,
            m12: num12 / det,
            m13: num13 / det,
            m21: num21 / det,
            m22: num22 / det,
            m23: num23 / det,
            m31: num31 / det,
            m32: num32 / det,
            m33: num33 / det,
        }
    }

    /// Multiply every entry by a scalar.
    pub fn scale(&self, s: FixedScalar) -> Self {
        self.map(|m| m * s)
    }

    /// Entry-wise absolute value.
    pub fn absolute(&self) -> Self {
        self.map(FixedScalar::abs)
    }

    fn map(&self, f: impl Fn(FixedScalar) -> FixedScalar) -> Self {
        Self {
            m11: f(self.m11),
            m12: f(self.m12),
            m13: f(self.m13),
            m21: f(self.m21),
            m22: f(self.m22),
            m23: f(self.m23),
            m31: f(self.m31),
            m32: f(self.m32),
            m33: f(self.m33),
        }
    }

    fn zip(&self, other: &Self, f: impl Fn(FixedScalar, FixedScalar) -> FixedScalar) -> Self {
        Self {
            m11: f(self.m11, other.m11),
            m12: f(self.m12, other.m12),
            m13: f(self.m13, other.m13),
            m21: f(self.m21, other.m21),
            m22: f(self.m22, other.m22),
            m23: f(self.m23, other.m23),
            m31: f(self.m31, other.m31),
            m32: f(self.m32, other.m32),
            m33: f(self.m33, other.m33),
        }
    }
}

impl Mul for FixedMat3 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        let [r1, r2, r3] = self.rows();
        Self::new(r1.transform(&rhs), r2.transform(&rhs), r3.transform(&rhs))
    }
}

impl Add for FixedMat3 {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        self.zip(&rhs, |a, b| a + b)
    }
}

impl Sub for FixedMat3 {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        self.zip(&rhs, |a, b| a - b)
    }
}

impl fmt::Debug for FixedMat3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r1, r2, r3] = self.rows();
        write!(f, "Mat3[{:?}, {:?}, {:?}]", r1, r2, r3)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: f64, y: f64, z: f64) -> FixedVec3 {
        FixedVec3::from_f64(x, y, z)
    }

    fn assert_mat_close(a: &FixedMat3, b: &FixedMat3, tolerance: f64) {
        for (ra, rb) in a.rows().iter().zip(b.rows().iter()) {
            let d = *ra - *rb;
            for c in [d.x, d.y, d.z] {
                assert!(c.abs().to_f64() <= tolerance, "{a:?} != {b:?}");
            }
        }
    }

    #[test]
    fn test_identity_and_transpose() {
        let m = FixedMat3::new(v(1.0, 2.0, 3.0), v(4.0, 5.0, 6.0), v(7.0, 8.0, 10.0));
        assert_eq!(m * FixedMat3::IDENTITY, m);
        assert_eq!(FixedMat3::IDENTITY * m, m);
        assert_eq!(m.transpose().transpose(), m);
        assert_eq!(m.transpose().m12, FixedScalar::from_int(4));
        assert_eq!(m.trace(), FixedScalar::from_int(16));
        assert_eq!(m.determinant(), FixedScalar::from_int(-3));
    }

    #[test]
    fn test_inverse() {
        let m = FixedMat3::new(v(1.0, 2.0, 3.0), v(0.0, 1.0, 4.0), v(5.0, 6.0, 0.0));
        assert_mat_close(&(m * m.inverse()), &FixedMat3::IDENTITY, 1e-8);

        let d = FixedMat3::diagonal(FixedScalar::TWO, FixedScalar::from_int(4), FixedScalar::HALF);
        assert_eq!(
            d.inverse(),
            FixedMat3::diagonal(FixedScalar::HALF, FixedScalar::from_ratio(1, 4), FixedScalar::TWO)
        );

        let singular = FixedMat3::new(v(1.0, 2.0, 3.0), v(2.0, 4.0, 6.0), v(0.0, 1.0, 0.0));
        assert_eq!(singular.inverse(), FixedMat3::ZERO);
        assert_eq!(FixedMat3::ZERO.inverse(), FixedMat3::ZERO);
    }

    #[test]
    fn test_rotation_about_z() {
        let r = FixedMat3::from_axis_angle(FixedVec3::UNIT_Z, FixedScalar::PI_OVER_2);
        // Row convention: X maps onto Y.
        let image = FixedVec3::UNIT_X.transform(&r);
        assert!((image - FixedVec3::UNIT_Y).length().to_f64() < 1e-8);
        // Rotation inverse is its transpose.
        assert_mat_close(&(r * r.transpose()), &FixedMat3::IDENTITY, 1e-8);
        assert_eq!(FixedVec3::UNIT_X.transform(&r).transpose_transform(&r).x.round(), FixedScalar::ONE);
    }

    #[test]
    fn test_product_applies_left_first() {
        let a = FixedMat3::from_axis_angle(FixedVec3::UNIT_Z, FixedScalar::PI_OVER_2);
        let b = FixedMat3::from_axis_angle(FixedVec3::UNIT_X, FixedScalar::PI_OVER_2);
        let p = FixedVec3::UNIT_X;
        let sequential = p.transform(&a).transform(&b);
        let combined = p.transform(&(a * b));
        assert!((sequential - combined).length().to_f64() < 1e-8);
        // X -> Y under a, Y -> Z under b.
        assert!((combined - FixedVec3::UNIT_Z).length().to_f64() < 1e-8);
    }
}
