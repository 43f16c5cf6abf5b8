//! Fixed-Point 3D Vector
//!
//! Deterministic 3D vector operations for the physics core.
//! All operations use fixed-point arithmetic.

use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

use super::fixed::FixedScalar;
use super::mat3::FixedMat3;

/// 3D vector with fixed-point components.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FixedVec3 {
    /// X component
    pub x: FixedScalar,
    /// Y component (up)
    pub y: FixedScalar,
    /// Z component
    pub z: FixedScalar,
}

impl FixedVec3 {
    /// Zero vector
    pub const ZERO: Self = Self::new(FixedScalar::ZERO, FixedScalar::ZERO, FixedScalar::ZERO);

    /// (1, 1, 1)
    pub const ONE: Self = Self::new(FixedScalar::ONE, FixedScalar::ONE, FixedScalar::ONE);

    /// Unit vector along +X
    pub const UNIT_X: Self = Self::new(FixedScalar::ONE, FixedScalar::ZERO, FixedScalar::ZERO);

    /// Unit vector along +Y
    pub const UNIT_Y: Self = Self::new(FixedScalar::ZERO, FixedScalar::ONE, FixedScalar::ZERO);

    /// Unit vector along +Z
    pub const UNIT_Z: Self = Self::new(FixedScalar::ZERO, FixedScalar::ZERO, FixedScalar::ONE);

    /// Up (+Y)
    pub const UP: Self = Self::UNIT_Y;

    /// Create a new vector from fixed-point components.
    #[inline]
    pub const fn new(x: FixedScalar, y: FixedScalar, z: FixedScalar) -> Self {
        Self { x, y, z }
    }

    /// Create a vector from integer components.
    #[inline]
    pub const fn from_ints(x: i32, y: i32, z: i32) -> Self {
        Self::new(
            FixedScalar::from_int(x),
            FixedScalar::from_int(y),
            FixedScalar::from_int(z),
        )
    }

    /// Create a vector from floats (setup and tests only).
    #[inline]
    pub fn from_f64(x: f64, y: f64, z: f64) -> Self {
        Self::new(
            FixedScalar::from_f64(x),
            FixedScalar::from_f64(y),
            FixedScalar::from_f64(z),
        )
    }

    /// Scale by a fixed-point scalar.
    #[inline]
    pub fn scale(self, scalar: FixedScalar) -> Self {
        Self::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }

    /// Divide every component by a scalar (zero divisor saturates).
    #[inline]
    pub fn div_scalar(self, scalar: FixedScalar) -> Self {
        Self::new(self.x / scalar, self.y / scalar, self.z / scalar)
    }

    /// Dot product.
    #[inline]
    pub fn dot(self, other: Self) -> FixedScalar {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Cross product.
    #[inline]
    pub fn cross(self, other: Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// Squared length (avoids sqrt - prefer this for comparisons).
    #[inline]
    pub fn length_squared(self) -> FixedScalar {
        self.dot(self)
    }

    /// Length (magnitude).
    #[inline]
    pub fn length(self) -> FixedScalar {
        // A sum of squares is never negative, the fallback is unreachable.
        self.length_squared().sqrt().unwrap_or(FixedScalar::ZERO)
    }

    /// Normalize to unit length.
    /// Returns ZERO for the zero vector.
    ///
    /// Scales by the largest component first so the squared length neither
    /// saturates for large vectors nor truncates to zero for tiny ones.
    #[inline]
    pub fn normalize(self) -> Self {
        let largest = self.x.abs().max(self.y.abs()).max(self.z.abs());
        if largest.is_zero() {
            return Self::ZERO;
        }
        let scaled = self.div_scalar(largest);
        scaled.div_scalar(scaled.length())
    }

    /// True if every component is exactly zero.
    #[inline]
    pub fn is_zero(self) -> bool {
        self.x.is_zero() && self.y.is_zero() && self.z.is_zero()
    }

    /// Row vector times matrix: `x' = x*M11 + y*M21 + z*M31`, etc.
    #[inline]
    pub fn transform(self, m: &FixedMat3) -> Self {
        Self::new(
            self.x * m.m11 + self.y * m.m21 + self.z * m.m31,
            self.x * m.m12 + self.y * m.m22 + self.z * m.m32,
            self.x * m.m13 + self.y * m.m23 + self.z * m.m33,
        )
    }

    /// Transform by the transpose of `m` (the inverse, for rotations).
    #[inline]
    pub fn transpose_transform(self, m: &FixedMat3) -> Self {
        Self::new(
            self.x * m.m11 + self.y * m.m12 + self.z * m.m13,
            self.x * m.m21 + self.y * m.m22 + self.z * m.m23,
            self.x * m.m31 + self.y * m.m32 + self.z * m.m33,
        )
    }

    /// Component-wise minimum.
    #[inline]
    pub fn min(self, other: Self) -> Self {
        Self::new(self.x.min(other.x), self.y.min(other.y), self.z.min(other.z))
    }

    /// Component-wise maximum.
    #[inline]
    pub fn max(self, other: Self) -> Self {
        Self::new(self.x.max(other.x), self.y.max(other.y), self.z.max(other.z))
    }

    /// Convert to float tuple for logging.
    #[inline]
    pub fn to_floats(self) -> (f64, f64, f64) {
        (self.x.to_f64(), self.y.to_f64(), self.z.to_f64())
    }
}

// Operator overloads for ergonomics
impl Add for FixedVec3 {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for FixedVec3 {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl AddAssign for FixedVec3 {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl SubAssign for FixedVec3 {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Mul<FixedScalar> for FixedVec3 {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: FixedScalar) -> Self {
        self.scale(rhs)
    }
}

impl Neg for FixedVec3 {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl fmt::Debug for FixedVec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (x, y, z) = self.to_floats();
        write!(f, "Vec3({:.4}, {:.4}, {:.4})", x, y, z)
    }
}

impl fmt::Display for FixedVec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (x, y, z) = self.to_floats();
        write!(f, "({:.4}, {:.4}, {:.4})", x, y, z)
    }
}

// =============================================================================
// TESTS
// =============================================================================
