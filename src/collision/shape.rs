//! Shape Geometry
//!
//! Closed set of convex primitives. Each primitive answers two questions:
//!
//! - **Support mapping**: the farthest surface point along a direction,
//!   which is all a GJK/EPA narrow phase needs from a convex shape
//! - **Mass properties**: closed-form mass (unit density, i.e. volume) and
//!   diagonal inertia tensor in body-local axes
//!
//! Derived data (mass, inertia, local bounding box) is cached on the
//! primitive and recomputed by every geometry setter.

use serde::{Deserialize, Serialize};

use crate::core::fixed::FixedScalar;
use crate::core::mat3::FixedMat3;
use crate::core::vec3::FixedVec3;

use super::capsule::CapsuleShape;
use super::cylinder::CylinderShape;

/// Convex primitive queried by the narrow phase.
pub trait ConvexShape {
    /// Farthest point of the surface along `direction` (local space).
    fn support_mapping(&self, direction: FixedVec3) -> FixedVec3;

    /// Closed-form `(mass, inertia)` at unit density.
    fn calculate_mass_inertia(&self) -> MassProperties;
}

/// Mass and local inertia tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MassProperties {
    /// Mass (equal to volume at unit density)
    pub mass: FixedScalar,
    /// Inertia tensor about the centre of mass, local axes
    pub inertia: FixedMat3,
}

impl Default for MassProperties {
    fn default() -> Self {
        Self {
            mass: FixedScalar::ONE,
            inertia: FixedMat3::IDENTITY,
        }
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Minimum corner
    pub min: FixedVec3,
    /// Maximum corner
    pub max: FixedVec3,
}

impl BoundingBox {
    /// Create from corners.
    #[inline]
    pub const fn new(min: FixedVec3, max: FixedVec3) -> Self {
        Self { min, max }
    }

    /// Tight local box of a convex shape, from its support points along ±X, ±Y, ±Z.
    pub fn from_support<S: ConvexShape + ?Sized>(shape: &S) -> Self {
        let max = FixedVec3::new(
            shape.support_mapping(FixedVec3::UNIT_X).x,
            shape.support_mapping(FixedVec3::UNIT_Y).y,
            shape.support_mapping(FixedVec3::UNIT_Z).z,
        );
        let min = FixedVec3::new(
            shape.support_mapping(-FixedVec3::UNIT_X).x,
            shape.support_mapping(-FixedVec3::UNIT_Y).y,
            shape.support_mapping(-FixedVec3::UNIT_Z).z,
        );
        Self { min, max }
    }

    /// Centre point.
    #[inline]
    pub fn center(&self) -> FixedVec3 {
        (self.min + self.max) * FixedScalar::HALF
    }

    /// Half the size along each axis.
    #[inline]
    pub fn half_extents(&self) -> FixedVec3 {
        (self.max - self.min) * FixedScalar::HALF
    }

    /// True if `point` lies inside or on the boundary.
    pub fn contains_point(&self, point: FixedVec3) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    /// True if the two boxes overlap (touching counts).
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }
}

/// Collision shape attached to a rigid body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Shape {
    /// Y-aligned capsule
    Capsule(CapsuleShape),
    /// Y-aligned solid cylinder
    Cylinder(CylinderShape),
}

impl Shape {
    /// Capsule with a cylindrical section of `length` and cap `radius`.
    pub fn capsule(length: FixedScalar, radius: FixedScalar) -> Self {
        Self::Capsule(CapsuleShape::new(length, radius))
    }

    /// Cylinder of `height` and `radius`.
    pub fn cylinder(height: FixedScalar, radius: FixedScalar) -> Self {
        Self::Cylinder(CylinderShape::new(height, radius))
    }

    /// Farthest surface point along `direction` (local space).
    pub fn support_mapping(&self, direction: FixedVec3) -> FixedVec3 {
        match self {
            Self::Capsule(capsule) => capsule.support_mapping(direction),
            Self::Cylinder(cylinder) => cylinder.support_mapping(direction),
        }
    }

    /// Recompute mass properties from the current geometry.
    pub fn calculate_mass_inertia(&self) -> MassProperties {
        match self {
            Self::Capsule(capsule) => capsule.calculate_mass_inertia(),
            Self::Cylinder(cylinder) => cylinder.calculate_mass_inertia(),
        }
    }

    /// Refresh every cached derived quantity.
    pub fn update_shape(&mut self) {
        match self {
            Self::Capsule(capsule) => capsule.update_shape(),
            Self::Cylinder(cylinder) => cylinder.update_shape(),
        }
    }

    /// Cached mass properties.
    pub fn mass_properties(&self) -> MassProperties {
        match self {
            Self::Capsule(capsule) => capsule.mass_properties(),
            Self::Cylinder(cylinder) => cylinder.mass_properties(),
        }
    }

    /// Cached mass.
    #[inline]
    pub fn mass(&self) -> FixedScalar {
        self.mass_properties().mass
    }

    /// Cached local inertia tensor.
    #[inline]
    pub fn inertia(&self) -> FixedMat3 {
        self.mass_properties().inertia
    }

    /// Cached local bounding box.
    pub fn bounding_box(&self) -> BoundingBox {
        match self {
            Self::Capsule(capsule) => capsule.bounding_box(),
            Self::Cylinder(cylinder) => cylinder.bounding_box(),
        }
    }

    /// World-space bounding box for a body at `position` with `orientation`.
    ///
    /// Conservative: transforms the local box by the absolute rotation.
    pub fn world_bounding_box(&self, position: FixedVec3, orientation: &FixedMat3) -> BoundingBox {
        let local = self.bounding_box();
        let center = position + local.center().transform(orientation);
        let extents = local.half_extents().transform(&orientation.absolute());
        BoundingBox::new(center - extents, center + extents)
    }
}

// =============================================================================
// TESTS
// =============================================================================
