//! Capsule: a Y-aligned cylinder of `length` capped by two hemispheres of `radius`.

use serde::{Deserialize, Serialize};

use crate::core::fixed::FixedScalar;
use crate::core::mat3::FixedMat3;
use crate::core::vec3::FixedVec3;

use super::shape::{BoundingBox, ConvexShape, MassProperties};

/// Capsule primitive. Geometry setters refresh the cached derived data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapsuleShape {
    length: FixedScalar,
    radius: FixedScalar,
    mass_properties: MassProperties,
    bounding_box: BoundingBox,
}

impl CapsuleShape {
    /// Create a capsule. `length` excludes the caps.
    pub fn new(length: FixedScalar, radius: FixedScalar) -> Self {
        let mut capsule = Self {
            length,
            radius,
            mass_properties: MassProperties::default(),
            bounding_box: BoundingBox::default(),
        };
        capsule.update_shape();
        capsule
    }

    /// Length of the cylindrical section.
    #[inline]
    pub fn length(&self) -> FixedScalar {
        self.length
    }

    /// Cap radius.
    #[inline]
    pub fn radius(&self) -> FixedScalar {
        self.radius
    }

    /// Change the length and recompute derived data.
    pub fn set_length(&mut self, length: FixedScalar) {
        self.length = length;
        self.update_shape();
    }

    /// Change the radius and recompute derived data.
    pub fn set_radius(&mut self, radius: FixedScalar) {
        self.radius = radius;
        self.update_shape();
    }

    /// Recompute mass, inertia and bounding box.
    pub fn update_shape(&mut self) {
        self.mass_properties = self.calculate_mass_inertia();
        self.bounding_box = BoundingBox::from_support(self);
    }

    /// Cached mass properties.
    #[inline]
    pub fn mass_properties(&self) -> MassProperties {
        self.mass_properties
    }

    /// Cached local bounding box.
    #[inline]
    pub fn bounding_box(&self) -> BoundingBox {
        self.bounding_box
    }
}

impl ConvexShape for CapsuleShape {
    fn support_mapping(&self, direction: FixedVec3) -> FixedVec3 {
        if !direction.y.is_zero() {
            // Hemisphere on the side the direction points to.
            let mut result = direction.normalize() * self.radius;
            result.y += FixedScalar::from_int(direction.y.sign()) * FixedScalar::HALF * self.length;
            return result;
        }

        // Zero direction maps to the origin.
        FixedVec3::new(direction.x, FixedScalar::ZERO, direction.z).normalize() * self.radius
    }

    fn calculate_mass_inertia(&self) -> MassProperties {
        let pi = FixedScalar::PI;
        let r = self.radius;
        let l = self.length;
        let r2 = r * r;

        let mass_sphere = FixedScalar::from_ratio(4, 3) * pi * r2 * r;
        let mass_cylinder = pi * r2 * l;

        let quarter = FixedScalar::from_ratio(1, 4);
        let twelfth = FixedScalar::from_ratio(1, 12);
        let two_fifths = FixedScalar::from_ratio(2, 5);

        let transverse = quarter * mass_cylinder * r2
            + twelfth * mass_cylinder * l * l
            + two_fifths * mass_sphere * r2
            + quarter * l * l * mass_sphere;
        let axial = FixedScalar::HALF * mass_cylinder * r2 + two_fifths * mass_sphere * r2;

        MassProperties {
            mass: mass_cylinder + mass_sphere,
            inertia: FixedMat3::diagonal(transverse, axial, transverse),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
