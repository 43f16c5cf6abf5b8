//! Solid Y-aligned cylinder.

use serde::{Deserialize, Serialize};

use crate::core::fixed::FixedScalar;
use crate::core::mat3::FixedMat3;
use crate::core::vec3::FixedVec3;

use super::shape::{BoundingBox, ConvexShape, MassProperties};

/// Cylinder primitive centred on the origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CylinderShape {
    height: FixedScalar,
    radius: FixedScalar,
    mass_properties: MassProperties,
    bounding_box: BoundingBox,
}

impl CylinderShape {
    /// Create a cylinder.
    pub fn new(height: FixedScalar, radius: FixedScalar) -> Self {
        let mut cylinder = Self {
            height,
            radius,
            mass_properties: MassProperties::default(),
            bounding_box: BoundingBox::default(),
        };
        cylinder.update_shape();
        cylinder
    }

    /// Full height along the y axis.
    #[inline]
    pub fn height(&self) -> FixedScalar {
        self.height
    }

    /// Radius of the circular section.
    #[inline]
    pub fn radius(&self) -> FixedScalar {
        self.radius
    }

    /// Change the height and recompute derived data.
    pub fn set_height(&mut self, height: FixedScalar) {
        self.height = height;
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

impl ConvexShape for CylinderShape {
    fn support_mapping(&self, direction: FixedVec3) -> FixedVec3 {
        let mut rim = FixedVec3::new(direction.x, FixedScalar::ZERO, direction.z).normalize() * self.radius;
        rim.y = FixedScalar::from_int(direction.y.sign()) * self.height * FixedScalar::HALF;
        rim
    }

    fn calculate_mass_inertia(&self) -> MassProperties {
        let r2 = self.radius * self.radius;
        let h = self.height;
        let mass = FixedScalar::PI * r2 * h;

        let transverse =
            FixedScalar::from_ratio(1, 4) * mass * r2 + FixedScalar::from_ratio(1, 12) * mass * h * h;
        let axial = FixedScalar::HALF * mass * r2;

        MassProperties {
            mass,
            inertia: FixedMat3::diagonal(transverse, axial, transverse),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::f64::consts::PI;

    #[test]
    fn test_cylinder_support() {
        let cylinder = CylinderShape::new(FixedScalar::from_int(4), FixedScalar::ONE);
        assert_eq!(
            cylinder.support_mapping(FixedVec3::from_ints(0, 3, 5)),
            FixedVec3::from_ints(0, 2, 1)
        );
        assert_eq!(
            cylinder.support_mapping(FixedVec3::from_ints(0, -1, 0)),
            FixedVec3::from_ints(0, -2, 0)
        );
        // Planar direction: rim at mid-height.
        assert_eq!(
            cylinder.support_mapping(FixedVec3::from_ints(-2, 0, 0)),
            FixedVec3::from_ints(-1, 0, 0)
        );
    }

    #[test]
    fn test_cylinder_support_huge_direction() {
        let cylinder = CylinderShape::new(FixedScalar::TWO, FixedScalar::ONE);
        let rim = cylinder.support_mapping(FixedVec3::from_ints(100_000, 1, 0));
        assert!(rim.x.to_f64() <= 1.001 && rim.x.to_f64() > 0.999, "{rim:?}");
        assert_eq!(rim.y, FixedScalar::ONE);

        let rim = cylinder.support_mapping(FixedVec3::from_ints(-300_000, -5, 400_000));
        assert!((rim - FixedVec3::from_f64(-0.6, -1.0, 0.8)).length().to_f64() < 1e-8, "{rim:?}");
    }

    #[test]
    fn test_cylinder_mass_inertia() {
        let props = CylinderShape::new(FixedScalar::TWO, FixedScalar::from_int(3)).calculate_mass_inertia();
        let mass = PI * 9.0 * 2.0;
        assert!((props.mass.to_f64() - mass).abs() < 1e-6);
        assert!((props.inertia.m11.to_f64() - (0.25 * mass * 9.0 + mass * 4.0 / 12.0)).abs() < 1e-5);
        assert!((props.inertia.m22.to_f64() - 0.5 * mass * 9.0).abs() < 1e-5);
        assert_eq!(props.inertia.m11, props.inertia.m33);
    }

    #[test]
    fn test_cylinder_setters_recompute() {
        let mut cylinder = CylinderShape::new(FixedScalar::ONE, FixedScalar::ONE);
        cylinder.set_height(FixedScalar::from_int(6));
        assert_eq!(cylinder.bounding_box().max.y, FixedScalar::from_int(3));
        cylinder.set_radius(FixedScalar::HALF);
        assert_eq!(cylinder.bounding_box().min.z, -FixedScalar::HALF);
        assert_eq!(cylinder.mass_properties(), cylinder.calculate_mass_inertia());
    }

    proptest! {
        #[test]
        fn prop_cylinder_support_is_farthest(
            dx in -1000i32..1000, dy in -1000i32..1000, dz in -1000i32..1000,
            ux in -1000i32..1000, uz in -1000i32..1000,
            s in 0i32..=1000, t in -1000i32..=1000,
        ) {
            let cylinder = CylinderShape::new(FixedScalar::TWO, FixedScalar::from_f64(0.5));
            let d = FixedVec3::from_ints(dx, dy, dz) * FixedScalar::from_ratio(1, 100);
            prop_assume!(!d.is_zero());

            let rim = FixedVec3::from_ints(ux, 0, uz).normalize() * cylinder.radius();
            let sample = rim * FixedScalar::from_ratio(s as i64, 1000)
                + FixedVec3::new(
                    FixedScalar::ZERO,
                    FixedScalar::from_ratio(t as i64, 1000) * FixedScalar::HALF * cylinder.height(),
                    FixedScalar::ZERO,
                );

            let support = cylinder.support_mapping(d);
            prop_assert!(support.dot(d).to_f64() >= sample.dot(d).to_f64() - 1e-6);
        }

        #[test]
        fn prop_cylinder_support_large_direction(
            dx in -200_000i32..200_000, dy in -200_000i32..200_000, dz in -200_000i32..200_000,
        ) {
            let cylinder = CylinderShape::new(FixedScalar::TWO, FixedScalar::from_f64(0.5));
            let d = FixedVec3::from_ints(dx, dy, dz);
            prop_assume!(!d.is_zero());

            let support = cylinder.support_mapping(d);
            let (fx, fy, fz) = (f64::from(dx), f64::from(dy), f64::from(dz));
            let reach = support.x.to_f64() * fx + support.y.to_f64() * fy + support.z.to_f64() * fz;
            // Farthest point: top or bottom rim edge.
            let expected = fy.abs() + 0.5 * (fx * fx + fz * fz).sqrt();
            prop_assert!((reach - expected).abs() <= 1e-6 * expected, "{:?} -> {:?}", d, support);
        }
    }
}
