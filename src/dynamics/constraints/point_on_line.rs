//! Two-body point-on-line joint.
//!
//! A line fixed on body 1 must keep passing through a point fixed on body 2.
//! Error: `C = |(p1 - p2) × l|`, the distance of the body 2 point from the line.

use serde::{Deserialize, Serialize};

use crate::core::fixed::FixedScalar;
use crate::core::vec3::FixedVec3;
use crate::debug::DebugDrawer;
use crate::dynamics::body::{BodyHandle, BodySet, RigidBody};
use crate::error::{PhysicsError, PhysicsResult};

/// Keeps a point of body 2 on a line through body 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointOnLine {
    body1: BodyHandle,
    body2: BodyHandle,
    local_anchor1: FixedVec3,
    local_anchor2: FixedVec3,
    /// Line direction in body 1 local axes.
    line_local: FixedVec3,

    bias_factor: FixedScalar,
    softness: FixedScalar,

    r1: FixedVec3,
    r2: FixedVec3,
    jacobian: [FixedVec3; 4],
    effective_mass: FixedScalar,
    accumulated_impulse: FixedScalar,
    bias: FixedScalar,
    softness_over_dt: FixedScalar,
}

impl PointOnLine {
    /// Line from `line_start_on_body1` through `point_on_body2` (both world points).
    ///
    /// Fails with [`PhysicsError::ZeroLineDirection`] if the two points coincide.
    pub fn new(
        bodies: &BodySet,
        body1: BodyHandle,
        body2: BodyHandle,
        line_start_on_body1: FixedVec3,
        point_on_body2: FixedVec3,
    ) -> PhysicsResult<Self> {
        if body1 == body2 {
            return Err(PhysicsError::SameBody(body1));
        }
        let b1 = bodies.get(body1)?;
        let b2 = bodies.get(body2)?;

        let direction = (line_start_on_body1 - point_on_body2).normalize();
        if direction.is_zero() {
            return Err(PhysicsError::ZeroLineDirection);
        }

        Ok(Self {
            body1,
            body2,
            local_anchor1: (line_start_on_body1 - b1.position()).transform(&b1.inv_orientation()),
            local_anchor2: (point_on_body2 - b2.position()).transform(&b2.inv_orientation()),
            line_local: direction.transform(&b1.inv_orientation()),
            bias_factor: FixedScalar::HALF,
            softness: FixedScalar::ZERO,
            r1: FixedVec3::ZERO,
            r2: FixedVec3::ZERO,
            jacobian: [FixedVec3::ZERO; 4],
            effective_mass: FixedScalar::ZERO,
            accumulated_impulse: FixedScalar::ZERO,
            bias: FixedScalar::ZERO,
            softness_over_dt: FixedScalar::ZERO,
        })
    }

    /// `(body1, body2)`.
    pub fn bodies(&self) -> (BodyHandle, BodyHandle) {
        (self.body1, self.body2)
    }

    /// Fraction of the error corrected per step.
    pub fn bias_factor(&self) -> FixedScalar {
        self.bias_factor
    }

    /// Set the fraction of the error corrected per step.
    pub fn set_bias_factor(&mut self, bias_factor: FixedScalar) {
        self.bias_factor = bias_factor;
    }

    /// Constraint softness.
    pub fn softness(&self) -> FixedScalar {
        self.softness
    }

    /// Set the constraint softness.
    pub fn set_softness(&mut self, softness: FixedScalar) {
        self.softness = softness;
    }

    /// Total impulse applied so far.
    pub fn applied_impulse(&self) -> FixedScalar {
        self.accumulated_impulse
    }

    /// Distance of the body 2 point from the line.
    pub fn error(&self, bodies: &BodySet) -> PhysicsResult<FixedScalar> {
        let b1 = bodies.get(self.body1)?;
        let b2 = bodies.get(self.body2)?;
        let (p1, p2, l) = self.world_points(b1, b2);
        Ok(l.cross(p2 - p1).length())
    }

    /// Jacobian, effective mass and bias; warm starts with the previous impulse.
    pub fn prepare_for_iteration(&mut self, bodies: &mut BodySet, timestep: FixedScalar) -> PhysicsResult<()> {
        let (b1, b2) = bodies.pair_mut(self.body1, self.body2)?;

        self.r1 = self.local_anchor1.transform(&b1.orientation());
        self.r2 = self.local_anchor2.transform(&b2.orientation());
        let (p1, p2, l) = self.world_points(b1, b2);

        // Degenerate intermediate stays unnormalized.
        let t = (p1 - p2).cross(l).normalize().cross(l);

        self.jacobian = [t, (self.r1 + p2 - p1).cross(t), -t, -self.r2.cross(t)];

        let mut k = b1.solver_inverse_mass()
            + b2.solver_inverse_mass()
            + self.jacobian[1].transform(&b1.solver_inv_inertia_world()).dot(self.jacobian[1])
            + self.jacobian[3].transform(&b2.solver_inv_inertia_world()).dot(self.jacobian[3]);

        self.softness_over_dt = self.softness / timestep;
        k += self.softness_over_dt;
        self.effective_mass = if k.is_zero() { k } else { FixedScalar::ONE / k };

        self.bias = -l.cross(p2 - p1).length() * self.bias_factor * (FixedScalar::ONE / timestep);

        self.apply(b1, b2, self.accumulated_impulse);
        Ok(())
    }

    /// One relaxation pass.
    pub fn iterate(&mut self, bodies: &mut BodySet) -> PhysicsResult<()> {
        let (b1, b2) = bodies.pair_mut(self.body1, self.body2)?;

        let jv = b1.linear_velocity.dot(self.jacobian[0])
            + b1.angular_velocity.dot(self.jacobian[1])
            + b2.linear_velocity.dot(self.jacobian[2])
            + b2.angular_velocity.dot(self.jacobian[3]);

        let softness_scalar = self.accumulated_impulse * self.softness_over_dt;
        let lambda = -self.effective_mass * (jv + self.bias + softness_scalar);
        self.accumulated_impulse += lambda;

        self.apply(b1, b2, lambda);
        Ok(())
    }

    /// The line, from the body 1 anchor outwards.
    pub fn debug_draw(&self, bodies: &BodySet, drawer: &mut dyn DebugDrawer) -> PhysicsResult<()> {
        let b1 = bodies.get(self.body1)?;
        let start = b1.position() + self.local_anchor1.transform(&b1.orientation());
        let direction = self.line_local.transform(&b1.orientation());
        drawer.draw_line(start, start + direction * FixedScalar::from_int(100));
        Ok(())
    }

    pub(crate) fn involves(&self, body: BodyHandle) -> bool {
        self.body1 == body || self.body2 == body
    }

    /// `(p1, p2, l)` from the current transforms.
    fn world_points(&self, b1: &RigidBody, b2: &RigidBody) -> (FixedVec3, FixedVec3, FixedVec3) {
        let r1 = self.local_anchor1.transform(&b1.orientation());
        let r2 = self.local_anchor2.transform(&b2.orientation());
        let l = self.line_local.transform(&b1.orientation()).normalize();
        (b1.position() + r1, b2.position() + r2, l)
    }

    fn apply(&self, b1: &mut RigidBody, b2: &mut RigidBody, lambda: FixedScalar) {
        b1.apply_constraint_impulse(self.jacobian[0] * lambda, self.jacobian[1] * lambda);
        b2.apply_constraint_impulse(self.jacobian[2] * lambda, self.jacobian[3] * lambda);
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::Shape;
    use crate::core::mat3::FixedMat3;
    use crate::debug::LineBuffer;

    /// Static rail at the origin and a unit-mass slider at (2, 0, 0).
    fn rail_and_slider() -> (BodySet, BodyHandle, BodyHandle) {
        let mut bodies = BodySet::new();
        let mut rail = RigidBody::new(Shape::cylinder(FixedScalar::ONE, FixedScalar::ONE));
        rail.set_static(true);
        let rail = bodies.insert(rail);

        let mut slider = RigidBody::new(Shape::cylinder(FixedScalar::ONE, FixedScalar::ONE));
        slider.set_mass_properties(FixedMat3::IDENTITY, FixedScalar::ONE);
        slider.set_position(FixedVec3::from_ints(2, 0, 0));
        let slider = bodies.insert(slider);
        (bodies, rail, slider)
    }

    #[test]
    fn test_zero_line_rejected() {
        let (bodies, rail, slider) = rail_and_slider();
        let p = FixedVec3::from_ints(2, 0, 0);
        assert_eq!(
            PointOnLine::new(&bodies, rail, slider, p, p),
            Err(PhysicsError::ZeroLineDirection)
        );
        assert_eq!(
            PointOnLine::new(&bodies, slider, slider, FixedVec3::ZERO, p),
            Err(PhysicsError::SameBody(slider))
        );
    }

    #[test]
    fn test_slider_pulled_back_to_line() {
        let (mut bodies, rail, slider) = rail_and_slider();
        let mut joint =
            PointOnLine::new(&bodies, rail, slider, FixedVec3::ZERO, FixedVec3::from_ints(2, 0, 0)).unwrap();
        assert_eq!(joint.error(&bodies).unwrap(), FixedScalar::ZERO);

        bodies.get_mut(slider).unwrap().set_position(FixedVec3::from_ints(2, 1, 0));
        let dt = FixedScalar::from_ratio(1, 50);
        let mut last = joint.error(&bodies).unwrap();
        assert_eq!(last, FixedScalar::ONE);

        for _ in 0..12 {
            joint.prepare_for_iteration(&mut bodies, dt).unwrap();
            for _ in 0..4 {
                joint.iterate(&mut bodies).unwrap();
            }
            bodies.integrate(dt);

            let error = joint.error(&bodies).unwrap();
            // Bias factor 0.5: half of the gap closes every step.
            assert!((error.to_f64() - last.to_f64() * 0.5).abs() < 1e-6, "{error} vs {last}");
            last = error;
        }
        assert!(last.to_f64() < 1e-3);
        // The rail is static and never moves.
        assert_eq!(bodies.get(rail).unwrap().linear_velocity, FixedVec3::ZERO);
    }

    #[test]
    fn test_motion_along_line_is_free() {
        let (mut bodies, rail, slider) = rail_and_slider();
        let mut joint =
            PointOnLine::new(&bodies, rail, slider, FixedVec3::ZERO, FixedVec3::from_ints(2, 0, 0)).unwrap();
        bodies.get_mut(slider).unwrap().set_position(FixedVec3::from_ints(2, 1, 0));
        bodies.get_mut(slider).unwrap().linear_velocity = FixedVec3::from_ints(3, 0, 0);

        joint.prepare_for_iteration(&mut bodies, FixedScalar::from_ratio(1, 50)).unwrap();
        joint.iterate(&mut bodies).unwrap();
        assert_eq!(bodies.get(slider).unwrap().linear_velocity.x, FixedScalar::from_int(3));
        assert!(bodies.get(slider).unwrap().linear_velocity.y < FixedScalar::ZERO);
        assert!(joint.applied_impulse() > FixedScalar::ZERO);
    }

    #[test]
    fn test_debug_draw_line() {
        let (bodies, rail, slider) = rail_and_slider();
        let joint =
            PointOnLine::new(&bodies, rail, slider, FixedVec3::ZERO, FixedVec3::from_ints(2, 0, 0)).unwrap();
        let mut buffer = LineBuffer::new();
        joint.debug_draw(&bodies, &mut buffer).unwrap();
        assert_eq!(buffer.lines, vec![(FixedVec3::ZERO, FixedVec3::from_ints(-100, 0, 0))]);
    }
}
