//! Single-body point-on-line joint: a body point slides along a fixed world line.

use serde::{Deserialize, Serialize};

use crate::core::fixed::FixedScalar;
use crate::core::vec3::FixedVec3;
use crate::debug::DebugDrawer;
use crate::dynamics::body::{BodyHandle, BodySet, RigidBody};
use crate::error::{PhysicsError, PhysicsResult};

/// Keeps a point of one body on a world-space line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinglePointOnLine {
    body: BodyHandle,
    local_anchor: FixedVec3,
    /// World point the line passes through.
    anchor: FixedVec3,
    /// Unit line direction, world space.
    axis: FixedVec3,

    bias_factor: FixedScalar,
    softness: FixedScalar,

    r1: FixedVec3,
    jacobian: [FixedVec3; 2],
    effective_mass: FixedScalar,
    accumulated_impulse: FixedScalar,
    bias: FixedScalar,
    softness_over_dt: FixedScalar,
}

impl SinglePointOnLine {
    /// The line runs along `line_direction` through the body's current
    /// `local_anchor` position.
    pub fn new(
        bodies: &BodySet,
        body: BodyHandle,
        local_anchor: FixedVec3,
        line_direction: FixedVec3,
    ) -> PhysicsResult<Self> {
        if line_direction.length_squared().is_zero() {
            return Err(PhysicsError::ZeroLineDirection);
        }
        let b = bodies.get(body)?;

        Ok(Self {
            body,
            local_anchor,
            anchor: b.position() + local_anchor.transform(&b.orientation()),
            axis: line_direction.normalize(),
            bias_factor: FixedScalar::HALF,
            softness: FixedScalar::ZERO,
            r1: FixedVec3::ZERO,
            jacobian: [FixedVec3::ZERO; 2],
            effective_mass: FixedScalar::ZERO,
            accumulated_impulse: FixedScalar::ZERO,
            bias: FixedScalar::ZERO,
            softness_over_dt: FixedScalar::ZERO,
        })
    }

    /// The constrained body.
    pub fn body(&self) -> BodyHandle {
        self.body
    }

    /// World point on the line.
    pub fn anchor(&self) -> FixedVec3 {
        self.anchor
    }

    /// Move the world anchor the line passes through.
    pub fn set_anchor(&mut self, anchor: FixedVec3) {
        self.anchor = anchor;
    }

    /// Unit line direction.
    pub fn axis(&self) -> FixedVec3 {
        self.axis
    }

    /// Set the line direction; it is normalized on the way in.
    pub fn set_axis(&mut self, axis: FixedVec3) -> PhysicsResult<()> {
        if axis.length_squared().is_zero() {
            return Err(PhysicsError::ZeroLineDirection);
        }
        self.axis = axis.normalize();
        Ok(())
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

    /// Distance of the body point from the line.
    pub fn error(&self, bodies: &BodySet) -> PhysicsResult<FixedScalar> {
        let b = bodies.get(self.body)?;
        let p1 = b.position() + self.local_anchor.transform(&b.orientation());
        Ok(self.axis.cross(p1 - self.anchor).length())
    }

    /// Jacobian, effective mass and bias; warm starts with the previous impulse.
    pub fn prepare_for_iteration(&mut self, bodies: &mut BodySet, timestep: FixedScalar) -> PhysicsResult<()> {
        let b = bodies.get_mut(self.body)?;

        self.r1 = self.local_anchor.transform(&b.orientation());
        let p1 = b.position() + self.r1;
        let l = self.axis;

        let t = (p1 - self.anchor).cross(l).normalize().cross(l);
        self.jacobian = [t, self.r1.cross(t)];

        let mut k = b.solver_inverse_mass()
            + self.jacobian[1].transform(&b.solver_inv_inertia_world()).dot(self.jacobian[1]);
        self.softness_over_dt = self.softness / timestep;
        k += self.softness_over_dt;
        self.effective_mass = if k.is_zero() { k } else { FixedScalar::ONE / k };

        self.bias = -l.cross(p1 - self.anchor).length() * self.bias_factor * (FixedScalar::ONE / timestep);

        self.apply(b, self.accumulated_impulse);
        Ok(())
    }

    /// One relaxation pass.
    pub fn iterate(&mut self, bodies: &mut BodySet) -> PhysicsResult<()> {
        let b = bodies.get_mut(self.body)?;

        let jv = b.linear_velocity.dot(self.jacobian[0]) + b.angular_velocity.dot(self.jacobian[1]);
        let softness_scalar = self.accumulated_impulse * self.softness_over_dt;
        let lambda = -self.effective_mass * (jv + self.bias + softness_scalar);
        self.accumulated_impulse += lambda;

        self.apply(b, lambda);
        Ok(())
    }

    /// The line around the anchor, and the body's lever arm.
    pub fn debug_draw(&self, bodies: &BodySet, drawer: &mut dyn DebugDrawer) -> PhysicsResult<()> {
        let b = bodies.get(self.body)?;
        let reach = self.axis * FixedScalar::from_int(50);
        drawer.draw_line(self.anchor - reach, self.anchor + reach);
        drawer.draw_line(b.position(), b.position() + self.r1);
        Ok(())
    }

    fn apply(&self, b: &mut RigidBody, lambda: FixedScalar) {
        b.apply_constraint_impulse(self.jacobian[0] * lambda, self.jacobian[1] * lambda);
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

    fn bead() -> (BodySet, BodyHandle) {
        let mut bodies = BodySet::new();
        let mut body = RigidBody::new(Shape::capsule(FixedScalar::ONE, FixedScalar::HALF));
        body.set_mass_properties(FixedMat3::IDENTITY, FixedScalar::ONE);
        let handle = bodies.insert(body);
        (bodies, handle)
    }

    #[test]
    fn test_zero_direction_rejected() {
        let (bodies, handle) = bead();
        assert_eq!(
            SinglePointOnLine::new(&bodies, handle, FixedVec3::ZERO, FixedVec3::ZERO),
            Err(PhysicsError::ZeroLineDirection)
        );
        assert_eq!(
            SinglePointOnLine::new(&bodies, BodyHandle(9), FixedVec3::ZERO, FixedVec3::UNIT_X),
            Err(PhysicsError::BodyNotFound(BodyHandle(9)))
        );
    }

    #[test]
    fn test_axis_is_normalized() {
        let (bodies, handle) = bead();
        let mut joint =
            SinglePointOnLine::new(&bodies, handle, FixedVec3::ZERO, FixedVec3::from_ints(0, 0, 4)).unwrap();
        assert_eq!(joint.axis(), FixedVec3::UNIT_Z);
        assert!(joint.set_axis(FixedVec3::ZERO).is_err());
        assert_eq!(joint.axis(), FixedVec3::UNIT_Z);
    }

    #[test]
    fn test_bead_returns_to_line() {
        let (mut bodies, handle) = bead();
        let mut joint = SinglePointOnLine::new(&bodies, handle, FixedVec3::ZERO, FixedVec3::UNIT_X).unwrap();
        assert_eq!(joint.anchor(), FixedVec3::ZERO);

        {
            let body = bodies.get_mut(handle).unwrap();
            body.set_position(FixedVec3::from_ints(0, 1, 0));
            body.linear_velocity = FixedVec3::UNIT_X;
        }

        let dt = FixedScalar::from_ratio(1, 50);
        let mut last = joint.error(&bodies).unwrap();
        for _ in 0..10 {
            joint.prepare_for_iteration(&mut bodies, dt).unwrap();
            for _ in 0..4 {
                joint.iterate(&mut bodies).unwrap();
            }
            bodies.integrate(dt);

            let error = joint.error(&bodies).unwrap();
            assert!((error.to_f64() - last.to_f64() * 0.5).abs() < 1e-6, "{error} vs {last}");
            last = error;
        }

        // Sliding along the line is untouched.
        assert_eq!(bodies.get(handle).unwrap().linear_velocity.x, FixedScalar::ONE);
        assert!(last.to_f64() < 1e-3);
    }

    #[test]
    fn test_debug_draw() {
        let (mut bodies, handle) = bead();
        let mut joint = SinglePointOnLine::new(&bodies, handle, FixedVec3::UNIT_Y, FixedVec3::UNIT_X).unwrap();
        joint.prepare_for_iteration(&mut bodies, FixedScalar::from_ratio(1, 60)).unwrap();

        let mut buffer = LineBuffer::new();
        joint.debug_draw(&bodies, &mut buffer).unwrap();
        assert_eq!(
            buffer.lines,
            vec![
                (FixedVec3::from_ints(-50, 1, 0), FixedVec3::from_ints(50, 1, 0)),
                (FixedVec3::ZERO, FixedVec3::UNIT_Y),
            ]
        );
    }
}
