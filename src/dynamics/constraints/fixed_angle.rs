//! Single-body fixed-angle joint.
//!
//! Holds a body at the world orientation it had when the joint was created.
//! Only angular velocity is touched:
//!
//! ```text
//! C    = rotation vector of  initialᵀ · current
//! J    = [0, I]
//! 1/m  = I⁻¹_world (+ softness/dt on the diagonal)
//! ```

use serde::{Deserialize, Serialize};

use crate::core::fixed::FixedScalar;
use crate::core::mat3::FixedMat3;
use crate::core::vec3::FixedVec3;
use crate::dynamics::body::{BodyHandle, BodySet};
use crate::error::PhysicsResult;

/// Locks a body's orientation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedAngle {
    body: BodyHandle,
    initial_orientation: FixedMat3,

    bias_factor: FixedScalar,
    softness: FixedScalar,

    effective_mass: FixedMat3,
    accumulated_impulse: FixedVec3,
    bias: FixedVec3,
    softness_over_dt: FixedScalar,
}

impl FixedAngle {
    /// Lock `body` at its current orientation.
    pub fn new(bodies: &BodySet, body: BodyHandle) -> PhysicsResult<Self> {
        let initial_orientation = bodies.get(body)?.orientation();
        Ok(Self {
            body,
            initial_orientation,
            bias_factor: FixedScalar::from_ratio(5, 100),
            softness: FixedScalar::ZERO,
            effective_mass: FixedMat3::ZERO,
            accumulated_impulse: FixedVec3::ZERO,
            bias: FixedVec3::ZERO,
            softness_over_dt: FixedScalar::ZERO,
        })
    }

    /// The locked body.
    pub fn body(&self) -> BodyHandle {
        self.body
    }

    /// Orientation the body is held at.
    pub fn initial_orientation(&self) -> FixedMat3 {
        self.initial_orientation
    }

    /// Orientation the body is held at.
    pub fn set_initial_orientation(&mut self, orientation: FixedMat3) {
        self.initial_orientation = orientation;
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

    /// Total angular impulse applied so far.
    pub fn applied_impulse(&self) -> FixedVec3 {
        self.accumulated_impulse
    }

    /// Angle (radians, in [0, π]) between the current and the locked orientation.
    pub fn orientation_error(&self, bodies: &BodySet) -> PhysicsResult<FixedScalar> {
        let orientation = bodies.get(self.body)?.orientation();
        let (_, angle) = self.rotation_error(&orientation);
        Ok(angle)
    }

    /// Effective mass and bias; warm starts with the previous impulse.
    pub fn prepare_for_iteration(&mut self, bodies: &mut BodySet, timestep: FixedScalar) -> PhysicsResult<()> {
        let b = bodies.get_mut(self.body)?;
        let inv_inertia = b.solver_inv_inertia_world();

        self.softness_over_dt = self.softness / timestep;
        let s = self.softness_over_dt;
        self.effective_mass = (inv_inertia + FixedMat3::diagonal(s, s, s)).inverse();

        let (axis, _) = self.rotation_error(&b.orientation());
        self.bias = axis * self.bias_factor * (-FixedScalar::ONE / timestep);

        b.apply_constraint_impulse(FixedVec3::ZERO, self.accumulated_impulse);
        Ok(())
    }

    /// One relaxation pass.
    pub fn iterate(&mut self, bodies: &mut BodySet) -> PhysicsResult<()> {
        let b = bodies.get_mut(self.body)?;

        let softness_vector = self.accumulated_impulse * self.softness_over_dt;
        let lambda = -(b.angular_velocity + self.bias + softness_vector).transform(&self.effective_mass);
        self.accumulated_impulse += lambda;

        b.apply_constraint_impulse(FixedVec3::ZERO, lambda);
        Ok(())
    }

    /// Scaled rotation axis and angle of `initialᵀ · current`.
    fn rotation_error(&self, current: &FixedMat3) -> (FixedVec3, FixedScalar) {
        let q = self.initial_orientation.transpose() * *current;

        let skew = FixedVec3::new(q.m32 - q.m23, q.m13 - q.m31, q.m21 - q.m12);
        let r = skew.length();
        let angle = r.atan2(q.trace() - FixedScalar::ONE);

        let mut axis = skew * angle;
        if !r.is_zero() {
            axis = axis * (FixedScalar::ONE / r);
        }
        (axis, angle)
    }
}

// =============================================================================
// TESTS
// =============================================================================
