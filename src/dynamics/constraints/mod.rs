//! Joint Constraints
//!
//! Velocity-level constraints solved alongside contacts:
//!
//! - [`PointOnLine`]: a point of one body stays on a line through another
//! - [`SinglePointOnLine`]: a body point stays on a fixed world line
//! - [`FixedAngle`]: a body keeps its world orientation
//!
//! All share the same life cycle: `prepare_for_iteration` once per step
//! (Jacobian, effective mass, bias and warm start), then `iterate` once per
//! solver pass.

pub mod fixed_angle;
pub mod point_on_line;
pub mod single_point_on_line;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::fixed::FixedScalar;
use crate::core::hash::{StateHash, StateHasher};
use crate::debug::DebugDrawer;
use crate::error::{PhysicsError, PhysicsResult};

use super::body::{BodyHandle, BodySet};

pub use fixed_angle::FixedAngle;
pub use point_on_line::PointOnLine;
pub use single_point_on_line::SinglePointOnLine;

/// Stable identifier of a constraint in a [`ConstraintSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConstraintHandle(pub u32);

impl fmt::Display for ConstraintHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "constraint#{}", self.0)
    }
}

/// Any supported joint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Constraint {
    /// Two-body point on line
    PointOnLine(PointOnLine),
    /// Body point on a world line
    PointOnWorldLine(SinglePointOnLine),
    /// Orientation lock
    FixedAngle(FixedAngle),
}

impl Constraint {
    /// Bodies this constraint acts on; the second is `None` for single-body joints.
    pub fn bodies(&self) -> (BodyHandle, Option<BodyHandle>) {
        match self {
            Constraint::PointOnLine(c) => {
                let (a, b) = c.bodies();
                (a, Some(b))
            }
            Constraint::PointOnWorldLine(c) => (c.body(), None),
            Constraint::FixedAngle(c) => (c.body(), None),
        }
    }

    /// True if the constraint touches `body`.
    pub fn involves(&self, body: BodyHandle) -> bool {
        match self {
            Constraint::PointOnLine(c) => c.involves(body),
            Constraint::PointOnWorldLine(c) => c.body() == body,
            Constraint::FixedAngle(c) => c.body() == body,
        }
    }

    /// Set the bias factor of the wrapped joint.
    pub fn set_bias_factor(&mut self, bias_factor: FixedScalar) {
        match self {
            Constraint::PointOnLine(c) => c.set_bias_factor(bias_factor),
            Constraint::PointOnWorldLine(c) => c.set_bias_factor(bias_factor),
            Constraint::FixedAngle(c) => c.set_bias_factor(bias_factor),
        }
    }

    /// Set the softness of the wrapped joint.
    pub fn set_softness(&mut self, softness: FixedScalar) {
        match self {
            Constraint::PointOnLine(c) => c.set_softness(softness),
            Constraint::PointOnWorldLine(c) => c.set_softness(softness),
            Constraint::FixedAngle(c) => c.set_softness(softness),
        }
    }

    /// Per-step setup, including warm start.
    pub fn prepare_for_iteration(&mut self, bodies: &mut BodySet, timestep: FixedScalar) -> PhysicsResult<()> {
        match self {
            Constraint::PointOnLine(c) => c.prepare_for_iteration(bodies, timestep),
            Constraint::PointOnWorldLine(c) => c.prepare_for_iteration(bodies, timestep),
            Constraint::FixedAngle(c) => c.prepare_for_iteration(bodies, timestep),
        }
    }

    /// One solver pass.
    pub fn iterate(&mut self, bodies: &mut BodySet) -> PhysicsResult<()> {
        match self {
            Constraint::PointOnLine(c) => c.iterate(bodies),
            Constraint::PointOnWorldLine(c) => c.iterate(bodies),
            Constraint::FixedAngle(c) => c.iterate(bodies),
        }
    }

    /// Emit debug geometry. Orientation locks draw nothing.
    pub fn debug_draw(&self, bodies: &BodySet, drawer: &mut dyn DebugDrawer) -> PhysicsResult<()> {
        match self {
            Constraint::PointOnLine(c) => c.debug_draw(bodies, drawer),
            Constraint::PointOnWorldLine(c) => c.debug_draw(bodies, drawer),
            Constraint::FixedAngle(_) => Ok(()),
        }
    }

    fn hash_into(&self, hasher: &mut StateHasher) {
        match self {
            Constraint::PointOnLine(c) => {
                hasher.update_u8(0);
                hasher.update_fixed(c.applied_impulse());
            }
            Constraint::PointOnWorldLine(c) => {
                hasher.update_u8(1);
                hasher.update_fixed(c.applied_impulse());
            }
            Constraint::FixedAngle(c) => {
                hasher.update_u8(2);
                hasher.update_vec3(c.applied_impulse());
            }
        }
    }
}

impl From<PointOnLine> for Constraint {
    fn from(c: PointOnLine) -> Self {
        Constraint::PointOnLine(c)
    }
}

impl From<SinglePointOnLine> for Constraint {
    fn from(c: SinglePointOnLine) -> Self {
        Constraint::PointOnWorldLine(c)
    }
}

impl From<FixedAngle> for Constraint {
    fn from(c: FixedAngle) -> Self {
        Constraint::FixedAngle(c)
    }
}

/// Constraints keyed by handle, solved in handle order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConstraintSet {
    constraints: BTreeMap<ConstraintHandle, Constraint>,
    next_id: u32,
}

impl ConstraintSet {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a constraint. Handles are never reused.
    pub fn insert(&mut self, constraint: impl Into<Constraint>) -> ConstraintHandle {
        let handle = ConstraintHandle(self.next_id);
        self.next_id += 1;
        let constraint = constraint.into();
        debug!("Added {} on {:?}", handle, constraint.bodies());
        self.constraints.insert(handle, constraint);
        handle
    }

    /// Remove and return a constraint.
    pub fn remove(&mut self, handle: ConstraintHandle) -> PhysicsResult<Constraint> {
        self.constraints
            .remove(&handle)
            .ok_or(PhysicsError::ConstraintNotFound(handle))
    }

    /// Constraint behind `handle`.
    pub fn get(&self, handle: ConstraintHandle) -> PhysicsResult<&Constraint> {
        self.constraints
            .get(&handle)
            .ok_or(PhysicsError::ConstraintNotFound(handle))
    }

    /// Mutable constraint behind `handle`.
    pub fn get_mut(&mut self, handle: ConstraintHandle) -> PhysicsResult<&mut Constraint> {
        self.constraints
            .get_mut(&handle)
            .ok_or(PhysicsError::ConstraintNotFound(handle))
    }

    /// Drop every constraint touching `body`; returns how many went.
    pub fn remove_body(&mut self, body: BodyHandle) -> usize {
        let before = self.constraints.len();
        self.constraints.retain(|_, c| !c.involves(body));
        before - self.constraints.len()
    }

    /// Constraints in handle order.
    pub fn iter(&self) -> impl Iterator<Item = (ConstraintHandle, &Constraint)> {
        self.constraints.iter().map(|(h, c)| (*h, c))
    }

    /// Number of live constraints.
    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    /// True if no constraint is live.
    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    /// `prepare_for_iteration` on every constraint.
    pub fn prepare_all(&mut self, bodies: &mut BodySet, timestep: FixedScalar) -> PhysicsResult<()> {
        for constraint in self.constraints.values_mut() {
            constraint.prepare_for_iteration(bodies, timestep)?;
        }
        Ok(())
    }

    /// One `iterate` pass over every constraint.
    pub fn iterate_all(&mut self, bodies: &mut BodySet) -> PhysicsResult<()> {
        for constraint in self.constraints.values_mut() {
            constraint.iterate(bodies)?;
        }
        Ok(())
    }

    /// Debug geometry of every constraint.
    pub fn debug_draw_all(&self, bodies: &BodySet, drawer: &mut dyn DebugDrawer) -> PhysicsResult<()> {
        for constraint in self.constraints.values() {
            constraint.debug_draw(bodies, drawer)?;
        }
        Ok(())
    }

    /// Feed every constraint's accumulated impulse into `hasher`, in handle order.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u32(self.constraints.len() as u32);
        for (handle, constraint) in &self.constraints {
            hasher.update_u32(handle.0);
            constraint.hash_into(hasher);
        }
    }

    /// Digest of every accumulated impulse.
    pub fn state_hash(&self) -> StateHash {
        let mut hasher = StateHasher::for_constraint_state();
        self.hash_into(&mut hasher);
        hasher.finalize()
    }
}

// =============================================================================
// TESTS
// =============================================================================
