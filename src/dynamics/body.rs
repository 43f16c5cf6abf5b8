//! Rigid Bodies
//!
//! Bodies live in a [`BodySet`], an index-addressed table. Contacts and
//! constraints refer to bodies by [`BodyHandle`] and borrow them only for
//! the duration of a solver call.
//!
//! Handles are never reused: a removed slot stays empty, so a stale handle
//! reports [`PhysicsError::BodyNotFound`] instead of aliasing a newer body.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::collision::Shape;
use crate::core::fixed::FixedScalar;
use crate::core::hash::{StateHash, StateHasher};
use crate::core::mat3::FixedMat3;
use crate::core::quat::FixedQuat;
use crate::core::vec3::FixedVec3;
use crate::error::{PhysicsError, PhysicsResult};

use super::material::Material;

/// Index of a body inside a [`BodySet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BodyHandle(pub u32);

impl BodyHandle {
    /// Slot index.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for BodyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "body#{}", self.0)
    }
}

/// A rigid body: transform, velocities, mass data, material and shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RigidBody {
    position: FixedVec3,
    orientation: FixedMat3,
    inv_orientation: FixedMat3,

    /// Linear velocity (world)
    pub linear_velocity: FixedVec3,
    /// Angular velocity (world)
    pub angular_velocity: FixedVec3,

    inverse_mass: FixedScalar,
    inertia: FixedMat3,
    inv_inertia: FixedMat3,
    inv_inertia_world: FixedMat3,

    is_static: bool,
    is_particle: bool,

    /// Surface material
    pub material: Material,
    shape: Shape,
}

impl RigidBody {
    /// Dynamic body at the origin with mass data taken from the shape.
    pub fn new(shape: Shape) -> Self {
        let props = shape.mass_properties();
        let mut body = Self {
            position: FixedVec3::ZERO,
            orientation: FixedMat3::IDENTITY,
            inv_orientation: FixedMat3::IDENTITY,
            linear_velocity: FixedVec3::ZERO,
            angular_velocity: FixedVec3::ZERO,
            inverse_mass: FixedScalar::ONE,
            inertia: FixedMat3::IDENTITY,
            inv_inertia: FixedMat3::IDENTITY,
            inv_inertia_world: FixedMat3::IDENTITY,
            is_static: false,
            is_particle: false,
            material: Material::default(),
            shape,
        };
        body.set_mass_properties(props.inertia, props.mass);
        body
    }

    /// Override mass and local inertia. A zero mass gives a zero inverse mass.
    pub fn set_mass_properties(&mut self, inertia: FixedMat3, mass: FixedScalar) {
        self.inertia = inertia;
        self.inv_inertia = inertia.inverse();
        self.inverse_mass = if mass.is_zero() {
            FixedScalar::ZERO
        } else {
            FixedScalar::ONE / mass
        };
        self.update_world_inertia();
    }

    /// Replace the shape and take its mass data.
    pub fn set_shape(&mut self, shape: Shape) {
        let props = shape.mass_properties();
        self.shape = shape;
        self.set_mass_properties(props.inertia, props.mass);
    }

    /// Collision shape.
    #[inline]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Centre of mass in world space.
    #[inline]
    pub fn position(&self) -> FixedVec3 {
        self.position
    }

    /// Move the body.
    #[inline]
    pub fn set_position(&mut self, position: FixedVec3) {
        self.position = position;
    }

    /// Orientation matrix (rows are the local axes in world space).
    #[inline]
    pub fn orientation(&self) -> FixedMat3 {
        self.orientation
    }

    /// Inverse (transpose) of the orientation.
    #[inline]
    pub fn inv_orientation(&self) -> FixedMat3 {
        self.inv_orientation
    }

    /// Set the orientation; refreshes the inverse and the world inertia.
    pub fn set_orientation(&mut self, orientation: FixedMat3) {
        self.orientation = orientation;
        self.inv_orientation = orientation.transpose();
        self.update_world_inertia();
    }

    /// `1 / mass`, or zero for a massless body.
    #[inline]
    pub fn inverse_mass(&self) -> FixedScalar {
        self.inverse_mass
    }

    /// Local inertia tensor.
    #[inline]
    pub fn inertia(&self) -> FixedMat3 {
        self.inertia
    }

    /// Local inverse inertia tensor.
    #[inline]
    pub fn inv_inertia(&self) -> FixedMat3 {
        self.inv_inertia
    }

    /// Inverse inertia in world axes.
    #[inline]
    pub fn inv_inertia_world(&self) -> FixedMat3 {
        self.inv_inertia_world
    }

    /// Static bodies never move.
    #[inline]
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Pin or release the body. Pinning clears both velocities.
    pub fn set_static(&mut self, is_static: bool) {
        self.is_static = is_static;
        if is_static {
            self.linear_velocity = FixedVec3::ZERO;
            self.angular_velocity = FixedVec3::ZERO;
        }
    }

    /// Mass points have no rotational response.
    #[inline]
    pub fn is_particle(&self) -> bool {
        self.is_particle
    }

    /// Mark as a mass point. Clears the angular velocity.
    pub fn set_particle(&mut self, is_particle: bool) {
        self.is_particle = is_particle;
        if is_particle {
            self.angular_velocity = FixedVec3::ZERO;
        }
    }

    /// Apply an impulse at `relative_position` (world offset from the centre).
    pub fn apply_impulse(&mut self, impulse: FixedVec3, relative_position: FixedVec3) {
        if self.is_static {
            return;
        }
        self.linear_velocity += impulse * self.inverse_mass;
        if !self.is_particle {
            self.angular_velocity += relative_position.cross(impulse).transform(&self.inv_inertia_world);
        }
    }

    /// Inverse mass as the constraint solver sees it: zero when static.
    #[inline]
    pub fn solver_inverse_mass(&self) -> FixedScalar {
        if self.is_static {
            FixedScalar::ZERO
        } else {
            self.inverse_mass
        }
    }

    /// Inverse world inertia as the constraint solver sees it: zero when
    /// static or a mass point.
    #[inline]
    pub fn solver_inv_inertia_world(&self) -> FixedMat3 {
        if self.is_static || self.is_particle {
            FixedMat3::ZERO
        } else {
            self.inv_inertia_world
        }
    }

    /// Velocity change from a constraint impulse split into its linear part
    /// and its angular part (`J_angular · λ`).
    pub fn apply_constraint_impulse(&mut self, linear: FixedVec3, angular: FixedVec3) {
        if self.is_static {
            return;
        }
        self.linear_velocity += linear * self.inverse_mass;
        if !self.is_particle {
            self.angular_velocity += angular.transform(&self.inv_inertia_world);
        }
    }

    /// Advance position and orientation by `dt` with the current velocities.
    pub fn integrate(&mut self, dt: FixedScalar) {
        if self.is_static {
            return;
        }
        self.position += self.linear_velocity * dt;

        if self.is_particle {
            return;
        }
        let speed = self.angular_velocity.length();
        if speed.is_zero() {
            return;
        }

        let half_angle = speed * dt * FixedScalar::HALF;
        let axis = self.angular_velocity * (half_angle.sin() / speed);
        let delta = FixedQuat::new(axis.x, axis.y, axis.z, half_angle.cos());

        let current = FixedQuat::from_matrix(&self.orientation);
        let next = (delta * current).normalize();
        self.set_orientation(next.to_matrix());
    }

    /// World-space bounding box.
    pub fn bounding_box(&self) -> crate::collision::BoundingBox {
        self.shape.world_bounding_box(self.position, &self.orientation)
    }

    /// Feed the simulation state into `hasher`.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_vec3(self.position);
        hasher.update_mat3(&self.orientation);
        hasher.update_vec3(self.linear_velocity);
        hasher.update_vec3(self.angular_velocity);
        hasher.update_fixed(self.inverse_mass);
        hasher.update_bool(self.is_static);
        hasher.update_bool(self.is_particle);
    }

    fn update_world_inertia(&mut self) {
        self.inv_inertia_world = self.inv_orientation * self.inv_inertia * self.orientation;
    }
}

/// Index-addressed table of bodies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodySet {
    slots: Vec<Option<RigidBody>>,
}

impl BodySet {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a body and return its handle.
    pub fn insert(&mut self, body: RigidBody) -> BodyHandle {
        let handle = BodyHandle(self.slots.len() as u32);
        self.slots.push(Some(body));
        debug!("Inserted {}", handle);
        handle
    }

    /// Remove a body. Its slot is never handed out again.
    pub fn remove(&mut self, handle: BodyHandle) -> PhysicsResult<RigidBody> {
        let body = self
            .slots
            .get_mut(handle.index())
            .and_then(Option::take)
            .ok_or(PhysicsError::BodyNotFound(handle))?;
        debug!("Removed {}", handle);
        Ok(body)
    }

    /// Body behind `handle`.
    pub fn get(&self, handle: BodyHandle) -> PhysicsResult<&RigidBody> {
        self.slots
            .get(handle.index())
            .and_then(Option::as_ref)
            .ok_or(PhysicsError::BodyNotFound(handle))
    }

    /// Mutable body behind `handle`.
    pub fn get_mut(&mut self, handle: BodyHandle) -> PhysicsResult<&mut RigidBody> {
        self.slots
            .get_mut(handle.index())
            .and_then(Option::as_mut)
            .ok_or(PhysicsError::BodyNotFound(handle))
    }

    /// Borrow two distinct bodies mutably, in argument order.
    pub fn pair_mut(
        &mut self,
        a: BodyHandle,
        b: BodyHandle,
    ) -> PhysicsResult<(&mut RigidBody, &mut RigidBody)> {
        if a == b {
            return Err(PhysicsError::SameBody(a));
        }
        let (low, high) = if a < b { (a, b) } else { (b, a) };
        if high.index() >= self.slots.len() {
            return Err(PhysicsError::BodyNotFound(high));
        }

        let (head, tail) = self.slots.split_at_mut(high.index());
        let low_body = head[low.index()]
            .as_mut()
            .ok_or(PhysicsError::BodyNotFound(low))?;
        let high_body = tail[0].as_mut().ok_or(PhysicsError::BodyNotFound(high))?;

        if a < b {
            Ok((low_body, high_body))
        } else {
            Ok((high_body, low_body))
        }
    }

    /// True if `handle` names a live body.
    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.get(handle).is_ok()
    }

    /// Number of live bodies.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// True if no body is live.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live bodies in handle order.
    pub fn iter(&self) -> impl Iterator<Item = (BodyHandle, &RigidBody)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|body| (BodyHandle(i as u32), body)))
    }

    /// Live bodies in handle order, mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (BodyHandle, &mut RigidBody)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_mut().map(|body| (BodyHandle(i as u32), body)))
    }

    /// Integrate every body in handle order.
    pub fn integrate(&mut self, dt: FixedScalar) {
        for (_, body) in self.iter_mut() {
            body.integrate(dt);
        }
    }

    /// Add `velocity_change` to the linear velocity of every dynamic body.
    pub fn apply_velocity_change(&mut self, velocity_change: FixedVec3) {
        for (_, body) in self.iter_mut() {
            if !body.is_static() {
                body.linear_velocity += velocity_change;
            }
        }
    }

    /// Feed every live body, with its handle, into `hasher`.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u32(self.len() as u32);
        for (handle, body) in self.iter() {
            hasher.update_u32(handle.0);
            body.hash_into(hasher);
        }
    }

    /// SHA-256 over the raw state of every live body.
    pub fn state_hash(&self) -> StateHash {
        let mut hasher = StateHasher::for_body_state();
        self.hash_into(&mut hasher);
        hasher.finalize()
    }

    /// Binary snapshot (raw integers throughout).
    pub fn to_snapshot_bytes(&self) -> PhysicsResult<Vec<u8>> {
        bincode::serialize(self).map_err(|e| PhysicsError::Snapshot(e.to_string()))
    }

    /// Restore from [`BodySet::to_snapshot_bytes`].
    pub fn from_snapshot_bytes(bytes: &[u8]) -> PhysicsResult<Self> {
        bincode::deserialize(bytes).map_err(|e| PhysicsError::Snapshot(e.to_string()))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn ball() -> RigidBody {
        RigidBody::new(Shape::cylinder(FixedScalar::ONE, FixedScalar::ONE))
    }

    #[test]
    fn test_body_mass_from_shape() {
        let body = ball();
        let mass = body.shape().mass();
        assert_eq!(body.inverse_mass(), FixedScalar::ONE / mass);
        assert_eq!(body.inv_inertia(), body.inertia().inverse());
        assert_eq!(body.inv_inertia_world(), body.inv_inertia());
    }

    #[test]
    fn test_set_orientation_updates_world_inertia() {
        let mut body = RigidBody::new(Shape::capsule(FixedScalar::from_int(4), FixedScalar::HALF));
        let local = body.inv_inertia();
        body.set_orientation(FixedMat3::from_axis_angle(FixedVec3::UNIT_Z, FixedScalar::PI_OVER_2));

        // The long axis now lies along world X, so X and Y entries swap.
        let world = body.inv_inertia_world();
        assert!((world.m11 - local.m22).abs().to_f64() < 1e-6);
        assert!((world.m22 - local.m11).abs().to_f64() < 1e-6);
        assert_eq!(body.inv_orientation(), body.orientation().transpose());
    }

    #[test]
    fn test_static_body_ignores_impulses() {
        let mut body = ball();
        body.linear_velocity = FixedVec3::UNIT_X;
        body.set_static(true);
        assert_eq!(body.linear_velocity, FixedVec3::ZERO);

        body.apply_impulse(FixedVec3::from_ints(5, 0, 0), FixedVec3::UNIT_Y);
        body.integrate(FixedScalar::ONE);
        assert_eq!(body.linear_velocity, FixedVec3::ZERO);
        assert_eq!(body.position(), FixedVec3::ZERO);
    }

    #[test]
    fn test_particle_has_no_spin() {
        let mut body = ball();
        body.set_particle(true);
        body.apply_impulse(FixedVec3::UNIT_X, FixedVec3::UNIT_Y);
        assert_eq!(body.angular_velocity, FixedVec3::ZERO);
        assert!(body.linear_velocity.x > FixedScalar::ZERO);
    }

    #[test]
    fn test_integrate_rotation() {
        let mut body = ball();
        body.angular_velocity = FixedVec3::new(FixedScalar::ZERO, FixedScalar::ZERO, FixedScalar::PI_OVER_2);
        let dt = FixedScalar::from_ratio(1, 100);
        for _ in 0..100 {
            body.integrate(dt);
        }
        // A quarter turn about Z maps local X onto world Y.
        let image = FixedVec3::UNIT_X.transform(&body.orientation());
        assert!((image - FixedVec3::UNIT_Y).length().to_f64() < 1e-6, "{image:?}");
    }

    #[test]
    fn test_integrate_linear() {
        let mut body = ball();
        body.linear_velocity = FixedVec3::from_ints(2, 0, -1);
        body.integrate(FixedScalar::HALF);
        assert_eq!(body.position(), FixedVec3::new(FixedScalar::ONE, FixedScalar::ZERO, -FixedScalar::HALF));
    }

    #[test]
    fn test_body_set_lookup_and_remove() {
        let mut bodies = BodySet::new();
        let a = bodies.insert(ball());
        let b = bodies.insert(ball());
        assert_eq!(bodies.len(), 2);

        bodies.remove(a).unwrap();
        assert_eq!(bodies.get(a), Err(PhysicsError::BodyNotFound(a)));
        assert_eq!(bodies.remove(a), Err(PhysicsError::BodyNotFound(a)));

        // Handles are not recycled.
        let c = bodies.insert(ball());
        assert_ne!(c, a);
        assert!(bodies.contains(b) && bodies.contains(c));
        assert_eq!(bodies.iter().map(|(h, _)| h).collect::<Vec<_>>(), vec![b, c]);
    }

    #[test]
    fn test_pair_mut() {
        let mut bodies = BodySet::new();
        let a = bodies.insert(ball());
        let b = bodies.insert(ball());

        {
            let (second, first) = bodies.pair_mut(b, a).unwrap();
            second.linear_velocity = FixedVec3::UNIT_Y;
            first.linear_velocity = FixedVec3::UNIT_X;
        }
        assert_eq!(bodies.get(a).unwrap().linear_velocity, FixedVec3::UNIT_X);
        assert_eq!(bodies.get(b).unwrap().linear_velocity, FixedVec3::UNIT_Y);

        assert!(matches!(bodies.pair_mut(a, a), Err(PhysicsError::SameBody(_))));
        assert!(matches!(
            bodies.pair_mut(a, BodyHandle(7)),
            Err(PhysicsError::BodyNotFound(BodyHandle(7)))
        ));
    }

    #[test]
    fn test_state_hash_and_snapshot() {
        let mut bodies = BodySet::new();
        let a = bodies.insert(ball());
        bodies.get_mut(a).unwrap().linear_velocity = FixedVec3::from_ints(1, 2, 3);
        let hash = bodies.state_hash();

        let bytes = bodies.to_snapshot_bytes().unwrap();
        let restored = BodySet::from_snapshot_bytes(&bytes).unwrap();
        assert_eq!(restored, bodies);
        assert_eq!(restored.state_hash(), hash);

        bodies.get_mut(a).unwrap().linear_velocity.x += FixedScalar::from_raw(1);
        assert_ne!(bodies.state_hash(), hash);

        assert!(matches!(BodySet::from_snapshot_bytes(&[1, 2]), Err(PhysicsError::Snapshot(_))));
    }
}
