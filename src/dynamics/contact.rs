//! Contact Resolver
//!
//! One contact point between two bodies, solved with sequential impulses.
//!
//! ## Per-step life cycle
//!
//! ```text
//! initialize ──► update_position ──► prepare_for_iteration ──► iterate × N
//!  (new or        (world points,       (effective masses,        (clamped
//!   refreshed)     penetration)         bias, warm start)          impulses)
//! ```
//!
//! ## Sign conventions
//!
//! - `normal` points from body 1 towards body 2
//! - `penetration = (p1 - p2) · normal`, positive while overlapping
//! - relative velocity is `body2 - body1`; a closing contact has `vn < 0`
//! - impulses are applied `-J` to body 1 and `+J` to body 2
//!
//! Accumulated impulses are clamped as running totals: the normal total
//! never drops below zero, the tangent total stays inside `±friction · normal`.

use serde::{Deserialize, Serialize};

use crate::core::fixed::FixedScalar;
use crate::core::math;
use crate::core::vec3::FixedVec3;
use crate::error::{PhysicsError, PhysicsResult};

use super::body::{BodyHandle, BodySet, RigidBody};
use super::material::MaterialCoefficientMixing;

/// Tuning for the contact solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactSettings {
    /// Upper bound of the positional correction speed
    pub maximum_bias: FixedScalar,
    /// Baumgarte gain
    pub bias_factor: FixedScalar,
    /// Relative speed below which a contact is left alone
    pub min_velocity: FixedScalar,
    /// Penetration tolerated before correction engages
    pub allowed_penetration: FixedScalar,
    /// Separation at which the owner may drop the contact
    pub break_threshold: FixedScalar,
    /// How the two materials combine
    pub material_mixing: MaterialCoefficientMixing,
}

impl Default for ContactSettings {
    fn default() -> Self {
        Self {
            maximum_bias: FixedScalar::from_int(10),
            bias_factor: FixedScalar::from_ratio(25, 100),
            min_velocity: FixedScalar::EN3,
            allowed_penetration: FixedScalar::EN2,
            break_threshold: FixedScalar::EN2,
            material_mixing: MaterialCoefficientMixing::UseAverage,
        }
    }
}

impl ContactSettings {
    /// Reject negative tuning values.
    pub fn validate(&self) -> PhysicsResult<()> {
        let fields = [
            ("maximum_bias", self.maximum_bias),
            ("bias_factor", self.bias_factor),
            ("min_velocity", self.min_velocity),
            ("allowed_penetration", self.allowed_penetration),
            ("break_threshold", self.break_threshold),
        ];
        for (name, value) in fields {
            if value.is_negative() {
                return Err(PhysicsError::InvalidConfig(format!(
                    "{name} must not be negative (got {value})"
                )));
            }
        }
        Ok(())
    }
}

/// Which side of a contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactSide {
    /// `body1`
    First,
    /// `body2`
    Second,
}

/// Geometry reported by the narrow phase for one contact point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactPoint {
    /// World point on body 1
    pub point1: FixedVec3,
    /// World point on body 2
    pub point2: FixedVec3,
    /// Direction from body 1 towards body 2 (normalized on initialize)
    pub normal: FixedVec3,
    /// Overlap depth, negative while separated
    pub penetration: FixedScalar,
}

/// Solver state of a single contact point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    body1: BodyHandle,
    body2: BodyHandle,

    normal: FixedVec3,
    tangent: FixedVec3,

    p1: FixedVec3,
    p2: FixedVec3,
    relative_pos1: FixedVec3,
    relative_pos2: FixedVec3,
    real_rel_pos1: FixedVec3,
    real_rel_pos2: FixedVec3,

    accumulated_normal_impulse: FixedScalar,
    accumulated_tangent_impulse: FixedScalar,

    penetration: FixedScalar,
    initial_penetration: FixedScalar,

    static_friction: FixedScalar,
    kinetic_friction: FixedScalar,
    restitution: FixedScalar,
    friction: FixedScalar,

    mass_normal: FixedScalar,
    mass_tangent: FixedScalar,
    restitution_bias: FixedScalar,
    speculative_velocity: FixedScalar,
    lost_speculative_bounce: FixedScalar,
    last_timestep: FixedScalar,

    new_contact: bool,
    treat_body1_as_static: bool,
    treat_body2_as_static: bool,
    body1_is_mass_point: bool,
    body2_is_mass_point: bool,

    settings: ContactSettings,
}

impl Default for Contact {
    fn default() -> Self {
        Self {
            body1: BodyHandle(0),
            body2: BodyHandle(0),
            normal: FixedVec3::ZERO,
            tangent: FixedVec3::ZERO,
            p1: FixedVec3::ZERO,
            p2: FixedVec3::ZERO,
            relative_pos1: FixedVec3::ZERO,
            relative_pos2: FixedVec3::ZERO,
            real_rel_pos1: FixedVec3::ZERO,
            real_rel_pos2: FixedVec3::ZERO,
            accumulated_normal_impulse: FixedScalar::ZERO,
            accumulated_tangent_impulse: FixedScalar::ZERO,
            penetration: FixedScalar::ZERO,
            initial_penetration: FixedScalar::ZERO,
            static_friction: FixedScalar::ZERO,
            kinetic_friction: FixedScalar::ZERO,
            restitution: FixedScalar::ZERO,
            friction: FixedScalar::ZERO,
            mass_normal: FixedScalar::ZERO,
            mass_tangent: FixedScalar::ZERO,
            restitution_bias: FixedScalar::ZERO,
            speculative_velocity: FixedScalar::ZERO,
            lost_speculative_bounce: FixedScalar::ZERO,
            last_timestep: FixedScalar::MAX,
            new_contact: false,
            treat_body1_as_static: false,
            treat_body2_as_static: false,
            body1_is_mass_point: false,
            body2_is_mass_point: false,
            settings: ContactSettings::default(),
        }
    }
}

impl Contact {
    /// Bind the contact to two bodies and a contact point.
    ///
    /// A new contact starts from zero impulses and mixes the two materials.
    /// A refreshed contact keeps both, so the previous step warm-starts it.
    pub fn initialize(
        &mut self,
        bodies: &BodySet,
        body1: BodyHandle,
        body2: BodyHandle,
        point: ContactPoint,
        new_contact: bool,
        settings: ContactSettings,
    ) -> PhysicsResult<()> {
        if body1 == body2 {
            return Err(PhysicsError::SameBody(body1));
        }
        let b1 = bodies.get(body1)?;
        let b2 = bodies.get(body2)?;

        self.body1 = body1;
        self.body2 = body2;
        self.normal = point.normal.normalize();
        self.p1 = point.point1;
        self.p2 = point.point2;
        self.new_contact = new_contact;
        self.settings = settings;

        self.relative_pos1 = self.p1 - b1.position();
        self.relative_pos2 = self.p2 - b2.position();
        self.real_rel_pos1 = self.relative_pos1.transform(&b1.inv_orientation());
        self.real_rel_pos2 = self.relative_pos2.transform(&b2.inv_orientation());

        self.initial_penetration = point.penetration;
        self.penetration = point.penetration;

        self.body1_is_mass_point = b1.is_particle();
        self.body2_is_mass_point = b2.is_particle();

        if new_contact {
            self.treat_body1_as_static = b1.is_static();
            self.treat_body2_as_static = b2.is_static();
            self.accumulated_normal_impulse = FixedScalar::ZERO;
            self.accumulated_tangent_impulse = FixedScalar::ZERO;
            self.lost_speculative_bounce = FixedScalar::ZERO;

            let mixed = settings.material_mixing.mix_materials(&b1.material, &b2.material);
            self.static_friction = mixed.static_friction;
            self.kinetic_friction = mixed.kinetic_friction;
            self.restitution = mixed.restitution;
        }
        Ok(())
    }

    /// Recompute the world contact points from the local anchors.
    pub fn update_position(&mut self, bodies: &BodySet) -> PhysicsResult<()> {
        let b1 = bodies.get(self.body1)?;
        let b2 = bodies.get(self.body2)?;

        self.p1 = if self.body1_is_mass_point {
            self.real_rel_pos1 + b1.position()
        } else {
            self.real_rel_pos1.transform(&b1.orientation()) + b1.position()
        };
        self.p2 = if self.body2_is_mass_point {
            self.real_rel_pos2 + b2.position()
        } else {
            self.real_rel_pos2.transform(&b2.orientation()) + b2.position()
        };

        self.penetration = (self.p1 - self.p2).dot(self.normal);
        Ok(())
    }

    /// Effective masses, bias terms, friction selection and warm start.
    pub fn prepare_for_iteration(&mut self, bodies: &mut BodySet, timestep: FixedScalar) -> PhysicsResult<()> {
        let (b1, b2) = bodies.pair_mut(self.body1, self.body2)?;
        let dv = self.relative_velocity(b1, b2);

        self.mass_normal = FixedScalar::ONE / self.effective_mass_denominator(b1, b2, self.normal);

        let vn = self.normal.dot(dv);
        self.tangent = (dv - self.normal * vn).normalize();
        self.mass_tangent = FixedScalar::ONE / self.effective_mass_denominator(b1, b2, self.tangent);

        self.restitution_bias = self.lost_speculative_bounce;
        self.speculative_velocity = FixedScalar::ZERO;

        let settings = self.settings;
        if self.penetration > settings.allowed_penetration {
            let depth = math::max(FixedScalar::ZERO, self.penetration - settings.allowed_penetration);
            self.restitution_bias = math::clamp(
                settings.bias_factor * (FixedScalar::ONE / timestep) * depth,
                FixedScalar::ZERO,
                settings.maximum_bias,
            );
        }

        let timestep_ratio = timestep / self.last_timestep;
        self.accumulated_normal_impulse *= timestep_ratio;
        self.accumulated_tangent_impulse *= timestep_ratio;

        // Sliding once the impulse needed to stop the tangent motion leaves the static cone.
        let tangent_impulse = self.mass_tangent * -self.tangent.dot(dv);
        let max_tangent_impulse = -self.static_friction * self.accumulated_normal_impulse;
        self.friction = if tangent_impulse < max_tangent_impulse {
            self.kinetic_friction
        } else {
            self.static_friction
        };

        // Restitution only on the first frame of a fast contact.
        if vn < -FixedScalar::ONE && self.new_contact {
            self.restitution_bias = math::max(-self.restitution * vn, self.restitution_bias);
        }

        // Not touching yet: aim for the velocity that just closes the gap and
        // keep the bounce for the frame where the surfaces actually meet.
        if self.penetration < -settings.allowed_penetration {
            self.speculative_velocity = self.penetration / timestep;
            self.lost_speculative_bounce = self.restitution_bias;
            self.restitution_bias = FixedScalar::ZERO;
        } else {
            self.lost_speculative_bounce = FixedScalar::ZERO;
        }

        let impulse = self.normal * self.accumulated_normal_impulse
            + self.tangent * self.accumulated_tangent_impulse;
        self.apply_to_pair(b1, b2, impulse);

        self.last_timestep = timestep;
        self.new_contact = false;
        Ok(())
    }

    /// One relaxation pass.
    pub fn iterate(&mut self, bodies: &mut BodySet) -> PhysicsResult<()> {
        if self.treat_body1_as_static && self.treat_body2_as_static {
            return Ok(());
        }
        let (b1, b2) = bodies.pair_mut(self.body1, self.body2)?;
        let dv = self.relative_velocity(b1, b2);

        let min_velocity = self.settings.min_velocity;
        if dv.length_squared() < min_velocity * min_velocity {
            return Ok(());
        }

        let vn = self.normal.dot(dv);
        let mut normal_impulse =
            self.mass_normal * (-vn + self.restitution_bias + self.speculative_velocity);
        let old_normal_impulse = self.accumulated_normal_impulse;
        self.accumulated_normal_impulse = math::max(old_normal_impulse + normal_impulse, FixedScalar::ZERO);
        normal_impulse = self.accumulated_normal_impulse - old_normal_impulse;

        let vt = dv.dot(self.tangent);
        let max_tangent_impulse = self.friction * self.accumulated_normal_impulse;
        let mut tangent_impulse = self.mass_tangent * -vt;
        let old_tangent_impulse = self.accumulated_tangent_impulse;
        self.accumulated_tangent_impulse = math::clamp(
            old_tangent_impulse + tangent_impulse,
            -max_tangent_impulse,
            max_tangent_impulse,
        );
        tangent_impulse = self.accumulated_tangent_impulse - old_tangent_impulse;

        let impulse = self.normal * normal_impulse + self.tangent * tangent_impulse;
        self.apply_to_pair(b1, b2, impulse);
        Ok(())
    }

    /// Apply `impulse` at the contact: `-impulse` on body 1, `+impulse` on body 2.
    pub fn apply_impulse(&self, bodies: &mut BodySet, impulse: FixedVec3) -> PhysicsResult<()> {
        let (b1, b2) = bodies.pair_mut(self.body1, self.body2)?;
        self.apply_to_pair(b1, b2, impulse);
        Ok(())
    }

    /// Velocity of the body 2 contact point relative to the body 1 contact point.
    pub fn calculate_relative_velocity(&self, bodies: &BodySet) -> PhysicsResult<FixedVec3> {
        let b1 = bodies.get(self.body1)?;
        let b2 = bodies.get(self.body2)?;
        Ok(self.relative_velocity(b1, b2))
    }

    /// Stop applying impulses to one side, regardless of its static flag.
    pub fn treat_body_as_static(&mut self, side: ContactSide) {
        match side {
            ContactSide::First => self.treat_body1_as_static = true,
            ContactSide::Second => self.treat_body2_as_static = true,
        }
    }

    /// Total normal impulse applied so far this step (after warm start).
    #[inline]
    pub fn applied_normal_impulse(&self) -> FixedScalar {
        self.accumulated_normal_impulse
    }

    /// Total tangent impulse applied so far this step.
    #[inline]
    pub fn applied_tangent_impulse(&self) -> FixedScalar {
        self.accumulated_tangent_impulse
    }

    /// First body.
    #[inline]
    pub fn body1(&self) -> BodyHandle {
        self.body1
    }

    /// Second body.
    #[inline]
    pub fn body2(&self) -> BodyHandle {
        self.body2
    }

    /// Contact normal, from body 1 towards body 2.
    #[inline]
    pub fn normal(&self) -> FixedVec3 {
        self.normal
    }

    /// Friction direction of the current step.
    #[inline]
    pub fn tangent(&self) -> FixedVec3 {
        self.tangent
    }

    /// World contact point on body 1.
    #[inline]
    pub fn position1(&self) -> FixedVec3 {
        self.p1
    }

    /// World contact point on body 2.
    #[inline]
    pub fn position2(&self) -> FixedVec3 {
        self.p2
    }

    /// Penetration depth.
    #[inline]
    pub fn penetration(&self) -> FixedScalar {
        self.penetration
    }

    /// Penetration passed to the last `initialize`.
    #[inline]
    pub fn initial_penetration(&self) -> FixedScalar {
        self.initial_penetration
    }

    /// Mixed static friction coefficient.
    #[inline]
    pub fn static_friction(&self) -> FixedScalar {
        self.static_friction
    }

    /// Mixed kinetic friction coefficient.
    #[inline]
    pub fn kinetic_friction(&self) -> FixedScalar {
        self.kinetic_friction
    }

    /// Mixed restitution.
    #[inline]
    pub fn restitution(&self) -> FixedScalar {
        self.restitution
    }

    /// Override the mixed static friction.
    pub fn set_static_friction(&mut self, value: FixedScalar) {
        self.static_friction = value;
    }

    /// Override the mixed kinetic friction.
    pub fn set_kinetic_friction(&mut self, value: FixedScalar) {
        self.kinetic_friction = value;
    }

    /// Override the mixed restitution.
    pub fn set_restitution(&mut self, value: FixedScalar) {
        self.restitution = value;
    }

    /// Friction coefficient picked by the last prepare.
    #[inline]
    pub fn friction(&self) -> FixedScalar {
        self.friction
    }

    /// Separation speed targeted along the normal this step.
    #[inline]
    pub fn restitution_bias(&self) -> FixedScalar {
        self.restitution_bias
    }

    /// `penetration / dt` for a speculative contact, zero otherwise.
    #[inline]
    pub fn speculative_velocity(&self) -> FixedScalar {
        self.speculative_velocity
    }

    /// Bounce held back until the speculative contact closes.
    #[inline]
    pub fn lost_speculative_bounce(&self) -> FixedScalar {
        self.lost_speculative_bounce
    }

    /// True on the step the contact was created.
    #[inline]
    pub fn is_new(&self) -> bool {
        self.new_contact
    }

    /// Settings the contact was initialized with.
    #[inline]
    pub fn settings(&self) -> &ContactSettings {
        &self.settings
    }

    /// Reset to the pristine pooled state.
    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }

    fn relative_velocity(&self, b1: &RigidBody, b2: &RigidBody) -> FixedVec3 {
        let mut dv = b2.linear_velocity - b1.linear_velocity;
        if !self.body1_is_mass_point {
            dv -= b1.angular_velocity.cross(self.relative_pos1);
        }
        if !self.body2_is_mass_point {
            dv += b2.angular_velocity.cross(self.relative_pos2);
        }
        dv
    }

    /// `J · M⁻¹ · Jᵗ` along `direction`, skipping bodies treated as static.
    fn effective_mass_denominator(&self, b1: &RigidBody, b2: &RigidBody, direction: FixedVec3) -> FixedScalar {
        let mut k = FixedScalar::ZERO;
        if !self.treat_body1_as_static {
            k += b1.inverse_mass();
            if !self.body1_is_mass_point {
                let angular = self
                    .relative_pos1
                    .cross(direction)
                    .transform(&b1.inv_inertia_world())
                    .cross(self.relative_pos1);
                k += angular.dot(direction);
            }
        }
        if !self.treat_body2_as_static {
            k += b2.inverse_mass();
            if !self.body2_is_mass_point {
                let angular = self
                    .relative_pos2
                    .cross(direction)
                    .transform(&b2.inv_inertia_world())
                    .cross(self.relative_pos2);
                k += angular.dot(direction);
            }
        }
        k
    }

    fn apply_to_pair(&self, b1: &mut RigidBody, b2: &mut RigidBody, impulse: FixedVec3) {
        if !self.treat_body1_as_static {
            b1.linear_velocity -= impulse * b1.inverse_mass();
            if !self.body1_is_mass_point {
                b1.angular_velocity -= self
                    .relative_pos1
                    .cross(impulse)
                    .transform(&b1.inv_inertia_world());
            }
        }
        if !self.treat_body2_as_static {
            b2.linear_velocity += impulse * b2.inverse_mass();
            if !self.body2_is_mass_point {
                b2.angular_velocity += self
                    .relative_pos2
                    .cross(impulse)
                    .transform(&b2.inv_inertia_world());
            }
        }
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
    use crate::dynamics::material::Material;

    fn fx(value: f64) -> FixedScalar {
        FixedScalar::from_f64(value)
    }

    /// Static ground at the origin, unit-mass box-ish body resting on it.
    fn ground_and_body(height: f64) -> (BodySet, BodyHandle, BodyHandle) {
        let mut bodies = BodySet::new();
        let mut ground = RigidBody::new(Shape::cylinder(FixedScalar::ONE, FixedScalar::from_int(10)));
        ground.set_static(true);
        let ground = bodies.insert(ground);

        let mut body = RigidBody::new(Shape::cylinder(FixedScalar::TWO, FixedScalar::ONE));
        body.set_mass_properties(FixedMat3::IDENTITY, FixedScalar::ONE);
        body.set_position(FixedVec3::new(FixedScalar::ZERO, fx(height), FixedScalar::ZERO));
        let body = bodies.insert(body);
        (bodies, ground, body)
    }

    /// Contact straight under the body centre: point on the ground at y = 0,
    /// point on the body one unit below its centre.
    fn resting_point(bodies: &BodySet, body: BodyHandle) -> ContactPoint {
        let position = bodies.get(body).unwrap().position();
        let point2 = position - FixedVec3::UNIT_Y;
        ContactPoint {
            point1: FixedVec3::ZERO,
            point2,
            normal: FixedVec3::UNIT_Y,
            penetration: -point2.y,
        }
    }

    #[test]
    fn test_initialize_mixes_materials() {
        let (mut bodies, ground, body) = ground_and_body(0.95);
        bodies.get_mut(ground).unwrap().material = Material::new(fx(1.0), fx(0.5), fx(0.2));
        bodies.get_mut(body).unwrap().material = Material::new(fx(0.5), fx(0.1), fx(0.6));

        let mut contact = Contact::default();
        let settings = ContactSettings {
            material_mixing: MaterialCoefficientMixing::TakeMinimum,
            ..ContactSettings::default()
        };
        let point = ContactPoint {
            normal: FixedVec3::from_ints(0, 5, 0),
            ..resting_point(&bodies, body)
        };
        contact.initialize(&bodies, ground, body, point, true, settings).unwrap();

        assert_eq!(contact.normal(), FixedVec3::UNIT_Y);
        assert_eq!(contact.static_friction(), fx(0.5));
        assert_eq!(contact.kinetic_friction(), fx(0.1));
        assert_eq!(contact.restitution(), fx(0.2));
        assert!(contact.is_new());
        assert_eq!(contact.applied_normal_impulse(), FixedScalar::ZERO);
    }

    #[test]
    fn test_initialize_rejects_same_body() {
        let (bodies, _, body) = ground_and_body(1.0);
        let mut contact = Contact::default();
        let point = resting_point(&bodies, body);
        let result = contact.initialize(&bodies, body, body, point, true, ContactSettings::default());
        assert_eq!(result, Err(PhysicsError::SameBody(body)));
    }

    #[test]
    fn test_update_position_tracks_bodies() {
        let (mut bodies, ground, body) = ground_and_body(0.95);
        let mut contact = Contact::default();
        contact
            .initialize(&bodies, ground, body, resting_point(&bodies, body), true, ContactSettings::default())
            .unwrap();
        assert!((contact.penetration().to_f64() - 0.05).abs() < 1e-9);

        bodies.get_mut(body).unwrap().set_position(FixedVec3::from_ints(0, 2, 0));
        contact.update_position(&bodies).unwrap();
        assert_eq!(contact.penetration(), -FixedScalar::ONE);
        assert_eq!(contact.position2(), FixedVec3::from_ints(0, 1, 0));
    }

    #[test]
    fn test_resting_contact_converges() {
        let settings = ContactSettings::default();
        let (mut bodies, ground, body) = ground_and_body(0.95);
        let mut contact = Contact::default();
        contact
            .initialize(&bodies, ground, body, resting_point(&bodies, body), true, settings)
            .unwrap();

        let dt = fx(0.02);
        let gravity = FixedVec3::new(FixedScalar::ZERO, FixedScalar::from_int(-10), FixedScalar::ZERO);
        for _ in 0..50 {
            bodies.apply_velocity_change(gravity * dt);
            contact.update_position(&bodies).unwrap();
            contact.prepare_for_iteration(&mut bodies, dt).unwrap();
            assert!(contact.applied_normal_impulse() >= FixedScalar::ZERO);
            for _ in 0..10 {
                contact.iterate(&mut bodies).unwrap();
                assert!(contact.applied_normal_impulse() >= FixedScalar::ZERO);
            }
            bodies.integrate(dt);
        }

        let vn = contact.calculate_relative_velocity(&bodies).unwrap().dot(contact.normal());
        assert!(vn.abs() <= settings.min_velocity, "vn = {vn}");
        assert!(contact.penetration() < fx(0.02));
        assert!(contact.applied_normal_impulse() > FixedScalar::ZERO);
        // The ground never moves.
        assert_eq!(bodies.get(ground).unwrap().linear_velocity, FixedVec3::ZERO);
    }

    #[test]
    fn test_warm_start_idempotent_when_satisfied() {
        let settings = ContactSettings::default();
        // Inside the allowed slop: no positional bias.
        let (mut bodies, ground, body) = ground_and_body(0.995);
        let mut contact = Contact::default();
        contact
            .initialize(&bodies, ground, body, resting_point(&bodies, body), true, settings)
            .unwrap();
        contact.update_position(&bodies).unwrap();
        contact.prepare_for_iteration(&mut bodies, fx(0.02)).unwrap();
        assert_eq!(contact.restitution_bias(), FixedScalar::ZERO);

        let before = contact.applied_normal_impulse();
        for _ in 0..20 {
            contact.iterate(&mut bodies).unwrap();
        }
        let change = (contact.applied_normal_impulse() - before).abs();
        assert!(change < settings.min_velocity);
        assert_eq!(bodies.get(body).unwrap().linear_velocity, FixedVec3::ZERO);
    }

    #[test]
    fn test_speculative_contact_defers_bounce() {
        let (mut bodies, ground, body) = ground_and_body(6.0);
        bodies.get_mut(ground).unwrap().material.restitution = fx(0.5);
        bodies.get_mut(body).unwrap().material.restitution = fx(0.5);
        bodies.get_mut(body).unwrap().linear_velocity = FixedVec3::new(FixedScalar::ZERO, FixedScalar::from_int(-300), FixedScalar::ZERO);

        let mut contact = Contact::default();
        let point = resting_point(&bodies, body);
        assert_eq!(point.penetration, FixedScalar::from_int(-5));
        contact.initialize(&bodies, ground, body, point, true, ContactSettings::default()).unwrap();
        contact.update_position(&bodies).unwrap();
        contact.prepare_for_iteration(&mut bodies, fx(0.02)).unwrap();

        assert!((contact.speculative_velocity().to_f64() + 250.0).abs() < 1e-5);
        assert_eq!(contact.restitution_bias(), FixedScalar::ZERO);
        assert!((contact.lost_speculative_bounce().to_f64() - 150.0).abs() < 1e-6);

        // One pass removes only the closing speed that would overshoot the gap.
        contact.iterate(&mut bodies).unwrap();
        let vy = bodies.get(body).unwrap().linear_velocity.y.to_f64();
        assert!((vy + 250.0).abs() < 1e-4, "vy = {vy}");
    }

    #[test]
    fn test_restitution_on_new_fast_contact() {
        let (mut bodies, ground, body) = ground_and_body(0.999);
        bodies.get_mut(ground).unwrap().material.restitution = FixedScalar::ONE;
        bodies.get_mut(body).unwrap().material.restitution = FixedScalar::ONE;
        bodies.get_mut(body).unwrap().linear_velocity = FixedVec3::new(FixedScalar::ZERO, FixedScalar::from_int(-4), FixedScalar::ZERO);

        let mut contact = Contact::default();
        contact
            .initialize(&bodies, ground, body, resting_point(&bodies, body), true, ContactSettings::default())
            .unwrap();
        contact.update_position(&bodies).unwrap();
        contact.prepare_for_iteration(&mut bodies, fx(0.02)).unwrap();
        assert_eq!(contact.restitution_bias(), FixedScalar::from_int(4));

        contact.iterate(&mut bodies).unwrap();
        assert_eq!(bodies.get(body).unwrap().linear_velocity.y, FixedScalar::from_int(4));
        assert!(!contact.is_new());
    }

    #[test]
    fn test_friction_clamped_to_cone() {
        let (mut bodies, ground, body) = ground_and_body(0.95);
        bodies.get_mut(body).unwrap().linear_velocity = FixedVec3::new(FixedScalar::from_int(5), -FixedScalar::ONE, FixedScalar::ZERO);

        let mut contact = Contact::default();
        contact
            .initialize(&bodies, ground, body, resting_point(&bodies, body), true, ContactSettings::default())
            .unwrap();
        contact.update_position(&bodies).unwrap();
        contact.prepare_for_iteration(&mut bodies, fx(0.02)).unwrap();
        for _ in 0..10 {
            contact.iterate(&mut bodies).unwrap();
            let bound = contact.friction() * contact.applied_normal_impulse();
            assert!(contact.applied_tangent_impulse().abs() <= bound);
        }
        // Sliding: the tangent impulse opposes the +X motion.
        assert!(contact.applied_tangent_impulse() < FixedScalar::ZERO);
        assert!(bodies.get(body).unwrap().linear_velocity.x < FixedScalar::from_int(5));
    }

    #[test]
    fn test_both_static_is_skipped() {
        let (mut bodies, ground, body) = ground_and_body(0.5);
        bodies.get_mut(body).unwrap().set_static(true);
        let mut contact = Contact::default();
        contact
            .initialize(&bodies, ground, body, resting_point(&bodies, body), true, ContactSettings::default())
            .unwrap();
        contact.update_position(&bodies).unwrap();
        contact.prepare_for_iteration(&mut bodies, fx(0.02)).unwrap();
        contact.iterate(&mut bodies).unwrap();
        assert_eq!(contact.applied_normal_impulse(), FixedScalar::ZERO);
    }

    #[test]
    fn test_treat_body_as_static_and_apply_impulse() {
        let (mut bodies, ground, body) = ground_and_body(1.0);
        let mut contact = Contact::default();
        contact
            .initialize(&bodies, ground, body, resting_point(&bodies, body), true, ContactSettings::default())
            .unwrap();

        contact.apply_impulse(&mut bodies, FixedVec3::UNIT_Y).unwrap();
        assert_eq!(bodies.get(body).unwrap().linear_velocity, FixedVec3::UNIT_Y);

        contact.treat_body_as_static(ContactSide::Second);
        contact.apply_impulse(&mut bodies, FixedVec3::UNIT_Y).unwrap();
        assert_eq!(bodies.get(body).unwrap().linear_velocity, FixedVec3::UNIT_Y);
    }

    #[test]
    fn test_settings_validate() {
        assert!(ContactSettings::default().validate().is_ok());
        let bad = ContactSettings {
            bias_factor: -FixedScalar::ONE,
            ..ContactSettings::default()
        };
        assert!(matches!(bad.validate(), Err(PhysicsError::InvalidConfig(_))));
    }
}
