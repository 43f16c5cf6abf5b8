//! Dynamics
//!
//! Bodies, materials, the contact resolver and joint constraints, plus the
//! driver that solves them together. Everything here is deterministic:
//! fixed-point only, iteration in handle or key order.

pub mod body;
pub mod constraints;
pub mod contact;
pub mod contact_pool;
pub mod material;
pub mod solver;

pub use body::{BodyHandle, BodySet, RigidBody};
pub use constraints::{Constraint, ConstraintHandle, ConstraintSet, FixedAngle, PointOnLine, SinglePointOnLine};
pub use contact::{Contact, ContactPoint, ContactSettings, ContactSide};
pub use contact_pool::{BodyPairKey, ContactId, ContactKey, ContactPool};
pub use material::{Material, MaterialCoefficientMixing};
pub use solver::{solve_step, SolveStats, SolverConfig};
