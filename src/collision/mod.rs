//! Collision shapes.
//!
//! Support mapping and analytic mass properties for the convex primitives.
//! Broadphase and the GJK/EPA narrow phase live outside this crate; they
//! only need [`Shape::support_mapping`].

pub mod capsule;
pub mod cylinder;
pub mod shape;

pub use capsule::CapsuleShape;
pub use cylinder::CylinderShape;
pub use shape::{BoundingBox, ConvexShape, MassProperties, Shape};
