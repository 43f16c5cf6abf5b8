//! # Lockstep Physics
//!
//! Deterministic rigid-body physics core for lock-step simulation.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    LOCKSTEP PHYSICS                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/            - Deterministic primitives                 │
//! │  ├── fixed.rs     - Q31.32 fixed-point scalar                │
//! │  ├── trig.rs      - sin/cos/tan/atan/acos/asin               │
//! │  ├── math.rs      - pow/log, clamps, interpolation helpers   │
//! │  ├── vec3.rs      - 3D vector                                │
//! │  ├── mat3.rs      - 3×3 matrix (row-vector convention)       │
//! │  ├── quat.rs      - Quaternion                               │
//! │  └── hash.rs      - State hashing for verification           │
//! │                                                              │
//! │  collision/       - Convex shapes                            │
//! │  ├── shape.rs     - Shape enum, bounding boxes, mass data    │
//! │  ├── capsule.rs   - Capsule                                  │
//! │  └── cylinder.rs  - Cylinder                                 │
//! │                                                              │
//! │  dynamics/        - Solver                                   │
//! │  ├── body.rs      - Rigid bodies and the body table          │
//! │  ├── material.rs  - Friction / restitution mixing            │
//! │  ├── contact.rs   - Sequential-impulse contact               │
//! │  ├── contact_pool.rs - Keyed contact arena                   │
//! │  ├── constraints/ - Point-on-line, fixed-angle joints        │
//! │  └── solver.rs    - Per-step solve driver                    │
//! │                                                              │
//! │  debug.rs         - Debug line drawing                       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! Every module is **100% deterministic**:
//! - No floating-point arithmetic in the simulation path
//! - No HashMap (BTreeMap / Vec indices for ordered iteration)
//! - Saturating arithmetic, so overflow never diverges between targets
//!
//! Given identical inputs, two runs produce **identical state hashes** on
//! any platform.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod collision;
pub mod core;
pub mod debug;
pub mod dynamics;
pub mod error;

// Re-export commonly used types
pub use crate::core::{FixedMat3, FixedQuat, FixedScalar, FixedVec3, StateHash};
pub use collision::{CapsuleShape, CylinderShape, Shape};
pub use debug::{DebugDrawer, LineBuffer};
pub use dynamics::{
    solve_step, BodyHandle, BodySet, Constraint, ConstraintSet, ContactPool, RigidBody, SolverConfig,
};
pub use error::{PhysicsError, PhysicsResult};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default simulation rate (Hz)
pub const STEP_RATE: u32 = 60;
