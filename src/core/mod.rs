//! Core deterministic primitives.
//!
//! All types in this module are designed for perfect cross-platform determinism.
//! Nothing here touches a float except the `from_f64` / `to_f64` conversions
//! used for setup and logging.

pub mod fixed;
pub mod hash;
pub mod mat3;
pub mod math;
pub mod quat;
pub mod trig;
pub mod vec3;

// Re-export core types
pub use fixed::{FixedScalar, FRACTIONAL_BITS};
pub use hash::{compute_state_hash, StateHash, StateHasher};
pub use mat3::FixedMat3;
pub use quat::FixedQuat;
pub use trig::LUT_SIZE;
pub use vec3::FixedVec3;
