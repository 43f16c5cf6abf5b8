//! Step Hashing
//!
//! SHA-256 digests of the raw simulation state. Peers running the same
//! inputs compare these after each step; a single differing raw bit in any
//! body or accumulated impulse changes the digest.

use sha2::{Digest, Sha256};

use super::fixed::FixedScalar;
use super::mat3::FixedMat3;
use super::vec3::FixedVec3;

/// 32-byte SHA-256 digest.
pub type StateHash = [u8; 32];

const BODY_DOMAIN: &[u8] = b"LOCKSTEP_PHYSICS_BODIES_V1";
const CONSTRAINT_DOMAIN: &[u8] = b"LOCKSTEP_PHYSICS_CONSTRAINTS_V1";

/// Incremental digest over fixed-point state.
///
/// Every value is fed as its raw little-endian integer, so the digest only
/// depends on the bits of the state and the order of the calls.
pub struct StateHasher {
    hasher: Sha256,
}

impl StateHasher {
    fn with_domain(domain: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        Self { hasher }
    }

    /// Digest of a body table.
    pub fn for_body_state() -> Self {
        Self::with_domain(BODY_DOMAIN)
    }

    /// Digest of a constraint set.
    pub fn for_constraint_state() -> Self {
        Self::with_domain(CONSTRAINT_DOMAIN)
    }

    /// Feed a tag byte.
    #[inline]
    pub fn update_u8(&mut self, value: u8) {
        self.hasher.update([value]);
    }

    /// Feed a count or handle.
    #[inline]
    pub fn update_u32(&mut self, value: u32) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Feed a step counter.
    #[inline]
    pub fn update_u64(&mut self, value: u64) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Feed a scalar's raw `i64`.
    #[inline]
    pub fn update_fixed(&mut self, value: FixedScalar) {
        self.hasher.update(value.raw().to_le_bytes());
    }

    /// Feed x, y, z.
    #[inline]
    pub fn update_vec3(&mut self, value: FixedVec3) {
        self.update_fixed(value.x);
        self.update_fixed(value.y);
        self.update_fixed(value.z);
    }

    /// Feed the three rows in order.
    pub fn update_mat3(&mut self, value: &FixedMat3) {
        for row in value.rows() {
            self.update_vec3(row);
        }
    }

    /// Feed a flag as one byte.
    #[inline]
    pub fn update_bool(&mut self, value: bool) {
        self.update_u8(u8::from(value));
    }

    /// Consume the hasher.
    pub fn finalize(self) -> StateHash {
        self.hasher.finalize().into()
    }
}

/// Digest of everything `add_state` feeds, prefixed by the step number.
pub fn compute_state_hash<F>(step: u64, add_state: F) -> StateHash
where
    F: FnOnce(&mut StateHasher),
{
    let mut hasher = StateHasher::for_body_state();
    hasher.update_u64(step);
    add_state(&mut hasher);
    hasher.finalize()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_order_matters() {
        let digest = |first: u32, second: u32| {
            let mut h = StateHasher::for_body_state();
            h.update_u32(first);
            h.update_u32(second);
            h.finalize()
        };
        assert_eq!(digest(1, 2), digest(1, 2));
        assert_ne!(digest(1, 2), digest(2, 1));
    }

    #[test]
    fn test_single_ulp_changes_hash() {
        let digest = |raw: i64| {
            let mut h = StateHasher::for_body_state();
            h.update_fixed(FixedScalar::from_raw(raw));
            h.finalize()
        };
        assert_ne!(digest(1 << 32), digest((1 << 32) + 1));
    }

    #[test]
    fn test_body_and_constraint_domains_differ() {
        let feed = |mut h: StateHasher| {
            h.update_mat3(&FixedMat3::IDENTITY);
            h.update_bool(true);
            h.finalize()
        };
        assert_ne!(feed(StateHasher::for_body_state()), feed(StateHasher::for_constraint_state()));
    }

    #[test]
    fn test_compute_state_hash_includes_step() {
        let add = |hasher: &mut StateHasher| {
            hasher.update_vec3(FixedVec3::from_ints(1, 2, 3));
            hasher.update_bool(false);
        };

        let hash = compute_state_hash(100, add);
        assert_eq!(hash, compute_state_hash(100, add));
        assert_ne!(hash, compute_state_hash(101, add));
    }
}
