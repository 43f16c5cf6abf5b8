//! Contact Pool
//!
//! Arena of [`Contact`]s with a free list, addressed by a stable
//! [`ContactKey`] (canonical body pair plus a narrow-phase feature id).
//!
//! ```text
//! begin_frame ─► check_out(key) … check_out(key) ─► end_frame
//!                 │ live key  → same slot, warm-startable
//!                 │ new key   → recycled or fresh slot, reset
//!                                                   └─ untouched keys are checked in
//! ```
//!
//! Iteration always follows `BTreeMap` key order, never slot order.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::PhysicsResult;

use super::body::BodyHandle;
use super::contact::Contact;

/// Unordered body pair, stored smaller handle first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BodyPairKey {
    low: BodyHandle,
    high: BodyHandle,
}

impl BodyPairKey {
    /// Canonical key for `a` and `b` in either order.
    pub fn new(a: BodyHandle, b: BodyHandle) -> Self {
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    /// Smaller handle.
    #[inline]
    pub fn low(&self) -> BodyHandle {
        self.low
    }

    /// Larger handle.
    #[inline]
    pub fn high(&self) -> BodyHandle {
        self.high
    }

    /// True if `body` is one of the pair.
    #[inline]
    pub fn involves(&self, body: BodyHandle) -> bool {
        self.low == body || self.high == body
    }
}

/// Stable identity of a contact across frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContactKey {
    /// The two bodies
    pub pair: BodyPairKey,
    /// Narrow-phase feature id (e.g. manifold point index)
    pub feature: u32,
}

impl ContactKey {
    /// Key for a body pair and a feature id.
    pub fn new(a: BodyHandle, b: BodyHandle, feature: u32) -> Self {
        Self {
            pair: BodyPairKey::new(a, b),
            feature,
        }
    }
}

/// Arena slot of a contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContactId(u32);

impl ContactId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Pooled contacts keyed by [`ContactKey`].
#[derive(Debug, Clone, Default)]
pub struct ContactPool {
    slots: Vec<Contact>,
    free: Vec<ContactId>,
    live: BTreeMap<ContactKey, ContactId>,
    touched: BTreeSet<ContactKey>,
}

impl ContactPool {
    /// Empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a frame: nothing counts as checked out yet.
    pub fn begin_frame(&mut self) {
        self.touched.clear();
    }

    /// Get the contact for `key`, creating it if needed.
    ///
    /// Returns the slot and whether the contact is new this frame. A new
    /// contact comes back reset and must be initialized with `new_contact = true`.
    pub fn check_out(&mut self, key: ContactKey) -> (ContactId, bool) {
        self.touched.insert(key);
        if let Some(&id) = self.live.get(&key) {
            return (id, false);
        }

        let id = match self.free.pop() {
            Some(id) => {
                self.slots[id.index()].reset();
                id
            }
            None => {
                let id = ContactId(self.slots.len() as u32);
                self.slots.push(Contact::default());
                id
            }
        };
        trace!("Checked out contact {:?} for {:?}", id, key);
        self.live.insert(key, id);
        (id, true)
    }

    /// Return the contact for `key` to the free list.
    pub fn check_in(&mut self, key: ContactKey) -> Option<ContactId> {
        let id = self.live.remove(&key)?;
        self.touched.remove(&key);
        self.free.push(id);
        trace!("Checked in contact {:?} for {:?}", id, key);
        Some(id)
    }

    /// Check in every contact not checked out since [`ContactPool::begin_frame`].
    ///
    /// Returns how many were released.
    pub fn end_frame(&mut self) -> usize {
        let stale: Vec<ContactKey> = self
            .live
            .keys()
            .filter(|key| !self.touched.contains(*key))
            .copied()
            .collect();
        for key in &stale {
            self.check_in(*key);
        }
        if !stale.is_empty() {
            debug!("Released {} stale contacts, {} live", stale.len(), self.live.len());
        }
        stale.len()
    }

    /// Check in every contact touching `body`.
    pub fn remove_body(&mut self, body: BodyHandle) -> usize {
        let keys: Vec<ContactKey> = self
            .live
            .keys()
            .filter(|key| key.pair.involves(body))
            .copied()
            .collect();
        for key in &keys {
            self.check_in(*key);
        }
        keys.len()
    }

    /// Contact in slot `id`. `None` once the slot is checked in.
    pub fn get(&self, id: ContactId) -> Option<&Contact> {
        if self.free.contains(&id) {
            return None;
        }
        self.slots.get(id.index())
    }

    /// Contact in slot `id`, mutably. `None` once the slot is checked in.
    pub fn get_mut(&mut self, id: ContactId) -> Option<&mut Contact> {
        if self.free.contains(&id) {
            return None;
        }
        self.slots.get_mut(id.index())
    }

    /// Live contact for `key`.
    pub fn contact(&self, key: &ContactKey) -> Option<&Contact> {
        self.live.get(key).and_then(|id| self.get(*id))
    }

    /// Live contacts in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&ContactKey, &Contact)> {
        self.live
            .iter()
            .map(move |(key, id)| (key, &self.slots[id.index()]))
    }

    /// Run `f` on every live contact in key order, stopping at the first error.
    pub fn try_for_each_mut<F>(&mut self, mut f: F) -> PhysicsResult<()>
    where
        F: FnMut(&mut Contact) -> PhysicsResult<()>,
    {
        for id in self.live.values() {
            f(&mut self.slots[id.index()])?;
        }
        Ok(())
    }

    /// Number of live contacts.
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// True if no contact is live.
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Number of allocated slots, live or free.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}

// =============================================================================
// TESTS
// =============================================================================
