//! Solve Driver
//!
//! Runs one velocity solve over every live contact and constraint.
//! Order is fixed: constraints in handle order, then contacts in key order.
//! Integration is left to the caller (`BodySet::integrate`).

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::core::fixed::FixedScalar;
use crate::error::{PhysicsError, PhysicsResult};

use super::body::BodySet;
use super::constraints::ConstraintSet;
use super::contact::ContactSettings;
use super::contact_pool::ContactPool;

/// Solver tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Relaxation passes per step
    pub iterations: u32,
    /// Settings handed to contacts when they are initialized
    pub contact: ContactSettings,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            iterations: 10,
            contact: ContactSettings::default(),
        }
    }
}

impl SolverConfig {
    /// Parse from JSON; missing fields take their defaults. The result is validated.
    pub fn from_json_str(json: &str) -> PhysicsResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| PhysicsError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to JSON.
    pub fn to_json_string(&self) -> PhysicsResult<String> {
        serde_json::to_string(self).map_err(|e| PhysicsError::InvalidConfig(e.to_string()))
    }

    /// Reject zero iterations and negative contact settings.
    pub fn validate(&self) -> PhysicsResult<()> {
        if self.iterations == 0 {
            return Err(PhysicsError::InvalidConfig("iterations must be at least 1".into()));
        }
        self.contact.validate()
    }
}

/// What a [`solve_step`] call touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SolveStats {
    /// Live contacts solved
    pub contacts: usize,
    /// Constraints solved
    pub constraints: usize,
    /// Relaxation passes run
    pub iterations: u32,
}

/// Solve velocities for one step of length `timestep`.
///
/// Contacts must already be initialized for this step.
pub fn solve_step(
    bodies: &mut BodySet,
    contacts: &mut ContactPool,
    constraints: &mut ConstraintSet,
    timestep: FixedScalar,
    config: &SolverConfig,
) -> PhysicsResult<SolveStats> {
    let stats = SolveStats {
        contacts: contacts.len(),
        constraints: constraints.len(),
        iterations: config.iterations,
    };

    // 1. Refresh contact points from the current transforms
    contacts.try_for_each_mut(|contact| contact.update_position(bodies))?;

    // 2. Prepare: Jacobians, effective masses, bias, warm start
    constraints.prepare_all(bodies, timestep)?;
    contacts.try_for_each_mut(|contact| contact.prepare_for_iteration(bodies, timestep))?;

    // 3. Relax
    for _iteration in 0..config.iterations {
        constraints.iterate_all(bodies)?;
        contacts.try_for_each_mut(|contact| contact.iterate(bodies))?;

        #[cfg(feature = "debug-tracing")]
        trace!("Solver pass {} done, bodies hash {}", _iteration, hex::encode(bodies.state_hash()));
    }

    trace!("Solved {:?} at dt {}", stats, timestep);
    if stats.contacts == 0 && stats.constraints == 0 {
        debug!("Solve step with nothing to solve");
    }
    Ok(stats)
}

// =============================================================================
// TESTS
// =============================================================================
