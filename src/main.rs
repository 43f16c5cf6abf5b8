//! Lockstep Physics Demo
//!
//! Runs a small scene twice and checks that both runs end in the same state.

use anyhow::{bail, Context, Result};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use lockstep_physics::{
    core::compute_state_hash,
    dynamics::{
        constraints::{FixedAngle, SinglePointOnLine},
        contact::ContactPoint,
        contact_pool::ContactKey,
    },
    solve_step, BodyHandle, BodySet, ConstraintSet, ContactPool, FixedMat3, FixedScalar, FixedVec3,
    LineBuffer, RigidBody, Shape, SolverConfig, StateHash, STEP_RATE, VERSION,
};

/// Simulated duration in steps (5 seconds)
const DEMO_STEPS: u32 = 5 * STEP_RATE;

fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("failed to set tracing subscriber")?;

    info!("Lockstep Physics v{}", VERSION);
    info!("Step Rate: {} Hz", STEP_RATE);

    let config = SolverConfig::default();
    config.validate()?;
    info!("Solver config: {}", config.to_json_string()?);

    info!("=== First Run ===");
    let (first, bodies) = run_demo(&config)?;

    info!("=== Verifying Determinism ===");
    let (second, _) = run_demo(&config)?;

    info!("First Run Hash:  {}", hex::encode(first));
    info!("Replay Hash:     {}", hex::encode(second));
    if first != second {
        bail!("DETERMINISM FAILURE: hashes differ");
    }
    info!("DETERMINISM VERIFIED: Hashes match!");

    let snapshot = bodies.to_snapshot_bytes()?;
    let restored = BodySet::from_snapshot_bytes(&snapshot)?;
    info!(
        "Snapshot: {} bytes, restored hash {}",
        snapshot.len(),
        hex::encode(restored.state_hash())
    );
    Ok(())
}

/// Ground, a capsule resting on it, and a bead locked to a rail.
fn run_demo(config: &SolverConfig) -> Result<(StateHash, BodySet)> {
    let mut bodies = BodySet::new();

    let mut ground = RigidBody::new(Shape::cylinder(FixedScalar::ONE, FixedScalar::from_int(20)));
    ground.set_static(true);
    let ground = bodies.insert(ground);

    let mut capsule = RigidBody::new(Shape::capsule(FixedScalar::ONE, FixedScalar::HALF));
    capsule.set_position(FixedVec3::new(FixedScalar::ZERO, FixedScalar::from_int(2), FixedScalar::ZERO));
    let capsule = bodies.insert(capsule);

    let mut bead = RigidBody::new(Shape::cylinder(FixedScalar::HALF, FixedScalar::HALF));
    bead.set_mass_properties(FixedMat3::IDENTITY, FixedScalar::ONE);
    bead.set_position(FixedVec3::from_ints(4, 3, 0));
    bead.linear_velocity = FixedVec3::from_ints(1, 2, 0);
    let bead = bodies.insert(bead);

    let mut constraints = ConstraintSet::new();
    constraints.insert(SinglePointOnLine::new(&bodies, bead, FixedVec3::ZERO, FixedVec3::UNIT_X)?);
    constraints.insert(FixedAngle::new(&bodies, bead)?);

    let mut contacts = ContactPool::new();
    let dt = FixedScalar::ONE / FixedScalar::from_int(STEP_RATE as i32);
    let gravity = FixedVec3::new(FixedScalar::ZERO, FixedScalar::from_ratio(-981, 100), FixedScalar::ZERO);

    for step in 0..DEMO_STEPS {
        contacts.begin_frame();
        touch_ground(&bodies, &mut contacts, ground, capsule, config)?;
        contacts.end_frame();

        bodies.apply_velocity_change(gravity * dt);
        solve_step(&mut bodies, &mut contacts, &mut constraints, dt, config)?;
        bodies.integrate(dt);

        if step % STEP_RATE == 0 {
            let p = bodies.get(capsule)?.position();
            info!("Step {}: capsule y = {:.3}, {} contacts", step, p.y.to_f64(), contacts.len());
        }
    }

    let mut lines = LineBuffer::new();
    constraints.debug_draw_all(&bodies, &mut lines)?;
    info!("Debug lines: {}", lines.len());

    let hash = compute_state_hash(u64::from(DEMO_STEPS), |hasher| {
        bodies.hash_into(hasher);
        constraints.hash_into(hasher);
    });
    Ok((hash, bodies))
}

/// Ground plane at y = 0.5: one contact under the capsule's lowest point while it overlaps or nearly does.
fn touch_ground(
    bodies: &BodySet,
    contacts: &mut ContactPool,
    ground: BodyHandle,
    capsule: BodyHandle,
    config: &SolverConfig,
) -> Result<()> {
    let surface = FixedScalar::HALF;
    let body = bodies.get(capsule)?;
    let down = (-FixedVec3::UNIT_Y).transform(&body.inv_orientation());
    let lowest = body.position() + body.shape().support_mapping(down).transform(&body.orientation());
    let penetration = surface - lowest.y;
    if penetration < -config.contact.break_threshold * FixedScalar::from_int(10) {
        return Ok(());
    }

    let (id, is_new) = contacts.check_out(ContactKey::new(ground, capsule, 0));
    let point = ContactPoint {
        point1: FixedVec3::new(lowest.x, surface, lowest.z),
        point2: lowest,
        normal: FixedVec3::UNIT_Y,
        penetration,
    };
    match contacts.get_mut(id) {
        Some(contact) => contact.initialize(bodies, ground, capsule, point, is_new, config.contact)?,
        None => bail!("contact slot {:?} missing", id),
    }
    Ok(())
}
