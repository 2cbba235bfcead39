//! Per-role state encoders.
//!
//! An encoder maps a read-only world snapshot, seen from one owning unit, to
//! the fixed-length feature vector its role's model expects. Encoders are
//! pure and deterministic.

pub mod blocks;
pub mod movement;
pub mod shooting;

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::warn;

use crate::roles::Role;
use crate::snapshot::{Unit, WorldSnapshot};

pub use movement::{
    BossMovementEncoder, CompanionMovementEncoder, CompanionSoloMovementEncoder,
    EnemyMovementEncoder, EnemyPatrolEncoder, PlayerMovementEncoder,
};
pub use shooting::{
    BossShootingEncoder, CompanionShootingEncoder, EnemyShootingEncoder, PlayerShootingEncoder,
};

static PADDING_EVENTS: AtomicU64 = AtomicU64::new(0);

/// Number of times any encoder output had to be padded or truncated.
pub fn padding_events() -> u64 {
    PADDING_EVENTS.load(Ordering::Relaxed)
}

/// Builds state vectors for one role.
pub trait StateEncoder: Send + Sync {
    /// The role this encoder serves.
    fn role(&self) -> Role;

    /// Number of features `encode_features` produces.
    fn feature_len(&self) -> usize;

    /// The natural feature vector, before size fitting.
    fn encode_features(&self, owner: &Unit, world: &WorldSnapshot) -> Vec<f64>;

    /// The feature vector fitted to exactly `state_size` elements.
    fn encode(&self, owner: &Unit, world: &WorldSnapshot, state_size: usize) -> Vec<f64> {
        fit_to_size(self.role(), self.encode_features(owner, world), state_size)
    }
}

/// Zero-fills or truncates `features` to `state_size`.
///
/// This is a compatibility shim: a well-configured encoder never triggers it.
/// Every adjustment is counted and logged.
pub fn fit_to_size(role: Role, mut features: Vec<f64>, state_size: usize) -> Vec<f64> {
    if features.len() != state_size {
        PADDING_EVENTS.fetch_add(1, Ordering::Relaxed);
        warn!(
            role = %role,
            natural = features.len(),
            expected = state_size,
            "state vector resized to model input size"
        );
        features.resize(state_size, 0.0);
    }
    features
}

/// The encoder for `role`.
pub fn encoder_for(role: Role) -> &'static dyn StateEncoder {
    match role {
        Role::PlayerMovement => &PlayerMovementEncoder,
        Role::PlayerShooting => &PlayerShootingEncoder,
        Role::CompanionMovement => &CompanionMovementEncoder,
        Role::CompanionShooting => &CompanionShootingEncoder,
        Role::EnemyMovement => &EnemyMovementEncoder,
        Role::EnemyShooting => &EnemyShootingEncoder,
        Role::BossMovement => &BossMovementEncoder,
        Role::BossShooting => &BossShootingEncoder,
        Role::CompanionSoloMovement => &CompanionSoloMovementEncoder,
        Role::EnemyPatrol => &EnemyPatrolEncoder,
    }
}
