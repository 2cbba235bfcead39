//! Per-role reward shaping.
//!
//! Movement roles share one skeleton: a survival bonus while not hit, a
//! terminal hit penalty, a penalty for standing still too long, a bonus for
//! moving, and a quadratic penalty near the walls. The numbers differ per
//! role and live in [`MovementProfile::for_role`]. Shooting roles pay a small
//! per-frame cost and earn rewards for hits and kills.

use crate::roles::Role;

/// Below this displacement per frame a unit counts as stationary.
pub const STATIONARY_SPEED: f64 = 1.0;

/// A patrol unit has reached its waypoint within this many pixels.
pub const WAYPOINT_REACH_RADIUS: f64 = 20.0;

/// Reward for reaching a patrol waypoint.
pub const WAYPOINT_REACHED_BONUS: f64 = 5.0;

/// Scale of the per-frame progress reward toward the waypoint.
pub const WAYPOINT_PROGRESS_SCALE: f64 = 0.1;

/// Shooting roles pay this every frame.
pub const SHOOTING_FRAME_COST: f64 = -0.1;

/// Reward per bullet that hits a target.
pub const HIT_REWARD: f64 = 10.0;

/// Reward parameters of one movement role.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementProfile {
    /// Added every frame the unit is not hit.
    pub survival_bonus: f64,
    /// Replaces all other terms on the frame the unit is hit.
    pub hit_penalty: f64,
    /// Consecutive stationary frames tolerated before the penalty applies.
    pub stationary_frames: u32,
    pub stationary_penalty: f64,
    /// Displacement per frame above which the movement bonus is paid.
    pub move_threshold: f64,
    pub move_bonus: f64,
    /// Distance from the walls at which the wall penalty starts.
    pub wall_margin: f64,
    /// Wall penalty at zero distance.
    pub wall_k: f64,
}

impl MovementProfile {
    /// The profile of a movement role; `None` for shooting roles.
    pub fn for_role(role: Role) -> Option<Self> {
        let profile = match role {
            Role::PlayerMovement => MovementProfile {
                survival_bonus: 1.0,
                hit_penalty: -50.0,
                stationary_frames: 15,
                stationary_penalty: -10.0,
                move_threshold: 3.0,
                move_bonus: 2.0,
                wall_margin: 100.0,
                wall_k: 10.0,
            },
            Role::CompanionMovement => MovementProfile {
                survival_bonus: 1.0,
                hit_penalty: -30.0,
                stationary_frames: 20,
                stationary_penalty: -5.0,
                move_threshold: 2.0,
                move_bonus: 2.0,
                wall_margin: 120.0,
                wall_k: 8.0,
            },
            Role::CompanionSoloMovement => MovementProfile {
                survival_bonus: 1.5,
                ..MovementProfile::for_role(Role::CompanionMovement)?
            },
            Role::EnemyMovement => MovementProfile {
                survival_bonus: 1.0,
                hit_penalty: -20.0,
                stationary_frames: 10,
                stationary_penalty: -3.0,
                move_threshold: 2.0,
                move_bonus: 2.0,
                wall_margin: 100.0,
                wall_k: 5.0,
            },
            Role::BossMovement => MovementProfile {
                survival_bonus: 2.0,
                hit_penalty: -40.0,
                stationary_frames: 30,
                stationary_penalty: -15.0,
                move_threshold: 5.0,
                move_bonus: 3.0,
                wall_margin: 150.0,
                wall_k: 20.0,
            },
            Role::EnemyPatrol => MovementProfile {
                survival_bonus: 1.0,
                hit_penalty: -20.0,
                stationary_frames: 25,
                stationary_penalty: -8.0,
                move_threshold: 2.0,
                move_bonus: 2.0,
                wall_margin: 100.0,
                wall_k: 5.0,
            },
            Role::PlayerShooting
            | Role::CompanionShooting
            | Role::EnemyShooting
            | Role::BossShooting => return None,
        };
        Some(profile)
    }
}

/// `-k·(1 − d/margin)²` inside the margin, zero outside.
pub fn wall_penalty(distance: f64, margin: f64, k: f64) -> f64 {
    if margin <= 0.0 || distance >= margin {
        return 0.0;
    }
    let closeness = 1.0 - distance.max(0.0) / margin;
    -k * closeness * closeness
}

/// Spacing reward of a solo companion given the distance to its nearest
/// fellow companion.
pub fn clustering_reward(nearest_companion: Option<f64>) -> f64 {
    match nearest_companion {
        Some(d) if d < 40.0 => -10.0,
        Some(d) if d < 80.0 => -5.0,
        Some(d) if (120.0..=250.0).contains(&d) => 2.0,
        _ => 0.0,
    }
}

/// Waypoint term of a patrol unit: progress toward the waypoint, plus a
/// bonus once it is reached.
pub fn waypoint_reward(previous_distance: f64, distance: f64) -> f64 {
    let progress = WAYPOINT_PROGRESS_SCALE * (previous_distance - distance);
    if distance <= WAYPOINT_REACH_RADIUS {
        progress + WAYPOINT_REACHED_BONUS
    } else {
        progress
    }
}

/// Frame-to-frame movement reward state of one unit.
#[derive(Debug, Clone)]
pub struct MovementRewardTracker {
    profile: MovementProfile,
    stationary_frames: u32,
}

impl MovementRewardTracker {
    pub fn new(profile: MovementProfile) -> Self {
        Self {
            profile,
            stationary_frames: 0,
        }
    }

    pub fn profile(&self) -> &MovementProfile {
        &self.profile
    }

    /// Consecutive frames spent below [`STATIONARY_SPEED`].
    pub fn stationary_frames(&self) -> u32 {
        self.stationary_frames
    }

    /// Reward of one frame.
    ///
    /// `displacement` is how far the unit moved this frame, `wall_distance`
    /// its distance to the nearest wall of its area.
    pub fn step(&mut self, displacement: f64, wall_distance: f64, hit: bool) -> f64 {
        if hit {
            return self.profile.hit_penalty;
        }

        if displacement < STATIONARY_SPEED {
            self.stationary_frames += 1;
        } else {
            self.stationary_frames = 0;
        }

        let mut reward = self.profile.survival_bonus;
        if self.stationary_frames > self.profile.stationary_frames {
            reward += self.profile.stationary_penalty;
        }
        if displacement > self.profile.move_threshold {
            reward += self.profile.move_bonus;
        }
        reward + wall_penalty(wall_distance, self.profile.wall_margin, self.profile.wall_k)
    }
}

/// What a shot killed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    Player,
    Companion,
    Enemy,
    Boss,
}

/// Bonus for `role` killing a `target`. Boss and player kills are worth
/// more than enemy and companion kills.
pub fn kill_bonus(role: Role, target: TargetKind) -> f64 {
    match (role, target) {
        (Role::PlayerShooting, TargetKind::Enemy) => 15.0,
        (Role::PlayerShooting, TargetKind::Boss) => 30.0,
        (Role::CompanionShooting, TargetKind::Enemy) => 15.0,
        (Role::CompanionShooting, TargetKind::Boss) => 25.0,
        (Role::EnemyShooting, TargetKind::Player) => 25.0,
        (Role::EnemyShooting, TargetKind::Companion) => 15.0,
        (Role::BossShooting, TargetKind::Player) => 30.0,
        (Role::BossShooting, TargetKind::Companion) => 20.0,
        _ => 0.0,
    }
}

/// Frames a shooting role must wait between shots.
pub fn shot_cooldown(role: Role) -> u32 {
    match role {
        Role::PlayerShooting => 8,
        Role::CompanionShooting => 12,
        Role::EnemyShooting => 20,
        Role::BossShooting => 15,
        _ => 0,
    }
}

/// Reward of one shooting frame.
pub fn shooting_reward(role: Role, hits: u32, kills: &[TargetKind]) -> f64 {
    SHOOTING_FRAME_COST
        + HIT_REWARD * f64::from(hits)
        + kills.iter().map(|k| kill_bonus(role, *k)).sum::<f64>()
}
