//! Discrete action tables and their translation into game effects.
//!
//! Movement roles pick a velocity (stop, 8 directions, optionally a dash).
//! Shooting roles pick a shot: action 0 never shoots, the next eight are
//! manual aims, and the tail holds the "smart" modes for the role.

use crate::error::{Result, TrainingError};
use crate::roles::Role;
use crate::snapshot::Unit;
use crate::types::Vec2;

/// Dash moves at this multiple of the role's base speed.
pub const DASH_MULTIPLIER: f64 = 2.0;

/// Half-angle between the outer bullets of a burst, in degrees.
pub const BURST_SPREAD_DEG: f64 = 10.0;

/// Fan angles of a full spread, in degrees.
pub const SPREAD_ANGLES_DEG: [f64; 5] = [-30.0, -15.0, 0.0, 15.0, 30.0];

/// Lookahead used by enemy predictive shots.
pub const ENEMY_LEAD_FRAMES: f64 = 3.0;

/// Bosses telegraph further ahead than regular enemies.
pub const BOSS_LEAD_FRAMES: f64 = 10.0;

/// One of the eight compass directions in screen space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    UpRight,
    Right,
    DownRight,
    Down,
    DownLeft,
    Left,
    UpLeft,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::Up,
        Direction::UpRight,
        Direction::Right,
        Direction::DownRight,
        Direction::Down,
        Direction::DownLeft,
        Direction::Left,
        Direction::UpLeft,
    ];

    /// Unit vector for this direction (y grows downward).
    pub fn vector(&self) -> Vec2 {
        let d = std::f64::consts::FRAC_1_SQRT_2;
        match self {
            Direction::Up => Vec2::new(0.0, -1.0),
            Direction::UpRight => Vec2::new(d, -d),
            Direction::Right => Vec2::new(1.0, 0.0),
            Direction::DownRight => Vec2::new(d, d),
            Direction::Down => Vec2::new(0.0, 1.0),
            Direction::DownLeft => Vec2::new(-d, d),
            Direction::Left => Vec2::new(-1.0, 0.0),
            Direction::UpLeft => Vec2::new(-d, -d),
        }
    }
}

/// One entry of a role's action table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActionKind {
    Stop,
    Move(Direction),
    /// Double-speed move along the current heading.
    Dash,
    NoShot,
    Aim(Direction),
    AimNearest,
    /// Aim at `target + velocity * frames`.
    PredictiveLead { frames: f64 },
    /// Three bullets in a narrow cone at the nearest target.
    Burst,
    /// Five bullets in a fan at the nearest target.
    Spread,
}

impl ActionKind {
    /// Stable name used by the data collector and logs.
    pub fn name(&self) -> &'static str {
        match self {
            ActionKind::Stop => "stop",
            ActionKind::Move(d) => match d {
                Direction::Up => "move_up",
                Direction::UpRight => "move_up_right",
                Direction::Right => "move_right",
                Direction::DownRight => "move_down_right",
                Direction::Down => "move_down",
                Direction::DownLeft => "move_down_left",
                Direction::Left => "move_left",
                Direction::UpLeft => "move_up_left",
            },
            ActionKind::Dash => "dash",
            ActionKind::NoShot => "no_shot",
            ActionKind::Aim(d) => match d {
                Direction::Up => "shoot_up",
                Direction::UpRight => "shoot_up_right",
                Direction::Right => "shoot_right",
                Direction::DownRight => "shoot_down_right",
                Direction::Down => "shoot_down",
                Direction::DownLeft => "shoot_down_left",
                Direction::Left => "shoot_left",
                Direction::UpLeft => "shoot_up_left",
            },
            ActionKind::AimNearest => "shoot_nearest",
            ActionKind::PredictiveLead { .. } => "shoot_predictive",
            ActionKind::Burst => "shoot_burst",
            ActionKind::Spread => "shoot_spread",
        }
    }
}

/// What the game loop should do with a chosen action.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionEffect {
    /// New velocity for the owner.
    Move(Vec2),
    /// Spawn one bullet per unit direction.
    Shoot(Vec<Vec2>),
}

const MOVE_BASIC: [ActionKind; 9] = [
    ActionKind::Stop,
    ActionKind::Move(Direction::Up),
    ActionKind::Move(Direction::UpRight),
    ActionKind::Move(Direction::Right),
    ActionKind::Move(Direction::DownRight),
    ActionKind::Move(Direction::Down),
    ActionKind::Move(Direction::DownLeft),
    ActionKind::Move(Direction::Left),
    ActionKind::Move(Direction::UpLeft),
];

const MOVE_WITH_DASH: [ActionKind; 10] = [
    ActionKind::Stop,
    ActionKind::Move(Direction::Up),
    ActionKind::Move(Direction::UpRight),
    ActionKind::Move(Direction::Right),
    ActionKind::Move(Direction::DownRight),
    ActionKind::Move(Direction::Down),
    ActionKind::Move(Direction::DownLeft),
    ActionKind::Move(Direction::Left),
    ActionKind::Move(Direction::UpLeft),
    ActionKind::Dash,
];

const SHOOT_ALLY: [ActionKind; 10] = [
    ActionKind::NoShot,
    ActionKind::Aim(Direction::Up),
    ActionKind::Aim(Direction::UpRight),
    ActionKind::Aim(Direction::Right),
    ActionKind::Aim(Direction::DownRight),
    ActionKind::Aim(Direction::Down),
    ActionKind::Aim(Direction::DownLeft),
    ActionKind::Aim(Direction::Left),
    ActionKind::Aim(Direction::UpLeft),
    ActionKind::AimNearest,
];

const SHOOT_ENEMY: [ActionKind; 12] = [
    ActionKind::NoShot,
    ActionKind::Aim(Direction::Up),
    ActionKind::Aim(Direction::UpRight),
    ActionKind::Aim(Direction::Right),
    ActionKind::Aim(Direction::DownRight),
    ActionKind::Aim(Direction::Down),
    ActionKind::Aim(Direction::DownLeft),
    ActionKind::Aim(Direction::Left),
    ActionKind::Aim(Direction::UpLeft),
    ActionKind::AimNearest,
    ActionKind::PredictiveLead {
        frames: ENEMY_LEAD_FRAMES,
    },
    ActionKind::Burst,
];

const SHOOT_BOSS: [ActionKind; 13] = [
    ActionKind::NoShot,
    ActionKind::Aim(Direction::Up),
    ActionKind::Aim(Direction::UpRight),
    ActionKind::Aim(Direction::Right),
    ActionKind::Aim(Direction::DownRight),
    ActionKind::Aim(Direction::Down),
    ActionKind::Aim(Direction::DownLeft),
    ActionKind::Aim(Direction::Left),
    ActionKind::Aim(Direction::UpLeft),
    ActionKind::AimNearest,
    ActionKind::PredictiveLead {
        frames: BOSS_LEAD_FRAMES,
    },
    ActionKind::Burst,
    ActionKind::Spread,
];

/// The discrete action table of `role`, indexed by action number.
pub fn action_table(role: Role) -> &'static [ActionKind] {
    match role {
        Role::PlayerMovement
        | Role::CompanionMovement
        | Role::CompanionSoloMovement
        | Role::EnemyPatrol => &MOVE_BASIC,
        Role::EnemyMovement | Role::BossMovement => &MOVE_WITH_DASH,
        Role::PlayerShooting | Role::CompanionShooting => &SHOOT_ALLY,
        Role::EnemyShooting => &SHOOT_ENEMY,
        Role::BossShooting => &SHOOT_BOSS,
    }
}

/// Base movement speed (pixels per frame) of `role`.
pub fn move_speed(role: Role) -> f64 {
    match role {
        Role::PlayerMovement | Role::PlayerShooting => 5.0,
        Role::CompanionMovement | Role::CompanionShooting | Role::CompanionSoloMovement => 4.0,
        Role::EnemyMovement | Role::EnemyShooting => 2.0,
        Role::BossMovement | Role::BossShooting => 2.5,
        Role::EnemyPatrol => 1.5,
    }
}

/// Name of `action` in `role`'s table, if the index exists.
pub fn action_name(role: Role, action: usize) -> Option<&'static str> {
    action_table(role).get(action).map(ActionKind::name)
}

/// Looks up the table entry for `action`, failing loudly on a bad index.
pub fn action_kind(role: Role, action: usize) -> Result<ActionKind> {
    let table = action_table(role);
    table
        .get(action)
        .copied()
        .ok_or(TrainingError::InvalidAction {
            role,
            action,
            action_size: table.len(),
        })
}

/// Translates `action` into an effect for `owner`.
///
/// `targets` are the units smart shooting modes may aim at. Returns `None`
/// for "don't shoot" and for smart modes that have nothing to aim at.
pub fn resolve(
    role: Role,
    action: usize,
    owner: &Unit,
    targets: &[Unit],
) -> Result<Option<ActionEffect>> {
    let speed = move_speed(role);
    let effect = match action_kind(role, action)? {
        ActionKind::Stop => Some(ActionEffect::Move(Vec2::zero())),
        ActionKind::Move(d) => Some(ActionEffect::Move(d.vector().scaled(speed))),
        ActionKind::Dash => {
            let heading = owner.velocity().normalized();
            Some(ActionEffect::Move(heading.scaled(speed * DASH_MULTIPLIER)))
        }
        ActionKind::NoShot => None,
        ActionKind::Aim(d) => Some(ActionEffect::Shoot(vec![d.vector()])),
        ActionKind::AimNearest => aim_at_nearest(owner, targets, 0.0)
            .map(|dir| ActionEffect::Shoot(vec![dir])),
        ActionKind::PredictiveLead { frames } => aim_at_nearest(owner, targets, frames)
            .map(|dir| ActionEffect::Shoot(vec![dir])),
        ActionKind::Burst => aim_at_nearest(owner, targets, 0.0).map(|dir| {
            ActionEffect::Shoot(vec![
                dir.rotated(-BURST_SPREAD_DEG),
                dir,
                dir.rotated(BURST_SPREAD_DEG),
            ])
        }),
        ActionKind::Spread => aim_at_nearest(owner, targets, 0.0).map(|dir| {
            ActionEffect::Shoot(SPREAD_ANGLES_DEG.iter().map(|a| dir.rotated(*a)).collect())
        }),
    };
    Ok(effect)
}

/// Unit aim vector at the nearest target, led by `lead_frames` of its velocity.
///
/// `None` when there is no target or the aim point coincides with the owner.
fn aim_at_nearest(owner: &Unit, targets: &[Unit], lead_frames: f64) -> Option<Vec2> {
    let origin = owner.position();
    let nearest = targets.iter().min_by(|a, b| {
        origin
            .distance_to(&a.position())
            .total_cmp(&origin.distance_to(&b.position()))
    })?;
    let aim_point = nearest.position() + nearest.velocity().scaled(lead_frames);
    let dir = origin.direction_to(&aim_point);
    if dir.is_zero() {
        None
    } else {
        Some(dir)
    }
}
