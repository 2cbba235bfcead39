//! Target-practice scenarios for the shooting roles.

use rand::rngs::StdRng;
use rand::Rng;

use super::episode::{
    advance_bullets, random_point, random_velocity, take_hits, wander, Scenario, StepOutcome,
    BOSS_HIT_RADIUS, BULLET_HIT_RADIUS, BULLET_SPEED, ENEMY_HIT_RADIUS,
};
use crate::action::{move_speed, ActionEffect};
use crate::reward::{shooting_reward, shot_cooldown, TargetKind};
use crate::roles::Role;
use crate::snapshot::{Bullet, Unit, WorldSnapshot};
use crate::types::{Rect, Size, Vec2};

/// Chance that a boss joins the enemies shot at by the player side.
const BOSS_CHANCE: f64 = 0.5;

/// Targets move at this fraction of their role's speed.
const TARGET_SPEED_SCALE: f64 = 0.5;

const PLAYER_TARGET_HEALTH: f64 = 5.0;
const COMPANION_TARGET_HEALTH: f64 = 3.0;
const ENEMY_TARGET_HEALTH: f64 = 3.0;
const BOSS_TARGET_HEALTH: f64 = 10.0;

/// A stationary shooter firing at wandering targets.
#[derive(Debug, Clone)]
pub struct ShootingScenario {
    role: Role,
    bounds: Rect,
    margin: f64,
    subject: Unit,
    world: WorldSnapshot,
    cooldown: u32,
    ready_in: u32,
}

impl ShootingScenario {
    /// Spawns a fresh episode for `role` inside `bounds`; `None` for
    /// movement roles.
    pub fn new(
        role: Role,
        window: Size,
        bounds: Rect,
        margin: f64,
        rng: &mut StdRng,
    ) -> Option<Self> {
        if !role.is_shooting() {
            return None;
        }
        let mut world = WorldSnapshot::within(window, bounds);

        // player-side shooters sit near the bottom, enemy-side near the top
        let player_side = matches!(role, Role::PlayerShooting | Role::CompanionShooting);
        let home_y = if player_side {
            bounds.bottom() - margin * 2.0
        } else {
            bounds.top() + margin * 2.0
        };
        let home = bounds.clamp(Vec2::new(bounds.center().x, home_y), margin);
        let subject = Unit::new(home, 1.0);

        match role {
            Role::PlayerShooting | Role::CompanionShooting => {
                let enemies = if role == Role::PlayerShooting { 3 } else { 2 };
                for _ in 0..enemies {
                    let enemy = spawn_target(&bounds, margin, TargetKind::Enemy, rng);
                    world.enemies.push(enemy);
                }
                if rng.gen_bool(BOSS_CHANCE) {
                    world.boss = Some(spawn_target(&bounds, margin, TargetKind::Boss, rng));
                }
                if role == Role::CompanionShooting {
                    let at = random_point(&bounds, margin, rng);
                    world.player = Some(Unit::new(at, PLAYER_TARGET_HEALTH));
                }
            }
            _ => {
                world.player = Some(spawn_target(&bounds, margin, TargetKind::Player, rng));
                for _ in 0..2 {
                    let companion = spawn_target(&bounds, margin, TargetKind::Companion, rng);
                    world.companions.push(companion);
                }
            }
        }

        Some(Self {
            role,
            bounds,
            margin,
            subject,
            world,
            cooldown: shot_cooldown(role),
            ready_in: 0,
        })
    }

    /// The subject's own bullets in flight.
    pub fn bullets(&self) -> &[Bullet] {
        if self.player_side() {
            &self.world.player_bullets
        } else {
            &self.world.enemy_bullets
        }
    }

    fn player_side(&self) -> bool {
        matches!(self.role, Role::PlayerShooting | Role::CompanionShooting)
    }

    fn own_bullets(&mut self) -> &mut Vec<Bullet> {
        if self.player_side() {
            &mut self.world.player_bullets
        } else {
            &mut self.world.enemy_bullets
        }
    }

    fn move_targets(&mut self, rng: &mut StdRng) {
        let (bounds, margin) = (self.bounds, self.margin);
        let groups: [(&mut [Unit], TargetKind); 4] = [
            (self.world.enemies.as_mut_slice(), TargetKind::Enemy),
            (self.world.boss.as_mut_slice(), TargetKind::Boss),
            (self.world.player.as_mut_slice(), TargetKind::Player),
            (self.world.companions.as_mut_slice(), TargetKind::Companion),
        ];
        for (units, kind) in groups {
            let speed = target_stats(kind).1;
            for unit in units {
                *unit = wander(unit, &bounds, margin, speed, rng);
            }
        }
    }

    /// Resolves bullet hits on every target. Returns the hit count and the
    /// kinds of the targets killed.
    fn resolve_hits(&mut self) -> (u32, Vec<TargetKind>) {
        let mut bullets = std::mem::take(self.own_bullets());
        let mut hits = 0;
        let mut kills = Vec::new();
        let mut strike = |unit: &Unit, kind: TargetKind| -> Option<Unit> {
            let struck = take_hits(&mut bullets, unit.position(), hit_radius(kind));
            hits += struck.len() as u32;
            let damaged = struck.iter().fold(*unit, |u, b| u.damaged(b.damage));
            if damaged.is_dead() {
                kills.push(kind);
                None
            } else {
                Some(damaged)
            }
        };

        if self.player_side() {
            self.world.enemies = self
                .world
                .enemies
                .iter()
                .filter_map(|e| strike(e, TargetKind::Enemy))
                .collect();
            self.world.boss = self.world.boss.and_then(|b| strike(&b, TargetKind::Boss));
        } else {
            self.world.player = self.world.player.and_then(|p| strike(&p, TargetKind::Player));
            self.world.companions = self
                .world
                .companions
                .iter()
                .filter_map(|c| strike(c, TargetKind::Companion))
                .collect();
        }
        *self.own_bullets() = bullets;
        (hits, kills)
    }
}

fn spawn_target(bounds: &Rect, margin: f64, kind: TargetKind, rng: &mut StdRng) -> Unit {
    let (health, speed) = target_stats(kind);
    Unit::new(random_point(bounds, margin, rng), health).with_velocity(random_velocity(speed, rng))
}

fn target_stats(kind: TargetKind) -> (f64, f64) {
    let speed = |role: Role| move_speed(role) * TARGET_SPEED_SCALE;
    match kind {
        TargetKind::Player => (PLAYER_TARGET_HEALTH, speed(Role::PlayerMovement)),
        TargetKind::Companion => (COMPANION_TARGET_HEALTH, speed(Role::CompanionMovement)),
        TargetKind::Enemy => (ENEMY_TARGET_HEALTH, speed(Role::EnemyMovement)),
        TargetKind::Boss => (BOSS_TARGET_HEALTH, speed(Role::BossMovement)),
    }
}

fn hit_radius(kind: TargetKind) -> f64 {
    match kind {
        TargetKind::Enemy => ENEMY_HIT_RADIUS,
        TargetKind::Boss => BOSS_HIT_RADIUS,
        TargetKind::Player | TargetKind::Companion => BULLET_HIT_RADIUS,
    }
}

impl Scenario for ShootingScenario {
    fn subject(&self) -> &Unit {
        &self.subject
    }

    fn observe(&self) -> WorldSnapshot {
        self.world.clone()
    }

    fn targets(&self) -> Vec<Unit> {
        if self.player_side() {
            self.world
                .enemies
                .iter()
                .chain(self.world.boss.iter())
                .copied()
                .collect()
        } else {
            self.world
                .player
                .iter()
                .chain(self.world.companions.iter())
                .copied()
                .collect()
        }
    }

    fn step(&mut self, effect: Option<ActionEffect>, rng: &mut StdRng) -> StepOutcome {
        self.ready_in = self.ready_in.saturating_sub(1);
        if let Some(ActionEffect::Shoot(directions)) = effect {
            if self.ready_in == 0 {
                let origin = self.subject.position();
                let shots = directions
                    .into_iter()
                    .map(|d| Bullet::new(origin, d.scaled(BULLET_SPEED), 1.0));
                self.own_bullets().extend(shots);
                self.ready_in = self.cooldown;
            }
        }

        self.move_targets(rng);
        let bounds = self.bounds;
        advance_bullets(self.own_bullets(), &bounds);
        let (hits, kills) = self.resolve_hits();

        StepOutcome {
            reward: shooting_reward(self.role, hits, &kills),
            done: self.targets().is_empty(),
            hits_landed: hits,
            kills: kills.len() as u32,
        }
    }
}
