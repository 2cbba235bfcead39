//! Dodging and positioning scenarios for the movement roles.

use rand::rngs::StdRng;
use rand::Rng;

use super::episode::{
    advance_bullets, bullet_toward, random_point, random_velocity, take_hits, wander, Scenario,
    StepOutcome, BOSS_HIT_RADIUS, BULLET_HIT_RADIUS, ENEMY_HIT_RADIUS,
};
use crate::action::{move_speed, ActionEffect};
use crate::encoder::movement::PATROL_VIEW_RADIUS;
use crate::reward::{
    clustering_reward, waypoint_reward, MovementProfile, MovementRewardTracker,
    WAYPOINT_REACH_RADIUS,
};
use crate::roles::Role;
use crate::snapshot::{Bullet, Unit, WorldSnapshot};
use crate::types::{Rect, Size, Vec2};

/// Average frames between two shots of one synthetic shooter.
pub const FIRE_INTERVAL: f64 = 30.0;

/// Synthetic shots are scattered by up to this many degrees.
const AIM_JITTER_DEG: f64 = 10.0;

/// Fraction of the range size the patrol route is inset by.
const PATROL_INSET: f64 = 0.25;

const PLAYER_HEALTH: f64 = 100.0;
const COMPANION_HEALTH: f64 = 60.0;
const ENEMY_HEALTH: f64 = 3.0;
const BOSS_HEALTH: f64 = 100.0;

/// Companions in the solo range for the 1-based `episode`, counting the
/// trained companion: one for episodes 1–20, two for 21–40, then three or
/// four at random.
pub fn curriculum_companions<R: Rng>(episode: u64, rng: &mut R) -> usize {
    match episode {
        0..=20 => 1,
        21..=40 => 2,
        _ => rng.gen_range(3..=4),
    }
}

fn spawn_wanderer(bounds: &Rect, margin: f64, health: f64, speed: f64, rng: &mut StdRng) -> Unit {
    Unit::new(random_point(bounds, margin, rng), health).with_velocity(random_velocity(speed, rng))
}

/// A movement subject dodging fire inside its range.
#[derive(Debug, Clone)]
pub struct MovementScenario {
    role: Role,
    bounds: Rect,
    margin: f64,
    window: Size,
    subject: Unit,
    /// Everything but the subject.
    world: WorldSnapshot,
    tracker: MovementRewardTracker,
    patrol_route: Vec<Vec2>,
    route_index: usize,
    companions: Option<usize>,
}

impl MovementScenario {
    /// Spawns a fresh episode for `role` inside `bounds`.
    ///
    /// `companions` is the curriculum count for the solo companion range
    /// and is ignored by the other roles.
    pub fn new(
        role: Role,
        window: Size,
        bounds: Rect,
        margin: f64,
        companions: usize,
        rng: &mut StdRng,
    ) -> Option<Self> {
        let profile = MovementProfile::for_role(role)?;
        let mut world = WorldSnapshot::within(window, bounds);
        let subject_health = match role {
            Role::PlayerMovement => PLAYER_HEALTH,
            Role::CompanionMovement | Role::CompanionSoloMovement => COMPANION_HEALTH,
            Role::BossMovement => BOSS_HEALTH,
            _ => ENEMY_HEALTH,
        };
        let subject = Unit::new(random_point(&bounds, margin * 3.0, rng), subject_health);

        let enemy_speed = move_speed(Role::EnemyMovement);
        let player_speed = move_speed(Role::PlayerMovement) / 2.0;
        let companion_speed = move_speed(Role::CompanionMovement) / 2.0;
        match role {
            Role::PlayerMovement => {
                for _ in 0..2 {
                    let enemy = spawn_wanderer(&bounds, margin, ENEMY_HEALTH, enemy_speed, rng);
                    world.enemies.push(enemy);
                }
            }
            Role::CompanionMovement | Role::CompanionSoloMovement => {
                world.player = Some(spawn_wanderer(&bounds, margin, PLAYER_HEALTH, player_speed, rng));
                let enemy = spawn_wanderer(&bounds, margin, ENEMY_HEALTH, enemy_speed, rng);
                world.enemies.push(enemy);
                if role == Role::CompanionSoloMovement {
                    for _ in 1..companions.max(1) {
                        let other =
                            spawn_wanderer(&bounds, margin, COMPANION_HEALTH, companion_speed, rng);
                        world.companions.push(other);
                    }
                }
            }
            _ => {
                world.player = Some(spawn_wanderer(&bounds, margin, PLAYER_HEALTH, player_speed, rng));
            }
        }

        let patrol_route = if role == Role::EnemyPatrol {
            let (dx, dy) = (bounds.width * PATROL_INSET, bounds.height * PATROL_INSET);
            vec![
                Vec2::new(bounds.left() + dx, bounds.top() + dy),
                Vec2::new(bounds.right() - dx, bounds.top() + dy),
                Vec2::new(bounds.right() - dx, bounds.bottom() - dy),
                Vec2::new(bounds.left() + dx, bounds.bottom() - dy),
            ]
        } else {
            Vec::new()
        };
        let subject = subject.with_waypoint(patrol_route.first().copied());

        Some(Self {
            role,
            bounds,
            margin,
            window,
            subject,
            world,
            tracker: MovementRewardTracker::new(profile),
            patrol_route,
            route_index: 0,
            companions: (role == Role::CompanionSoloMovement).then_some(companions.max(1)),
        })
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn window(&self) -> Size {
        self.window
    }

    /// Every unit in the scenario, subject first.
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        std::iter::once(&self.subject)
            .chain(self.world.player.iter())
            .chain(self.world.enemies.iter())
            .chain(self.world.companions.iter())
    }

    /// Every live bullet.
    pub fn bullets(&self) -> impl Iterator<Item = &Bullet> {
        self.world
            .player_bullets
            .iter()
            .chain(self.world.enemy_bullets.iter())
    }

    fn subject_radius(&self) -> f64 {
        match self.role {
            Role::BossMovement => BOSS_HIT_RADIUS,
            Role::EnemyMovement | Role::EnemyPatrol => ENEMY_HIT_RADIUS,
            _ => BULLET_HIT_RADIUS,
        }
    }

    /// Player-side subjects die on touching an enemy.
    fn contact_applies(&self) -> bool {
        matches!(
            self.role,
            Role::PlayerMovement | Role::CompanionMovement | Role::CompanionSoloMovement
        )
    }

    /// True when an enemy is within collision range of the subject.
    fn in_contact(&self) -> bool {
        let at = self.subject.position();
        self.contact_applies()
            && self
                .world
                .enemies
                .iter()
                .any(|e| e.position().distance_to(&at) < ENEMY_HIT_RADIUS)
    }

    /// Positions that fire at the subject this frame. Enemies already in
    /// contact hold their fire.
    fn shooters(&self) -> Vec<Vec2> {
        let at = self.subject.position();
        match self.role {
            Role::PlayerMovement | Role::CompanionMovement | Role::CompanionSoloMovement => self
                .world
                .enemies
                .iter()
                .map(Unit::position)
                .filter(|p| p.distance_to(&at) >= ENEMY_HIT_RADIUS)
                .collect(),
            Role::EnemyPatrol => self
                .world
                .player
                .iter()
                .map(Unit::position)
                .filter(|p| p.distance_to(&at) <= PATROL_VIEW_RADIUS)
                .collect(),
            _ => self.world.player.iter().map(Unit::position).collect(),
        }
    }

    /// Bullets that can hit the subject.
    fn threats(&mut self) -> &mut Vec<Bullet> {
        match self.role {
            Role::PlayerMovement | Role::CompanionMovement | Role::CompanionSoloMovement => {
                &mut self.world.enemy_bullets
            }
            _ => &mut self.world.player_bullets,
        }
    }

    fn move_others(&mut self, rng: &mut StdRng) {
        let (bounds, margin) = (self.bounds, self.margin);
        let player_speed = move_speed(Role::PlayerMovement) / 2.0;
        if let Some(player) = self.world.player.as_mut() {
            *player = wander(player, &bounds, margin, player_speed, rng);
        }
        for enemy in &mut self.world.enemies {
            *enemy = wander(enemy, &bounds, margin, move_speed(Role::EnemyMovement), rng);
        }
        for companion in &mut self.world.companions {
            *companion = wander(
                companion,
                &bounds,
                margin,
                move_speed(Role::CompanionMovement) / 2.0,
                rng,
            );
        }
    }

    fn fire(&mut self, rng: &mut StdRng) {
        let target = self.subject.position();
        let shots: Vec<Bullet> = self
            .shooters()
            .into_iter()
            .filter_map(|from| {
                if !rng.gen_bool(1.0 / FIRE_INTERVAL) {
                    return None;
                }
                let jitter = rng.gen_range(-AIM_JITTER_DEG..=AIM_JITTER_DEG);
                let aim = from + (target - from).rotated(jitter);
                bullet_toward(from, aim, 1.0)
            })
            .collect();
        self.threats().extend(shots);
    }

    fn nearest_companion_distance(&self) -> Option<f64> {
        let at = self.subject.position();
        self.world
            .companions
            .iter()
            .map(|c| c.position().distance_to(&at))
            .min_by(f64::total_cmp)
    }

    fn patrol_reward(&mut self, previous: Vec2) -> f64 {
        let Some(waypoint) = self.subject.waypoint else {
            return 0.0;
        };
        let now = self.subject.position().distance_to(&waypoint);
        let reward = waypoint_reward(previous.distance_to(&waypoint), now);
        if now <= WAYPOINT_REACH_RADIUS && !self.patrol_route.is_empty() {
            self.route_index = (self.route_index + 1) % self.patrol_route.len();
            self.subject = self
                .subject
                .with_waypoint(Some(self.patrol_route[self.route_index]));
        }
        reward
    }
}

impl Scenario for MovementScenario {
    fn subject(&self) -> &Unit {
        &self.subject
    }

    fn observe(&self) -> WorldSnapshot {
        let mut world = self.world.clone();
        if self.role == Role::CompanionSoloMovement {
            world.companions.insert(0, self.subject);
        }
        world
    }

    fn step(&mut self, effect: Option<ActionEffect>, rng: &mut StdRng) -> StepOutcome {
        let before = self.subject.position();
        if let Some(ActionEffect::Move(velocity)) = effect {
            self.subject = self.subject.with_velocity(velocity);
        }
        let after = self
            .bounds
            .clamp(before + self.subject.velocity(), self.margin);
        self.subject = self.subject.with_position(after);

        self.move_others(rng);
        let contact = self.in_contact();
        self.fire(rng);
        let bounds = self.bounds;
        advance_bullets(self.threats(), &bounds);
        let radius = self.subject_radius();
        let hits = take_hits(self.threats(), after, radius);
        let hit = contact || !hits.is_empty();
        for bullet in &hits {
            self.subject = self.subject.damaged(bullet.damage);
        }

        let mut reward = self.tracker.step(
            before.distance_to(&after),
            self.bounds.distance_to_edge(&after),
            hit,
        );
        if !hit {
            match self.role {
                Role::CompanionSoloMovement => {
                    reward += clustering_reward(self.nearest_companion_distance());
                }
                Role::EnemyPatrol => reward += self.patrol_reward(before),
                _ => {}
            }
        }

        StepOutcome {
            reward,
            done: hit,
            hits_landed: 0,
            kills: 0,
        }
    }

    fn companions(&self) -> Option<usize> {
        self.companions
    }
}
