//! Encoders for the movement roles.

use super::blocks::{
    hostile_bodies, other_companions, push_nearest_moving, push_nearest_static,
    push_self, push_target, push_target_motion, push_walls, BULLET_PAD, COMPANION_PAD,
    NO_OBSTACLE, PLAYER_MOTION_PAD, PLAYER_PAD, STATIC_TARGET_PAD, WAYPOINT_PAD,
};
use super::StateEncoder;
use crate::roles::Role;
use crate::snapshot::{Unit, WorldSnapshot};

/// Patrol units notice the player within this many pixels.
pub const PATROL_VIEW_RADIUS: f64 = 250.0;

/// Companion count is divided by this before entering the state.
const COMPANION_COUNT_SCALE: f64 = 4.0;

/// self(4) walls(4) enemy bullets 3×5 hostiles 2×3.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlayerMovementEncoder;

impl StateEncoder for PlayerMovementEncoder {
    fn role(&self) -> Role {
        Role::PlayerMovement
    }

    fn feature_len(&self) -> usize {
        29
    }

    fn encode_features(&self, owner: &Unit, world: &WorldSnapshot) -> Vec<f64> {
        let origin = owner.position();
        let mut out = Vec::with_capacity(self.feature_len());
        push_self(&mut out, owner, world, self.role().spec().velocity_divisor);
        push_walls(&mut out, owner, world);
        push_nearest_moving(
            &mut out,
            origin,
            world.enemy_bullets.iter().map(|b| b.body),
            3,
            world.window,
            &BULLET_PAD,
        );
        push_nearest_static(
            &mut out,
            origin,
            hostile_bodies(world),
            2,
            world.window,
            &STATIC_TARGET_PAD,
        );
        out
    }
}

/// self(4) walls(4) player(3) enemy bullets 2×5 nearest hostile(3).
#[derive(Debug, Clone, Copy, Default)]
pub struct CompanionMovementEncoder;

impl StateEncoder for CompanionMovementEncoder {
    fn role(&self) -> Role {
        Role::CompanionMovement
    }

    fn feature_len(&self) -> usize {
        24
    }

    fn encode_features(&self, owner: &Unit, world: &WorldSnapshot) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.feature_len());
        push_companion_core(&mut out, self.role(), owner, world);
        out
    }
}

/// The companion core plus neighbour spacing: other companions 2×3,
/// companion count(1), nearest obstacle distance(1).
#[derive(Debug, Clone, Copy, Default)]
pub struct CompanionSoloMovementEncoder;

impl StateEncoder for CompanionSoloMovementEncoder {
    fn role(&self) -> Role {
        Role::CompanionSoloMovement
    }

    fn feature_len(&self) -> usize {
        32
    }

    fn encode_features(&self, owner: &Unit, world: &WorldSnapshot) -> Vec<f64> {
        let origin = owner.position();
        let mut out = Vec::with_capacity(self.feature_len());
        push_companion_core(&mut out, self.role(), owner, world);
        push_nearest_static(
            &mut out,
            origin,
            other_companions(owner, world),
            2,
            world.window,
            &COMPANION_PAD,
        );
        out.push(world.companions.len() as f64 / COMPANION_COUNT_SCALE);
        let obstacle = world
            .obstacles
            .iter()
            .map(|r| r.distance_from_point(&origin) / world.window.width)
            .fold(None, |acc: Option<f64>, d| Some(acc.map_or(d, |a| a.min(d))));
        out.push(obstacle.map_or(NO_OBSTACLE, |d| d.min(NO_OBSTACLE)));
        out
    }
}

fn push_companion_core(out: &mut Vec<f64>, role: Role, owner: &Unit, world: &WorldSnapshot) {
    let origin = owner.position();
    push_self(out, owner, world, role.spec().velocity_divisor);
    push_walls(out, owner, world);
    push_target(
        out,
        origin,
        world.player.map(|p| p.position()),
        world.window,
        &PLAYER_PAD,
    );
    push_nearest_moving(
        out,
        origin,
        world.enemy_bullets.iter().map(|b| b.body),
        2,
        world.window,
        &BULLET_PAD,
    );
    push_nearest_static(
        out,
        origin,
        hostile_bodies(world),
        1,
        world.window,
        &STATIC_TARGET_PAD,
    );
}

/// self(4) walls(4) player(5) player bullets 2×5.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnemyMovementEncoder;

impl StateEncoder for EnemyMovementEncoder {
    fn role(&self) -> Role {
        Role::EnemyMovement
    }

    fn feature_len(&self) -> usize {
        23
    }

    fn encode_features(&self, owner: &Unit, world: &WorldSnapshot) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.feature_len());
        push_hunter_core(&mut out, self.role(), owner, world);
        out
    }
}

/// The enemy core plus own health(1).
#[derive(Debug, Clone, Copy, Default)]
pub struct BossMovementEncoder;

impl StateEncoder for BossMovementEncoder {
    fn role(&self) -> Role {
        Role::BossMovement
    }

    fn feature_len(&self) -> usize {
        24
    }

    fn encode_features(&self, owner: &Unit, world: &WorldSnapshot) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.feature_len());
        push_hunter_core(&mut out, self.role(), owner, world);
        out.push(owner.health_fraction());
        out
    }
}

fn push_hunter_core(out: &mut Vec<f64>, role: Role, owner: &Unit, world: &WorldSnapshot) {
    let origin = owner.position();
    push_self(out, owner, world, role.spec().velocity_divisor);
    push_walls(out, owner, world);
    push_target_motion(
        out,
        origin,
        world.player.as_ref(),
        world.window,
        &PLAYER_MOTION_PAD,
    );
    push_nearest_moving(
        out,
        origin,
        world.player_bullets.iter().map(|b| b.body),
        2,
        world.window,
        &BULLET_PAD,
    );
}

/// self(4) walls(4) player(3) player-visible(1) waypoint(3) health(1).
#[derive(Debug, Clone, Copy, Default)]
pub struct EnemyPatrolEncoder;

impl StateEncoder for EnemyPatrolEncoder {
    fn role(&self) -> Role {
        Role::EnemyPatrol
    }

    fn feature_len(&self) -> usize {
        16
    }

    fn encode_features(&self, owner: &Unit, world: &WorldSnapshot) -> Vec<f64> {
        let origin = owner.position();
        let player = world.player.map(|p| p.position());
        let mut out = Vec::with_capacity(self.feature_len());
        push_self(&mut out, owner, world, self.role().spec().velocity_divisor);
        push_walls(&mut out, owner, world);
        push_target(&mut out, origin, player, world.window, &PLAYER_PAD);
        let visible = player.is_some_and(|p| origin.distance_to(&p) <= PATROL_VIEW_RADIUS);
        out.push(if visible { 1.0 } else { 0.0 });
        push_target(&mut out, origin, owner.waypoint, world.window, &WAYPOINT_PAD);
        out.push(owner.health_fraction());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::Bullet;
    use crate::types::{Rect, Size, Vec2};

    fn window() -> Size {
        Size::new(1200.0, 900.0)
    }

    #[test]
    fn player_movement_single_bullet_features() {
        let owner = Unit::new(Vec2::new(600.0, 450.0), 10.0);
        let mut w = WorldSnapshot::empty(window());
        w.enemy_bullets
            .push(Bullet::new(Vec2::new(720.0, 450.0), Vec2::new(5.0, 0.0), 1.0));
        let f = PlayerMovementEncoder.encode_features(&owner, &w);
        // bullets start after self(4) and walls(4)
        assert_eq!(&f[8..13], &[0.1, 0.0, 0.1, 0.5, 0.0]);
        assert_eq!(&f[13..18], &BULLET_PAD);
        assert_eq!(&f[18..23], &BULLET_PAD);
        // no enemies: both hostile slots padded
        assert_eq!(&f[23..26], &STATIC_TARGET_PAD);
        assert_eq!(&f[26..29], &STATIC_TARGET_PAD);
    }

    #[test]
    fn empty_world_pads_every_slot() {
        let owner = Unit::new(Vec2::new(100.0, 100.0), 10.0);
        let w = WorldSnapshot::empty(window());
        let f = CompanionMovementEncoder.encode_features(&owner, &w);
        assert_eq!(&f[8..11], &PLAYER_PAD);
        assert_eq!(&f[11..16], &BULLET_PAD);
        assert_eq!(&f[16..21], &BULLET_PAD);
        assert_eq!(&f[21..24], &STATIC_TARGET_PAD);
    }

    #[test]
    fn solo_companion_spacing_features() {
        let owner = Unit::new(Vec2::new(300.0, 300.0), 10.0);
        let mut w = WorldSnapshot::empty(window());
        w.companions = vec![owner, Unit::new(Vec2::new(420.0, 300.0), 10.0)];
        let f = CompanionSoloMovementEncoder.encode_features(&owner, &w);
        assert_eq!(&f[24..27], &[0.1, 0.0, 0.1]);
        assert_eq!(&f[27..30], &COMPANION_PAD);
        assert_eq!(f[30], 0.5);
        assert_eq!(f[31], NO_OBSTACLE);
    }

    #[test]
    fn solo_companion_obstacle_distance() {
        let owner = Unit::new(Vec2::new(300.0, 300.0), 10.0);
        let mut w = WorldSnapshot::empty(window());
        w.obstacles.push(Rect::new(360.0, 250.0, 50.0, 100.0));
        let f = CompanionSoloMovementEncoder.encode_features(&owner, &w);
        assert!((f[31] - 60.0 / 1200.0).abs() < 1e-12);
    }

    #[test]
    fn enemy_velocity_uses_role_divisor() {
        let owner = Unit::new(Vec2::new(300.0, 300.0), 10.0).with_velocity(Vec2::new(2.0, -4.0));
        let w = WorldSnapshot::empty(window());
        let enemy = EnemyMovementEncoder.encode_features(&owner, &w);
        let boss = BossMovementEncoder.encode_features(&owner, &w);
        let player = PlayerMovementEncoder.encode_features(&owner, &w);
        assert_eq!(&enemy[2..4], &[0.5, -1.0]);
        assert_eq!(&boss[2..4], &[0.4, -0.8]);
        assert_eq!(&player[2..4], &[0.2, -0.4]);
    }

    #[test]
    fn patrol_visibility_and_waypoint() {
        let owner = Unit::new(Vec2::new(300.0, 300.0), 4.0)
            .with_waypoint(Some(Vec2::new(300.0, 390.0)));
        let mut w = WorldSnapshot::empty(window());
        w.player = Some(Unit::new(Vec2::new(400.0, 300.0), 10.0));
        let f = EnemyPatrolEncoder.encode_features(&owner, &w);
        assert_eq!(f[11], 1.0);
        assert_eq!(&f[12..15], &[0.0, 0.1, 0.1]);
        assert_eq!(f[15], 1.0);

        w.player = Some(Unit::new(Vec2::new(900.0, 300.0), 10.0));
        let far = EnemyPatrolEncoder.encode_features(&owner.with_waypoint(None), &w);
        assert_eq!(far[11], 0.0);
        assert_eq!(&far[12..15], &WAYPOINT_PAD);
    }
}
