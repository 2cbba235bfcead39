//! Encoders for the shooting roles.

use super::blocks::{
    distance_or, hostile_bodies, push_nearest_moving, push_nearest_static, push_position,
    push_target_motion, BOSS_PAD, COMPANION_PAD, MOVING_TARGET_PAD, NO_PLAYER_DISTANCE,
    PLAYER_MOTION_PAD,
};
use super::StateEncoder;
use crate::roles::Role;
use crate::snapshot::{Unit, WorldSnapshot};

/// pos(2) enemies 3×5 boss(4).
#[derive(Debug, Clone, Copy, Default)]
pub struct PlayerShootingEncoder;

impl StateEncoder for PlayerShootingEncoder {
    fn role(&self) -> Role {
        Role::PlayerShooting
    }

    fn feature_len(&self) -> usize {
        21
    }

    fn encode_features(&self, owner: &Unit, world: &WorldSnapshot) -> Vec<f64> {
        let origin = owner.position();
        let mut out = Vec::with_capacity(self.feature_len());
        push_position(&mut out, owner, world);
        push_nearest_moving(
            &mut out,
            origin,
            world.enemies.iter().map(|e| e.body),
            3,
            world.window,
            &MOVING_TARGET_PAD,
        );
        match world.boss {
            Some(boss) => {
                let n = world.window.normalize(boss.position() - origin);
                out.extend([n.x, n.y, n.length(), 1.0]);
            }
            None => out.extend_from_slice(&BOSS_PAD),
        }
        out
    }
}

/// pos(2) hostiles 2×5 player distance(1).
#[derive(Debug, Clone, Copy, Default)]
pub struct CompanionShootingEncoder;

impl StateEncoder for CompanionShootingEncoder {
    fn role(&self) -> Role {
        Role::CompanionShooting
    }

    fn feature_len(&self) -> usize {
        13
    }

    fn encode_features(&self, owner: &Unit, world: &WorldSnapshot) -> Vec<f64> {
        let origin = owner.position();
        let mut out = Vec::with_capacity(self.feature_len());
        push_position(&mut out, owner, world);
        push_nearest_moving(
            &mut out,
            origin,
            hostile_bodies(world),
            2,
            world.window,
            &MOVING_TARGET_PAD,
        );
        out.push(distance_or(
            origin,
            world.player.map(|p| p.position()),
            world.window,
            NO_PLAYER_DISTANCE,
        ));
        out
    }
}

/// pos(2) player(5) companions 2×3 health(1).
#[derive(Debug, Clone, Copy, Default)]
pub struct EnemyShootingEncoder;

impl StateEncoder for EnemyShootingEncoder {
    fn role(&self) -> Role {
        Role::EnemyShooting
    }

    fn feature_len(&self) -> usize {
        14
    }

    fn encode_features(&self, owner: &Unit, world: &WorldSnapshot) -> Vec<f64> {
        let origin = owner.position();
        let mut out = Vec::with_capacity(self.feature_len());
        push_position(&mut out, owner, world);
        push_target_motion(
            &mut out,
            origin,
            world.player.as_ref(),
            world.window,
            &PLAYER_MOTION_PAD,
        );
        push_nearest_static(
            &mut out,
            origin,
            world.companions.iter().map(|c| c.body),
            2,
            world.window,
            &COMPANION_PAD,
        );
        out.push(owner.health_fraction());
        out
    }
}

/// pos(2) health(1) player(5) companions 2×5.
#[derive(Debug, Clone, Copy, Default)]
pub struct BossShootingEncoder;

impl StateEncoder for BossShootingEncoder {
    fn role(&self) -> Role {
        Role::BossShooting
    }

    fn feature_len(&self) -> usize {
        18
    }

    fn encode_features(&self, owner: &Unit, world: &WorldSnapshot) -> Vec<f64> {
        let origin = owner.position();
        let mut out = Vec::with_capacity(self.feature_len());
        push_position(&mut out, owner, world);
        out.push(owner.health_fraction());
        push_target_motion(
            &mut out,
            origin,
            world.player.as_ref(),
            world.window,
            &PLAYER_MOTION_PAD,
        );
        push_nearest_moving(
            &mut out,
            origin,
            world.companions.iter().map(|c| c.body),
            2,
            world.window,
            &MOVING_TARGET_PAD,
        );
        out
    }
}
