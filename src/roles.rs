//! Behavioural roles and their per-role configuration data.
//!
//! Each role trains its own agent. Everything that differs between roles is
//! expressed here (or in the per-role tables of the encoder, action and reward
//! modules) as data, so one generic agent serves them all.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One independently trained behavioural responsibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    PlayerMovement,
    PlayerShooting,
    CompanionMovement,
    CompanionShooting,
    EnemyMovement,
    EnemyShooting,
    BossMovement,
    BossShooting,
    CompanionSoloMovement,
    /// Stealth/patrol enemy that walks a waypoint route.
    EnemyPatrol,
}

/// Static, per-role training parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoleSpec {
    /// Length of the encoded state vector.
    pub state_size: usize,
    pub learning_rate: f64,
    /// Initial epsilon for epsilon-greedy selection.
    pub exploration_rate: f64,
    /// Fixed divisor applied to the owner's velocity features.
    pub velocity_divisor: f64,
    /// Frame cap of one training episode.
    pub episode_length: u32,
}

impl Role {
    /// Returns all roles in declaration order.
    pub fn all() -> [Role; 10] {
        [
            Role::PlayerMovement,
            Role::PlayerShooting,
            Role::CompanionMovement,
            Role::CompanionShooting,
            Role::EnemyMovement,
            Role::EnemyShooting,
            Role::BossMovement,
            Role::BossShooting,
            Role::CompanionSoloMovement,
            Role::EnemyPatrol,
        ]
    }

    /// Stable name used for model files and logs.
    pub fn name(&self) -> &'static str {
        match self {
            Role::PlayerMovement => "player_movement",
            Role::PlayerShooting => "player_shooting",
            Role::CompanionMovement => "companion_movement",
            Role::CompanionShooting => "companion_shooting",
            Role::EnemyMovement => "enemy_movement",
            Role::EnemyShooting => "enemy_shooting",
            Role::BossMovement => "boss_movement",
            Role::BossShooting => "boss_shooting",
            Role::CompanionSoloMovement => "companion_solo_movement",
            Role::EnemyPatrol => "enemy_patrol",
        }
    }

    /// True for roles whose actions are shots rather than velocities.
    pub fn is_shooting(&self) -> bool {
        matches!(
            self,
            Role::PlayerShooting | Role::CompanionShooting | Role::EnemyShooting | Role::BossShooting
        )
    }

    pub fn spec(&self) -> RoleSpec {
        match self {
            Role::PlayerMovement => RoleSpec {
                state_size: 29,
                learning_rate: 0.01,
                exploration_rate: 0.15,
                velocity_divisor: 10.0,
                episode_length: 1000,
            },
            Role::PlayerShooting => RoleSpec {
                state_size: 21,
                learning_rate: 0.01,
                exploration_rate: 0.2,
                velocity_divisor: 10.0,
                episode_length: 500,
            },
            Role::CompanionMovement => RoleSpec {
                state_size: 24,
                learning_rate: 0.01,
                exploration_rate: 0.15,
                velocity_divisor: 10.0,
                episode_length: 800,
            },
            Role::CompanionShooting => RoleSpec {
                state_size: 13,
                learning_rate: 0.01,
                exploration_rate: 0.2,
                velocity_divisor: 10.0,
                episode_length: 500,
            },
            Role::EnemyMovement => RoleSpec {
                state_size: 23,
                learning_rate: 0.005,
                exploration_rate: 0.2,
                velocity_divisor: 4.0,
                episode_length: 600,
            },
            Role::EnemyShooting => RoleSpec {
                state_size: 14,
                learning_rate: 0.005,
                exploration_rate: 0.25,
                velocity_divisor: 10.0,
                episode_length: 400,
            },
            Role::BossMovement => RoleSpec {
                state_size: 24,
                learning_rate: 0.005,
                exploration_rate: 0.1,
                velocity_divisor: 5.0,
                episode_length: 1000,
            },
            Role::BossShooting => RoleSpec {
                state_size: 18,
                learning_rate: 0.005,
                exploration_rate: 0.15,
                velocity_divisor: 10.0,
                episode_length: 600,
            },
            Role::CompanionSoloMovement => RoleSpec {
                state_size: 32,
                learning_rate: 0.01,
                exploration_rate: 0.2,
                velocity_divisor: 10.0,
                episode_length: 800,
            },
            Role::EnemyPatrol => RoleSpec {
                state_size: 16,
                learning_rate: 0.01,
                exploration_rate: 0.2,
                // patrol velocity features are left unnormalized
                velocity_divisor: 1.0,
                episode_length: 600,
            },
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_sizes_within_observed_range() {
        for role in Role::all() {
            let s = role.spec().state_size;
            assert!((13..=32).contains(&s), "{role}: {s}");
        }
    }

    #[test]
    fn episode_lengths_within_range() {
        for role in Role::all() {
            let len = role.spec().episode_length;
            assert!((300..=1000).contains(&len), "{role}: {len}");
        }
    }

    #[test]
    fn names_are_unique() {
        let mut names: Vec<_> = Role::all().iter().map(|r| r.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), Role::all().len());
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&Role::BossShooting).unwrap();
        assert_eq!(json, "\"boss_shooting\"");
    }
}
