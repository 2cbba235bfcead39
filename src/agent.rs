//! The generic per-role agent.
//!
//! A [`RoleAgent`] ties together a role's encoder, action table, exploration
//! policy and trainer. Everything role-specific is looked up from data, so
//! one implementation serves all roles.

use std::path::Path;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, warn};

use crate::action::{self, ActionEffect, ActionKind};
use crate::config::{ExplorationSchedule, LearnMode, ModelConfig};
use crate::encoder::{encoder_for, StateEncoder};
use crate::error::{Result, TrainingError};
use crate::experience::Experience;
use crate::policy::EpsilonGreedy;
use crate::roles::Role;
use crate::snapshot::{Unit, WorldSnapshot};
use crate::training::{ExperienceReplayBuffer, LinearTrainer, ReplayStats, Trainer};

/// Where `learn` sends transitions.
#[derive(Debug)]
enum Learner {
    Online,
    Replay {
        buffer: ExperienceReplayBuffer,
        batch_size: usize,
        train_every: usize,
    },
}

impl From<LearnMode> for Learner {
    fn from(mode: LearnMode) -> Self {
        match mode {
            LearnMode::Online => Learner::Online,
            LearnMode::Replay {
                replay,
                batch_size,
                train_every,
            } => Learner::Replay {
                buffer: ExperienceReplayBuffer::new(replay),
                batch_size: batch_size.max(1),
                train_every: train_every.max(1),
            },
        }
    }
}

/// One role's learning agent.
pub struct RoleAgent<T: Trainer = LinearTrainer> {
    role: Role,
    encoder: &'static dyn StateEncoder,
    actions: &'static [ActionKind],
    policy: EpsilonGreedy,
    trainer: T,
    learner: Learner,
    rng: StdRng,
    steps: u64,
}

impl RoleAgent<LinearTrainer> {
    /// A fresh agent with the role's default model configuration.
    pub fn new(role: Role, seed: u64) -> Result<Self> {
        Self::with_config(role, ModelConfig::for_role(role), seed)
    }

    /// A fresh agent with an explicit model configuration.
    pub fn with_config(role: Role, config: ModelConfig, seed: u64) -> Result<Self> {
        RoleAgent::with_trainer(role, LinearTrainer::new(config), seed)
    }

    /// Loads the model at `path`, falling back to a fresh one when the file
    /// is missing, unreadable or shaped for another role.
    pub fn load_or_fresh(role: Role, path: &Path, seed: u64) -> Result<Self> {
        match LinearTrainer::load_model(path) {
            Ok(trainer) => match RoleAgent::with_trainer(role, trainer, seed) {
                Ok(agent) => {
                    debug!(role = %role, path = %path.display(), "loaded model");
                    return Ok(agent);
                }
                Err(e) => warn!(role = %role, error = %e, "stored model does not fit role, starting fresh"),
            },
            Err(e) => warn!(role = %role, error = %e, "could not load model, starting fresh"),
        }
        Self::new(role, seed)
    }
}

impl<T: Trainer> RoleAgent<T> {
    /// Wraps an existing trainer, checking that its shape matches the role.
    pub fn with_trainer(role: Role, trainer: T, seed: u64) -> Result<Self> {
        let encoder = encoder_for(role);
        let actions = action::action_table(role);
        let config = trainer.config();

        if encoder.feature_len() != config.state_space_size {
            return Err(TrainingError::ConfigMismatch {
                role,
                encoder_len: encoder.feature_len(),
                state_size: config.state_space_size,
            });
        }
        if actions.len() != config.action_space_size {
            return Err(TrainingError::ActionTableMismatch {
                role,
                table_len: actions.len(),
                action_size: config.action_space_size,
            });
        }

        Ok(Self {
            role,
            encoder,
            actions,
            policy: EpsilonGreedy::new(config.exploration_rate),
            trainer,
            learner: Learner::Online,
            rng: StdRng::seed_from_u64(seed),
            steps: 0,
        })
    }

    /// Switches how transitions are learned. Any stored replay is dropped.
    pub fn with_learn_mode(mut self, mode: LearnMode) -> Self {
        self.learner = mode.into();
        self
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn config(&self) -> &ModelConfig {
        self.trainer.config()
    }

    pub fn trainer(&self) -> &T {
        &self.trainer
    }

    pub fn trainer_mut(&mut self) -> &mut T {
        &mut self.trainer
    }

    /// Number of transitions passed to `learn`.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn epsilon(&self) -> f64 {
        self.policy.epsilon()
    }

    pub fn set_epsilon(&mut self, epsilon: f64) {
        self.policy.set_epsilon(epsilon);
    }

    /// One step of per-episode exploration decay.
    pub fn decay_exploration(&mut self, schedule: &ExplorationSchedule) {
        self.policy.decay(schedule);
    }

    /// Encodes the world as seen by `owner` for this role's model.
    pub fn encode(&self, owner: &Unit, world: &WorldSnapshot) -> Vec<f64> {
        self.encoder
            .encode(owner, world, self.trainer.config().state_space_size)
    }

    /// Epsilon-greedy action for `state`.
    pub fn select_action(&mut self, state: &[f64]) -> Result<usize> {
        self.check_state(state)?;
        Ok(self.policy.select(&self.trainer, state, &mut self.rng))
    }

    /// Turns `action` into a game effect. `targets` feed the smart shooting
    /// modes.
    pub fn action_to_effect(
        &self,
        action: usize,
        owner: &Unit,
        targets: &[Unit],
    ) -> Result<Option<ActionEffect>> {
        action::resolve(self.role, action, owner, targets)
    }

    /// Learns from one transition, online or through the replay buffer.
    pub fn learn(
        &mut self,
        state: &[f64],
        action: usize,
        reward: f64,
        next_state: &[f64],
        done: bool,
    ) -> Result<()> {
        self.check_state(state)?;
        self.check_state(next_state)?;
        if action >= self.actions.len() {
            return Err(TrainingError::InvalidAction {
                role: self.role,
                action,
                action_size: self.actions.len(),
            });
        }

        let experience = Experience::new(state.to_vec(), action, reward, next_state.to_vec(), done);
        self.steps += 1;

        match &mut self.learner {
            Learner::Online => {
                self.trainer.train_on_batch(std::slice::from_ref(&experience));
            }
            Learner::Replay {
                buffer,
                batch_size,
                train_every,
            } => {
                buffer.add([experience]);
                if self.steps % *train_every as u64 == 0 && buffer.len() >= *batch_size {
                    let batch = buffer.sample_batch(*batch_size, &mut self.rng);
                    let td_errors = self
                        .trainer
                        .train_on_weighted_batch(&batch.experiences, &batch.weights);
                    buffer.update_priorities(&batch, &td_errors);
                }
            }
        }
        Ok(())
    }

    /// Replay statistics, when learning through a replay buffer.
    pub fn replay_stats(&self) -> Option<ReplayStats> {
        match &self.learner {
            Learner::Online => None,
            Learner::Replay { buffer, .. } => Some(buffer.stats()),
        }
    }

    pub fn average_reward(&self) -> f64 {
        self.trainer.average_reward()
    }

    pub fn export_model(&self, path: &Path) -> Result<()> {
        self.trainer.export_model(path)
    }

    fn check_state(&self, state: &[f64]) -> Result<()> {
        let expected = self.trainer.config().state_space_size;
        if state.len() != expected {
            return Err(TrainingError::StateLengthMismatch {
                role: self.role,
                expected,
                actual: state.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReplayConfig;
    use crate::snapshot::Bullet;
    use crate::types::{Size, Vec2};

    fn bullet_world() -> (Unit, WorldSnapshot) {
        let owner = Unit::new(Vec2::new(600.0, 450.0), 100.0);
        let mut world = WorldSnapshot::empty(Size::new(1200.0, 900.0));
        world
            .enemy_bullets
            .push(Bullet::new(Vec2::new(720.0, 450.0), Vec2::new(5.0, 0.0), 10.0));
        (owner, world)
    }

    #[test]
    fn construction_rejects_mismatched_config() {
        let mut config = ModelConfig::for_role(Role::PlayerMovement);
        config.state_space_size = 20;
        let err = RoleAgent::with_config(Role::PlayerMovement, config, 0).err();
        assert!(matches!(err, Some(TrainingError::ConfigMismatch { .. })));

        let mut config = ModelConfig::for_role(Role::BossShooting);
        config.action_space_size = 9;
        let err = RoleAgent::with_config(Role::BossShooting, config, 0).err();
        assert!(matches!(err, Some(TrainingError::ActionTableMismatch { .. })));
    }

    #[test]
    fn every_role_builds_with_defaults() {
        for role in Role::all() {
            let agent = RoleAgent::new(role, 1).unwrap();
            assert_eq!(agent.epsilon(), role.spec().exploration_rate);
        }
    }

    #[test]
    fn wrong_state_length_fails_loudly() {
        let mut agent = RoleAgent::new(Role::PlayerMovement, 0).unwrap();
        let err = agent.select_action(&[0.0; 12]).unwrap_err();
        assert!(matches!(
            err,
            TrainingError::StateLengthMismatch {
                expected: 29,
                actual: 12,
                ..
            }
        ));
        let ok = vec![0.0; 29];
        assert!(agent.learn(&ok, 0, 1.0, &[0.0; 3], false).is_err());
        assert!(agent.learn(&ok, 9, 1.0, &ok, false).is_err());
    }

    #[test]
    fn full_exploration_is_uniform() {
        let mut agent = RoleAgent::new(Role::PlayerMovement, 3).unwrap();
        agent.set_epsilon(1.0);
        let state = vec![0.0; 29];
        let mut counts = [0usize; 9];
        for _ in 0..9000 {
            counts[agent.select_action(&state).unwrap()] += 1;
        }
        for c in counts {
            assert!((800..1200).contains(&c), "counts {counts:?}");
        }
    }

    #[test]
    fn zero_exploration_matches_predict() {
        let (owner, world) = bullet_world();
        let mut agent = RoleAgent::new(Role::PlayerMovement, 3).unwrap();
        agent.set_epsilon(0.0);
        let state = agent.encode(&owner, &world);
        for _ in 0..20 {
            let a = agent.select_action(&state).unwrap();
            assert_eq!(a, agent.trainer().predict(&state));
            agent.learn(&state, a, -1.0, &state, false).unwrap();
        }
    }

    #[test]
    fn learns_to_avoid_penalized_action() {
        let (owner, world) = bullet_world();
        let mut agent = RoleAgent::new(Role::PlayerMovement, 5).unwrap();
        agent.set_epsilon(0.0);
        let state = agent.encode(&owner, &world);
        assert_eq!(&state[8..13], &[0.1, 0.0, 0.1, 0.5, 0.0]);

        let penalized = agent.select_action(&state).unwrap();
        let alternative = (penalized + 3) % 9;
        for _ in 0..50 {
            agent.learn(&state, penalized, -50.0, &state, true).unwrap();
            agent.learn(&state, alternative, 2.0, &state, true).unwrap();
        }
        let q = agent.trainer().q_values(&state);
        assert!(q[alternative] > q[penalized]);
        assert_eq!(agent.select_action(&state).unwrap(), alternative);
    }

    #[test]
    fn replay_mode_trains_in_batches() {
        let mut agent = RoleAgent::new(Role::EnemyShooting, 2)
            .unwrap()
            .with_learn_mode(LearnMode::Replay {
                replay: ReplayConfig {
                    max_size: 32,
                    ..ReplayConfig::default()
                },
                batch_size: 8,
                train_every: 4,
            });
        let state = vec![0.5; 14];
        for i in 0..64 {
            agent.learn(&state, i % 12, 1.0, &state, i % 10 == 0).unwrap();
        }
        let stats = agent.replay_stats().unwrap();
        assert_eq!(stats.len, 32);
        // 64 steps, a batch of 8 every 4th step once 8 are stored
        assert_eq!(agent.trainer().updates(), 15 * 8);
    }

    #[test]
    fn load_or_fresh_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("boss_movement.json");
        let agent = RoleAgent::load_or_fresh(Role::BossMovement, &path, 0).unwrap();
        assert_eq!(agent.trainer().updates(), 0);

        // a model for a different role is rejected too
        let other = RoleAgent::new(Role::PlayerShooting, 0).unwrap();
        other.export_model(&path).unwrap();
        let agent = RoleAgent::load_or_fresh(Role::BossMovement, &path, 0).unwrap();
        assert_eq!(agent.config().state_space_size, 24);
    }

    #[test]
    fn exported_model_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("player_movement.json");
        let mut agent = RoleAgent::new(Role::PlayerMovement, 0).unwrap();
        let state = vec![0.1; 29];
        agent.learn(&state, 4, 3.0, &state, true).unwrap();
        agent.export_model(&path).unwrap();

        let loaded = RoleAgent::load_or_fresh(Role::PlayerMovement, &path, 0).unwrap();
        assert_eq!(loaded.trainer().q_values(&state), agent.trainer().q_values(&state));
        assert_eq!(loaded.average_reward(), 3.0);
    }

    #[test]
    fn shooting_effect_delegates_to_table() {
        let agent = RoleAgent::new(Role::EnemyShooting, 0).unwrap();
        let owner = Unit::new(Vec2::new(0.0, 0.0), 10.0);
        assert_eq!(agent.action_to_effect(0, &owner, &[]).unwrap(), None);
        assert_eq!(agent.action_to_effect(9, &owner, &[]).unwrap(), None);
        assert!(agent.action_to_effect(12, &owner, &[]).is_err());
    }
}
