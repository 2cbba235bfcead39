//! Configuration for models, replay and the training ranges.

use serde::{Deserialize, Serialize};

use crate::action;
use crate::roles::Role;
use crate::types::Size;

/// Shape and hyperparameters of one role's model.
///
/// Fixed at agent construction. Every state vector produced by the paired
/// encoder has exactly `state_space_size` elements.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub state_space_size: usize,
    pub action_space_size: usize,
    pub learning_rate: f64,
    pub exploration_rate: f64,
    /// Discount factor for bootstrapped targets.
    #[serde(default = "default_discount")]
    pub discount: f64,
    /// TD errors are clipped to `±td_clip` before each update.
    #[serde(default = "default_td_clip")]
    pub td_clip: f64,
}

fn default_discount() -> f64 {
    0.95
}

fn default_td_clip() -> f64 {
    10.0
}

impl ModelConfig {
    /// The default model configuration for `role`.
    pub fn for_role(role: Role) -> Self {
        let spec = role.spec();
        Self {
            state_space_size: spec.state_size,
            action_space_size: action::action_table(role).len(),
            learning_rate: spec.learning_rate,
            exploration_rate: spec.exploration_rate,
            discount: default_discount(),
            td_clip: default_td_clip(),
        }
    }
}

/// Parameters of the prioritized replay buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReplayConfig {
    /// Maximum number of stored experiences.
    pub max_size: usize,
    /// Importance-sampling exponent β.
    pub beta: f64,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            max_size: 100_000,
            beta: 0.4,
        }
    }
}

/// How an agent routes transitions into its trainer.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum LearnMode {
    /// Train on every transition as it arrives (batch of one).
    #[default]
    Online,
    /// Store transitions and train on prioritized batches.
    Replay {
        replay: ReplayConfig,
        batch_size: usize,
        /// Train once every this many `learn` calls.
        train_every: usize,
    },
}

/// Multiplicative epsilon decay applied once per finished episode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExplorationSchedule {
    pub decay: f64,
    pub min_epsilon: f64,
}

impl Default for ExplorationSchedule {
    fn default() -> Self {
        Self {
            decay: 0.995,
            min_epsilon: 0.05,
        }
    }
}

/// Configuration of the training-range system.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeConfig {
    /// Full play-area size, partitioned into the 3×3 range grid.
    pub window: Size,
    /// Subjects are clamped this far inside their range.
    pub edge_margin: f64,
    pub learn_mode: LearnMode,
    pub exploration: ExplorationSchedule,
    /// Master seed; each range derives its own stream from it.
    pub seed: u64,
    /// Overrides every role's episode length when set.
    pub episode_length_override: Option<u32>,
    /// Transitions kept per role by each range's data collector.
    pub collector_capacity: usize,
}

impl RangeConfig {
    /// Episode length for `role`, honouring the override.
    pub fn episode_length(&self, role: Role) -> u32 {
        self.episode_length_override
            .unwrap_or_else(|| role.spec().episode_length)
    }
}

impl Default for RangeConfig {
    fn default() -> Self {
        Self {
            window: Size::new(1200.0, 900.0),
            edge_margin: 20.0,
            learn_mode: LearnMode::Online,
            exploration: ExplorationSchedule::default(),
            seed: 42,
            episode_length_override: None,
            collector_capacity: 2_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_range_config_is_valid() {
        let cfg = RangeConfig::default();
        assert!(cfg.window.width > 0.0);
        assert!(cfg.window.height > 0.0);
        assert_eq!(cfg.edge_margin, 20.0);
        assert_eq!(cfg.learn_mode, LearnMode::Online);
    }

    #[test]
    fn model_config_matches_action_table() {
        for role in Role::all() {
            let cfg = ModelConfig::for_role(role);
            assert_eq!(cfg.action_space_size, action::action_table(role).len());
            assert_eq!(cfg.state_space_size, role.spec().state_size);
        }
    }

    #[test]
    fn model_config_defaults_fill_missing_fields() {
        let json = r#"{"state_space_size":4,"action_space_size":2,"learning_rate":0.1,"exploration_rate":0.0}"#;
        let cfg: ModelConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.discount, 0.95);
        assert_eq!(cfg.td_clip, 10.0);
    }

    #[test]
    fn episode_length_override() {
        let cfg = RangeConfig {
            episode_length_override: Some(7),
            ..RangeConfig::default()
        };
        assert_eq!(cfg.episode_length(Role::BossMovement), 7);
        assert_eq!(
            RangeConfig::default().episode_length(Role::BossMovement),
            1000
        );
    }
}
