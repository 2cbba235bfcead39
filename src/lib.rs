//! skirmish-rl - role-separated reinforcement learning for a 2D arena shooter
//!
//! Every combat role (player, companions, enemies, boss, patrol guard) gets
//! its own agent, state encoder and Q-value model. Agents learn in isolated
//! training ranges, one grid cell of the play area per role, against
//! synthetic opponents spawned for each episode.

pub mod action;
pub mod agent;
pub mod config;
pub mod encoder;
pub mod error;
pub mod experience;
pub mod metrics;
pub mod policy;
pub mod range;
pub mod reward;
pub mod roles;
pub mod snapshot;
pub mod training;
pub mod types;

pub use action::{ActionEffect, ActionKind};
pub use agent::RoleAgent;
pub use config::{ExplorationSchedule, LearnMode, ModelConfig, RangeConfig, ReplayConfig};
pub use encoder::{encoder_for, StateEncoder};
pub use error::{Result, TrainingError};
pub use experience::{DataCollector, Experience};
pub use metrics::TrainingMetrics;
pub use range::{EpisodeReport, TrainingRange, TrainingRangeSystem};
pub use roles::Role;
pub use snapshot::{Bullet, Unit, WorldSnapshot};
pub use training::{ExperienceReplayBuffer, LinearTrainer, Trainer};
pub use types::{Rect, Size, Vec2};
