//! Training infrastructure: the trainer contract, the reference linear
//! Q-learner and the prioritized experience-replay buffer.

pub mod linear;
pub mod replay;
pub mod trainer;

pub use linear::LinearTrainer;
pub use replay::{ExperienceReplayBuffer, ReplayStats, SampledBatch, SharedReplayBuffer};
pub use trainer::{argmax, Trainer};
