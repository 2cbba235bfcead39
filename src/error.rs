use std::path::PathBuf;

use thiserror::Error;

use crate::roles::Role;

/// Errors raised by agents, trainers and the training ranges.
#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("{role}: encoder produces {encoder_len} features but the model expects {state_size}")]
    ConfigMismatch {
        role: Role,
        encoder_len: usize,
        state_size: usize,
    },

    #[error("{role}: action table has {table_len} entries but the model expects {action_size}")]
    ActionTableMismatch {
        role: Role,
        table_len: usize,
        action_size: usize,
    },

    #[error("{role}: state vector has {actual} elements, expected {expected}")]
    StateLengthMismatch {
        role: Role,
        expected: usize,
        actual: usize,
    },

    #[error("{role}: action {action} is outside [0, {action_size})")]
    InvalidAction {
        role: Role,
        action: usize,
        action_size: usize,
    },

    #[error("model file {path:?} does not match its declared shape: {reason}")]
    ModelShape { path: PathBuf, reason: String },

    #[error("model file I/O failed for {path:?}")]
    ModelIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("model file {path:?} is not valid JSON")]
    ModelFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0}: no training scenario for this role")]
    NoScenario(Role),

    #[error("replay buffer lock was poisoned")]
    ReplayLockPoisoned,
}

pub type Result<T> = std::result::Result<T, TrainingError>;
