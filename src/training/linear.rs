//! Linear Q-learner used as the reference [`Trainer`].
//!
//! `Q(s, a) = w_a · s + b_a`, one weight row per action, trained with
//! one-step Q-learning targets and clipped TD errors.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use super::trainer::Trainer;
use crate::config::ModelConfig;
use crate::error::{Result, TrainingError};
use crate::experience::Experience;

/// Number of recent rewards averaged by [`Trainer::average_reward`].
const REWARD_WINDOW: usize = 1000;

/// On-disk representation of a [`LinearTrainer`].
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ModelRecord {
    model_id: String,
    config: ModelConfig,
    weights: Vec<Vec<f64>>,
    bias: Vec<f64>,
    /// Average reward at export time, read by the external model manager.
    performance: f64,
    updates: u64,
    saved_at: u64,
}

/// Linear action-value approximator.
#[derive(Debug, Clone)]
pub struct LinearTrainer {
    config: ModelConfig,
    weights: Vec<Vec<f64>>,
    bias: Vec<f64>,
    recent_rewards: VecDeque<f64>,
    /// Performance carried over from a loaded model until new rewards arrive.
    loaded_performance: Option<f64>,
    updates: u64,
    model_id: Uuid,
}

impl LinearTrainer {
    /// Creates a zero-initialised model.
    pub fn new(config: ModelConfig) -> Self {
        Self {
            weights: vec![vec![0.0; config.state_space_size]; config.action_space_size],
            bias: vec![0.0; config.action_space_size],
            config,
            recent_rewards: VecDeque::with_capacity(REWARD_WINDOW),
            loaded_performance: None,
            updates: 0,
            model_id: Uuid::new_v4(),
        }
    }

    /// Number of transitions trained on so far.
    pub fn updates(&self) -> u64 {
        self.updates
    }

    /// Identifier written into exported model files.
    pub fn model_id(&self) -> Uuid {
        self.model_id
    }

    fn q_value(&self, state: &[f64], action: usize) -> f64 {
        self.weights[action]
            .iter()
            .zip(state)
            .map(|(w, s)| w * s)
            .sum::<f64>()
            + self.bias[action]
    }

    fn max_q(&self, state: &[f64]) -> f64 {
        (0..self.config.action_space_size)
            .map(|a| self.q_value(state, a))
            .fold(f64::NEG_INFINITY, f64::max)
    }

    fn fits(&self, experience: &Experience) -> bool {
        experience.state.len() == self.config.state_space_size
            && experience.next_state.len() == self.config.state_space_size
            && experience.action < self.config.action_space_size
    }

    fn remember_reward(&mut self, reward: f64) {
        if self.recent_rewards.len() == REWARD_WINDOW {
            self.recent_rewards.pop_front();
        }
        self.recent_rewards.push_back(reward);
    }
}

impl Trainer for LinearTrainer {
    fn config(&self) -> &ModelConfig {
        &self.config
    }

    fn q_values(&self, state: &[f64]) -> Vec<f64> {
        (0..self.config.action_space_size)
            .map(|a| self.q_value(state, a))
            .collect()
    }

    fn train_on_weighted_batch(&mut self, batch: &[Experience], weights: &[f64]) -> Vec<f64> {
        let mut td_errors = Vec::with_capacity(batch.len());
        for (i, exp) in batch.iter().enumerate() {
            if !self.fits(exp) {
                warn!(
                    state_len = exp.state.len(),
                    action = exp.action,
                    "skipping transition that does not fit the model"
                );
                td_errors.push(0.0);
                continue;
            }
            let weight = weights.get(i).copied().unwrap_or(1.0);
            let bootstrap = if exp.done {
                0.0
            } else {
                self.config.discount * self.max_q(&exp.next_state)
            };
            let td = exp.reward + bootstrap - self.q_value(&exp.state, exp.action);
            let step =
                self.config.learning_rate * weight * td.clamp(-self.config.td_clip, self.config.td_clip);

            for (w, s) in self.weights[exp.action].iter_mut().zip(&exp.state) {
                *w += step * s;
            }
            self.bias[exp.action] += step;

            self.remember_reward(exp.reward);
            self.updates += 1;
            td_errors.push(td);
        }
        td_errors
    }

    fn export_model(&self, path: &Path) -> Result<()> {
        let record = ModelRecord {
            model_id: self.model_id.to_string(),
            config: self.config,
            weights: self.weights.clone(),
            bias: self.bias.clone(),
            performance: self.average_reward(),
            updates: self.updates,
            saved_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
        };
        let json = serde_json::to_vec_pretty(&record).map_err(|source| TrainingError::ModelFormat {
            path: path.to_path_buf(),
            source,
        })?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| io_error(parent, source))?;
        }
        // A uniquely named temp file plus rename keeps concurrent writers of
        // the same role from interleaving.
        let tmp = temp_path(path);
        fs::write(&tmp, json).map_err(|source| io_error(&tmp, source))?;
        fs::rename(&tmp, path).map_err(|source| {
            let _ = fs::remove_file(&tmp);
            io_error(path, source)
        })?;
        debug!(path = %path.display(), updates = self.updates, "model exported");
        Ok(())
    }

    fn load_model(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).map_err(|source| io_error(path, source))?;
        let record: ModelRecord =
            serde_json::from_slice(&bytes).map_err(|source| TrainingError::ModelFormat {
                path: path.to_path_buf(),
                source,
            })?;

        let shape_error = |reason: String| TrainingError::ModelShape {
            path: path.to_path_buf(),
            reason,
        };
        let cfg = record.config;
        if record.weights.len() != cfg.action_space_size || record.bias.len() != cfg.action_space_size
        {
            return Err(shape_error(format!(
                "expected {} actions, found {} weight rows and {} biases",
                cfg.action_space_size,
                record.weights.len(),
                record.bias.len()
            )));
        }
        if let Some(row) = record
            .weights
            .iter()
            .find(|row| row.len() != cfg.state_space_size)
        {
            return Err(shape_error(format!(
                "expected {} weights per action, found {}",
                cfg.state_space_size,
                row.len()
            )));
        }

        Ok(Self {
            config: cfg,
            weights: record.weights,
            bias: record.bias,
            recent_rewards: VecDeque::with_capacity(REWARD_WINDOW),
            loaded_performance: Some(record.performance),
            updates: record.updates,
            model_id: Uuid::parse_str(&record.model_id).unwrap_or_else(|_| Uuid::new_v4()),
        })
    }

    fn average_reward(&self) -> f64 {
        if self.recent_rewards.is_empty() {
            return self.loaded_performance.unwrap_or(0.0);
        }
        self.recent_rewards.iter().sum::<f64>() / self.recent_rewards.len() as f64
    }
}

fn io_error(path: &Path, source: std::io::Error) -> TrainingError {
    TrainingError::ModelIo {
        path: path.to_path_buf(),
        source,
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(format!(".{}.tmp", Uuid::new_v4()));
    path.with_file_name(name)
}
