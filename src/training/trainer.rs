//! The trainer contract every agent talks to.

use std::path::Path;

use crate::config::ModelConfig;
use crate::error::Result;
use crate::experience::Experience;

/// A black-box predictor/learner.
///
/// Implementations must stay stable when trained with batches of a single
/// transition, since agents train online on every step by default.
pub trait Trainer: Send {
    /// The fixed model configuration.
    fn config(&self) -> &ModelConfig;

    /// Estimated value of every action in `state`.
    fn q_values(&self, state: &[f64]) -> Vec<f64>;

    /// Greedy best action under the current parameters.
    fn predict(&self, state: &[f64]) -> usize {
        argmax(&self.q_values(state))
    }

    /// One update step over `batch`, each transition scaled by its weight.
    ///
    /// Returns the TD error of every transition, in batch order.
    fn train_on_weighted_batch(&mut self, batch: &[Experience], weights: &[f64]) -> Vec<f64>;

    /// One update step over `batch` with unit weights.
    fn train_on_batch(&mut self, batch: &[Experience]) -> Vec<f64> {
        let weights = vec![1.0; batch.len()];
        self.train_on_weighted_batch(batch, &weights)
    }

    /// Writes the model to `path`.
    fn export_model(&self, path: &Path) -> Result<()>;

    /// Reads a model previously written by [`Trainer::export_model`].
    fn load_model(path: &Path) -> Result<Self>
    where
        Self: Sized;

    /// Mean reward over recently trained transitions (0.0 when none).
    fn average_reward(&self) -> f64;
}

/// Index of the largest value; ties resolve to the lowest index and NaN
/// never wins. Returns 0 for an empty slice.
pub fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    let mut best_value = f64::NEG_INFINITY;
    for (i, v) in values.iter().enumerate() {
        let v = if v.is_nan() { f64::NEG_INFINITY } else { *v };
        if v > best_value {
            best = i;
            best_value = v;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argmax_ties_pick_lowest() {
        assert_eq!(argmax(&[1.0, 3.0, 3.0]), 1);
        assert_eq!(argmax(&[0.0, 0.0]), 0);
    }

    #[test]
    fn argmax_ignores_nan() {
        assert_eq!(argmax(&[f64::NAN, -1.0]), 1);
    }

    #[test]
    fn argmax_empty() {
        assert_eq!(argmax(&[]), 0);
    }
}
