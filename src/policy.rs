//! Epsilon-greedy action selection.

use rand::Rng;

use crate::config::ExplorationSchedule;
use crate::training::Trainer;

/// Explores uniformly with probability `epsilon`, otherwise exploits the
/// trainer's greedy prediction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpsilonGreedy {
    epsilon: f64,
}

impl EpsilonGreedy {
    /// Creates a policy; `epsilon` is clamped into `[0, 1]`.
    pub fn new(epsilon: f64) -> Self {
        Self {
            epsilon: epsilon.clamp(0.0, 1.0),
        }
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn set_epsilon(&mut self, epsilon: f64) {
        self.epsilon = epsilon.clamp(0.0, 1.0);
    }

    /// Applies one step of multiplicative decay, never going below the floor.
    ///
    /// An epsilon already under the floor is left alone.
    pub fn decay(&mut self, schedule: &ExplorationSchedule) {
        if self.epsilon > schedule.min_epsilon {
            self.epsilon = (self.epsilon * schedule.decay).max(schedule.min_epsilon);
        }
    }

    /// Picks an action for `state` in `[0, action_space_size)`.
    pub fn select<T, R>(&self, trainer: &T, state: &[f64], rng: &mut R) -> usize
    where
        T: Trainer + ?Sized,
        R: Rng,
    {
        let actions = trainer.config().action_space_size;
        if actions > 0 && rng.gen::<f64>() < self.epsilon {
            rng.gen_range(0..actions)
        } else {
            trainer.predict(state)
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::config::ModelConfig;
    use crate::experience::Experience;
    use crate::training::LinearTrainer;

    fn trainer() -> LinearTrainer {
        LinearTrainer::new(ModelConfig {
            state_space_size: 2,
            action_space_size: 4,
            learning_rate: 0.1,
            exploration_rate: 0.0,
            discount: 0.9,
            td_clip: 10.0,
        })
    }

    #[test]
    fn greedy_matches_predict() {
        let mut t = trainer();
        for _ in 0..10 {
            t.train_on_batch(&[Experience::new(vec![1.0, 0.0], 2, 5.0, vec![0.0, 0.0], true)]);
        }
        let policy = EpsilonGreedy::new(0.0);
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..100 {
            assert_eq!(policy.select(&t, &[1.0, 0.0], &mut rng), t.predict(&[1.0, 0.0]));
        }
        assert_eq!(t.predict(&[1.0, 0.0]), 2);
    }

    #[test]
    fn full_exploration_is_uniform() {
        let t = trainer();
        let policy = EpsilonGreedy::new(1.0);
        let mut rng = StdRng::seed_from_u64(9);
        let mut counts = [0usize; 4];
        for _ in 0..4000 {
            counts[policy.select(&t, &[0.0, 0.0], &mut rng)] += 1;
        }
        for c in counts {
            assert!((800..1200).contains(&c), "counts {counts:?}");
        }
    }

    #[test]
    fn decay_stops_at_floor() {
        let schedule = ExplorationSchedule {
            decay: 0.5,
            min_epsilon: 0.1,
        };
        let mut policy = EpsilonGreedy::new(0.8);
        for _ in 0..10 {
            policy.decay(&schedule);
        }
        assert_eq!(policy.epsilon(), 0.1);
    }

    #[test]
    fn epsilon_is_clamped() {
        assert_eq!(EpsilonGreedy::new(3.0).epsilon(), 1.0);
        assert_eq!(EpsilonGreedy::new(-1.0).epsilon(), 0.0);
    }
}
