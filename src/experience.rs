//! Shared transition type and the per-role data collector.

use std::collections::{HashMap, VecDeque};

use crate::action;
use crate::roles::Role;

/// A single decision step: `(state, action, reward, next_state, done)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Experience {
    pub state: Vec<f64>,
    pub action: usize,
    pub reward: f64,
    pub next_state: Vec<f64>,
    pub done: bool,
}

impl Experience {
    pub fn new(state: Vec<f64>, action: usize, reward: f64, next_state: Vec<f64>, done: bool) -> Self {
        Self {
            state,
            action,
            reward,
            next_state,
            done,
        }
    }
}

/// Records transitions per role together with how often each named action
/// was taken.
///
/// The transition log is bounded; the oldest entries are dropped first.
#[derive(Debug)]
pub struct DataCollector {
    capacity: usize,
    transitions: HashMap<Role, VecDeque<Experience>>,
    action_counts: HashMap<Role, HashMap<&'static str, u64>>,
}

impl DataCollector {
    /// Creates a collector keeping at most `capacity` transitions per role.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            transitions: HashMap::new(),
            action_counts: HashMap::new(),
        }
    }

    /// Records one transition of `role`.
    pub fn record(&mut self, role: Role, experience: &Experience) {
        let name = action::action_name(role, experience.action).unwrap_or("unknown");
        *self
            .action_counts
            .entry(role)
            .or_default()
            .entry(name)
            .or_insert(0) += 1;

        if self.capacity == 0 {
            return;
        }
        let log = self.transitions.entry(role).or_default();
        if log.len() == self.capacity {
            log.pop_front();
        }
        log.push_back(experience.clone());
    }

    /// Action histogram of `role`, most frequent first (ties by name).
    pub fn action_counts(&self, role: Role) -> Vec<(&'static str, u64)> {
        let mut counts: Vec<_> = self
            .action_counts
            .get(&role)
            .map(|m| m.iter().map(|(k, v)| (*k, *v)).collect())
            .unwrap_or_default();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        counts
    }

    /// Number of transitions currently held for `role`.
    pub fn len(&self, role: Role) -> usize {
        self.transitions.get(&role).map_or(0, VecDeque::len)
    }

    /// True when nothing is held for any role.
    pub fn is_empty(&self) -> bool {
        self.transitions.values().all(VecDeque::is_empty)
    }

    /// Removes and returns all transitions recorded for `role`.
    pub fn drain(&mut self, role: Role) -> Vec<Experience> {
        self.transitions
            .get_mut(&role)
            .map(|log| log.drain(..).collect())
            .unwrap_or_default()
    }
}

impl Default for DataCollector {
    fn default() -> Self {
        Self::new(10_000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exp(action: usize) -> Experience {
        Experience::new(vec![0.0; 2], action, 1.0, vec![0.0; 2], false)
    }

    #[test]
    fn counts_actions_by_name() {
        let mut dc = DataCollector::new(10);
        dc.record(Role::PlayerMovement, &exp(0));
        dc.record(Role::PlayerMovement, &exp(3));
        dc.record(Role::PlayerMovement, &exp(3));
        let counts = dc.action_counts(Role::PlayerMovement);
        assert_eq!(counts[0], ("move_right", 2));
        assert_eq!(counts[1], ("stop", 1));
        assert!(dc.action_counts(Role::BossShooting).is_empty());
    }

    #[test]
    fn log_is_bounded() {
        let mut dc = DataCollector::new(2);
        for a in 0..5 {
            dc.record(Role::EnemyShooting, &exp(a));
        }
        assert_eq!(dc.len(Role::EnemyShooting), 2);
        let drained = dc.drain(Role::EnemyShooting);
        assert_eq!(drained.iter().map(|e| e.action).collect::<Vec<_>>(), vec![3, 4]);
        assert!(dc.is_empty());
    }

    #[test]
    fn drain_unknown_role_is_empty() {
        let mut dc = DataCollector::default();
        assert!(dc.drain(Role::EnemyPatrol).is_empty());
    }
}
