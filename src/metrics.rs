//! Per-role training metrics aggregated over finished episodes.

use std::collections::BTreeMap;
use std::fmt;

use crate::range::EpisodeReport;
use crate::roles::Role;

/// Running totals for one role.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoleMetrics {
    pub episodes: u64,
    pub total_reward: f64,
    pub total_frames: u64,
    /// Episodes that ended on the subject being hit.
    pub terminal_hits: u64,
    pub hits_landed: u64,
    pub kills: u64,
    pub best_reward: Option<f64>,
    pub last_reward: Option<f64>,
}

impl RoleMetrics {
    fn record(&mut self, report: &EpisodeReport) {
        self.episodes += 1;
        self.total_reward += report.total_reward;
        self.total_frames += u64::from(report.frames);
        self.terminal_hits += u64::from(report.terminal_hit);
        self.hits_landed += u64::from(report.hits_landed);
        self.kills += u64::from(report.kills);
        self.best_reward = Some(
            self.best_reward
                .map_or(report.total_reward, |b| b.max(report.total_reward)),
        );
        self.last_reward = Some(report.total_reward);
    }

    pub fn mean_reward(&self) -> f64 {
        if self.episodes == 0 {
            return 0.0;
        }
        self.total_reward / self.episodes as f64
    }

    pub fn mean_frames(&self) -> f64 {
        if self.episodes == 0 {
            return 0.0;
        }
        self.total_frames as f64 / self.episodes as f64
    }

    /// Fraction of episodes that ran to the frame cap without a hit.
    pub fn survival_rate(&self) -> f64 {
        if self.episodes == 0 {
            return 0.0;
        }
        1.0 - self.terminal_hits as f64 / self.episodes as f64
    }
}

/// Metrics of every role seen so far.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingMetrics {
    roles: BTreeMap<Role, RoleMetrics>,
}

impl TrainingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, report: &EpisodeReport) {
        self.roles.entry(report.role).or_default().record(report);
    }

    pub fn role(&self, role: Role) -> Option<&RoleMetrics> {
        self.roles.get(&role)
    }

    pub fn total_episodes(&self) -> u64 {
        self.roles.values().map(|m| m.episodes).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Role, &RoleMetrics)> {
        self.roles.iter().map(|(r, m)| (*r, m))
    }
}

impl fmt::Display for TrainingMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "=== Training Metrics ({} episodes) ===",
            self.total_episodes()
        )?;
        for (role, m) in self.iter() {
            write!(
                f,
                "  {:<24} eps {:>5}  reward {:>9.2}  frames {:>7.1}",
                role.name(),
                m.episodes,
                m.mean_reward(),
                m.mean_frames()
            )?;
            if role.is_shooting() {
                writeln!(f, "  hits {:>6}  kills {:>5}", m.hits_landed, m.kills)?;
            } else {
                writeln!(f, "  survival {:>5.1}%", m.survival_rate() * 100.0)?;
            }
        }
        Ok(())
    }
}
