//! Training ranges: the window split into a 3×3 grid, one role per cell.
//!
//! Each range owns its agent, random stream and data collector, so ranges
//! train independently and a round can run them in parallel. Episodes spawn
//! synthetic entities inside their range only and throw them away at the
//! end; only the transitions survive, in the agents and the collectors.

pub mod episode;
pub mod movement;
pub mod shooting;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::agent::RoleAgent;
use crate::config::RangeConfig;
use crate::error::{Result, TrainingError};
use crate::experience::{DataCollector, Experience};
use crate::metrics::TrainingMetrics;
use crate::roles::Role;
use crate::training::{LinearTrainer, Trainer};
use crate::types::{Rect, Size};

pub use episode::{drive, EpisodeReport, Scenario, StepOutcome};
pub use movement::{curriculum_companions, MovementScenario};
pub use shooting::ShootingScenario;

/// Roles of the grid cells in row-major order.
pub const GRID_ROLES: [Role; 9] = [
    Role::PlayerMovement,
    Role::PlayerShooting,
    Role::CompanionMovement,
    Role::CompanionShooting,
    Role::EnemyMovement,
    Role::EnemyShooting,
    Role::BossMovement,
    Role::BossShooting,
    Role::CompanionSoloMovement,
];

/// A rectangle of the play area bound to one role.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingRange {
    pub role: Role,
    pub bounds: Rect,
}

/// Splits `window` into the nine grid ranges.
pub fn partition(window: Size) -> Vec<TrainingRange> {
    let (w, h) = (window.width / 3.0, window.height / 3.0);
    GRID_ROLES
        .iter()
        .enumerate()
        .map(|(i, &role)| {
            let (col, row) = ((i % 3) as f64, (i / 3) as f64);
            TrainingRange {
                role,
                bounds: Rect::new(col * w, row * h, w, h),
            }
        })
        .collect()
}

/// File a role's model is exported to inside `dir`.
pub fn model_path(dir: &Path, role: Role) -> PathBuf {
    dir.join(format!("{}.json", role.name()))
}

/// Everything one range needs to train on its own.
struct RangeSlot<T: Trainer> {
    range: TrainingRange,
    in_grid: bool,
    agent: RoleAgent<T>,
    rng: StdRng,
    episodes_run: u64,
    collector: DataCollector,
}

impl<T: Trainer> RangeSlot<T> {
    fn run(&mut self, bounds: Rect, max_frames: u32, config: &RangeConfig) -> Result<EpisodeReport> {
        let role = self.range.role;
        self.episodes_run += 1;
        let episode = self.episodes_run;

        let mut scenario = build_scenario(role, config, bounds, episode, &mut self.rng)
            .ok_or(TrainingError::NoScenario(role))?;
        let report = drive(
            scenario.as_mut(),
            &mut self.agent,
            episode,
            max_frames,
            &mut self.rng,
            &mut self.collector,
        )?;
        self.agent.decay_exploration(&config.exploration);

        debug!(
            role = %role,
            episode,
            frames = report.frames,
            reward = report.total_reward,
            hit = report.terminal_hit,
            epsilon = self.agent.epsilon(),
            "episode finished"
        );
        Ok(report)
    }
}

fn build_scenario(
    role: Role,
    config: &RangeConfig,
    bounds: Rect,
    episode: u64,
    rng: &mut StdRng,
) -> Option<Box<dyn Scenario>> {
    let (window, margin) = (config.window, config.edge_margin);
    if role.is_shooting() {
        ShootingScenario::new(role, window, bounds, margin, rng)
            .map(|s| Box::new(s) as Box<dyn Scenario>)
    } else {
        let companions = if role == Role::CompanionSoloMovement {
            curriculum_companions(episode, rng)
        } else {
            1
        };
        MovementScenario::new(role, window, bounds, margin, companions, rng)
            .map(|s| Box::new(s) as Box<dyn Scenario>)
    }
}

/// Runs training episodes for every role in its own range.
///
/// The nine grid roles train in their partition cells. The patrol role has
/// no cell; it trains over the whole window, or in any rectangle through
/// [`TrainingRangeSystem::run_episode_in`].
pub struct TrainingRangeSystem<T: Trainer = LinearTrainer> {
    config: RangeConfig,
    /// One slot per role, indexed by `Role as usize`.
    slots: Vec<RangeSlot<T>>,
    metrics: TrainingMetrics,
}

impl TrainingRangeSystem<LinearTrainer> {
    /// Fresh agents for every role.
    pub fn new(config: RangeConfig) -> Result<Self> {
        Self::with_agents(config, RoleAgent::<LinearTrainer>::new)
    }

    /// Agents loaded from `model_dir` where possible, fresh otherwise.
    pub fn load_or_fresh(config: RangeConfig, model_dir: &Path) -> Result<Self> {
        Self::with_agents(config, |role, seed| {
            RoleAgent::<LinearTrainer>::load_or_fresh(role, &model_path(model_dir, role), seed)
        })
    }
}

impl<T: Trainer> TrainingRangeSystem<T> {
    /// Builds the system with agents from `make_agent(role, seed)`.
    pub fn with_agents<F>(config: RangeConfig, mut make_agent: F) -> Result<Self>
    where
        F: FnMut(Role, u64) -> Result<RoleAgent<T>>,
    {
        let grid = partition(config.window);
        let whole = Rect::new(0.0, 0.0, config.window.width, config.window.height);

        let mut slots = Vec::with_capacity(Role::all().len());
        for (i, role) in Role::all().into_iter().enumerate() {
            let stream = config.seed.wrapping_add(2 * i as u64);
            let agent = make_agent(role, stream)?.with_learn_mode(config.learn_mode);
            let range = grid.iter().copied().find(|r| r.role == role);
            slots.push(RangeSlot {
                range: range.unwrap_or(TrainingRange {
                    role,
                    bounds: whole,
                }),
                in_grid: range.is_some(),
                agent,
                rng: StdRng::seed_from_u64(stream.wrapping_add(1)),
                episodes_run: 0,
                collector: DataCollector::new(config.collector_capacity),
            });
        }
        info!(ranges = grid.len(), window = %format!("{}x{}", config.window.width, config.window.height), "training ranges ready");

        Ok(Self {
            config,
            slots,
            metrics: TrainingMetrics::new(),
        })
    }

    pub fn config(&self) -> &RangeConfig {
        &self.config
    }

    /// The nine grid ranges.
    pub fn ranges(&self) -> Vec<TrainingRange> {
        self.slots
            .iter()
            .filter(|s| s.in_grid)
            .map(|s| s.range)
            .collect()
    }

    /// The range `role` trains in by default.
    pub fn range(&self, role: Role) -> TrainingRange {
        self.slot(role).range
    }

    pub fn agent(&self, role: Role) -> &RoleAgent<T> {
        &self.slot(role).agent
    }

    pub fn agent_mut(&mut self, role: Role) -> &mut RoleAgent<T> {
        &mut self.slot_mut(role).agent
    }

    /// Episodes run so far by `role`.
    pub fn episodes_run(&self, role: Role) -> u64 {
        self.slot(role).episodes_run
    }

    pub fn metrics(&self) -> &TrainingMetrics {
        &self.metrics
    }

    /// How often each named action of `role` was taken.
    pub fn action_counts(&self, role: Role) -> Vec<(&'static str, u64)> {
        self.slot(role).collector.action_counts(role)
    }

    /// Removes and returns the transitions collected for `role`.
    pub fn drain_transitions(&mut self, role: Role) -> Vec<Experience> {
        self.slot_mut(role).collector.drain(role)
    }

    /// One episode of `role` in its default range.
    pub fn run_episode(&mut self, role: Role) -> Result<EpisodeReport> {
        let bounds = self.slot(role).range.bounds;
        let frames = self.config.episode_length(role);
        self.run_episode_in(role, bounds, frames)
    }

    /// One episode of `role` inside `bounds`, capped at `max_frames`.
    pub fn run_episode_in(
        &mut self,
        role: Role,
        bounds: Rect,
        max_frames: u32,
    ) -> Result<EpisodeReport> {
        let config = &self.config;
        let slot = &mut self.slots[role as usize];
        let report = slot.run(bounds, max_frames, config)?;
        self.metrics.record(&report);
        Ok(report)
    }

    /// One episode in each grid range, one after another.
    pub fn run_round(&mut self) -> Result<Vec<EpisodeReport>> {
        self.run_round_until(&AtomicBool::new(false))
    }

    fn run_round_until(&mut self, cancel: &AtomicBool) -> Result<Vec<EpisodeReport>> {
        let mut reports = Vec::with_capacity(GRID_ROLES.len());
        for role in GRID_ROLES {
            if cancel.load(Ordering::Relaxed) {
                break;
            }
            reports.push(self.run_episode(role)?);
        }
        Ok(reports)
    }

    /// One episode in each grid range, all ranges at once.
    pub fn run_round_parallel(&mut self) -> Result<Vec<EpisodeReport>> {
        let config = &self.config;
        let reports = self
            .slots
            .par_iter_mut()
            .filter(|slot| slot.in_grid)
            .map(|slot| {
                let role = slot.range.role;
                slot.run(slot.range.bounds, config.episode_length(role), config)
            })
            .collect::<Result<Vec<_>>>()?;
        for report in &reports {
            self.metrics.record(report);
        }
        Ok(reports)
    }

    /// Runs up to `rounds` rounds, stopping early once `cancel` is set.
    ///
    /// Sequential rounds check the flag between episodes, parallel rounds
    /// between rounds. Returns the number of episodes completed.
    pub fn train(&mut self, rounds: usize, parallel: bool, cancel: &AtomicBool) -> Result<usize> {
        let mut completed = 0;
        for round in 1..=rounds {
            if cancel.load(Ordering::Relaxed) {
                info!(round, completed, "training cancelled");
                break;
            }
            let reports = if parallel {
                self.run_round_parallel()?
            } else {
                self.run_round_until(cancel)?
            };
            completed += reports.len();
            let mean = reports.iter().map(|r| r.total_reward).sum::<f64>()
                / reports.len().max(1) as f64;
            info!(round, episodes = reports.len(), mean_reward = mean, "round finished");
        }
        Ok(completed)
    }

    /// Writes every role's model to `dir`, one JSON file per role.
    pub fn export_all(&self, dir: &Path) -> Result<()> {
        for slot in &self.slots {
            let role = slot.range.role;
            let path = model_path(dir, role);
            slot.agent.export_model(&path)?;
            info!(
                role = %role,
                path = %path.display(),
                performance = slot.agent.average_reward(),
                "model exported"
            );
        }
        Ok(())
    }

    fn slot(&self, role: Role) -> &RangeSlot<T> {
        &self.slots[role as usize]
    }

    fn slot_mut(&mut self, role: Role) -> &mut RangeSlot<T> {
        &mut self.slots[role as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short_config() -> RangeConfig {
        RangeConfig {
            episode_length_override: Some(60),
            collector_capacity: 100,
            ..RangeConfig::default()
        }
    }

    #[test]
    fn partition_is_a_disjoint_cover() {
        let window = Size::new(1200.0, 900.0);
        let ranges = partition(window);
        assert_eq!(ranges.len(), 9);
        for (i, a) in ranges.iter().enumerate() {
            assert_eq!(a.role, GRID_ROLES[i]);
            for b in &ranges[i + 1..] {
                assert!(!a.bounds.intersects(&b.bounds), "{} overlaps {}", a.bounds, b.bounds);
            }
        }
        let area: f64 = ranges.iter().map(|r| r.bounds.width * r.bounds.height).sum();
        assert!((area - 1200.0 * 900.0).abs() < 1e-6);
        assert_eq!(ranges[4].bounds, Rect::new(400.0, 300.0, 400.0, 300.0));
    }

    #[test]
    fn slots_follow_role_order() {
        let system = TrainingRangeSystem::new(short_config()).unwrap();
        for role in Role::all() {
            assert_eq!(system.range(role).role, role);
            assert_eq!(system.agent(role).role(), role);
        }
        assert_eq!(system.ranges().len(), 9);
        assert_eq!(system.range(Role::EnemyPatrol).bounds.width, 1200.0);
    }

    #[test]
    fn episodes_respect_the_frame_cap() {
        let mut system = TrainingRangeSystem::new(short_config()).unwrap();
        for role in Role::all() {
            let report = system.run_episode(role).unwrap();
            assert!(report.frames >= 1 && report.frames <= 60);
            assert_eq!(report.episode, 1);
            assert_eq!(system.episodes_run(role), 1);
        }
        assert_eq!(system.metrics().total_episodes(), 10);
    }

    #[test]
    fn solo_curriculum_grows() {
        let mut system = TrainingRangeSystem::new(RangeConfig {
            episode_length_override: Some(1),
            ..short_config()
        })
        .unwrap();
        let mut counts = Vec::new();
        for _ in 0..45 {
            let report = system.run_episode(Role::CompanionSoloMovement).unwrap();
            counts.push(report.companions.unwrap());
        }
        assert!(counts[..20].iter().all(|&c| c == 1));
        assert!(counts[20..40].iter().all(|&c| c == 2));
        assert!(counts[40..].iter().all(|&c| (3..=4).contains(&c)));
    }

    #[test]
    fn exploration_decays_per_episode() {
        let mut system = TrainingRangeSystem::new(short_config()).unwrap();
        let before = system.agent(Role::EnemyShooting).epsilon();
        system.run_episode(Role::EnemyShooting).unwrap();
        assert!(system.agent(Role::EnemyShooting).epsilon() < before);
    }

    #[test]
    fn collector_sees_every_frame() {
        let mut system = TrainingRangeSystem::new(short_config()).unwrap();
        let report = system.run_episode(Role::PlayerShooting).unwrap();
        let counted: u64 = system
            .action_counts(Role::PlayerShooting)
            .iter()
            .map(|(_, n)| n)
            .sum();
        assert_eq!(counted, u64::from(report.frames));
        let drained = system.drain_transitions(Role::PlayerShooting);
        assert_eq!(drained.len(), report.frames as usize);
        assert!(drained.iter().all(|e| e.state.len() == 21));
    }

    #[test]
    fn cancelled_training_stops_early() {
        let mut system = TrainingRangeSystem::new(short_config()).unwrap();
        let cancel = AtomicBool::new(true);
        assert_eq!(system.train(5, false, &cancel).unwrap(), 0);
        assert_eq!(system.metrics().total_episodes(), 0);
    }

    #[test]
    fn parallel_round_covers_the_grid() {
        let mut system = TrainingRangeSystem::new(short_config()).unwrap();
        let reports = system.run_round_parallel().unwrap();
        assert_eq!(reports.len(), 9);
        let mut roles: Vec<Role> = reports.iter().map(|r| r.role).collect();
        roles.sort();
        assert_eq!(roles, GRID_ROLES.to_vec());
        assert_eq!(system.episodes_run(Role::EnemyPatrol), 0);
    }
}
