//! Prioritized experience-replay ring buffer.
//!
//! Each stored experience carries a priority; sampling draws with
//! replacement, proportionally to priority. Once the buffer is full, new
//! experiences overwrite the slot at `current_index` and the index advances
//! modulo capacity.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use rand::Rng;
use tracing::debug;

use crate::config::ReplayConfig;
use crate::error::{Result, TrainingError};
use crate::experience::Experience;

/// Smallest priority a sampled experience can be given back.
pub const MIN_PRIORITY: f64 = 0.01;

/// One slot of the buffer.
#[derive(Debug, Clone)]
pub struct StoredExperience {
    /// Unique per buffer, used to detect overwritten slots.
    pub id: u64,
    pub experience: Experience,
    pub priority: f64,
    pub timestamp: Instant,
    pub sample_count: u64,
}

/// A sampled batch. Experiences are copies, so later overwrites never
/// invalidate it.
#[derive(Debug, Clone, Default)]
pub struct SampledBatch {
    pub experiences: Vec<Experience>,
    /// Buffer slot each experience was drawn from.
    pub slots: Vec<usize>,
    /// Id of the drawn slot at sampling time.
    pub ids: Vec<u64>,
    /// Importance-sampling weights, max-normalized to 1.
    pub weights: Vec<f64>,
}

impl SampledBatch {
    pub fn len(&self) -> usize {
        self.experiences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.experiences.is_empty()
    }
}

/// Summary of the buffer contents.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ReplayStats {
    pub len: usize,
    pub capacity: usize,
    pub mean_priority: f64,
    pub max_priority: f64,
    pub mean_reward: f64,
    /// Fraction of stored transitions that ended an episode.
    pub terminal_ratio: f64,
}

impl fmt::Display for ReplayStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} stored, priority mean {:.3} max {:.3}, reward mean {:.3}, {:.1}% terminal",
            self.len,
            self.capacity,
            self.mean_priority,
            self.max_priority,
            self.mean_reward,
            self.terminal_ratio * 100.0
        )
    }
}

/// Initial priority of a freshly added experience.
///
/// `|r| + 0.1`, doubled for terminal transitions and scaled by 1.5 for
/// rewards above 1.
pub fn initial_priority(experience: &Experience) -> f64 {
    let mut priority = experience.reward.abs() + 0.1;
    if experience.done {
        priority *= 2.0;
    }
    if experience.reward > 1.0 {
        priority *= 1.5;
    }
    priority
}

/// Fixed-capacity prioritized replay buffer.
#[derive(Debug)]
pub struct ExperienceReplayBuffer {
    config: ReplayConfig,
    entries: Vec<StoredExperience>,
    current_index: usize,
    next_id: u64,
}

impl ExperienceReplayBuffer {
    pub fn new(config: ReplayConfig) -> Self {
        Self {
            entries: Vec::with_capacity(config.max_size.min(4096)),
            config,
            current_index: 0,
            next_id: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.config.max_size
    }

    /// Slot the next add overwrites once the buffer is full.
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn iter(&self) -> impl Iterator<Item = &StoredExperience> {
        self.entries.iter()
    }

    /// Adds experiences stamped with the current time.
    pub fn add<I>(&mut self, experiences: I)
    where
        I: IntoIterator<Item = Experience>,
    {
        self.add_at(experiences, Instant::now());
    }

    /// Adds experiences stamped with `now`.
    pub fn add_at<I>(&mut self, experiences: I, now: Instant)
    where
        I: IntoIterator<Item = Experience>,
    {
        if self.config.max_size == 0 {
            return;
        }
        for experience in experiences {
            let stored = StoredExperience {
                id: self.next_id,
                priority: initial_priority(&experience),
                experience,
                timestamp: now,
                sample_count: 0,
            };
            self.next_id += 1;

            if self.entries.len() < self.config.max_size {
                self.entries.push(stored);
            } else {
                self.entries[self.current_index] = stored;
                self.current_index = (self.current_index + 1) % self.config.max_size;
            }
        }
    }

    /// Draws `batch_size` experiences with replacement, each with
    /// probability proportional to its priority.
    pub fn sample_batch<R: Rng>(&mut self, batch_size: usize, rng: &mut R) -> SampledBatch {
        if self.entries.is_empty() || batch_size == 0 {
            return SampledBatch::default();
        }

        let total: f64 = self.entries.iter().map(|e| e.priority).sum();
        let last = self.entries.len() - 1;
        let slots: Vec<usize> = (0..batch_size)
            .map(|_| {
                let target = rng.gen::<f64>() * total;
                let mut cumulative = 0.0;
                self.entries
                    .iter()
                    .position(|e| {
                        cumulative += e.priority;
                        cumulative >= target
                    })
                    // floating-point shortfall: the draw landed past the last sum
                    .unwrap_or(last)
            })
            .collect();

        let n = self.entries.len() as f64;
        let raw: Vec<f64> = slots
            .iter()
            .map(|&s| {
                let p = self.entries[s].priority / total;
                (n * p).powf(-self.config.beta)
            })
            .collect();
        let max_weight = raw.iter().copied().fold(0.0, f64::max);
        let weights = raw
            .into_iter()
            .map(|w| if max_weight > 0.0 { w / max_weight } else { 1.0 })
            .collect();

        self.collect(slots, weights)
    }

    /// Draws `batch_size` experiences uniformly with replacement.
    pub fn sample_uniform<R: Rng>(&mut self, batch_size: usize, rng: &mut R) -> SampledBatch {
        if self.entries.is_empty() || batch_size == 0 {
            return SampledBatch::default();
        }
        let len = self.entries.len();
        let slots: Vec<usize> = (0..batch_size).map(|_| rng.gen_range(0..len)).collect();
        let weights = vec![1.0; batch_size];
        self.collect(slots, weights)
    }

    fn collect(&mut self, slots: Vec<usize>, weights: Vec<f64>) -> SampledBatch {
        let mut experiences = Vec::with_capacity(slots.len());
        let mut ids = Vec::with_capacity(slots.len());
        for &slot in &slots {
            let entry = &mut self.entries[slot];
            entry.sample_count += 1;
            experiences.push(entry.experience.clone());
            ids.push(entry.id);
        }
        SampledBatch {
            experiences,
            slots,
            ids,
            weights,
        }
    }

    /// Sets the priority of every sampled slot to `max(0.01, |δ| + 0.01)`.
    ///
    /// Slots overwritten or pruned since sampling are skipped.
    pub fn update_priorities(&mut self, batch: &SampledBatch, td_errors: &[f64]) {
        for ((&slot, &id), &td) in batch.slots.iter().zip(&batch.ids).zip(td_errors) {
            match self.entries.get_mut(slot) {
                Some(entry) if entry.id == id => {
                    entry.priority = (td.abs() + MIN_PRIORITY).max(MIN_PRIORITY);
                }
                _ => {}
            }
        }
    }

    /// Drops experiences older than `max_age`. Returns how many were removed.
    pub fn clear_old_experiences(&mut self, max_age: Duration) -> usize {
        self.clear_old_experiences_at(Instant::now(), max_age)
    }

    /// Drops experiences older than `max_age` as seen from `now`.
    pub fn clear_old_experiences_at(&mut self, now: Instant, max_age: Duration) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|e| now.saturating_duration_since(e.timestamp) <= max_age);
        if self.current_index >= self.entries.len() {
            self.current_index = 0;
        }
        let removed = before - self.entries.len();
        if removed > 0 {
            debug!(removed, remaining = self.entries.len(), "pruned stale experiences");
        }
        removed
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.current_index = 0;
    }

    pub fn stats(&self) -> ReplayStats {
        if self.entries.is_empty() {
            return ReplayStats {
                capacity: self.config.max_size,
                ..ReplayStats::default()
            };
        }
        let n = self.entries.len() as f64;
        ReplayStats {
            len: self.entries.len(),
            capacity: self.config.max_size,
            mean_priority: self.entries.iter().map(|e| e.priority).sum::<f64>() / n,
            max_priority: self.entries.iter().map(|e| e.priority).fold(0.0, f64::max),
            mean_reward: self.entries.iter().map(|e| e.experience.reward).sum::<f64>() / n,
            terminal_ratio: self.entries.iter().filter(|e| e.experience.done).count() as f64 / n,
        }
    }
}

/// A replay buffer shared between threads.
#[derive(Debug, Clone)]
pub struct SharedReplayBuffer {
    inner: Arc<Mutex<ExperienceReplayBuffer>>,
}

impl SharedReplayBuffer {
    pub fn new(config: ReplayConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ExperienceReplayBuffer::new(config))),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, ExperienceReplayBuffer>> {
        self.inner.lock().map_err(|_| TrainingError::ReplayLockPoisoned)
    }

    pub fn add<I>(&self, experiences: I) -> Result<()>
    where
        I: IntoIterator<Item = Experience>,
    {
        self.lock()?.add(experiences);
        Ok(())
    }

    pub fn sample_batch<R: Rng>(&self, batch_size: usize, rng: &mut R) -> Result<SampledBatch> {
        Ok(self.lock()?.sample_batch(batch_size, rng))
    }

    pub fn update_priorities(&self, batch: &SampledBatch, td_errors: &[f64]) -> Result<()> {
        self.lock()?.update_priorities(batch, td_errors);
        Ok(())
    }

    pub fn clear_old_experiences(&self, max_age: Duration) -> Result<usize> {
        Ok(self.lock()?.clear_old_experiences(max_age))
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    pub fn stats(&self) -> Result<ReplayStats> {
        Ok(self.lock()?.stats())
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn exp(reward: f64, done: bool) -> Experience {
        Experience::new(vec![reward], 0, reward, vec![reward], done)
    }

    fn buffer(max_size: usize) -> ExperienceReplayBuffer {
        ExperienceReplayBuffer::new(ReplayConfig {
            max_size,
            ..ReplayConfig::default()
        })
    }

    #[test]
    fn initial_priority_rules() {
        assert!((initial_priority(&exp(0.0, false)) - 0.1).abs() < 1e-12);
        assert!((initial_priority(&exp(-1.0, true)) - 2.2).abs() < 1e-12);
        assert!((initial_priority(&exp(2.0, false)) - 3.15).abs() < 1e-12);
    }

    #[test]
    fn ring_evicts_oldest_when_full() {
        let mut buf = buffer(4);
        buf.add((0..5).map(|i| exp(i as f64, false)));
        assert_eq!(buf.len(), 4);
        assert_eq!(buf.current_index(), 1);
        let rewards: Vec<f64> = buf.iter().map(|e| e.experience.reward).collect();
        assert_eq!(rewards, vec![4.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn empty_buffer_gives_empty_batch() {
        let mut buf = buffer(8);
        let mut rng = StdRng::seed_from_u64(0);
        assert!(buf.sample_batch(16, &mut rng).is_empty());
        assert!(buf.sample_uniform(16, &mut rng).is_empty());
    }

    #[test]
    fn high_priority_item_dominates_sampling() {
        let mut buf = buffer(128);
        buf.add((0..99).map(|_| exp(0.0, false)));
        buf.add([exp(1000.0, false)]);
        let mut rng = StdRng::seed_from_u64(7);

        let batch = buf.sample_batch(50, &mut rng);
        assert_eq!(batch.len(), 50);
        let hits = batch.slots.iter().filter(|&&s| s == 99).count();
        assert!(hits > 40, "high-priority item drawn only {hits} times");

        // its weight is the smallest, the rare low-priority draws get 1.0
        let w99 = batch.weights[batch.slots.iter().position(|&s| s == 99).unwrap()];
        assert!(batch.weights.iter().all(|&w| w >= w99 && w <= 1.0));
    }

    #[test]
    fn uniform_sampling_ignores_priority() {
        let mut buf = buffer(128);
        buf.add((0..99).map(|_| exp(0.0, false)));
        buf.add([exp(1000.0, false)]);
        let mut rng = StdRng::seed_from_u64(7);

        let batch = buf.sample_uniform(50, &mut rng);
        let hits = batch.slots.iter().filter(|&&s| s == 99).count();
        assert!(hits < 10);
        assert!(batch.weights.iter().all(|&w| w == 1.0));
    }

    #[test]
    fn sampling_counts_draws() {
        let mut buf = buffer(4);
        buf.add([exp(1.0, false)]);
        let mut rng = StdRng::seed_from_u64(1);
        buf.sample_batch(3, &mut rng);
        assert_eq!(buf.iter().next().unwrap().sample_count, 3);
    }

    #[test]
    fn priority_update_has_a_floor() {
        let mut buf = buffer(4);
        buf.add([exp(5.0, false), exp(5.0, false)]);
        let mut rng = StdRng::seed_from_u64(3);
        let batch = buf.sample_uniform(8, &mut rng);
        let td = vec![0.0; batch.len()];
        buf.update_priorities(&batch, &td);
        for slot in &batch.slots {
            let e = buf.iter().nth(*slot).unwrap();
            assert!((e.priority - MIN_PRIORITY).abs() < 1e-12);
        }
    }

    #[test]
    fn overwritten_slots_keep_their_priority() {
        let mut buf = buffer(1);
        buf.add([exp(1.0, false)]);
        let mut rng = StdRng::seed_from_u64(3);
        let batch = buf.sample_batch(1, &mut rng);
        buf.add([exp(3.0, false)]);
        buf.update_priorities(&batch, &[100.0]);
        let e = buf.iter().next().unwrap();
        assert!((e.priority - initial_priority(&exp(3.0, false))).abs() < 1e-12);
    }

    #[test]
    fn stale_experiences_are_pruned() {
        let mut buf = buffer(3);
        let start = Instant::now();
        buf.add_at([exp(1.0, false), exp(2.0, false)], start);
        buf.add_at([exp(3.0, false), exp(4.0, false)], start + Duration::from_secs(10));
        assert_eq!(buf.current_index(), 1);

        let removed =
            buf.clear_old_experiences_at(start + Duration::from_secs(12), Duration::from_secs(5));
        assert_eq!(removed, 1);
        assert_eq!(buf.len(), 2);
        assert!(buf.iter().all(|e| e.experience.reward > 2.0));
        assert!(buf.current_index() < buf.len());
    }

    #[test]
    fn stats_summarise_contents() {
        let mut buf = buffer(8);
        assert_eq!(buf.stats().len, 0);
        buf.add([exp(1.0, true), exp(3.0, false)]);
        let s = buf.stats();
        assert_eq!(s.len, 2);
        assert!((s.mean_reward - 2.0).abs() < 1e-12);
        assert!((s.terminal_ratio - 0.5).abs() < 1e-12);
    }

    #[test]
    fn shared_buffer_across_threads() {
        let shared = SharedReplayBuffer::new(ReplayConfig::default());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let buf = shared.clone();
                std::thread::spawn(move || buf.add((0..25).map(|i| exp((t * 25 + i) as f64, false))))
            })
            .collect();
        for h in handles {
            h.join().unwrap().unwrap();
        }
        assert_eq!(shared.len().unwrap(), 100);
    }
}
