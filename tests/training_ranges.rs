use std::sync::atomic::AtomicBool;

use rand::rngs::StdRng;
use rand::SeedableRng;
use skirmish_rl::range::model_path;
use skirmish_rl::training::SharedReplayBuffer;
use skirmish_rl::{LearnMode, RangeConfig, ReplayConfig, Role, Trainer, TrainingRangeSystem};

fn config(learn_mode: LearnMode) -> RangeConfig {
    RangeConfig {
        learn_mode,
        episode_length_override: Some(80),
        collector_capacity: 500,
        seed: 7,
        ..RangeConfig::default()
    }
}

fn replay_mode() -> LearnMode {
    LearnMode::Replay {
        replay: ReplayConfig {
            max_size: 1_000,
            beta: 0.4,
        },
        batch_size: 16,
        train_every: 4,
    }
}

#[test]
fn rounds_train_every_grid_role() {
    let mut system = TrainingRangeSystem::new(config(LearnMode::Online)).unwrap();
    let cancel = AtomicBool::new(false);
    let episodes = system.train(3, false, &cancel).unwrap();
    assert_eq!(episodes, 27);

    for range in system.ranges() {
        let m = system.metrics().role(range.role).unwrap();
        assert_eq!(m.episodes, 3);
        assert!(system.agent(range.role).steps() > 0);
    }
    assert!(system.metrics().role(Role::EnemyPatrol).is_none());
    assert!(system.metrics().to_string().contains("27 episodes"));
}

#[test]
fn patrol_trains_over_the_window() {
    let mut system = TrainingRangeSystem::new(config(LearnMode::Online)).unwrap();
    let report = system.run_episode(Role::EnemyPatrol).unwrap();
    assert_eq!(report.role, Role::EnemyPatrol);
    assert!(report.frames >= 1);
}

#[test]
fn replay_agents_fill_their_buffers() {
    let mut system = TrainingRangeSystem::new(config(replay_mode())).unwrap();
    let cancel = AtomicBool::new(false);
    system.train(2, true, &cancel).unwrap();

    for range in system.ranges() {
        let stats = system.agent(range.role).replay_stats().unwrap();
        let steps = system.agent(range.role).steps() as usize;
        assert_eq!(stats.len, steps.min(1_000));
        assert!(stats.mean_priority >= 0.01);
    }
}

#[test]
fn exported_models_reload_into_a_new_system() {
    let dir = tempfile::tempdir().unwrap();
    let mut system = TrainingRangeSystem::new(config(LearnMode::Online)).unwrap();
    system.run_round().unwrap();
    system.export_all(dir.path()).unwrap();

    for role in Role::all() {
        assert!(model_path(dir.path(), role).exists(), "{role} not exported");
    }

    let reloaded = TrainingRangeSystem::load_or_fresh(config(LearnMode::Online), dir.path()).unwrap();
    let role = Role::BossShooting;
    let state = vec![0.25; role.spec().state_size];
    assert_eq!(
        system.agent(role).trainer().q_values(&state),
        reloaded.agent(role).trainer().q_values(&state)
    );
    assert_eq!(
        system.agent(role).average_reward(),
        reloaded.agent(role).average_reward()
    );
}

#[test]
fn same_seed_same_training() {
    let mut a = TrainingRangeSystem::new(config(LearnMode::Online)).unwrap();
    let mut b = TrainingRangeSystem::new(config(LearnMode::Online)).unwrap();
    let ra = a.run_round_parallel().unwrap();
    let rb = b.run_round_parallel().unwrap();
    assert_eq!(ra, rb);
}

#[test]
fn collected_transitions_feed_a_shared_buffer() {
    let mut system = TrainingRangeSystem::new(config(LearnMode::Online)).unwrap();
    let report = system.run_episode(Role::CompanionMovement).unwrap();

    let shared = SharedReplayBuffer::new(ReplayConfig::default());
    let worker = shared.clone();
    let transitions = system.drain_transitions(Role::CompanionMovement);
    std::thread::spawn(move || worker.add(transitions))
        .join()
        .unwrap()
        .unwrap();

    assert_eq!(shared.len().unwrap(), report.frames as usize);
    let batch = shared.sample_batch(8, &mut StdRng::seed_from_u64(1)).unwrap();
    assert_eq!(batch.len(), 8);
    assert!(system.drain_transitions(Role::CompanionMovement).is_empty());
}
