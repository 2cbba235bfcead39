// Demonstration: train every role in its own range and print the metrics.
//
// Run from the repo root:
//   cargo run --example train_ranges -- --rounds 20 --replay --parallel --export models

use std::env;
use std::path::Path;
use std::sync::atomic::AtomicBool;

use skirmish_rl::{LearnMode, RangeConfig, ReplayConfig, Role, TrainingRangeSystem};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("skirmish_rl=info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let args: Vec<String> = env::args().collect();
    let rounds: usize = arg_value(&args, "--rounds")
        .and_then(|s| s.parse().ok())
        .unwrap_or(10);
    let seed: u64 = arg_value(&args, "--seed")
        .and_then(|s| s.parse().ok())
        .unwrap_or(42);
    let frames: Option<u32> = arg_value(&args, "--frames").and_then(|s| s.parse().ok());
    let parallel = args.iter().any(|a| a == "--parallel");

    let learn_mode = if args.iter().any(|a| a == "--replay") {
        LearnMode::Replay {
            replay: ReplayConfig::default(),
            batch_size: 32,
            train_every: 4,
        }
    } else {
        LearnMode::Online
    };

    let config = RangeConfig {
        seed,
        learn_mode,
        episode_length_override: frames,
        ..RangeConfig::default()
    };

    let mut system = match arg_value(&args, "--load") {
        Some(dir) => TrainingRangeSystem::load_or_fresh(config, Path::new(dir)),
        None => TrainingRangeSystem::new(config),
    }
    .expect("building the training ranges failed");

    let cancel = AtomicBool::new(false);
    let episodes = system
        .train(rounds, parallel, &cancel)
        .expect("training failed");

    println!("Trained {} episodes", episodes);
    println!("{}", system.metrics());
    for role in [Role::PlayerShooting, Role::CompanionSoloMovement] {
        let top: Vec<String> = system
            .action_counts(role)
            .iter()
            .take(3)
            .map(|(name, n)| format!("{name}={n}"))
            .collect();
        println!("{role} top actions: {}", top.join(", "));
    }

    if let Some(dir) = arg_value(&args, "--export") {
        system
            .export_all(Path::new(dir))
            .expect("exporting models failed");
        println!("Models written to {}", dir);
    }
}

fn arg_value<'a>(args: &'a [String], key: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}
