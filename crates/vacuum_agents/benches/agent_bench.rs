//! Benchmarks for vacuum agents
//!
//! Run with: cargo bench -p vacuum_agents

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;
use vacuum_agents::{
    find_path, generate, AgentConfig, AggregateState, BatteryBucket, Cell, DirectAction,
    EpisodeDriver, GoalDirected, LayoutConfig, LearningConfig, LearningEngine, MapSource,
    StateKey, TrainingConfig,
};

/// Benchmark BFS across room sizes
fn bench_pathfinding(c: &mut Criterion) {
    let mut group = c.benchmark_group("Pathfinding");

    for size in [10, 20, 40] {
        let mut rng = StdRng::seed_from_u64(7);
        let room = generate(&LayoutConfig::square(size), &mut rng).unwrap();
        let dirt = room.grid.dirt_targets();
        let bins = room.grid.bin_targets().to_vec();

        group.bench_with_input(BenchmarkId::new("nearest_dirt", size), &size, |b, _| {
            b.iter(|| black_box(find_path(&room.grid, room.start, &dirt)));
        });

        group.bench_with_input(BenchmarkId::new("single_bin", size), &size, |b, _| {
            b.iter(|| black_box(find_path(&room.grid, room.start, &bins)));
        });
    }

    group.finish();
}

/// Benchmark Q-learning updates
fn bench_q_updates(c: &mut Criterion) {
    let mut group = c.benchmark_group("Q-Learning");

    let states: Vec<StateKey> = [BatteryBucket::Critical, BatteryBucket::Low, BatteryBucket::High]
        .into_iter()
        .flat_map(|battery| {
            [false, true].into_iter().map(move |bin_full| {
                StateKey::Aggregate(AggregateState {
                    battery,
                    bin_full,
                    all_clean: false,
                })
            })
        })
        .collect();

    group.bench_function("update_1000", |b| {
        let mut engine = LearningEngine::new(4, LearningConfig::default());
        b.iter(|| {
            for i in 0..1000 {
                let s = &states[i % states.len()];
                let next = &states[(i + 1) % states.len()];
                let _ = engine.update(s, i % 4, black_box(1.0), next);
            }
        });
    });

    group.bench_function("select_epsilon_greedy", |b| {
        let engine = LearningEngine::new(4, LearningConfig::default());
        let mut rng = StdRng::seed_from_u64(1);
        b.iter(|| black_box(engine.select(&states[0], &mut rng)));
    });

    group.finish();
}

/// Benchmark whole training episodes
fn bench_episodes(c: &mut Criterion) {
    let mut group = c.benchmark_group("Episodes");
    group.sample_size(20);

    let training = TrainingConfig {
        episodes: 1,
        max_steps: 500,
        log_every: 0,
        seed: Some(3),
        ..Default::default()
    };
    let source = MapSource::Generated(LayoutConfig::square(20));

    group.bench_function("goal_directed_20x20", |b| {
        let mut driver: EpisodeDriver<GoalDirected> = EpisodeDriver::new(
            AgentConfig::default(),
            LearningConfig::default(),
            source.clone(),
            training,
        )
        .unwrap();
        b.iter(|| black_box(driver.run_episode(0, true)));
    });

    group.bench_function("direct_action_20x20", |b| {
        let mut driver: EpisodeDriver<DirectAction> = EpisodeDriver::new(
            AgentConfig::default(),
            LearningConfig::default(),
            source.clone(),
            training,
        )
        .unwrap();
        b.iter(|| black_box(driver.run_episode(0, true)));
    });

    group.bench_function("agent_reset", |b| {
        let mut agent = vacuum_agents::create_direct_agent(Cell::new(1, 1));
        b.iter(|| agent.reset(black_box(Cell::new(1, 1))));
    });

    group.finish();
}

criterion_group!(benches, bench_pathfinding, bench_q_updates, bench_episodes);
criterion_main!(benches);
