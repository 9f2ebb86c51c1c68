//! Integration tests for policy persistence
//!
//! Trains small policies, saves them, loads them back and checks that the
//! loaded policy drives an agent exactly like the original.

use std::fs;
use std::path::PathBuf;
use vacuum_agents::{
    AgentConfig, CheckpointManager, DirectAction, EpisodeDriver, GoalDirected, LayoutConfig,
    LearningConfig, LearningEngine, MapSource, PersistenceError, PersistenceOptions,
    PolicyPersistence, QTable, TrainingConfig,
};

fn temp_path(name: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("vacuum_agents_it_{}", name));
    path
}

fn training(episodes: u64, seed: u64) -> TrainingConfig {
    TrainingConfig {
        episodes,
        max_steps: 100,
        log_every: 0,
        seed: Some(seed),
        ..Default::default()
    }
}

fn source() -> MapSource {
    MapSource::Generated(LayoutConfig::square(8))
}

// ============================================================================
// Round trips
// ============================================================================

#[test]
fn test_trained_table_round_trips_through_bytes() {
    let mut driver: EpisodeDriver<DirectAction> = EpisodeDriver::new(
        AgentConfig::default(),
        LearningConfig::default(),
        source(),
        training(5, 1),
    )
    .unwrap();
    driver.train().unwrap();

    let table = driver.engine().table();
    assert!(!table.is_empty());

    let bytes = table.to_bytes();
    assert!(!bytes.is_empty());
    let loaded = QTable::from_bytes(&bytes).unwrap();
    assert_eq!(&loaded, table);
    assert_eq!(loaded.num_actions(), 7);
    assert_eq!(loaded.len(), table.len());
}

#[test]
fn test_loaded_policy_replays_identically() {
    let mut driver: EpisodeDriver<GoalDirected> = EpisodeDriver::new(
        AgentConfig::default(),
        LearningConfig::default(),
        source(),
        training(10, 2),
    )
    .unwrap();
    driver.train().unwrap();

    let path = temp_path("replay_policy.json");
    driver
        .engine()
        .save_to_file_with_options(&path, &PersistenceOptions::compact())
        .unwrap();
    let loaded = LearningEngine::load_from_file(&path).unwrap();
    assert_eq!(&loaded, driver.engine());

    let mut original: EpisodeDriver<GoalDirected> = EpisodeDriver::with_engine(
        AgentConfig::default(),
        driver.into_engine(),
        source(),
        training(0, 99),
    )
    .unwrap();
    let mut restored: EpisodeDriver<GoalDirected> = EpisodeDriver::with_engine(
        AgentConfig::default(),
        loaded,
        source(),
        training(0, 99),
    )
    .unwrap();

    let a = original.evaluate(3).unwrap();
    let b = restored.evaluate(3).unwrap();
    assert_eq!(a, b);

    let _ = fs::remove_file(&path);
}

// ============================================================================
// Failure modes
// ============================================================================

#[test]
fn test_loading_goal_policy_into_direct_driver_fails() {
    let engine = LearningEngine::new(4, LearningConfig::default());
    let bytes = engine.to_bytes();
    let loaded = LearningEngine::from_bytes(&bytes).unwrap();

    let result: vacuum_agents::Result<EpisodeDriver<DirectAction>> = EpisodeDriver::with_engine(
        AgentConfig::default(),
        loaded,
        source(),
        training(0, 0),
    );
    assert!(result.is_err());
}

#[test]
fn test_truncated_file_is_rejected() {
    let path = temp_path("truncated_policy.json");
    let engine = LearningEngine::new(7, LearningConfig::default());
    let bytes = engine.to_bytes();
    fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();

    assert!(matches!(
        LearningEngine::load_from_file(&path),
        Err(PersistenceError::Deserialization(_))
    ));

    let _ = fs::remove_file(&path);
}

#[test]
fn test_missing_policy_file() {
    let path = temp_path("does_not_exist.json");
    let _ = fs::remove_file(&path);
    let err = LearningEngine::load_from_file(&path).unwrap_err();
    assert!(matches!(err, PersistenceError::Io(_)));

    let err: vacuum_agents::Error = err.into();
    assert!(err.to_string().starts_with("Persistence error"));
}

// ============================================================================
// Checkpoints during training
// ============================================================================

#[test]
fn test_training_writes_checkpoints() {
    let dir = temp_path("training_checkpoints");
    let _ = fs::remove_dir_all(&dir);

    let manager = CheckpointManager::new(&dir, 2).with_interval(3);
    let mut driver: EpisodeDriver<GoalDirected> = EpisodeDriver::new(
        AgentConfig::default(),
        LearningConfig::default(),
        source(),
        training(10, 3),
    )
    .unwrap()
    .with_checkpoints(manager);
    driver.train().unwrap();

    // Saved after 3, 6 and 9 episodes; the oldest was pruned.
    let reader = CheckpointManager::new(&dir, 2);
    let episodes: Vec<u64> = reader
        .list_checkpoints()
        .unwrap()
        .into_iter()
        .map(|(episode, _)| episode)
        .collect();
    assert_eq!(episodes, vec![6, 9]);

    let latest = reader.load_latest_checkpoint().unwrap();
    assert_eq!(latest.episode, 9);
    assert_eq!(latest.engine.total_episodes(), 9);

    let _ = fs::remove_dir_all(&dir);
}
