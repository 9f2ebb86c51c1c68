//! Policy persistence.
//!
//! Saves learned policies so a trained agent can be run later without
//! retraining, and writes periodic checkpoints during long training runs.
//! Everything is stored as JSON through serde.
//!
//! ## Example
//!
//! ```rust,no_run
//! use vacuum_agents::{LearningConfig, LearningEngine, PolicyPersistence};
//! use std::path::Path;
//!
//! let engine = LearningEngine::new(4, LearningConfig::default());
//!
//! // ... train ...
//!
//! engine.save_to_file(Path::new("policy.json")).unwrap();
//! let loaded = LearningEngine::load_from_file(Path::new("policy.json")).unwrap();
//! assert_eq!(loaded.table(), engine.table());
//! ```

use crate::learning::{LearningEngine, QTable};
use crate::types::Timestamp;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Defines errors that can occur while saving or loading a policy.
#[derive(Debug)]
pub enum PersistenceError {
    /// An error occurred during file I/O.
    Io(std::io::Error),
    /// The value could not be serialized.
    Serialization(String),
    /// The bytes are not valid JSON.
    Deserialization(String),
    /// The JSON is well formed but does not describe a valid policy, e.g. a
    /// row whose width disagrees with the declared action count.
    InvalidFormat(String),
}

impl std::fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PersistenceError::Io(e) => write!(f, "IO error: {}", e),
            PersistenceError::Serialization(e) => write!(f, "Serialization error: {}", e),
            PersistenceError::Deserialization(e) => write!(f, "Deserialization error: {}", e),
            PersistenceError::InvalidFormat(e) => write!(f, "Invalid format: {}", e),
        }
    }
}

impl std::error::Error for PersistenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PersistenceError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PersistenceError {
    fn from(e: std::io::Error) -> Self {
        PersistenceError::Io(e)
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(e: serde_json::Error) -> Self {
        PersistenceError::Serialization(e.to_string())
    }
}

/// Options for configuring persistence operations.
#[derive(Debug, Clone)]
pub struct PersistenceOptions {
    /// If `true`, pretty-prints JSON output to be more human-readable.
    pub pretty: bool,
}

impl Default for PersistenceOptions {
    fn default() -> Self {
        Self::readable()
    }
}

impl PersistenceOptions {
    /// Returns options optimized for compact storage.
    pub fn compact() -> Self {
        Self { pretty: false }
    }

    /// Returns options optimized for human-readability (pretty-printed JSON).
    pub fn readable() -> Self {
        Self { pretty: true }
    }
}

/// Saving and loading of learned policies.
///
/// Every method has a default implementation on top of serde; implementors
/// only name themselves for the logs.
pub trait PolicyPersistence: Serialize + DeserializeOwned + Sized {
    /// Human-readable name used in log lines.
    const LABEL: &'static str;

    /// Saves to a file using default options.
    fn save_to_file(&self, path: &Path) -> Result<(), PersistenceError> {
        self.save_to_file_with_options(path, &PersistenceOptions::default())
    }

    /// Saves to a file with custom `PersistenceOptions`.
    fn save_to_file_with_options(
        &self,
        path: &Path,
        options: &PersistenceOptions,
    ) -> Result<(), PersistenceError> {
        let bytes = serialize_with_options(self, options)?;

        let mut file = fs::File::create(path)?;
        file.write_all(&bytes)?;

        log::info!("Saved {} to {:?}", Self::LABEL, path);
        Ok(())
    }

    /// Loads from a file using default options.
    fn load_from_file(path: &Path) -> Result<Self, PersistenceError> {
        Self::load_from_file_with_options(path, &PersistenceOptions::default())
    }

    /// Loads from a file with custom `PersistenceOptions`.
    fn load_from_file_with_options(
        path: &Path,
        options: &PersistenceOptions,
    ) -> Result<Self, PersistenceError> {
        let mut file = fs::File::open(path)?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;

        let value = Self::from_bytes_with_options(&bytes, options)?;

        log::info!("Loaded {} from {:?}", Self::LABEL, path);
        Ok(value)
    }

    /// Serializes to a byte vector using default options.
    ///
    /// Returns an empty vector if serialization fails.
    fn to_bytes(&self) -> Vec<u8> {
        self.to_bytes_with_options(&PersistenceOptions::default())
            .unwrap_or_default()
    }

    /// Serializes to a byte vector with custom `PersistenceOptions`.
    fn to_bytes_with_options(
        &self,
        options: &PersistenceOptions,
    ) -> Result<Vec<u8>, PersistenceError> {
        serialize_with_options(self, options)
    }

    /// Deserializes from a byte slice using default options.
    fn from_bytes(bytes: &[u8]) -> Result<Self, PersistenceError> {
        Self::from_bytes_with_options(bytes, &PersistenceOptions::default())
    }

    /// Deserializes from a byte slice with custom `PersistenceOptions`.
    fn from_bytes_with_options(
        bytes: &[u8],
        _options: &PersistenceOptions,
    ) -> Result<Self, PersistenceError> {
        deserialize(bytes)
    }
}

impl PolicyPersistence for QTable {
    const LABEL: &'static str = "Q-table";
}

impl PolicyPersistence for LearningEngine {
    const LABEL: &'static str = "learning engine";
}

impl PolicyPersistence for Checkpoint {
    const LABEL: &'static str = "checkpoint";
}

fn serialize_with_options<T: Serialize>(
    value: &T,
    options: &PersistenceOptions,
) -> Result<Vec<u8>, PersistenceError> {
    let bytes = if options.pretty {
        serde_json::to_vec_pretty(value)?
    } else {
        serde_json::to_vec(value)?
    };
    Ok(bytes)
}

fn deserialize<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, PersistenceError> {
    serde_json::from_slice(bytes).map_err(|e| {
        if e.is_data() {
            PersistenceError::InvalidFormat(e.to_string())
        } else {
            PersistenceError::Deserialization(e.to_string())
        }
    })
}

/// A learning engine saved mid-training.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Episodes completed when the checkpoint was taken.
    pub episode: u64,
    pub saved_at: Timestamp,
    pub engine: LearningEngine,
}

/// Manages the periodic saving of a learning engine to checkpoints.
pub struct CheckpointManager {
    /// The directory where checkpoint files are stored.
    checkpoint_dir: PathBuf,
    /// The maximum number of checkpoint files to keep. Older ones are deleted.
    max_checkpoints: usize,
    /// The number of episodes between each checkpoint.
    checkpoint_interval: u64,
    /// The episode of the last saved checkpoint.
    last_checkpoint: u64,
}

impl CheckpointManager {
    /// Creates a new `CheckpointManager`.
    ///
    /// # Arguments
    ///
    /// * `checkpoint_dir` - The path to the directory where checkpoints will be saved.
    /// * `max_checkpoints` - The maximum number of checkpoint files to retain.
    pub fn new(checkpoint_dir: &Path, max_checkpoints: usize) -> Self {
        Self {
            checkpoint_dir: checkpoint_dir.to_path_buf(),
            max_checkpoints,
            checkpoint_interval: 1000,
            last_checkpoint: 0,
        }
    }

    /// Sets the interval (in episodes) between checkpoints.
    pub fn with_interval(mut self, interval: u64) -> Self {
        self.checkpoint_interval = interval.max(1);
        self
    }

    /// Determines if a checkpoint is due after `episode` episodes.
    pub fn should_checkpoint(&self, episode: u64) -> bool {
        episode.saturating_sub(self.last_checkpoint) >= self.checkpoint_interval
    }

    /// Saves `engine` as `checkpoint_<episode>.json` and prunes old files.
    pub fn save_checkpoint(
        &mut self,
        engine: &LearningEngine,
        episode: u64,
    ) -> Result<PathBuf, PersistenceError> {
        fs::create_dir_all(&self.checkpoint_dir)?;

        let checkpoint = Checkpoint {
            episode,
            saved_at: Timestamp::now(),
            engine: engine.clone(),
        };
        let checkpoint_path = self
            .checkpoint_dir
            .join(format!("checkpoint_{}.json", episode));
        checkpoint.save_to_file_with_options(&checkpoint_path, &PersistenceOptions::compact())?;

        self.last_checkpoint = episode;
        self.cleanup_old_checkpoints()?;

        log::info!("Saved checkpoint at episode {}", episode);
        Ok(checkpoint_path)
    }

    /// Loads the most recent checkpoint from the checkpoint directory.
    pub fn load_latest_checkpoint(&self) -> Result<Checkpoint, PersistenceError> {
        let checkpoints = self.list_checkpoints()?;
        match checkpoints.last() {
            Some((_, latest)) => Checkpoint::load_from_file(latest),
            None => Err(PersistenceError::InvalidFormat(
                "No checkpoints found".to_string(),
            )),
        }
    }

    /// Lists all checkpoint files in the directory, oldest episode first.
    pub fn list_checkpoints(&self) -> Result<Vec<(u64, PathBuf)>, PersistenceError> {
        if !self.checkpoint_dir.exists() {
            return Ok(Vec::new());
        }

        let mut checkpoints = Vec::new();

        for entry in fs::read_dir(&self.checkpoint_dir)? {
            let path = entry?.path();
            if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            let episode = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.strip_prefix("checkpoint_"))
                .and_then(|s| s.parse::<u64>().ok());
            if let Some(episode) = episode {
                checkpoints.push((episode, path));
            }
        }

        // Numeric order; checkpoint_10 sorts after checkpoint_9.
        checkpoints.sort();
        Ok(checkpoints)
    }

    /// Removes the oldest checkpoint files to stay within the `max_checkpoints` limit.
    fn cleanup_old_checkpoints(&self) -> Result<(), PersistenceError> {
        let checkpoints = self.list_checkpoints()?;
        let excess = checkpoints.len().saturating_sub(self.max_checkpoints);

        for (_, old_checkpoint) in checkpoints.iter().take(excess) {
            fs::remove_file(old_checkpoint)?;
            log::debug!("Removed old checkpoint: {:?}", old_checkpoint);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::learning::LearningConfig;
    use crate::state::{AggregateState, BatteryBucket, StateKey};

    fn temp_path(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("vacuum_agents_test_{}", name));
        path
    }

    fn trained_engine() -> LearningEngine {
        let s0 = StateKey::Aggregate(AggregateState {
            battery: BatteryBucket::High,
            bin_full: false,
            all_clean: false,
        });
        let s1 = StateKey::Aggregate(AggregateState {
            battery: BatteryBucket::Low,
            bin_full: true,
            all_clean: false,
        });
        let mut engine = LearningEngine::new(4, LearningConfig::default());
        engine.update(&s0, 1, 50.0, &s1).unwrap();
        engine.update(&s1, 2, -20.0, &s0).unwrap();
        engine.end_episode();
        engine
    }

    #[test]
    fn test_table_bytes_round_trip() {
        let engine = trained_engine();
        let table = engine.table();

        for options in [PersistenceOptions::compact(), PersistenceOptions::readable()] {
            let bytes = table.to_bytes_with_options(&options).unwrap();
            let loaded = QTable::from_bytes_with_options(&bytes, &options).unwrap();
            assert_eq!(&loaded, table);
        }
    }

    #[test]
    fn test_engine_file_round_trip() {
        let engine = trained_engine();
        let path = temp_path("engine_round_trip.json");

        engine.save_to_file(&path).unwrap();
        assert!(path.exists());

        let loaded = LearningEngine::load_from_file(&path).unwrap();
        assert_eq!(loaded, engine);
        assert_eq!(loaded.total_updates(), 2);
        assert_eq!(loaded.epsilon(), engine.epsilon());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_rejects_mismatched_rows() {
        let json = br#"{"num_actions":4,"entries":[[{"Aggregate":{"battery":"High","bin_full":false,"all_clean":true}},[1.0,2.0]]]}"#;
        assert!(matches!(
            QTable::from_bytes(json),
            Err(PersistenceError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(
            QTable::from_bytes(b"not json"),
            Err(PersistenceError::Deserialization(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let invalid_path = PathBuf::from("/invalid/path/that/does/not/exist/policy.json");
        assert!(matches!(
            LearningEngine::load_from_file(&invalid_path),
            Err(PersistenceError::Io(_))
        ));
    }

    #[test]
    fn test_checkpoint_interval() {
        let mut manager = CheckpointManager::new(&temp_path("checkpoint_interval"), 3).with_interval(10);
        assert!(manager.should_checkpoint(10));
        assert!(!manager.should_checkpoint(5));
        manager.last_checkpoint = 10;
        assert!(!manager.should_checkpoint(15));
        assert!(manager.should_checkpoint(20));
    }

    #[test]
    fn test_checkpoint_rotation_keeps_newest() {
        let checkpoint_dir = temp_path("checkpoint_rotation");
        let _ = fs::remove_dir_all(&checkpoint_dir);
        let mut manager = CheckpointManager::new(&checkpoint_dir, 2).with_interval(1);

        let engine = trained_engine();
        for episode in [2, 9, 10, 11] {
            manager.save_checkpoint(&engine, episode).unwrap();
        }

        let episodes: Vec<u64> = manager
            .list_checkpoints()
            .unwrap()
            .into_iter()
            .map(|(episode, _)| episode)
            .collect();
        assert_eq!(episodes, vec![10, 11]);

        let latest = manager.load_latest_checkpoint().unwrap();
        assert_eq!(latest.episode, 11);
        assert_eq!(latest.engine, engine);

        let _ = fs::remove_dir_all(&checkpoint_dir);
    }

    #[test]
    fn test_no_checkpoints() {
        let manager = CheckpointManager::new(&temp_path("checkpoint_none"), 2);
        assert!(manager.load_latest_checkpoint().is_err());
    }
}
