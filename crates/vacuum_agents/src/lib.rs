#![doc = include_str!("../README.md")]
//! # Vacuum Agents
//!
//! A grid-world cleaning robot that learns with tabular Q-learning.
//!
//! ## Overview
//!
//! The robot has to keep a room clean with a finite battery and a finite
//! debris bin. It learns, from reward alone, to:
//! - **Clean** dirt tiles
//! - **Dump** its bin before it overflows
//! - **Charge** before the battery runs out
//! - **Survive**: an empty battery ends the episode with a large penalty
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                      EpisodeDriver                         │
//! ├────────────────────────────────────────────────────────────┤
//! │                                                            │
//! │  ┌─────────────┐  StateKey   ┌──────────────────┐          │
//! │  │   Agent<C>  │────────────►│  LearningEngine  │          │
//! │  │             │             │                  │          │
//! │  │ • position  │◄────────────│ • QTable         │          │
//! │  │ • battery   │   choice    │ • epsilon-greedy │          │
//! │  │ • bin       │             │ • Bellman update │          │
//! │  └──────┬──────┘             └──────────────────┘          │
//! │         │ GoalDirected: plan ──► find_path (BFS)           │
//! │         │ DirectAction: step                               │
//! │  ┌──────▼──────┐                                           │
//! │  │   GridMap   │◄── environment::generate / spawn_dirt     │
//! │  └─────────────┘                                           │
//! │                                                            │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Control schemes
//!
//! | Scheme           | State                          | Choices |
//! |------------------|--------------------------------|---------|
//! | [`GoalDirected`] | battery, bin full, map clean   | 4 goals |
//! | [`DirectAction`] | neighbour tiles, battery, bin  | 7 actions |
//!
//! ## Quick Start
//!
//! ```rust
//! use vacuum_agents::{
//!     AgentConfig, EpisodeDriver, GoalDirected, LayoutConfig, LearningConfig, MapSource,
//!     TrainingConfig,
//! };
//!
//! let training = TrainingConfig {
//!     episodes: 5,
//!     max_steps: 100,
//!     log_every: 0,
//!     seed: Some(42),
//!     ..Default::default()
//! };
//! let mut driver: EpisodeDriver<GoalDirected> = EpisodeDriver::new(
//!     AgentConfig::default(),
//!     LearningConfig::default(),
//!     MapSource::Generated(LayoutConfig::square(10)),
//!     training,
//! )
//! .unwrap();
//!
//! let history = driver.train().unwrap();
//! assert_eq!(history.len(), 5);
//! ```

pub mod agent;
pub mod config;
pub mod environment;
pub mod episode;
pub mod error;
pub mod grid;
pub mod learning;
pub mod pathfinding;
pub mod persistence;
pub mod state;
pub mod types;

pub use agent::{Action, Agent, ControlScheme, DirectAction, Goal, GoalDirected, SchemeKind, StepOutcome};
pub use config::{
    AgentConfig, BatteryConfig, BatteryThresholds, BinConfig, ConfigError, RewardConfig,
    RewardPreset,
};
pub use environment::{generate, spawn_dirt, LayoutConfig, MapSource, Room};
pub use episode::{mean_reward, EpisodeDriver, EpisodeStats, TrainingConfig};
pub use error::{Error, Result};
pub use grid::{GridMap, Tile};
pub use learning::{LearningConfig, LearningEngine, QTable};
pub use pathfinding::{find_path, PathResult};
pub use persistence::{
    Checkpoint, CheckpointManager, PersistenceError, PersistenceOptions, PolicyPersistence,
};
pub use state::{AggregateState, BatteryBucket, LocalState, StateKey, Vitals};
pub use types::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Creates a goal-directed agent with the default configuration.
///
/// # Examples
///
/// ```
/// use vacuum_agents::{create_goal_agent, Cell};
///
/// let agent = create_goal_agent(Cell::new(1, 1));
/// assert_eq!(agent.battery(), 200);
/// ```
pub fn create_goal_agent(start: Cell) -> Agent<GoalDirected> {
    Agent::new(start, AgentConfig::default())
}

/// Creates a direct-action agent with the default configuration.
pub fn create_direct_agent(start: Cell) -> Agent<DirectAction> {
    Agent::new(start, AgentConfig::default())
}
