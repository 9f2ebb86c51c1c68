//! Tabular Q-learning for the vacuum agents.
//!
//! ## Overview
//!
//! The policy is a [`QTable`]: one row of value estimates per discretized
//! [`StateKey`](crate::StateKey), one column per goal or action of the active
//! control scheme. Rows appear lazily as zero vectors the first time a state
//! is referenced and are never removed.
//!
//! [`LearningEngine`] wraps the table with its hyperparameters and the live
//! exploration rate. Selection is epsilon-greedy; updates follow the
//! Q-learning rule
//!
//! ```text
//! Q(s,a) <- Q(s,a) + lr * (r + gamma * max_a' Q(s',a') - Q(s,a))
//! ```
//!
//! and epsilon decays multiplicatively once per episode down to a floor.
//!
//! ## Example
//!
//! ```rust
//! use vacuum_agents::learning::{LearningConfig, LearningEngine};
//! use vacuum_agents::{AggregateState, BatteryBucket, StateKey};
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! let state = StateKey::Aggregate(AggregateState {
//!     battery: BatteryBucket::High,
//!     bin_full: false,
//!     all_clean: false,
//! });
//! let done = StateKey::Aggregate(AggregateState {
//!     battery: BatteryBucket::High,
//!     bin_full: false,
//!     all_clean: true,
//! });
//!
//! let mut engine = LearningEngine::new(4, LearningConfig::default());
//! let mut rng = StdRng::seed_from_u64(7);
//!
//! let choice = engine.select(&state, &mut rng);
//! engine.update(&state, choice, 50.0, &done).unwrap();
//! engine.end_episode();
//!
//! assert_eq!(engine.total_updates(), 1);
//! assert!(engine.epsilon() < 1.0);
//! ```

mod engine;
mod q_table;

pub use engine::{LearningConfig, LearningEngine};
pub use q_table::{QTable, QTableSnapshot};
