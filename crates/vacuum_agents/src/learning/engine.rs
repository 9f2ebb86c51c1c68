//! The Q-learning engine.
//!
//! Wraps a [`QTable`] with its hyperparameters, the live exploration rate and
//! some training counters. This is the only state that survives from one
//! episode to the next.

use crate::config::ConfigError;
use crate::error::Result;
use crate::learning::q_table::QTable;
use crate::state::StateKey;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Configuration for the `LearningEngine`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LearningConfig {
    /// The learning rate (alpha), determining how much new information overrides old information.
    pub learning_rate: f64,
    /// The discount factor (gamma), determining the importance of future rewards.
    pub discount_factor: f64,
    /// The exploration rate (epsilon) at the start of training.
    pub epsilon: f64,
    /// The multiplier applied to epsilon after each episode.
    pub epsilon_decay: f64,
    /// The minimum value that epsilon can decay to.
    pub epsilon_min: f64,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.15,
            discount_factor: 0.99,
            epsilon: 1.0,
            epsilon_decay: 0.995,
            epsilon_min: 0.05,
        }
    }
}

impl LearningConfig {
    /// The first tuning, paired with [`RewardConfig::classic`](crate::RewardConfig::classic).
    pub fn classic() -> Self {
        Self {
            learning_rate: 0.1,
            discount_factor: 0.9,
            ..Self::default()
        }
    }

    /// A configuration that never explores, for greedy evaluation runs.
    pub fn greedy() -> Self {
        Self {
            epsilon: 0.0,
            epsilon_min: 0.0,
            ..Self::default()
        }
    }

    /// Validates the hyperparameters.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(ConfigError::LearningRate(self.learning_rate));
        }
        if !(0.0..=1.0).contains(&self.discount_factor) {
            return Err(ConfigError::DiscountFactor(self.discount_factor));
        }
        let schedule_ok = (0.0..=1.0).contains(&self.epsilon)
            && (0.0..=self.epsilon).contains(&self.epsilon_min)
            && self.epsilon_decay > 0.0
            && self.epsilon_decay <= 1.0;
        if !schedule_ok {
            return Err(ConfigError::EpsilonSchedule);
        }
        Ok(())
    }
}

/// The tabular Q-learning engine shared across the episodes of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningEngine {
    /// The learned Q-values.
    table: QTable,
    /// The configuration for the learning process.
    config: LearningConfig,
    /// The current exploration rate.
    epsilon: f64,
    /// Statistics on the total number of learning updates performed.
    total_updates: u64,
    /// Statistics on the total number of episodes completed.
    total_episodes: u64,
}

impl LearningEngine {
    /// Creates an engine with an empty table of `num_actions` columns.
    pub fn new(num_actions: usize, config: LearningConfig) -> Self {
        Self::with_table(QTable::new(num_actions), config)
    }

    /// Creates an engine around an existing table, e.g. one loaded from disk.
    pub fn with_table(table: QTable, config: LearningConfig) -> Self {
        Self {
            table,
            epsilon: config.epsilon,
            config,
            total_updates: 0,
            total_episodes: 0,
        }
    }

    /// Epsilon-greedy selection at the current exploration rate.
    pub fn select<R: Rng>(&self, state: &StateKey, rng: &mut R) -> usize {
        self.table.select(state, self.epsilon, rng)
    }

    /// The best known action for `state`, ignoring exploration.
    pub fn greedy(&self, state: &StateKey) -> usize {
        self.table.best_action(state)
    }

    /// Performs a Q-learning update with the configured rate and discount.
    pub fn update(
        &mut self,
        state: &StateKey,
        action: usize,
        reward: f64,
        next_state: &StateKey,
    ) -> Result<f64> {
        let value = self.table.update(
            state,
            action,
            reward,
            next_state,
            self.config.learning_rate,
            self.config.discount_factor,
        )?;
        self.total_updates += 1;
        Ok(value)
    }

    /// Decays the exploration rate, never below the configured floor.
    pub fn decay_exploration(&mut self) {
        self.epsilon = (self.epsilon * self.config.epsilon_decay).max(self.config.epsilon_min);
    }

    /// Marks the end of a learning episode and decays epsilon.
    pub fn end_episode(&mut self) {
        self.total_episodes += 1;
        self.decay_exploration();
    }

    /// Returns the current exploration rate (epsilon).
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Overrides the current exploration rate, e.g. `0.0` for evaluation.
    pub fn set_epsilon(&mut self, epsilon: f64) {
        self.epsilon = epsilon.clamp(0.0, 1.0);
    }

    /// Returns the total number of learning updates performed.
    pub fn total_updates(&self) -> u64 {
        self.total_updates
    }

    /// Returns the total number of episodes completed.
    pub fn total_episodes(&self) -> u64 {
        self.total_episodes
    }

    /// Returns the number of distinct states in the table.
    pub fn state_count(&self) -> usize {
        self.table.len()
    }

    /// Returns a reference to the Q-table.
    pub fn table(&self) -> &QTable {
        &self.table
    }

    /// Consumes the engine, returning its table.
    pub fn into_table(self) -> QTable {
        self.table
    }

    /// Returns a reference to the learning configuration.
    pub fn config(&self) -> &LearningConfig {
        &self.config
    }

    /// Clears all learned values and counters and restores the initial epsilon.
    pub fn reset(&mut self) {
        self.table.clear();
        self.epsilon = self.config.epsilon;
        self.total_updates = 0;
        self.total_episodes = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{AggregateState, BatteryBucket};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn state(all_clean: bool) -> StateKey {
        StateKey::Aggregate(AggregateState {
            battery: BatteryBucket::High,
            bin_full: false,
            all_clean,
        })
    }

    #[test]
    fn test_learning_engine_creation() {
        let engine = LearningEngine::new(4, LearningConfig::default());
        assert_eq!(engine.total_updates(), 0);
        assert_eq!(engine.state_count(), 0);
        assert_eq!(engine.epsilon(), 1.0);
        assert_eq!(engine.table().num_actions(), 4);
    }

    #[test]
    fn test_update_uses_configured_rates() {
        let config = LearningConfig {
            learning_rate: 0.5,
            discount_factor: 0.0,
            ..Default::default()
        };
        let mut engine = LearningEngine::new(4, config);
        let value = engine.update(&state(false), 1, 10.0, &state(true)).unwrap();
        assert_eq!(value, 5.0);
        assert_eq!(engine.total_updates(), 1);
        assert_eq!(engine.state_count(), 2);
    }

    #[test]
    fn test_failed_update_is_not_counted() {
        let mut engine = LearningEngine::new(4, LearningConfig::default());
        assert!(engine.update(&state(false), 4, 1.0, &state(true)).is_err());
        assert_eq!(engine.total_updates(), 0);
    }

    #[test]
    fn test_greedy_after_learning() {
        let mut engine = LearningEngine::new(4, LearningConfig::greedy());
        engine.update(&state(false), 2, 10.0, &state(true)).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(engine.greedy(&state(false)), 2);
        assert_eq!(engine.select(&state(false), &mut rng), 2);
    }

    #[test]
    fn test_epsilon_decay_respects_floor() {
        let config = LearningConfig {
            epsilon: 1.0,
            epsilon_decay: 0.5,
            epsilon_min: 0.1,
            ..Default::default()
        };
        let mut engine = LearningEngine::new(4, config);

        engine.decay_exploration();
        assert_eq!(engine.epsilon(), 0.5);

        for _ in 0..10 {
            engine.end_episode();
        }
        assert_eq!(engine.epsilon(), 0.1);
        assert_eq!(engine.total_episodes(), 10);
    }

    #[test]
    fn test_set_epsilon_clamps() {
        let mut engine = LearningEngine::new(4, LearningConfig::default());
        engine.set_epsilon(2.0);
        assert_eq!(engine.epsilon(), 1.0);
        engine.set_epsilon(-1.0);
        assert_eq!(engine.epsilon(), 0.0);
    }

    #[test]
    fn test_reset() {
        let mut engine = LearningEngine::new(4, LearningConfig::default());
        engine.update(&state(false), 0, 1.0, &state(true)).unwrap();
        engine.end_episode();
        engine.reset();
        assert_eq!(engine.state_count(), 0);
        assert_eq!(engine.total_updates(), 0);
        assert_eq!(engine.total_episodes(), 0);
        assert_eq!(engine.epsilon(), 1.0);
    }

    #[test]
    fn test_config_validation() {
        assert!(LearningConfig::default().validate().is_ok());
        assert!(LearningConfig::classic().validate().is_ok());
        assert!(LearningConfig::greedy().validate().is_ok());

        let config = LearningConfig {
            learning_rate: 0.0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::LearningRate(0.0)));

        let config = LearningConfig {
            discount_factor: 1.5,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::DiscountFactor(1.5)));

        let config = LearningConfig {
            epsilon: 0.1,
            epsilon_min: 0.5,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::EpsilonSchedule));
    }
}
