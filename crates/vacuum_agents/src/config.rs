//! Configuration for vacuum agents.
//!
//! Every physical limit and reward magnitude lives in an immutable
//! [`AgentConfig`] handed to the agent at construction. Two historical reward
//! tunings are kept as named presets; see [`RewardConfig::classic`] and
//! [`RewardConfig::efficiency`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Environment variable selecting the reward preset (`classic` or `efficiency`).
pub const ENV_REWARD_PRESET: &str = "VACUUM_REWARD_PRESET";
/// Environment variable overriding the battery capacity.
pub const ENV_MAX_BATTERY: &str = "VACUUM_MAX_BATTERY";
/// Environment variable overriding the bin capacity.
pub const ENV_BIN_CAPACITY: &str = "VACUUM_BIN_CAPACITY";

/// Battery capacity and per-operation costs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatteryConfig {
    /// Full charge.
    pub max: i32,
    /// Drained by every committed move.
    pub move_cost: i32,
    /// Drained by every successful clean.
    pub clean_cost: i32,
    /// Restored per `interact` on a charger in the goal-directed scheme.
    pub charge_step: i32,
    /// The direct-action `Charge` only pays a reward below this level.
    pub charge_needed_below: i32,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            max: 200,
            move_cost: 1,
            clean_cost: 2,
            charge_step: 10,
            charge_needed_below: 100,
        }
    }
}

/// Debris bin capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinConfig {
    pub capacity: u32,
}

impl Default for BinConfig {
    fn default() -> Self {
        Self { capacity: 5 }
    }
}

/// Reward magnitudes for every outcome the agent can produce.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RewardConfig {
    /// Dirt removed.
    pub clean: f64,
    /// Direct-action charge while the battery actually needed it.
    pub charge: f64,
    /// Goal-directed trickle charge on a charger tile.
    pub charge_trickle: f64,
    /// Bin emptied.
    pub dump: f64,
    /// Baseline per-tick reward.
    pub step: f64,
    /// Baseline per-tick reward while the battery is critical.
    pub step_critical: f64,
    /// Walking into an obstacle.
    pub wall: f64,
    /// Extra penalty when a move left the position unchanged.
    pub bump: f64,
    /// Cleaning dirt with a full bin.
    pub bin_full: f64,
    /// Cleaning a tile with nothing to clean.
    pub wasted_action: f64,
    /// Charging off a charger or dumping off a bin.
    pub misplaced_action: f64,
    /// Battery depleted.
    pub death: f64,
}

impl RewardConfig {
    /// The first tuning: modest rewards, mild penalties.
    pub fn classic() -> Self {
        Self {
            clean: 20.0,
            charge: 20.0,
            charge_trickle: 5.0,
            dump: 20.0,
            step: -1.0,
            step_critical: -2.0,
            wall: -10.0,
            bump: -2.0,
            bin_full: -5.0,
            wasted_action: -1.0,
            misplaced_action: -3.0,
            death: -100.0,
        }
    }

    /// The later tuning: dirt is worth more, walls and death hurt more.
    pub fn efficiency() -> Self {
        Self {
            clean: 50.0,
            charge: 50.0,
            charge_trickle: 5.0,
            dump: 50.0,
            step: -1.0,
            step_critical: -3.0,
            wall: -20.0,
            bump: -5.0,
            bin_full: -10.0,
            wasted_action: -2.0,
            misplaced_action: -5.0,
            death: -200.0,
        }
    }

    /// Returns the rewards for a named preset.
    pub fn preset(preset: RewardPreset) -> Self {
        match preset {
            RewardPreset::Classic => Self::classic(),
            RewardPreset::Efficiency => Self::efficiency(),
        }
    }
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self::efficiency()
    }
}

/// Named reward tunings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RewardPreset {
    Classic,
    #[default]
    Efficiency,
}

impl RewardPreset {
    /// Both presets, for parameterized tests and sweeps.
    pub const ALL: [RewardPreset; 2] = [RewardPreset::Classic, RewardPreset::Efficiency];
}

impl FromStr for RewardPreset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "classic" => Ok(RewardPreset::Classic),
            "efficiency" => Ok(RewardPreset::Efficiency),
            other => Err(ConfigError::UnknownPreset(other.to_string())),
        }
    }
}

impl fmt::Display for RewardPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RewardPreset::Classic => write!(f, "classic"),
            RewardPreset::Efficiency => write!(f, "efficiency"),
        }
    }
}

/// Battery bucket boundaries, as fractions of the battery capacity.
///
/// A battery strictly below `critical * max` is critical, strictly below
/// `low * max` is low, anything else is high.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatteryThresholds {
    pub critical: f64,
    pub low: f64,
}

impl BatteryThresholds {
    /// Creates a new threshold pair.
    pub const fn new(critical: f64, low: f64) -> Self {
        Self { critical, low }
    }
}

impl Default for BatteryThresholds {
    fn default() -> Self {
        Self::new(0.2, 0.6)
    }
}

/// The complete, immutable configuration of an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AgentConfig {
    pub battery: BatteryConfig,
    pub bin: BinConfig,
    pub rewards: RewardConfig,
    /// Buckets used by the local-sensor state.
    pub local_thresholds: BatteryThresholds,
    /// Buckets used by the aggregate state (40 / 120 of a 200 battery).
    pub aggregate_thresholds: BatteryThresholds,
}

impl AgentConfig {
    /// Returns the default configuration with the rewards of `preset`.
    pub fn with_preset(preset: RewardPreset) -> Self {
        Self {
            rewards: RewardConfig::preset(preset),
            ..Default::default()
        }
    }

    /// Replaces the reward table.
    pub fn with_rewards(mut self, rewards: RewardConfig) -> Self {
        self.rewards = rewards;
        self
    }

    /// Replaces the battery settings.
    pub fn with_battery(mut self, battery: BatteryConfig) -> Self {
        self.battery = battery;
        self
    }

    /// Sets the bin capacity.
    pub fn with_bin_capacity(mut self, capacity: u32) -> Self {
        self.bin.capacity = capacity;
        self
    }

    /// Builds a configuration from `VACUUM_*` environment variables,
    /// falling back to defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let mut config = match std::env::var(ENV_REWARD_PRESET) {
            Ok(name) => match name.parse::<RewardPreset>() {
                Ok(preset) => Self::with_preset(preset),
                Err(e) => {
                    log::warn!("Ignoring {}: {}", ENV_REWARD_PRESET, e);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        };

        if let Ok(max_str) = std::env::var(ENV_MAX_BATTERY) {
            if let Some(max) = parse_env_value(ENV_MAX_BATTERY, &max_str) {
                config.battery.max = max;
            }
        }

        if let Ok(capacity_str) = std::env::var(ENV_BIN_CAPACITY) {
            if let Some(capacity) = parse_env_value(ENV_BIN_CAPACITY, &capacity_str) {
                config.bin.capacity = capacity;
            }
        }

        config
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.battery.max <= 0 {
            return Err(ConfigError::NonPositiveBattery(self.battery.max));
        }
        if self.battery.move_cost < 0 || self.battery.clean_cost < 0 || self.battery.charge_step < 0
        {
            return Err(ConfigError::NegativeCost);
        }
        if self.bin.capacity == 0 {
            return Err(ConfigError::ZeroBinCapacity);
        }
        for thresholds in [self.local_thresholds, self.aggregate_thresholds] {
            if !(0.0..=1.0).contains(&thresholds.critical)
                || !(0.0..=1.0).contains(&thresholds.low)
                || thresholds.critical > thresholds.low
            {
                return Err(ConfigError::InvalidThresholds {
                    critical: thresholds.critical,
                    low: thresholds.low,
                });
            }
        }
        Ok(())
    }
}

/// Defines errors that can occur during configuration validation.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The battery capacity must be positive.
    NonPositiveBattery(i32),
    /// Battery costs must not be negative.
    NegativeCost,
    /// The bin must hold at least one unit.
    ZeroBinCapacity,
    /// Bucket thresholds must lie in `[0, 1]` with `critical <= low`.
    InvalidThresholds { critical: f64, low: f64 },
    /// The learning rate must lie in `(0, 1]`.
    LearningRate(f64),
    /// The discount factor must lie in `[0, 1]`.
    DiscountFactor(f64),
    /// The epsilon schedule must satisfy `0 <= min <= initial <= 1` and
    /// `0 < decay <= 1`.
    EpsilonSchedule,
    /// An unknown reward preset name.
    UnknownPreset(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NonPositiveBattery(max) => {
                write!(f, "Battery capacity must be positive, got {}", max)
            }
            ConfigError::NegativeCost => write!(f, "Battery costs must not be negative"),
            ConfigError::ZeroBinCapacity => write!(f, "Bin capacity must be at least 1"),
            ConfigError::InvalidThresholds { critical, low } => write!(
                f,
                "Invalid battery thresholds: critical={} low={}",
                critical, low
            ),
            ConfigError::LearningRate(lr) => {
                write!(f, "Learning rate must be in (0, 1], got {}", lr)
            }
            ConfigError::DiscountFactor(gamma) => {
                write!(f, "Discount factor must be in [0, 1], got {}", gamma)
            }
            ConfigError::EpsilonSchedule => write!(f, "Invalid epsilon schedule"),
            ConfigError::UnknownPreset(name) => write!(f, "Unknown reward preset: {}", name),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Parses one environment value, warning and returning `None` when it does
/// not parse.
fn parse_env_value<T>(name: &str, value: &str) -> Option<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match value.trim().parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            log::warn!("Ignoring {}={:?}: {}", name, value, e);
            None
        }
    }
}
