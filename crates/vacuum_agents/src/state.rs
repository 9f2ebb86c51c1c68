//! State discretization.
//!
//! Turns the agent's raw physical state and the grid into a small, hashable
//! [`StateKey`] that indexes the Q-table. Each control scheme owns one key
//! variant; the two never mix inside one table.

use crate::config::{AgentConfig, BatteryThresholds};
use crate::grid::{GridMap, Tile};
use crate::types::Cell;
use serde::{Deserialize, Serialize};

/// Coarse battery level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BatteryBucket {
    Critical = 0,
    Low = 1,
    High = 2,
}

impl BatteryBucket {
    /// Buckets `battery` against `thresholds` scaled by `max`.
    pub fn classify(battery: i32, max: i32, thresholds: &BatteryThresholds) -> Self {
        let level = battery as f64;
        let max = max as f64;
        if level < thresholds.critical * max {
            BatteryBucket::Critical
        } else if level < thresholds.low * max {
            BatteryBucket::Low
        } else {
            BatteryBucket::High
        }
    }
}

/// The raw quantities discretization reads from an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vitals {
    pub position: Cell,
    pub battery: i32,
    pub bin: u32,
}

/// Local-sensor state: the four neighbours, the current tile, the battery
/// bucket and whether the bin is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalState {
    pub north: Tile,
    pub south: Tile,
    pub east: Tile,
    pub west: Tile,
    pub current: Tile,
    pub battery: BatteryBucket,
    pub bin_full: bool,
}

impl LocalState {
    /// Reads the local-sensor state. Pure.
    pub fn observe(vitals: Vitals, grid: &GridMap, config: &AgentConfig) -> Self {
        let [north, south, east, west, current] = grid.local_sensors(vitals.position);
        Self {
            north,
            south,
            east,
            west,
            current,
            battery: BatteryBucket::classify(
                vitals.battery,
                config.battery.max,
                &config.local_thresholds,
            ),
            bin_full: vitals.bin >= config.bin.capacity,
        }
    }
}

/// Aggregate state for goal selection: battery bucket, bin full, and
/// whether the grid is clean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AggregateState {
    pub battery: BatteryBucket,
    pub bin_full: bool,
    /// `true` once no dirt is left anywhere on the grid.
    pub all_clean: bool,
}

impl AggregateState {
    /// Reads the aggregate state. Pure; scans the whole grid once.
    pub fn observe(vitals: Vitals, grid: &GridMap, config: &AgentConfig) -> Self {
        Self {
            battery: BatteryBucket::classify(
                vitals.battery,
                config.battery.max,
                &config.aggregate_thresholds,
            ),
            bin_full: vitals.bin >= config.bin.capacity,
            all_clean: grid.dirt_count() == 0,
        }
    }
}

/// A discretized state, one variant per control scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateKey {
    Local(LocalState),
    Aggregate(AggregateState),
}

impl From<LocalState> for StateKey {
    fn from(state: LocalState) -> Self {
        StateKey::Local(state)
    }
}

impl From<AggregateState> for StateKey {
    fn from(state: AggregateState) -> Self {
        StateKey::Aggregate(state)
    }
}
