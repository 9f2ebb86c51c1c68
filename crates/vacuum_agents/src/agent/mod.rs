//! The cleaning robot.
//!
//! An [`Agent`] owns the physical state shared by both execution models:
//! position, battery, bin fill, the alive flag and a counter of cleaned
//! tiles. What the agent *does* each tick is decided by its
//! [`ControlScheme`]:
//!
//! - [`GoalDirected`]: the policy picks a high-level [`Goal`]; BFS turns it
//!   into a path and the agent walks it one cell per tick.
//! - [`DirectAction`]: the policy picks one of seven primitive [`Action`]s.
//!
//! The two schemes never share a policy table; each discretizes into its own
//! [`StateKey`] variant and has its own number of choices.

mod direct_action;
mod goal_directed;

pub use direct_action::{Action, DirectAction};
pub use goal_directed::{Goal, GoalDirected};

use crate::config::AgentConfig;
use crate::error::Result;
use crate::grid::{GridMap, Tile};
use crate::state::{StateKey, Vitals};
use crate::types::Cell;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a control scheme, e.g. in logs and saved policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchemeKind {
    GoalDirected,
    DirectAction,
}

impl fmt::Display for SchemeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemeKind::GoalDirected => write!(f, "goal"),
            SchemeKind::DirectAction => write!(f, "direct"),
        }
    }
}

/// The result of one decide-execute tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    pub reward: f64,
    /// The episode is over; only set on death.
    pub terminal: bool,
    /// The choice index that was actually carried out, which is what the
    /// policy should be credited for.
    pub choice: usize,
}

/// How an agent turns a policy choice into behaviour.
///
/// Implementations hold whatever per-episode planning state they need; the
/// physical state lives on [`Agent`].
pub trait ControlScheme: Sized {
    /// Width of the policy rows for this scheme.
    const NUM_CHOICES: usize;

    /// Which scheme this is.
    fn kind() -> SchemeKind;

    /// Discretizes the agent's current situation.
    fn discretize(agent: &Agent<Self>, grid: &GridMap) -> StateKey;

    /// Carries out `choice` for one tick.
    ///
    /// Fails only if `choice` is not below [`ControlScheme::NUM_CHOICES`].
    fn act(agent: &mut Agent<Self>, choice: usize, grid: &mut GridMap) -> Result<StepOutcome>;

    /// Drops any per-episode planning state.
    fn reset(&mut self);
}

/// A cleaning robot driven by the control scheme `C`.
#[derive(Debug, Clone)]
pub struct Agent<C: ControlScheme> {
    position: Cell,
    battery: i32,
    bin: u32,
    alive: bool,
    cleaned: u32,
    config: AgentConfig,
    scheme: C,
}

impl<C: ControlScheme + Default> Agent<C> {
    /// Creates a fully charged agent with an empty bin at `start`.
    pub fn new(start: Cell, config: AgentConfig) -> Self {
        Self {
            position: start,
            battery: config.battery.max,
            bin: 0,
            alive: true,
            cleaned: 0,
            config,
            scheme: C::default(),
        }
    }
}

impl<C: ControlScheme> Agent<C> {
    /// Restores a fresh agent at `start`: full battery, empty bin, alive,
    /// nothing cleaned, and no planning state.
    pub fn reset(&mut self, start: Cell) {
        self.position = start;
        self.battery = self.config.battery.max;
        self.bin = 0;
        self.alive = true;
        self.cleaned = 0;
        self.scheme.reset();
    }

    /// Discretizes the current situation for the policy.
    pub fn discretize(&self, grid: &GridMap) -> StateKey {
        C::discretize(self, grid)
    }

    /// Carries out one policy choice.
    pub fn act(&mut self, choice: usize, grid: &mut GridMap) -> Result<StepOutcome> {
        C::act(self, choice, grid)
    }

    /// The raw quantities the discretizers read.
    pub fn vitals(&self) -> Vitals {
        Vitals {
            position: self.position,
            battery: self.battery,
            bin: self.bin,
        }
    }

    pub fn position(&self) -> Cell {
        self.position
    }

    pub fn battery(&self) -> i32 {
        self.battery
    }

    /// Current bin fill.
    pub fn bin(&self) -> u32 {
        self.bin
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Dirt tiles removed since the last reset.
    pub fn cleaned(&self) -> u32 {
        self.cleaned
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn scheme(&self) -> &C {
        &self.scheme
    }

    /// Overrides the battery level, clamped to `[0, max]`.
    ///
    /// Meant for scenario setup; the alive flag follows the new level.
    pub fn set_battery(&mut self, battery: i32) {
        self.battery = battery.clamp(0, self.config.battery.max);
        self.alive = self.battery > 0;
    }

    /// Overrides the bin fill, clamped to the capacity.
    pub fn set_bin(&mut self, bin: u32) {
        self.bin = bin.min(self.config.bin.capacity);
    }

    pub(crate) fn bin_has_room(&self) -> bool {
        self.bin < self.config.bin.capacity
    }

    pub(crate) fn bin_is_full(&self) -> bool {
        self.bin >= self.config.bin.capacity
    }

    /// Deducts `cost` from the battery, clamped at zero. The agent dies when
    /// the battery reaches zero.
    pub(crate) fn drain(&mut self, cost: i32) {
        self.battery = (self.battery - cost).max(0);
        if self.battery <= 0 {
            self.alive = false;
        }
    }

    /// Removes the dirt under the agent into the bin.
    ///
    /// Returns `false` without touching anything if the tile is not dirt or
    /// the bin is full.
    pub(crate) fn collect_dirt(&mut self, grid: &mut GridMap) -> bool {
        if grid.tile(self.position) != Tile::Dirt || !self.bin_has_room() {
            return false;
        }
        grid.set_tile(self.position, Tile::Empty);
        self.bin += 1;
        self.cleaned += 1;
        self.drain(self.config.battery.clean_cost);
        true
    }

    /// Moves onto `cell` and pays the move cost.
    pub(crate) fn commit_move(&mut self, cell: Cell) {
        self.position = cell;
        self.drain(self.config.battery.move_cost);
    }
}
