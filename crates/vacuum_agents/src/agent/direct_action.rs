//! Direct control: the policy picks a primitive action every tick.

use super::{Agent, ControlScheme, SchemeKind, StepOutcome};
use crate::error::{Error, Result};
use crate::grid::{GridMap, Tile};
use crate::state::{BatteryBucket, LocalState, StateKey};
use crate::types::{Cell, Direction};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A primitive action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Up,
    Down,
    Right,
    Left,
    Clean,
    Charge,
    Dump,
}

impl Action {
    /// All actions in policy index order.
    pub const ALL: [Action; 7] = [
        Action::Up,
        Action::Down,
        Action::Right,
        Action::Left,
        Action::Clean,
        Action::Charge,
        Action::Dump,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Action> {
        Action::ALL.get(index).copied()
    }

    /// The direction of a move action.
    pub fn direction(self) -> Option<Direction> {
        match self {
            Action::Up => Some(Direction::Up),
            Action::Down => Some(Direction::Down),
            Action::Right => Some(Direction::Right),
            Action::Left => Some(Direction::Left),
            Action::Clean | Action::Charge | Action::Dump => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::Up => "up",
            Action::Down => "down",
            Action::Right => "right",
            Action::Left => "left",
            Action::Clean => "clean",
            Action::Charge => "charge",
            Action::Dump => "dump",
        };
        f.write_str(name)
    }
}

/// Marker scheme for direct action control. Holds no planning state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectAction;

impl ControlScheme for DirectAction {
    const NUM_CHOICES: usize = Action::ALL.len();

    fn kind() -> SchemeKind {
        SchemeKind::DirectAction
    }

    fn discretize(agent: &Agent<Self>, grid: &GridMap) -> StateKey {
        LocalState::observe(agent.vitals(), grid, &agent.config).into()
    }

    fn act(agent: &mut Agent<Self>, choice: usize, grid: &mut GridMap) -> Result<StepOutcome> {
        let action = Action::from_index(choice)
            .ok_or_else(|| Error::Policy(format!("no action with index {}", choice)))?;
        let (reward, terminal) = agent.step(action, grid);
        Ok(StepOutcome {
            reward,
            terminal,
            choice,
        })
    }

    fn reset(&mut self) {}
}

impl Agent<DirectAction> {
    /// Executes one primitive action and returns `(reward, terminal)`.
    pub fn step(&mut self, action: Action, grid: &mut GridMap) -> (f64, bool) {
        let rewards = self.config.rewards;
        if !self.alive {
            return (rewards.death, true);
        }

        let bucket = BatteryBucket::classify(
            self.battery,
            self.config.battery.max,
            &self.config.local_thresholds,
        );
        let mut reward = if bucket == BatteryBucket::Critical {
            rewards.step_critical
        } else {
            rewards.step
        };

        let start = self.position;
        let here = grid.tile(self.position);

        match action {
            Action::Up | Action::Down | Action::Right | Action::Left => {
                if let Some(direction) = action.direction() {
                    let (row, col) = self.position.offset(direction);
                    // Off-grid reads as wall, so a walkable tile is in bounds.
                    if grid.tile_at(row, col).is_obstacle() {
                        reward = rewards.wall;
                    } else {
                        self.commit_move(Cell::new(row as usize, col as usize));
                    }
                }
            }
            Action::Clean => {
                reward = if here != Tile::Dirt {
                    rewards.wasted_action
                } else if self.collect_dirt(grid) {
                    rewards.clean
                } else {
                    rewards.bin_full
                };
            }
            Action::Charge => {
                if here == Tile::Charger {
                    reward = if self.battery < self.config.battery.charge_needed_below {
                        rewards.charge
                    } else {
                        0.0
                    };
                    self.battery = self.config.battery.max;
                } else {
                    reward = rewards.misplaced_action;
                }
            }
            Action::Dump => {
                if here == Tile::Bin {
                    reward = if self.bin_is_full() { rewards.dump } else { 0.0 };
                    self.bin = 0;
                } else {
                    reward = rewards.misplaced_action;
                }
            }
        }

        if action.direction().is_some() && self.position == start {
            reward += rewards.bump;
        }

        if self.battery <= 0 {
            self.alive = false;
            return (rewards.death, true);
        }

        (reward, false)
    }
}
