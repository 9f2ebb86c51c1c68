//! Goal-directed control: the policy picks a goal, BFS plans the route.

use super::{Agent, ControlScheme, SchemeKind, StepOutcome};
use crate::error::{Error, Result};
use crate::grid::{GridMap, Tile};
use crate::pathfinding::{find_path, PathResult};
use crate::state::{AggregateState, StateKey};
use crate::types::Cell;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// A high-level intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Goal {
    Clean,
    Dump,
    Charge,
    Idle,
}

impl Goal {
    /// All goals in policy index order.
    pub const ALL: [Goal; 4] = [Goal::Clean, Goal::Dump, Goal::Charge, Goal::Idle];

    /// Goals tried, in order, when the requested one cannot be planned.
    const FALLBACK: [Goal; 3] = [Goal::Clean, Goal::Dump, Goal::Charge];

    /// Policy column for this goal.
    pub fn index(self) -> usize {
        match self {
            Goal::Clean => 0,
            Goal::Dump => 1,
            Goal::Charge => 2,
            Goal::Idle => 3,
        }
    }

    /// Goal for a policy column.
    pub fn from_index(index: usize) -> Option<Goal> {
        Goal::ALL.get(index).copied()
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Goal::Clean => "clean",
            Goal::Dump => "dump",
            Goal::Charge => "charge",
            Goal::Idle => "idle",
        };
        f.write_str(name)
    }
}

/// Planning state of a goal-directed agent: the goal being pursued and the
/// cells still to walk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoalDirected {
    goal: Option<Goal>,
    path: VecDeque<Cell>,
}

impl GoalDirected {
    /// The goal currently pursued, if any.
    pub fn goal(&self) -> Option<Goal> {
        self.goal
    }

    /// Remaining queued cells, next step first.
    pub fn path(&self) -> &VecDeque<Cell> {
        &self.path
    }
}

impl ControlScheme for GoalDirected {
    const NUM_CHOICES: usize = Goal::ALL.len();

    fn kind() -> SchemeKind {
        SchemeKind::GoalDirected
    }

    fn discretize(agent: &Agent<Self>, grid: &GridMap) -> StateKey {
        AggregateState::observe(agent.vitals(), grid, &agent.config).into()
    }

    fn act(agent: &mut Agent<Self>, choice: usize, grid: &mut GridMap) -> Result<StepOutcome> {
        let goal = Goal::from_index(choice)
            .ok_or_else(|| Error::Policy(format!("no goal with index {}", choice)))?;
        Ok(agent.tick(grid, goal))
    }

    fn reset(&mut self) {
        self.goal = None;
        self.path.clear();
    }
}

impl Agent<GoalDirected> {
    /// Plans a route for `goal`.
    ///
    /// On success the route replaces the queue and `goal` becomes current.
    /// When the agent already stands on a target the queue is emptied and the
    /// next [`interact`](Self::interact) acts on it. On failure nothing
    /// changes. `Idle` never plans.
    pub fn plan(&mut self, grid: &GridMap, goal: Goal) -> bool {
        let targets = match goal {
            Goal::Clean => grid.dirt_targets(),
            Goal::Dump => grid.bin_targets().to_vec(),
            Goal::Charge => grid.charger_targets().to_vec(),
            Goal::Idle => return false,
        };

        match find_path(grid, self.position, &targets) {
            PathResult::Found(path) => {
                self.scheme.path = path.into();
                self.scheme.goal = Some(goal);
                true
            }
            PathResult::AlreadyThere => {
                self.scheme.path.clear();
                self.scheme.goal = Some(goal);
                true
            }
            PathResult::Unreachable => false,
        }
    }

    /// Plans `goal`, falling back to Clean, Dump and Charge in that order.
    ///
    /// Returns the goal that was planned, or `Idle` with an empty queue when
    /// nothing can be reached.
    pub fn plan_with_fallback(&mut self, grid: &GridMap, goal: Goal) -> Goal {
        if self.plan(grid, goal) {
            return goal;
        }
        for fallback in Goal::FALLBACK {
            if fallback != goal && self.plan(grid, fallback) {
                log::debug!("Cannot plan {}, falling back to {}", goal, fallback);
                return fallback;
            }
        }
        log::debug!("Nothing reachable from {}, idling", self.position);
        self.scheme.goal = Some(Goal::Idle);
        self.scheme.path.clear();
        Goal::Idle
    }

    /// Advances one cell along the queued path.
    ///
    /// Returns `(reward, terminal)`. An empty queue is an idle tick. A queued
    /// cell that has become an obstacle costs the wall penalty, the agent
    /// stays put and the rest of the stale route is dropped.
    pub fn move_step(&mut self, grid: &GridMap) -> (f64, bool) {
        let rewards = self.config.rewards;
        let Some(next) = self.scheme.path.pop_front() else {
            return (rewards.step, false);
        };

        if grid.tile(next).is_obstacle() {
            log::warn!("Path step {} is blocked, dropping route", next);
            self.scheme.path.clear();
            return (rewards.wall, false);
        }

        self.commit_move(next);
        if !self.alive {
            return (rewards.death, true);
        }
        (rewards.step, false)
    }

    /// Acts on the tile under the agent and returns the reward.
    ///
    /// Dirt is collected while the bin has room, a bin tile empties a
    /// non-empty bin, and a charger adds one charge step up to the maximum.
    /// Anything else is a no-op worth nothing.
    pub fn interact(&mut self, grid: &mut GridMap) -> f64 {
        let rewards = self.config.rewards;
        match grid.tile(self.position) {
            Tile::Dirt => {
                if self.collect_dirt(grid) {
                    rewards.clean
                } else {
                    0.0
                }
            }
            Tile::Bin if self.bin > 0 => {
                self.bin = 0;
                rewards.dump
            }
            Tile::Charger if self.battery < self.config.battery.max => {
                self.battery = (self.battery + self.config.battery.charge_step)
                    .min(self.config.battery.max);
                rewards.charge_trickle
            }
            _ => 0.0,
        }
    }

    /// One full tick: choose what to pursue, move, then interact.
    ///
    /// An agent on a charger below full battery stays there and charges.
    /// Otherwise a new plan is made for `goal` only when the queue has run
    /// out; an unfinished route is followed to its end first. The returned
    /// choice is the goal actually pursued.
    pub fn tick(&mut self, grid: &mut GridMap, goal: Goal) -> StepOutcome {
        let death = self.config.rewards.death;
        if !self.alive {
            return StepOutcome {
                reward: death,
                terminal: true,
                choice: goal.index(),
            };
        }

        let pursued = if grid.tile(self.position) == Tile::Charger
            && self.battery < self.config.battery.max
        {
            self.scheme.goal = Some(Goal::Charge);
            self.scheme.path.clear();
            Goal::Charge
        } else if self.scheme.path.is_empty() {
            self.plan_with_fallback(grid, goal)
        } else {
            self.scheme.goal.unwrap_or(goal)
        };

        let (mut reward, mut terminal) = self.move_step(grid);
        if !terminal {
            reward += self.interact(grid);
        }

        if !self.alive {
            reward = death;
            terminal = true;
        }

        StepOutcome {
            reward,
            terminal,
            choice: pursued.index(),
        }
    }
}
