//! Episode orchestration.
//!
//! The [`EpisodeDriver`] owns one agent, one map and the learning engine and
//! runs the decide, execute, learn cycle:
//!
//! 1. discretize the situation,
//! 2. let the policy pick a choice,
//! 3. carry it out on the map,
//! 4. possibly respawn a little dirt,
//! 5. update the policy with the observed reward and next state,
//!
//! until the agent dies or the step cap is hit. Exploration decays once per
//! training episode.

use crate::agent::{Agent, ControlScheme};
use crate::config::AgentConfig;
use crate::environment::{spawn_dirt, MapSource};
use crate::error::{Error, Result};
use crate::grid::GridMap;
use crate::learning::{LearningConfig, LearningEngine};
use crate::persistence::CheckpointManager;
use crate::types::Cell;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Settings of a training or evaluation run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Number of training episodes.
    pub episodes: u64,
    /// Hard cap on ticks per episode.
    pub max_steps: usize,
    /// Chance per tick that dirt appears on a random empty cell.
    pub dirt_spawn_chance: f64,
    /// Log a progress line every this many episodes; `0` disables it.
    pub log_every: u64,
    /// Seed for map generation and exploration. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            episodes: 20_000,
            max_steps: 500,
            dirt_spawn_chance: 0.0,
            log_every: 1000,
            seed: None,
        }
    }
}

/// What happened during one episode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpisodeStats {
    /// Zero-based index of the episode within its run.
    pub episode: u64,
    pub total_reward: f64,
    pub steps: usize,
    /// Dirt tiles the agent removed.
    pub cleaned: u32,
    /// Dirt left on the map at the end.
    pub dirt_left: usize,
    /// The battery ran out.
    pub died: bool,
    /// Exploration rate the episode was played with.
    pub epsilon: f64,
}

/// Mean total reward over `stats`, `0.0` when empty.
pub fn mean_reward(stats: &[EpisodeStats]) -> f64 {
    if stats.is_empty() {
        return 0.0;
    }
    stats.iter().map(|s| s.total_reward).sum::<f64>() / stats.len() as f64
}

/// Runs episodes for one agent against a learning engine.
pub struct EpisodeDriver<C: ControlScheme> {
    agent: Agent<C>,
    grid: GridMap,
    engine: LearningEngine,
    source: MapSource,
    start: Cell,
    training: TrainingConfig,
    rng: StdRng,
    checkpoints: Option<CheckpointManager>,
}

impl<C: ControlScheme + Default> EpisodeDriver<C> {
    /// Creates a driver with a fresh, empty policy.
    pub fn new(
        config: AgentConfig,
        learning: LearningConfig,
        source: MapSource,
        training: TrainingConfig,
    ) -> Result<Self> {
        learning.validate()?;
        Self::with_engine(config, LearningEngine::new(C::NUM_CHOICES, learning), source, training)
    }

    /// Creates a driver around an existing engine, e.g. a loaded policy.
    ///
    /// Fails if the engine's table was built for a different number of
    /// choices than the scheme `C` has.
    pub fn with_engine(
        config: AgentConfig,
        engine: LearningEngine,
        source: MapSource,
        training: TrainingConfig,
    ) -> Result<Self> {
        config.validate()?;
        if engine.table().num_actions() != C::NUM_CHOICES {
            return Err(Error::Policy(format!(
                "policy has {} choices, the {} scheme needs {}",
                engine.table().num_actions(),
                C::kind(),
                C::NUM_CHOICES
            )));
        }

        let mut rng = match training.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        let room = source.build(&mut rng)?;

        Ok(Self {
            agent: Agent::new(room.start, config),
            grid: room.grid,
            engine,
            source,
            start: room.start,
            training,
            rng,
            checkpoints: None,
        })
    }
}

impl<C: ControlScheme> EpisodeDriver<C> {
    /// Saves checkpoints through `manager` while training.
    pub fn with_checkpoints(mut self, manager: CheckpointManager) -> Self {
        self.checkpoints = Some(manager);
        self
    }

    /// Builds the next map and puts a fresh agent on its start cell.
    ///
    /// A persistent map is left as the last episode left it.
    pub fn reset_episode(&mut self) -> Result<()> {
        if !self.source.is_persistent() {
            let room = self.source.build(&mut self.rng)?;
            self.grid = room.grid;
            self.start = room.start;
        }
        self.agent.reset(self.start);
        Ok(())
    }

    /// Plays one episode on a fresh map.
    ///
    /// With `learn` set the policy explores and is updated every tick and
    /// epsilon decays at the end; otherwise the policy is followed greedily
    /// and left untouched.
    pub fn run_episode(&mut self, episode: u64, learn: bool) -> Result<EpisodeStats> {
        self.reset_episode()?;

        let epsilon = if learn { self.engine.epsilon() } else { 0.0 };
        let mut total_reward = 0.0;
        let mut steps = 0;
        let mut state = self.agent.discretize(&self.grid);

        while steps < self.training.max_steps {
            let choice = if learn {
                self.engine.select(&state, &mut self.rng)
            } else {
                self.engine.greedy(&state)
            };

            let outcome = self.agent.act(choice, &mut self.grid)?;
            spawn_dirt(&mut self.grid, self.training.dirt_spawn_chance, &mut self.rng);
            let next_state = self.agent.discretize(&self.grid);

            if learn {
                self.engine
                    .update(&state, outcome.choice, outcome.reward, &next_state)?;
            }

            state = next_state;
            total_reward += outcome.reward;
            steps += 1;

            if outcome.terminal {
                break;
            }
        }

        if learn {
            self.engine.end_episode();
        }

        Ok(EpisodeStats {
            episode,
            total_reward,
            steps,
            cleaned: self.agent.cleaned(),
            dirt_left: self.grid.dirt_count(),
            died: !self.agent.is_alive(),
            epsilon,
        })
    }

    /// Runs the configured number of training episodes.
    pub fn train(&mut self) -> Result<Vec<EpisodeStats>> {
        let episodes = self.training.episodes;
        let log_every = self.training.log_every;
        log::info!(
            "Starting {} scheme training for {} episodes",
            C::kind(),
            episodes
        );

        let mut history = Vec::with_capacity(episodes as usize);
        for episode in 0..episodes {
            let stats = self.run_episode(episode, true)?;
            history.push(stats);

            if log_every > 0 && episode % log_every == 0 {
                let window = history.len().min(log_every as usize);
                log::info!(
                    "Episode {} | avg reward (last {}): {:.1} | epsilon: {:.2}",
                    episode,
                    window,
                    mean_reward(&history[history.len() - window..]),
                    self.engine.epsilon()
                );
            }

            let completed = episode + 1;
            if let Some(manager) = self.checkpoints.as_mut() {
                if manager.should_checkpoint(completed) {
                    manager.save_checkpoint(&self.engine, completed)?;
                }
            }
        }

        log::info!(
            "Training complete: {} states learned, {} updates",
            self.engine.state_count(),
            self.engine.total_updates()
        );
        Ok(history)
    }

    /// Plays `runs` greedy episodes without learning.
    pub fn evaluate(&mut self, runs: u64) -> Result<Vec<EpisodeStats>> {
        let mut results = Vec::with_capacity(runs as usize);
        for run in 0..runs {
            let stats = self.run_episode(run, false)?;
            log::debug!(
                "Evaluation run {}: reward {:.1}, cleaned {}, steps {}{}",
                run,
                stats.total_reward,
                stats.cleaned,
                stats.steps,
                if stats.died { ", died" } else { "" }
            );
            results.push(stats);
        }
        Ok(results)
    }

    pub fn agent(&self) -> &Agent<C> {
        &self.agent
    }

    pub fn grid(&self) -> &GridMap {
        &self.grid
    }

    pub fn engine(&self) -> &LearningEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut LearningEngine {
        &mut self.engine
    }

    /// Consumes the driver, returning the trained engine.
    pub fn into_engine(self) -> LearningEngine {
        self.engine
    }
}
