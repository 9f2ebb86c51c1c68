//! Vacuum Trainer - headless training and greedy evaluation
//!
//! Trains a vacuum agent policy on random rooms and saves it, or loads a saved
//! policy and runs it greedily.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use vacuum_agents::{
    mean_reward, AgentConfig, CheckpointManager, ControlScheme, DirectAction, EpisodeDriver,
    EpisodeStats, GoalDirected, LayoutConfig, LearningConfig, LearningEngine, MapSource,
    PersistenceOptions, PolicyPersistence, Result, RewardConfig, RewardPreset, TrainingConfig,
};

/// Vacuum agent trainer
#[derive(Parser, Debug)]
#[command(name = "vacuum-trainer")]
#[command(version)]
#[command(about = "Train and run Q-learning vacuum cleaner agents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train a new policy and save it
    Train(TrainArgs),
    /// Run a saved policy greedily
    Run(RunArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Scheme {
    /// Goal selection with BFS path planning
    Goal,
    /// Primitive actions from local sensors
    Direct,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Preset {
    Classic,
    Efficiency,
}

impl From<Preset> for RewardPreset {
    fn from(preset: Preset) -> Self {
        match preset {
            Preset::Classic => RewardPreset::Classic,
            Preset::Efficiency => RewardPreset::Efficiency,
        }
    }
}

/// Options shared by both subcommands.
#[derive(Args, Debug)]
struct WorldArgs {
    /// Control scheme
    #[arg(short, long, value_enum, default_value_t = Scheme::Goal)]
    scheme: Scheme,

    /// Reward preset; falls back to VACUUM_REWARD_PRESET, then efficiency
    #[arg(long, value_enum)]
    preset: Option<Preset>,

    /// Side length of the generated square rooms
    #[arg(long, default_value_t = 20)]
    grid_size: usize,

    /// Step cap per episode
    #[arg(long, default_value_t = 500)]
    max_steps: usize,

    /// Chance per tick that new dirt appears
    #[arg(long)]
    dirt_spawn: Option<f64>,

    /// Seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args, Debug)]
struct TrainArgs {
    #[command(flatten)]
    world: WorldArgs,

    /// Number of training episodes
    #[arg(short, long, default_value_t = 20_000)]
    episodes: u64,

    /// Where to write the trained policy
    #[arg(short, long, default_value = "policy.json")]
    output: PathBuf,

    /// Write periodic checkpoints into this directory
    #[arg(long)]
    checkpoint_dir: Option<PathBuf>,

    /// Episodes between checkpoints
    #[arg(long, default_value_t = 1000)]
    checkpoint_every: u64,

    /// Checkpoints to keep
    #[arg(long, default_value_t = 5)]
    keep_checkpoints: usize,

    /// Episodes between progress lines
    #[arg(long, default_value_t = 1000)]
    log_every: u64,

    /// Use the first learning tuning (lr 0.1, gamma 0.9)
    #[arg(long)]
    classic_learning: bool,
}

#[derive(Args, Debug)]
struct RunArgs {
    #[command(flatten)]
    world: WorldArgs,

    /// Saved policy to load
    #[arg(short, long)]
    policy: PathBuf,

    /// Number of greedy runs
    #[arg(short, long, default_value_t = 10)]
    runs: u64,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp_millis()
        .init();

    let result = match &cli.command {
        Command::Train(args) => match args.world.scheme {
            Scheme::Goal => train::<GoalDirected>(args),
            Scheme::Direct => train::<DirectAction>(args),
        },
        Command::Run(args) => match args.world.scheme {
            Scheme::Goal => run::<GoalDirected>(args),
            Scheme::Direct => run::<DirectAction>(args),
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn agent_config(world: &WorldArgs) -> AgentConfig {
    let config = AgentConfig::from_env();
    match world.preset {
        Some(preset) => config.with_rewards(RewardConfig::preset(preset.into())),
        None => config,
    }
}

fn training_config(world: &WorldArgs, episodes: u64, log_every: u64, spawn: f64) -> TrainingConfig {
    TrainingConfig {
        episodes,
        max_steps: world.max_steps,
        dirt_spawn_chance: world.dirt_spawn.unwrap_or(spawn),
        log_every,
        seed: world.seed,
    }
}

fn train<C: ControlScheme + Default>(args: &TrainArgs) -> Result<()> {
    let learning = if args.classic_learning {
        LearningConfig::classic()
    } else {
        LearningConfig::default()
    };
    let source = MapSource::Generated(LayoutConfig::square(args.world.grid_size));
    let training = training_config(&args.world, args.episodes, args.log_every, 0.0);

    let mut driver: EpisodeDriver<C> =
        EpisodeDriver::new(agent_config(&args.world), learning, source, training)?;
    if let Some(dir) = &args.checkpoint_dir {
        let manager =
            CheckpointManager::new(dir, args.keep_checkpoints).with_interval(args.checkpoint_every);
        driver = driver.with_checkpoints(manager);
    }

    let history = driver.train()?;
    let tail = &history[history.len().saturating_sub(1000)..];
    log::info!(
        "Average reward over the last {} episodes: {:.1}",
        tail.len(),
        mean_reward(tail)
    );

    driver
        .engine()
        .save_to_file_with_options(&args.output, &PersistenceOptions::compact())?;
    println!(
        "Saved {} scheme policy ({} states) to {}",
        C::kind(),
        driver.engine().state_count(),
        args.output.display()
    );
    Ok(())
}

/// One room for all runs; live runs keep it busy with a little fresh dirt.
fn run_source(world: &WorldArgs) -> MapSource {
    MapSource::Persistent(LayoutConfig::square(world.grid_size))
}

fn run<C: ControlScheme + Default>(args: &RunArgs) -> Result<()> {
    let engine = load_policy(&args.policy)?;
    let source = run_source(&args.world);
    let training = training_config(&args.world, 0, 0, 0.02);

    let mut driver: EpisodeDriver<C> =
        EpisodeDriver::with_engine(agent_config(&args.world), engine, source, training)?;
    let results = driver.evaluate(args.runs)?;
    print_summary(&results);
    Ok(())
}

fn load_policy(path: &Path) -> Result<LearningEngine> {
    LearningEngine::load_from_file(path).map_err(|e| {
        vacuum_agents::Error::Persistence(format!(
            "cannot load policy {}: {}; train one first with `vacuum-trainer train`",
            path.display(),
            e
        ))
    })
}

fn print_summary(results: &[EpisodeStats]) {
    for stats in results {
        println!(
            "run {:>3}: reward {:>9.1}  cleaned {:>3}  dirt left {:>3}  steps {:>4}{}",
            stats.episode,
            stats.total_reward,
            stats.cleaned,
            stats.dirt_left,
            stats.steps,
            if stats.died { "  (battery died)" } else { "" }
        );
    }
    let deaths = results.iter().filter(|s| s.died).count();
    println!(
        "mean reward {:.1} over {} runs, {} deaths",
        mean_reward(results),
        results.len(),
        deaths
    );
}
