//! Gamesearch: play tic-tac-toe between search, random, and planning players.
//!
//! ## Usage
//!
//! - `gamesearch` - Show a demo
//! - `gamesearch play --x planner --o random` - Play one game
//! - `gamesearch demo` - Run the search demo

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use gamesearch::alphabeta::alphabeta;
use gamesearch::config::{MatchConfig, PlannerConfig, SearchConfig};
use gamesearch::constants::{DEFAULT_DEPTH, PLANNER_EPSILON, PLANNER_MAX_ITERATIONS};
use gamesearch::expectiminimax::expectiminimax;
use gamesearch::explicit::ExplicitTree;
use gamesearch::game::{
    AlphaBetaPlayer, ExpectiminimaxPlayer, Match, Mover, OpponentModel, Player, PlannerPlayer,
    PolicyPlayer,
};
use gamesearch::planner::ValueIteration;
use gamesearch::policy::UniformPolicy;
use gamesearch::tictactoe::{evaluate, TicTacToeTree};

/// Gamesearch: minimax, expectiminimax, and MDP planning for turn-based games
#[derive(Parser)]
#[command(name = "gamesearch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play one game of tic-tac-toe and print every position
    Play {
        /// Strategy for X (the max player, moves first)
        #[arg(long, value_enum, default_value_t = PlayerKind::Alphabeta)]
        x: PlayerKind,
        /// Strategy for O (the min player)
        #[arg(long, value_enum, default_value_t = PlayerKind::Random)]
        o: PlayerKind,
        /// Search depth for the search players (at least one ply)
        #[arg(
            long,
            default_value_t = DEFAULT_DEPTH,
            value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..)
        )]
        depth: usize,
        /// Seed for the random players
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Planner convergence threshold
        #[arg(long, default_value_t = PLANNER_EPSILON)]
        epsilon: f64,
        /// Planner sweep limit
        #[arg(long, default_value_t = PLANNER_MAX_ITERATIONS)]
        max_iterations: usize,
    },
    /// Run a small demo of both search engines
    Demo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PlayerKind {
    Alphabeta,
    Expectiminimax,
    Random,
    /// Planner that assumes a random opponent
    Planner,
    /// Planner that assumes the opponent follows the last exported policy
    PlannerLearned,
}

fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .with_context(|| format!("invalid log level {level:?}"))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;

    match cli.command {
        Some(Commands::Play {
            x,
            o,
            depth,
            seed,
            epsilon,
            max_iterations,
        }) => {
            let search = SearchConfig::default().with_depth(depth);
            let planner = PlannerConfig::default()
                .with_epsilon(epsilon)
                .with_max_iterations(max_iterations);
            run_game(x, o, &search, &planner, seed)
        }
        Some(Commands::Demo) | None => run_demo(),
    }
}

fn make_player<'t>(
    kind: PlayerKind,
    tree: &'t TicTacToeTree,
    search: &SearchConfig,
    planner: &PlannerConfig,
    seed: u64,
) -> Box<dyn Player<TicTacToeTree> + 't> {
    match kind {
        PlayerKind::Alphabeta => Box::new(AlphaBetaPlayer::new(search.depth, evaluate)),
        PlayerKind::Expectiminimax => Box::new(ExpectiminimaxPlayer::new(search.depth, evaluate)),
        PlayerKind::Random => Box::new(PolicyPlayer::new(UniformPolicy::new(tree), seed)),
        PlayerKind::Planner => Box::new(PlannerPlayer::new(
            ValueIteration::new(planner.clone()),
            OpponentModel::Uniform,
        )),
        PlayerKind::PlannerLearned => Box::new(PlannerPlayer::new(
            ValueIteration::new(planner.clone()),
            OpponentModel::Learned,
        )),
    }
}

fn run_game(
    x: PlayerKind,
    o: PlayerKind,
    search: &SearchConfig,
    planner: &PlannerConfig,
    seed: u64,
) -> Result<()> {
    let tree = TicTacToeTree::new();
    let root = tree.root();
    println!("{}", root.data);

    let mut game = Match::new(
        &tree,
        make_player(x, &tree, search, planner, seed),
        make_player(o, &tree, search, planner, seed.wrapping_add(1)),
    )
    .with_config(MatchConfig::default().with_seed(seed));

    info!(?x, ?o, depth = search.depth, "starting game");
    let record = game.run(root).context("game aborted")?;

    for turn in &record.turns {
        let side = match turn.mover {
            Mover::Max => "Cross",
            Mover::Min => "Circle",
            Mover::Chance => "Chance",
        };
        println!("{side} plays {}", turn.action.label);
        println!("{}", turn.action.node.data);
    }

    match record.outcome() {
        Some(v) if v > 0.0 => println!("Cross wins"),
        Some(v) if v < 0.0 => println!("Circle wins"),
        _ => println!("Draw"),
    }
    Ok(())
}

fn run_demo() -> Result<()> {
    println!("Gamesearch: minimax and expectiminimax\n");

    // Demo 1: two-ply deterministic tree
    println!("=== Alpha-Beta Demo ===");
    let mut tree = ExplicitTree::new();
    let root = tree.add_decision("root", true);
    let left = tree.add_decision("left", false);
    let right = tree.add_decision("right", false);
    tree.add_child(root, left, "left");
    tree.add_child(root, right, "right");
    for (parent, v) in [(left, 4.0), (left, 6.0), (right, 9.0), (right, 12.0)] {
        let leaf = tree.add_terminal(&format!("{v}"), v, true);
        tree.add_child(parent, leaf, &format!("{v}"));
    }

    let node = tree.node(root).context("missing root")?;
    let estimate = |n: &gamesearch::Node<String>| tree.estimate(n);
    let result = alphabeta(&node, &tree, 2, f64::NEG_INFINITY, f64::INFINITY, true, &estimate)?;
    let best = result.best_child.map(|e| e.label).unwrap_or_default();
    println!("Root value: {} (best move: {best})\n", result.value);

    // Demo 2: a sure thing against a coin flip
    println!("=== Expectiminimax Demo ===");
    let mut tree = ExplicitTree::new();
    let root = tree.add_decision("root", true);
    let sure = tree.add_terminal("sure", 4.0, false);
    let flip = tree.add_chance("flip", false);
    let heads = tree.add_terminal("heads", 3.0, false);
    let tails = tree.add_terminal("tails", 7.0, false);
    tree.add_child(root, sure, "sure");
    tree.add_child(root, flip, "flip");
    tree.add_outcome(flip, heads, "heads", 0.5);
    tree.add_outcome(flip, tails, "tails", 0.5);

    let node = tree.node(root).context("missing root")?;
    let estimate = |n: &gamesearch::Node<String>| tree.estimate(n);
    let result = expectiminimax(&node, &tree, 1, true, &estimate)?;
    let best = result.best_child.map(|e| e.label).unwrap_or_default();
    println!("Root value: {} (best move: {best})", result.value);
    Ok(())
}
