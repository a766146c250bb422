//! Gamesearch: adversarial and stochastic game-tree search.
//!
//! This crate provides depth-limited minimax search with alpha-beta pruning,
//! expectiminimax for trees with chance nodes, opponent models, an MDP
//! planner adapter, and a turn loop that plays two strategies against each
//! other.
//!
//! ## Modules
//!
//! - [`tree`] - Nodes, edges, chance outcomes, and the [`tree::GameTree`] trait
//! - [`alphabeta`] - Fail-soft alpha-beta search
//! - [`expectiminimax`] - Expectiminimax over chance nodes
//! - [`policy`] - Distributions, learned policies, and opponent models
//! - [`planner`] - Game-as-MDP adapter and the value-iteration planner
//! - [`game`] - Players and the turn-driven match loop
//! - [`explicit`] - Hand-built trees
//! - [`tictactoe`] - Tic-tac-toe as a game tree
//! - [`config`] / [`constants`] - Tunables
//!
//! ## Example
//!
//! ```
//! use gamesearch::alphabeta::alphabeta;
//! use gamesearch::tictactoe::{evaluate, TicTacToeTree};
//!
//! let tree = TicTacToeTree::new();
//! let root = tree.root();
//! let result = alphabeta(&root, &tree, 2, f64::NEG_INFINITY, f64::INFINITY, true, &evaluate).unwrap();
//! println!("best opening: {}", result.best_child.unwrap().label);
//! ```

pub mod alphabeta;
pub mod config;
pub mod constants;
pub mod error;
pub mod expectiminimax;
pub mod explicit;
pub mod game;
pub mod planner;
pub mod policy;
pub mod tictactoe;
pub mod tree;

pub use error::{GameError, PlannerError, SearchError};
pub use tree::{Edge, Evaluation, GameTree, Node, NodeId, NodeKind, Outcome};
