//! Turn-driven game loop.
//!
//! A [`Match`] pits two [`Player`]s against each other on a game tree. On
//! every turn the side to move (the max side when `node.max_player` is set)
//! picks a child, and the loop advances to it. Chance nodes are resolved by
//! the match itself. The loop stops at the first terminal node.
//!
//! Players never write to nodes. The move each player picked is recorded in
//! the [`GameRecord`], keyed by the node it was picked at.
//!
//! ## Example
//!
//! ```
//! use gamesearch::explicit::ExplicitTree;
//! use gamesearch::game::{AlphaBetaPlayer, Match, PolicyPlayer};
//! use gamesearch::policy::UniformPolicy;
//!
//! let mut tree = ExplicitTree::new();
//! let root = tree.add_decision("root", true);
//! let win = tree.add_terminal("win", 1.0, false);
//! let lose = tree.add_terminal("lose", -1.0, false);
//! tree.add_child(root, lose, "bad");
//! tree.add_child(root, win, "good");
//!
//! let searcher = AlphaBetaPlayer::new(2, |n: &gamesearch::tree::Node<String>| n.terminal_value);
//! let random = PolicyPlayer::new(UniformPolicy::new(&tree), 1);
//! let mut game = Match::new(&tree, searcher, random);
//! let record = game.run(tree.node(root).unwrap()).unwrap();
//! assert_eq!(record.outcome(), Some(1.0));
//! ```

use std::collections::HashMap;
use std::fmt;

use tracing::{debug, trace};

use crate::alphabeta::alphabeta;
use crate::config::MatchConfig;
use crate::error::GameError;
use crate::expectiminimax::expectiminimax;
use crate::planner::{GameDomain, PlannerFactory};
use crate::policy::{chance_distribution, LearnedPolicy, OpponentPolicy, Policy};
use crate::tree::{Edge, GameTree, Node, NodeId};

// =============================================================================
// Players
// =============================================================================

/// State shared between turns of a match.
#[derive(Debug, Clone)]
pub struct TurnContext<S> {
    /// Number of turns played so far.
    pub turn: usize,
    /// Policy exported by the last planner that ran, if any.
    pub last_policy: Option<Policy<S>>,
}

impl<S> Default for TurnContext<S> {
    fn default() -> Self {
        Self {
            turn: 0,
            last_policy: None,
        }
    }
}

/// One side of a match.
pub trait Player<T: GameTree + ?Sized> {
    fn name(&self) -> &str;

    /// Pick a child of `node`.
    fn choose(
        &mut self,
        tree: &T,
        node: &Node<T::State>,
        ctx: &mut TurnContext<T::State>,
    ) -> Result<Edge<T::State>, GameError>;
}

impl<T, P> Player<T> for Box<P>
where
    T: GameTree + ?Sized,
    P: Player<T> + ?Sized,
{
    fn name(&self) -> &str {
        (**self).name()
    }

    fn choose(
        &mut self,
        tree: &T,
        node: &Node<T::State>,
        ctx: &mut TurnContext<T::State>,
    ) -> Result<Edge<T::State>, GameError> {
        (**self).choose(tree, node, ctx)
    }
}

/// Plays the best child found by a fixed-depth alpha-beta search.
pub struct AlphaBetaPlayer<E> {
    depth: usize,
    evaluate: E,
}

impl<E> AlphaBetaPlayer<E> {
    /// A depth of zero never selects a move: every turn fails with
    /// [`GameError::NoMove`].
    pub fn new(depth: usize, evaluate: E) -> Self {
        Self { depth, evaluate }
    }
}

impl<T, E> Player<T> for AlphaBetaPlayer<E>
where
    T: GameTree + ?Sized,
    E: Fn(&Node<T::State>) -> f64,
{
    fn name(&self) -> &str {
        "alphabeta"
    }

    fn choose(
        &mut self,
        tree: &T,
        node: &Node<T::State>,
        _ctx: &mut TurnContext<T::State>,
    ) -> Result<Edge<T::State>, GameError> {
        let result = alphabeta(
            node,
            tree,
            self.depth,
            f64::NEG_INFINITY,
            f64::INFINITY,
            node.max_player,
            &self.evaluate,
        )?;
        trace!(node = %node.id, value = result.value, "alpha-beta root");
        result.best_child.ok_or(GameError::NoMove(node.id))
    }
}

/// Plays the child with the best expected value at a fixed depth.
pub struct ExpectiminimaxPlayer<E> {
    depth: usize,
    evaluate: E,
}

impl<E> ExpectiminimaxPlayer<E> {
    /// Same depth contract as [`AlphaBetaPlayer::new`].
    pub fn new(depth: usize, evaluate: E) -> Self {
        Self { depth, evaluate }
    }
}

impl<T, E> Player<T> for ExpectiminimaxPlayer<E>
where
    T: GameTree + ?Sized,
    E: Fn(&Node<T::State>) -> f64,
{
    fn name(&self) -> &str {
        "expectiminimax"
    }

    fn choose(
        &mut self,
        tree: &T,
        node: &Node<T::State>,
        _ctx: &mut TurnContext<T::State>,
    ) -> Result<Edge<T::State>, GameError> {
        let result = expectiminimax(node, tree, self.depth, node.max_player, &self.evaluate)?;
        trace!(node = %node.id, value = result.value, "expectiminimax root");
        result.best_child.ok_or(GameError::NoMove(node.id))
    }
}

/// Samples its move from an opponent policy.
///
/// With [`crate::policy::UniformPolicy`] this is the random player.
pub struct PolicyPlayer<P> {
    policy: P,
    rng: fastrand::Rng,
}

impl<P> PolicyPlayer<P> {
    pub fn new(policy: P, seed: u64) -> Self {
        Self {
            policy,
            rng: fastrand::Rng::with_seed(seed),
        }
    }
}

impl<T, P> Player<T> for PolicyPlayer<P>
where
    T: GameTree + ?Sized,
    P: OpponentPolicy<T::State>,
{
    fn name(&self) -> &str {
        "policy"
    }

    fn choose(
        &mut self,
        tree: &T,
        node: &Node<T::State>,
        _ctx: &mut TurnContext<T::State>,
    ) -> Result<Edge<T::State>, GameError> {
        let dist = self.policy.distribution(node)?;
        let target = dist.sample(&mut self.rng).ok_or(GameError::NoMove(node.id))?;
        tree.children(node)
            .into_iter()
            .find(|c| c.node.id == target.id)
            .ok_or(GameError::NoMove(node.id))
    }
}

/// How a [`PlannerPlayer`] models the other side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpponentModel {
    /// The opponent moves uniformly at random.
    Uniform,
    /// The opponent follows the policy exported by the previous planner
    /// turn, uniform where that policy is silent.
    Learned,
}

/// Plans each move by solving the game as an MDP against an opponent model.
///
/// A fresh planner is opened every turn and dropped once the move is picked.
/// Its exported policy is published in the [`TurnContext`] for the next turn.
pub struct PlannerPlayer<F> {
    factory: F,
    opponent: OpponentModel,
}

impl<F: PlannerFactory> PlannerPlayer<F> {
    pub fn new(factory: F, opponent: OpponentModel) -> Self {
        Self { factory, opponent }
    }
}

impl<T, F> Player<T> for PlannerPlayer<F>
where
    T: GameTree + ?Sized,
    F: PlannerFactory,
{
    fn name(&self) -> &str {
        match self.opponent {
            OpponentModel::Uniform => "planner-vs-uniform",
            OpponentModel::Learned => "planner-vs-learned",
        }
    }

    fn choose(
        &mut self,
        tree: &T,
        node: &Node<T::State>,
        ctx: &mut TurnContext<T::State>,
    ) -> Result<Edge<T::State>, GameError> {
        let learned = match self.opponent {
            OpponentModel::Uniform => None,
            OpponentModel::Learned => ctx.last_policy.take(),
        };
        let domain = GameDomain::new(
            tree,
            node.clone(),
            LearnedPolicy::new(tree, learned),
            node.max_player,
        );

        let mut planner = self.factory.open(domain)?;
        planner.solve()?;
        let action = planner.sample_action(node)?;
        let policy = planner.policy();
        drop(planner);

        debug!(node = %node.id, action = %action.label, states = policy.len(), "planner move");
        ctx.last_policy = Some(policy);
        Ok(action)
    }
}

// =============================================================================
// Match
// =============================================================================

/// Whether the game can continue from a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    InProgress,
    Terminal,
}

impl GameStatus {
    pub fn of<T: GameTree + ?Sized>(tree: &T, node: &Node<T::State>) -> Self {
        if tree.is_terminal(node) {
            GameStatus::Terminal
        } else {
            GameStatus::InProgress
        }
    }
}

/// Who moved on a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mover {
    Max,
    Min,
    Chance,
}

impl fmt::Display for Mover {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mover::Max => write!(f, "max"),
            Mover::Min => write!(f, "min"),
            Mover::Chance => write!(f, "chance"),
        }
    }
}

/// One move of a finished or running game.
#[derive(Debug, Clone)]
pub struct Turn<S> {
    /// Node the move was made from.
    pub node: NodeId,
    pub mover: Mover,
    pub action: Edge<S>,
}

/// History of a match.
#[derive(Debug, Clone)]
pub struct GameRecord<S> {
    pub root: NodeId,
    pub turns: Vec<Turn<S>>,
    /// The terminal node the game ended at.
    pub final_node: Option<Node<S>>,
}

impl<S> GameRecord<S> {
    fn new(root: NodeId) -> Self {
        Self {
            root,
            turns: Vec::new(),
            final_node: None,
        }
    }

    pub fn status(&self) -> GameStatus {
        if self.final_node.is_some() {
            GameStatus::Terminal
        } else {
            GameStatus::InProgress
        }
    }

    /// Terminal value of the final node.
    pub fn outcome(&self) -> Option<f64> {
        self.final_node.as_ref().map(|n| n.terminal_value)
    }

    /// The move chosen at each node visited, keyed by node identity.
    pub fn decisions(&self) -> HashMap<NodeId, &Edge<S>> {
        self.turns.iter().map(|t| (t.node, &t.action)).collect()
    }

    /// Action labels in play order.
    pub fn labels(&self) -> Vec<&str> {
        self.turns.iter().map(|t| t.action.label.as_str()).collect()
    }
}

/// A game between a max side and a min side on a shared tree.
pub struct Match<'p, T: GameTree + ?Sized> {
    tree: &'p T,
    max_side: Box<dyn Player<T> + 'p>,
    min_side: Box<dyn Player<T> + 'p>,
    config: MatchConfig,
    rng: fastrand::Rng,
}

impl<'p, T: GameTree + ?Sized> Match<'p, T> {
    pub fn new(
        tree: &'p T,
        max_side: impl Player<T> + 'p,
        min_side: impl Player<T> + 'p,
    ) -> Self {
        let config = MatchConfig::default();
        Self {
            tree,
            max_side: Box::new(max_side),
            min_side: Box::new(min_side),
            rng: fastrand::Rng::with_seed(config.seed),
            config,
        }
    }

    pub fn with_config(mut self, config: MatchConfig) -> Self {
        self.rng = fastrand::Rng::with_seed(config.seed);
        self.config = config;
        self
    }

    /// Play from `root` until a terminal node is reached.
    pub fn run(&mut self, root: Node<T::State>) -> Result<GameRecord<T::State>, GameError> {
        let mut record = GameRecord::new(root.id);
        let mut ctx = TurnContext::default();
        let mut node = root;

        loop {
            if GameStatus::of(self.tree, &node) == GameStatus::Terminal {
                debug!(
                    turns = record.turns.len(),
                    value = node.terminal_value,
                    "game over"
                );
                record.final_node = Some(node);
                return Ok(record);
            }
            if let Some(limit) = self.config.max_turns
                && record.turns.len() >= limit
            {
                return Err(GameError::TurnLimit(limit));
            }

            let (mover, action) = if node.is_chance() {
                (Mover::Chance, self.draw_outcome(&node)?)
            } else if node.max_player {
                let action = self.max_side.choose(self.tree, &node, &mut ctx)?;
                (Mover::Max, self.check_legal(&node, action)?)
            } else {
                let action = self.min_side.choose(self.tree, &node, &mut ctx)?;
                (Mover::Min, self.check_legal(&node, action)?)
            };

            debug!(
                turn = ctx.turn,
                %mover,
                player = self.side_name(mover),
                from = %node.id,
                action = %action.label,
                "move"
            );

            let next = action.node.clone();
            record.turns.push(Turn {
                node: node.id,
                mover,
                action,
            });
            ctx.turn += 1;
            node = next;
        }
    }

    fn side_name(&self, mover: Mover) -> &str {
        match mover {
            Mover::Max => self.max_side.name(),
            Mover::Min => self.min_side.name(),
            Mover::Chance => "chance",
        }
    }

    fn check_legal(
        &self,
        node: &Node<T::State>,
        action: Edge<T::State>,
    ) -> Result<Edge<T::State>, GameError> {
        if self.tree.children(node).contains(&action) {
            Ok(action)
        } else {
            Err(GameError::IllegalMove {
                node: node.id,
                label: action.label,
            })
        }
    }

    fn draw_outcome(&mut self, node: &Node<T::State>) -> Result<Edge<T::State>, GameError> {
        let dist = chance_distribution(self.tree, node)?;
        let drawn = dist
            .sample(&mut self.rng)
            .map(|n| n.id)
            .ok_or(GameError::NoMove(node.id))?;
        self.tree
            .outcomes(node)
            .into_iter()
            .find(|o| o.node.id == drawn)
            .map(|o| Edge::new(o.node, o.label))
            .ok_or(GameError::NoMove(node.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlannerConfig;
    use crate::error::SearchError;
    use crate::explicit::ExplicitTree;
    use crate::planner::ValueIteration;
    use crate::policy::UniformPolicy;

    /// root (max) -> a (min) -> {4, 6}, b (min) -> {9, 12}
    fn two_ply() -> (ExplicitTree, NodeId) {
        let mut tree = ExplicitTree::new();
        let root = tree.add_decision("root", true);
        let a = tree.add_decision("a", false);
        let b = tree.add_decision("b", false);
        tree.add_child(root, a, "a");
        tree.add_child(root, b, "b");
        for (parent, v) in [(a, 4.0), (a, 6.0), (b, 9.0), (b, 12.0)] {
            let leaf = tree.add_terminal(&format!("t{v}"), v, true);
            tree.add_child(parent, leaf, &format!("{v}"));
        }
        (tree, root)
    }

    fn terminal_value(n: &Node<String>) -> f64 {
        n.terminal_value
    }

    #[test]
    fn test_search_vs_search() {
        let (tree, root) = two_ply();
        let mut game = Match::new(
            &tree,
            AlphaBetaPlayer::new(2, terminal_value),
            AlphaBetaPlayer::new(1, terminal_value),
        );
        let record = game.run(tree.node(root).unwrap()).unwrap();

        assert_eq!(record.labels(), vec!["b", "9"]);
        assert_eq!(record.outcome(), Some(9.0));
        assert_eq!(record.status(), GameStatus::Terminal);
        assert_eq!(record.turns[0].mover, Mover::Max);
        assert_eq!(record.turns[1].mover, Mover::Min);
        assert_eq!(record.decisions()[&root].label, "b");
    }

    #[test]
    fn test_terminal_root_ends_immediately() {
        let mut tree = ExplicitTree::new();
        let root = tree.add_terminal("done", 0.5, true);
        let mut game = Match::new(
            &tree,
            AlphaBetaPlayer::new(3, terminal_value),
            AlphaBetaPlayer::new(3, terminal_value),
        );
        let record = game.run(tree.node(root).unwrap()).unwrap();
        assert!(record.turns.is_empty());
        assert_eq!(record.outcome(), Some(0.5));
    }

    #[test]
    fn test_random_player_stays_on_tree() {
        let (tree, root) = two_ply();
        for seed in 0..10 {
            let mut game = Match::new(
                &tree,
                PolicyPlayer::new(UniformPolicy::new(&tree), seed),
                PolicyPlayer::new(UniformPolicy::new(&tree), seed + 100),
            );
            let record = game.run(tree.node(root).unwrap()).unwrap();
            assert_eq!(record.turns.len(), 2);
            assert!([4.0, 6.0, 9.0, 12.0].contains(&record.outcome().unwrap()));
        }
    }

    #[test]
    fn test_chance_nodes_are_drawn_by_the_match() {
        let mut tree = ExplicitTree::new();
        let root = tree.add_chance("coin", true);
        let heads = tree.add_terminal("heads", 1.0, true);
        let tails = tree.add_terminal("tails", -1.0, true);
        tree.add_outcome(root, heads, "H", 0.5);
        tree.add_outcome(root, tails, "T", 0.5);

        let mut seen = std::collections::HashSet::new();
        for seed in 0..32 {
            let mut game = Match::new(
                &tree,
                AlphaBetaPlayer::new(1, terminal_value),
                AlphaBetaPlayer::new(1, terminal_value),
            )
            .with_config(MatchConfig::default().with_seed(seed));
            let record = game.run(tree.node(root).unwrap()).unwrap();
            assert_eq!(record.turns[0].mover, Mover::Chance);
            seen.insert(record.labels()[0].to_string());
        }
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn test_chance_node_without_outcomes_ends_the_match() {
        let mut tree = ExplicitTree::new();
        let root = tree.add_decision("root", true);
        let empty = tree.add_chance("empty", false);
        tree.add_child(root, empty, "roll");

        let mut game = Match::new(
            &tree,
            AlphaBetaPlayer::new(1, terminal_value),
            AlphaBetaPlayer::new(1, terminal_value),
        );
        let err = game.run(tree.node(root).unwrap()).unwrap_err();
        assert!(matches!(
            err,
            GameError::Search(SearchError::InvalidTreeState { node, .. }) if node == empty
        ));
    }

    #[cfg(debug_assertions)]
    #[test]
    fn test_malformed_chance_mass_ends_the_match_in_debug_builds() {
        let mut tree = ExplicitTree::new();
        let coin = tree.add_chance("coin", true);
        let heads = tree.add_terminal("heads", 1.0, true);
        let tails = tree.add_terminal("tails", -1.0, true);
        tree.add_outcome(coin, heads, "H", 0.5);
        tree.add_outcome(coin, tails, "T", 0.25);

        let mut game = Match::new(
            &tree,
            AlphaBetaPlayer::new(1, terminal_value),
            AlphaBetaPlayer::new(1, terminal_value),
        );
        assert_eq!(
            game.run(tree.node(coin).unwrap()).unwrap_err(),
            GameError::Search(SearchError::InvalidDistribution {
                node: coin,
                total: 0.75
            })
        );
    }

    #[test]
    fn test_depth_zero_player_selects_no_move() {
        let (tree, root) = two_ply();
        let mut game = Match::new(
            &tree,
            AlphaBetaPlayer::new(0, terminal_value),
            AlphaBetaPlayer::new(1, terminal_value),
        );
        assert_eq!(
            game.run(tree.node(root).unwrap()).unwrap_err(),
            GameError::NoMove(root)
        );
    }

    #[test]
    fn test_turn_limit() {
        let (tree, root) = two_ply();
        let mut game = Match::new(
            &tree,
            AlphaBetaPlayer::new(2, terminal_value),
            AlphaBetaPlayer::new(2, terminal_value),
        )
        .with_config(MatchConfig::default().with_max_turns(1));
        assert_eq!(
            game.run(tree.node(root).unwrap()).unwrap_err(),
            GameError::TurnLimit(1)
        );
    }

    struct Cheater;

    impl Player<ExplicitTree> for Cheater {
        fn name(&self) -> &str {
            "cheater"
        }

        fn choose(
            &mut self,
            tree: &ExplicitTree,
            _node: &Node<String>,
            _ctx: &mut TurnContext<String>,
        ) -> Result<Edge<String>, GameError> {
            // Jump straight to the best leaf, skipping the opponent.
            Ok(Edge::new(tree.node(NodeId(6)).unwrap(), "teleport"))
        }
    }

    #[test]
    fn test_illegal_move_is_rejected() {
        let (tree, root) = two_ply();
        let mut game = Match::new(&tree, Cheater, AlphaBetaPlayer::new(1, terminal_value));
        let err = game.run(tree.node(root).unwrap()).unwrap_err();
        assert_eq!(
            err,
            GameError::IllegalMove {
                node: root,
                label: "teleport".to_string()
            }
        );
    }

    #[test]
    fn test_planner_vs_planner_shares_policy() {
        let (tree, root) = two_ply();
        let factory = ValueIteration::new(PlannerConfig::for_testing().with_heuristic(20.0));
        let mut game = Match::new(
            &tree,
            PlannerPlayer::new(factory.clone(), OpponentModel::Learned),
            PlannerPlayer::new(factory, OpponentModel::Learned),
        );
        let record = game.run(tree.node(root).unwrap()).unwrap();
        assert_eq!(record.turns.len(), 2);
        // Min plans for itself and takes the smaller leaf under either branch.
        assert!([4.0, 9.0].contains(&record.outcome().unwrap()));
    }
}
