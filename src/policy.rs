//! Opponent move models and learned policies.
//!
//! An opponent policy maps a node to a probability distribution over its
//! successors. Two providers are built in:
//! - [`UniformPolicy`]: every child is equally likely
//! - [`LearnedPolicy`]: follows a [`Policy`] exported by a planner, and falls
//!   back to uniform for nodes the planner never decided

use std::collections::HashMap;

use tracing::trace;

use crate::error::SearchError;
use crate::expectiminimax::check_distribution;
use crate::tree::{Edge, GameTree, Node, NodeId};

// =============================================================================
// Distributions
// =============================================================================

/// An ordered discrete distribution over nodes.
#[derive(Debug, Clone)]
pub struct Distribution<S> {
    entries: Vec<(f64, Node<S>)>,
}

impl<S> Distribution<S> {
    pub fn new(entries: Vec<(f64, Node<S>)>) -> Self {
        Self { entries }
    }

    /// Probability one on a single node.
    pub fn degenerate(node: Node<S>) -> Self {
        Self {
            entries: vec![(1.0, node)],
        }
    }

    /// Equal probability on each node.
    pub fn uniform(nodes: impl IntoIterator<Item = Node<S>>) -> Self {
        let nodes: Vec<_> = nodes.into_iter().collect();
        let p = 1.0 / nodes.len() as f64;
        Self {
            entries: nodes.into_iter().map(|n| (p, n)).collect(),
        }
    }

    pub fn entries(&self) -> &[(f64, Node<S>)] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &(f64, Node<S>)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all probabilities.
    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(p, _)| p).sum()
    }

    /// Probability assigned to the node with the given id.
    pub fn probability_of(&self, id: NodeId) -> f64 {
        self.entries
            .iter()
            .filter(|(_, n)| n.id == id)
            .map(|(p, _)| p)
            .sum()
    }

    /// Draw a node by inverse CDF. Rounding slack lands on the last entry.
    pub fn sample(&self, rng: &mut fastrand::Rng) -> Option<&Node<S>> {
        let mut r = rng.f64() * self.total();
        for (p, node) in &self.entries {
            if r < *p {
                return Some(node);
            }
            r -= p;
        }
        self.entries.last().map(|(_, n)| n)
    }
}

impl<S> IntoIterator for Distribution<S> {
    type Item = (f64, Node<S>);
    type IntoIter = std::vec::IntoIter<(f64, Node<S>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

// =============================================================================
// Learned Policies
// =============================================================================

/// A planner's decision at one state.
#[derive(Debug, Clone)]
pub struct PolicyEntry<S> {
    pub action: Edge<S>,
    /// Value of the state under the planner's value function.
    pub value: f64,
}

/// Mapping from state to chosen action, as produced by a planner.
#[derive(Debug, Clone)]
pub struct Policy<S> {
    entries: HashMap<NodeId, PolicyEntry<S>>,
}

impl<S> Default for Policy<S> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<S> Policy<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, state: NodeId, action: Edge<S>, value: f64) {
        self.entries.insert(state, PolicyEntry { action, value });
    }

    pub fn get(&self, state: NodeId) -> Option<&PolicyEntry<S>> {
        self.entries.get(&state)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &PolicyEntry<S>)> {
        self.entries.iter()
    }
}

// =============================================================================
// Opponent Policies
// =============================================================================

/// Distribution of the opponent's (or the environment's) move from a node.
pub trait OpponentPolicy<S> {
    fn distribution(&self, node: &Node<S>) -> Result<Distribution<S>, SearchError>;
}

impl<S, F> OpponentPolicy<S> for F
where
    F: Fn(&Node<S>) -> Result<Distribution<S>, SearchError>,
{
    fn distribution(&self, node: &Node<S>) -> Result<Distribution<S>, SearchError> {
        self(node)
    }
}

/// Uniform distribution over the children of `node`.
///
/// Chance nodes use their own outcome probabilities instead.
pub fn uniform_distribution<T>(tree: &T, node: &Node<T::State>) -> Result<Distribution<T::State>, SearchError>
where
    T: GameTree + ?Sized,
{
    if node.is_chance() {
        return chance_distribution(tree, node);
    }

    let children = tree.children(node);
    if children.is_empty() {
        return Err(SearchError::no_children(node.id));
    }
    Ok(Distribution::uniform(children.into_iter().map(|e| e.node)))
}

/// Outcome weights of a chance node.
///
/// Debug builds reject weights that do not form a distribution.
pub fn chance_distribution<T>(tree: &T, node: &Node<T::State>) -> Result<Distribution<T::State>, SearchError>
where
    T: GameTree + ?Sized,
{
    let outcomes = tree.outcomes(node);
    if outcomes.is_empty() {
        return Err(SearchError::no_outcomes(node.id));
    }
    if cfg!(debug_assertions) {
        check_distribution(node, &outcomes)?;
    }
    Ok(Distribution::new(
        outcomes.into_iter().map(|o| (o.probability, o.node)).collect(),
    ))
}

/// An opponent that picks every legal move with equal probability.
pub struct UniformPolicy<'t, T: ?Sized> {
    tree: &'t T,
}

impl<'t, T: GameTree + ?Sized> UniformPolicy<'t, T> {
    pub fn new(tree: &'t T) -> Self {
        Self { tree }
    }
}

impl<T: GameTree + ?Sized> OpponentPolicy<T::State> for UniformPolicy<'_, T> {
    fn distribution(&self, node: &Node<T::State>) -> Result<Distribution<T::State>, SearchError> {
        uniform_distribution(self.tree, node)
    }
}

/// An opponent that plays the move recorded in a planner's policy.
///
/// Nodes without a recorded decision fall back to the uniform policy.
pub struct LearnedPolicy<'t, T: GameTree + ?Sized> {
    tree: &'t T,
    learned: Option<Policy<T::State>>,
}

impl<'t, T: GameTree + ?Sized> LearnedPolicy<'t, T> {
    pub fn new(tree: &'t T, learned: Option<Policy<T::State>>) -> Self {
        Self { tree, learned }
    }
}

impl<T: GameTree + ?Sized> OpponentPolicy<T::State> for LearnedPolicy<'_, T> {
    fn distribution(&self, node: &Node<T::State>) -> Result<Distribution<T::State>, SearchError> {
        if let Some(entry) = self.learned.as_ref().and_then(|p| p.get(node.id)) {
            return Ok(Distribution::degenerate(entry.action.node.clone()));
        }
        trace!(node = %node.id, "no learned decision, falling back to uniform");
        uniform_distribution(self.tree, node)
    }
}
