//! Game tree abstraction.
//!
//! A tree is anything that can enumerate the successors of a node. Nodes come
//! in three kinds:
//! - Decision nodes, where the player to move picks a child
//! - Chance nodes, where the successor is drawn from weighted outcomes
//! - Terminal nodes, which carry the final value of the game
//!
//! Children order matters: searches break ties in favor of the first child,
//! so a tree must return the same children in the same order every time.

use std::fmt;
use std::hash::{Hash, Hasher};

/// Opaque node identity. Two nodes are the same position iff their ids match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What kind of position a node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Decision,
    Chance,
    Terminal,
}

/// A position in the game tree.
///
/// `data` is the application payload (a board, a game state). `max_player`
/// records whose turn the node represents; for chance nodes it is the player
/// who moves after the outcome is drawn.
#[derive(Debug, Clone)]
pub struct Node<S> {
    pub id: NodeId,
    pub data: S,
    pub kind: NodeKind,
    /// Final value of the game. Only meaningful for terminal nodes.
    pub terminal_value: f64,
    pub max_player: bool,
}

impl<S> Node<S> {
    /// Create a decision node.
    pub fn decision(id: NodeId, data: S, max_player: bool) -> Self {
        Self {
            id,
            data,
            kind: NodeKind::Decision,
            terminal_value: 0.0,
            max_player,
        }
    }

    /// Create a chance node.
    pub fn chance(id: NodeId, data: S, max_player: bool) -> Self {
        Self {
            id,
            data,
            kind: NodeKind::Chance,
            terminal_value: 0.0,
            max_player,
        }
    }

    /// Create a terminal node carrying its final value.
    pub fn terminal(id: NodeId, data: S, value: f64, max_player: bool) -> Self {
        Self {
            id,
            data,
            kind: NodeKind::Terminal,
            terminal_value: value,
            max_player,
        }
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.kind == NodeKind::Terminal
    }

    #[inline]
    pub fn is_chance(&self) -> bool {
        self.kind == NodeKind::Chance
    }
}

impl<S> PartialEq for Node<S> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<S> Eq for Node<S> {}

impl<S> Hash for Node<S> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// A move: the successor node together with the action label that leads to it.
#[derive(Debug, Clone)]
pub struct Edge<S> {
    pub node: Node<S>,
    pub label: String,
}

impl<S> Edge<S> {
    pub fn new(node: Node<S>, label: impl Into<String>) -> Self {
        Self {
            node,
            label: label.into(),
        }
    }
}

impl<S> PartialEq for Edge<S> {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node && self.label == other.label
    }
}

impl<S> Eq for Edge<S> {}

/// A weighted outcome of a chance node.
#[derive(Debug, Clone)]
pub struct Outcome<S> {
    pub node: Node<S>,
    pub label: String,
    pub probability: f64,
}

impl<S> Outcome<S> {
    pub fn new(node: Node<S>, label: impl Into<String>, probability: f64) -> Self {
        Self {
            node,
            label: label.into(),
            probability,
        }
    }
}

/// Successor generator for a game.
///
/// Implementations must be pure with respect to search: repeated calls for
/// the same node return the same successors in the same order. Terminal
/// nodes yield no successors; every other decision node yields at least one
/// child and every chance node at least one outcome.
pub trait GameTree {
    /// Application payload carried by the nodes of this tree.
    type State: Clone;

    fn is_terminal(&self, node: &Node<Self::State>) -> bool {
        node.is_terminal()
    }

    /// Children of a decision node, in tree order.
    fn children(&self, node: &Node<Self::State>) -> Vec<Edge<Self::State>>;

    /// Weighted outcomes of a chance node, in tree order.
    fn outcomes(&self, _node: &Node<Self::State>) -> Vec<Outcome<Self::State>> {
        Vec::new()
    }
}

/// Result of a search: the backed-up value and the locally optimal child.
///
/// `best_child` is `None` when the node was evaluated statically (depth
/// exhausted or terminal) or when no child improved on the initial bound.
#[derive(Debug, Clone)]
pub struct Evaluation<S> {
    pub value: f64,
    pub best_child: Option<Edge<S>>,
}

impl<S> Evaluation<S> {
    pub(crate) fn leaf(value: f64) -> Self {
        Self {
            value,
            best_child: None,
        }
    }
}
