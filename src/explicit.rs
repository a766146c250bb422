//! Explicit, arena-backed game tree.
//!
//! Useful for small hand-built games, demos, and tests. Nodes are named and
//! their ids are arena indices, so the first node added has id `#0`.
//!
//! ```
//! use gamesearch::explicit::ExplicitTree;
//!
//! let mut tree = ExplicitTree::new();
//! let root = tree.add_decision("root", true);
//! let win = tree.add_terminal("win", 1.0, false);
//! tree.add_child(root, win, "take");
//! assert_eq!(tree.children_of(root).len(), 1);
//! ```

use crate::tree::{Edge, GameTree, Node, NodeId, Outcome};

struct Entry {
    node: Node<String>,
    children: Vec<(NodeId, String)>,
    outcomes: Vec<(NodeId, String, f64)>,
    estimate: f64,
}

/// A game tree whose nodes and edges are stored up front.
#[derive(Default)]
pub struct ExplicitTree {
    entries: Vec<Entry>,
}

impl ExplicitTree {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, build: impl FnOnce(NodeId) -> Node<String>) -> NodeId {
        let id = NodeId(self.entries.len() as u64);
        self.entries.push(Entry {
            node: build(id),
            children: Vec::new(),
            outcomes: Vec::new(),
            estimate: 0.0,
        });
        id
    }

    /// Add a decision node where the max player (or min player) moves.
    pub fn add_decision(&mut self, name: &str, max_player: bool) -> NodeId {
        self.push(|id| Node::decision(id, name.to_string(), max_player))
    }

    /// Add a chance node. `max_player` is the side to move after the draw.
    pub fn add_chance(&mut self, name: &str, max_player: bool) -> NodeId {
        self.push(|id| Node::chance(id, name.to_string(), max_player))
    }

    pub fn add_terminal(&mut self, name: &str, value: f64, max_player: bool) -> NodeId {
        self.push(|id| Node::terminal(id, name.to_string(), value, max_player))
    }

    /// Append `child` to the children of `parent`.
    ///
    /// # Panics
    /// Panics if either id was not created by this tree.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId, label: &str) {
        assert!((child.0 as usize) < self.entries.len(), "unknown child {child}");
        self.entries[parent.0 as usize]
            .children
            .push((child, label.to_string()));
    }

    /// Append a weighted outcome to the chance node `parent`.
    ///
    /// # Panics
    /// Panics if either id was not created by this tree.
    pub fn add_outcome(&mut self, parent: NodeId, child: NodeId, label: &str, probability: f64) {
        assert!((child.0 as usize) < self.entries.len(), "unknown child {child}");
        self.entries[parent.0 as usize]
            .outcomes
            .push((child, label.to_string(), probability));
    }

    /// Set the static estimate returned by [`ExplicitTree::estimate`] for a
    /// non-terminal node.
    pub fn set_estimate(&mut self, id: NodeId, value: f64) {
        self.entries[id.0 as usize].estimate = value;
    }

    /// Look up a node by id.
    pub fn node(&self, id: NodeId) -> Option<Node<String>> {
        self.entries.get(id.0 as usize).map(|e| e.node.clone())
    }

    /// Children of the node with the given id.
    pub fn children_of(&self, id: NodeId) -> Vec<Edge<String>> {
        self.entries
            .get(id.0 as usize)
            .map(|e| {
                e.children
                    .iter()
                    .map(|(c, label)| Edge::new(self.entries[c.0 as usize].node.clone(), label.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Evaluation function: the terminal value for terminal nodes, the
    /// stored estimate otherwise.
    pub fn estimate(&self, node: &Node<String>) -> f64 {
        if node.is_terminal() {
            return node.terminal_value;
        }
        self.entries
            .get(node.id.0 as usize)
            .map(|e| e.estimate)
            .unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl GameTree for ExplicitTree {
    type State = String;

    fn children(&self, node: &Node<String>) -> Vec<Edge<String>> {
        self.children_of(node.id)
    }

    fn outcomes(&self, node: &Node<String>) -> Vec<Outcome<String>> {
        self.entries
            .get(node.id.0 as usize)
            .map(|e| {
                e.outcomes
                    .iter()
                    .map(|(c, label, p)| {
                        Outcome::new(self.entries[c.0 as usize].node.clone(), label.clone(), *p)
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_arena_indices() {
        let mut tree = ExplicitTree::new();
        let a = tree.add_decision("a", true);
        let b = tree.add_terminal("b", 2.0, false);
        assert_eq!(a, NodeId(0));
        assert_eq!(b, NodeId(1));
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_children_keep_insertion_order() {
        let mut tree = ExplicitTree::new();
        let root = tree.add_decision("root", true);
        let x = tree.add_terminal("x", 1.0, false);
        let y = tree.add_terminal("y", 2.0, false);
        tree.add_child(root, y, "right");
        tree.add_child(root, x, "left");

        let labels: Vec<_> = tree.children_of(root).into_iter().map(|e| e.label).collect();
        assert_eq!(labels, vec!["right", "left"]);
    }

    #[test]
    fn test_outcomes_and_estimate() {
        let mut tree = ExplicitTree::new();
        let roll = tree.add_chance("roll", true);
        let lo = tree.add_terminal("lo", 3.0, true);
        let hi = tree.add_decision("hi", true);
        tree.add_outcome(roll, lo, "1", 0.25);
        tree.add_outcome(roll, hi, "2", 0.75);
        tree.set_estimate(hi, 4.5);

        let node = tree.node(roll).unwrap();
        let outcomes = tree.outcomes(&node);
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[1].probability, 0.75);
        assert_eq!(tree.estimate(&tree.node(lo).unwrap()), 3.0);
        assert_eq!(tree.estimate(&tree.node(hi).unwrap()), 4.5);
    }

    #[test]
    fn test_unknown_node_has_no_children() {
        let tree = ExplicitTree::new();
        assert!(tree.children_of(NodeId(7)).is_empty());
        assert!(tree.node(NodeId(7)).is_none());
    }
}
