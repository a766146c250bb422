//! Random tree shapes shared by the integration tests.

#![allow(dead_code)]

use gamesearch::explicit::ExplicitTree;
use gamesearch::NodeId;
use proptest::prelude::*;

/// A deterministic game tree with integer leaves and static estimates.
#[derive(Debug, Clone)]
pub enum Shape {
    Leaf(i32),
    Branch(i32, Vec<Shape>),
}

impl Shape {
    /// Longest path from this node to a leaf, in plies.
    pub fn height(&self) -> usize {
        match self {
            Shape::Leaf(_) => 0,
            Shape::Branch(_, children) => {
                1 + children.iter().map(Shape::height).max().unwrap_or(0)
            }
        }
    }
}

pub fn shape() -> impl Strategy<Value = Shape> {
    let leaf = (-20i32..20).prop_map(Shape::Leaf);
    leaf.prop_recursive(5, 96, 4, |inner| {
        (-20i32..20, prop::collection::vec(inner, 1..4))
            .prop_map(|(estimate, children)| Shape::Branch(estimate, children))
    })
}

/// Add `shape` to `tree` with `max_player` to move at its root.
pub fn build(tree: &mut ExplicitTree, shape: &Shape, max_player: bool) -> NodeId {
    match shape {
        Shape::Leaf(v) => tree.add_terminal(&format!("leaf {v}"), f64::from(*v), max_player),
        Shape::Branch(estimate, children) => {
            let id = tree.add_decision(&format!("branch {estimate}"), max_player);
            tree.set_estimate(id, f64::from(*estimate));
            for (i, child) in children.iter().enumerate() {
                let c = build(tree, child, !max_player);
                tree.add_child(id, c, &format!("m{i}"));
            }
            id
        }
    }
}

/// Two-ply tree: root (max) -> a (min) -> {4, 6}, b (min) -> {9, 12}.
pub fn two_ply() -> (ExplicitTree, NodeId) {
    let shape = Shape::Branch(
        0,
        vec![
            Shape::Branch(0, vec![Shape::Leaf(4), Shape::Leaf(6)]),
            Shape::Branch(0, vec![Shape::Leaf(9), Shape::Leaf(12)]),
        ],
    );
    let mut tree = ExplicitTree::new();
    let root = build(&mut tree, &shape, true);
    (tree, root)
}
