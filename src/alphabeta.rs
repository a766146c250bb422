//! Minimax search with alpha-beta pruning (fail-soft).
//!
//! The returned value may lie outside the `[alpha, beta]` window: a cutoff
//! returns the best value found so far rather than clamping it to the bound.
//!
//! Ties are broken by tree order. A child replaces the current best only if
//! its value is strictly better, so the first child reaching the extreme
//! value is the one reported in [`Evaluation::best_child`].

use crate::error::SearchError;
use crate::tree::{Evaluation, GameTree, Node};

/// Run a depth-limited fail-soft alpha-beta search from `node`.
///
/// Returns the backed-up value together with the best child of `node`.
/// `best_child` is left empty when `node` is evaluated statically, or when a
/// cutoff happens before any child improves on the initial bound.
///
/// Chance nodes are rejected; use [`crate::expectiminimax`] for stochastic
/// trees.
pub fn alphabeta<T, F>(
    node: &Node<T::State>,
    tree: &T,
    depth: usize,
    mut alpha: f64,
    mut beta: f64,
    maximizing: bool,
    evaluate: &F,
) -> Result<Evaluation<T::State>, SearchError>
where
    T: GameTree + ?Sized,
    F: Fn(&Node<T::State>) -> f64 + ?Sized,
{
    if depth == 0 || tree.is_terminal(node) {
        return Ok(Evaluation::leaf(evaluate(node)));
    }
    if node.is_chance() {
        return Err(SearchError::InvalidTreeState {
            node: node.id,
            reason: "alpha-beta cannot evaluate a chance node".to_string(),
        });
    }

    let children = tree.children(node);
    if children.is_empty() {
        return Err(SearchError::no_children(node.id));
    }

    let mut best_child = None;

    if maximizing {
        let mut value = f64::NEG_INFINITY;
        for child in children {
            let tentative =
                alphabeta(&child.node, tree, depth - 1, alpha, beta, false, evaluate)?.value;
            if tentative > value {
                value = tentative;
                best_child = Some(child);
            }
            alpha = alpha.max(value);
            if value >= beta {
                break;
            }
        }
        Ok(Evaluation { value, best_child })
    } else {
        let mut value = f64::INFINITY;
        for child in children {
            let tentative =
                alphabeta(&child.node, tree, depth - 1, alpha, beta, true, evaluate)?.value;
            if tentative < value {
                value = tentative;
                best_child = Some(child);
            }
            beta = beta.min(value);
            if value <= alpha {
                break;
            }
        }
        Ok(Evaluation { value, best_child })
    }
}

/// Alpha-beta with the full `(-inf, +inf)` window, returning only the value.
pub fn alphabeta_value<T, F>(
    node: &Node<T::State>,
    tree: &T,
    depth: usize,
    maximizing: bool,
    evaluate: &F,
) -> Result<f64, SearchError>
where
    T: GameTree + ?Sized,
    F: Fn(&Node<T::State>) -> f64 + ?Sized,
{
    alphabeta(
        node,
        tree,
        depth,
        f64::NEG_INFINITY,
        f64::INFINITY,
        maximizing,
        evaluate,
    )
    .map(|e| e.value)
}

/// Plain minimax without pruning. Visits every node up to `depth`.
///
/// Slower than [`alphabeta`] but trivially correct, which makes it the
/// reference the pruning search is checked against.
pub fn minimax<T, F>(
    node: &Node<T::State>,
    tree: &T,
    depth: usize,
    maximizing: bool,
    evaluate: &F,
) -> Result<f64, SearchError>
where
    T: GameTree + ?Sized,
    F: Fn(&Node<T::State>) -> f64 + ?Sized,
{
    if depth == 0 || tree.is_terminal(node) {
        return Ok(evaluate(node));
    }

    let children = tree.children(node);
    if children.is_empty() {
        return Err(SearchError::no_children(node.id));
    }

    let values = children
        .iter()
        .map(|c| minimax(&c.node, tree, depth - 1, !maximizing, evaluate))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(if maximizing {
        values.into_iter().fold(f64::NEG_INFINITY, f64::max)
    } else {
        values.into_iter().fold(f64::INFINITY, f64::min)
    })
}
