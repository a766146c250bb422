//! Expectiminimax search over trees with chance nodes.
//!
//! Decision nodes are searched like minimax, without pruning. A chance node
//! takes the probability-weighted sum of its outcomes. Chance layers do not
//! consume depth: a move that leads to a chance node is scored by the
//! expectation over its outcomes, which are searched with the depth left
//! after the move. A search started at depth zero evaluates its node
//! statically, whatever its kind.

use crate::constants::PROBABILITY_TOLERANCE;
use crate::error::SearchError;
use crate::tree::{Evaluation, GameTree, Node, Outcome};

/// Run a depth-limited expectiminimax search from `node`.
///
/// For a decision node the best child (first wins on ties) is returned in
/// [`Evaluation::best_child`]. Chance nodes and static evaluations carry no
/// best child.
pub fn expectiminimax<T, F>(
    node: &Node<T::State>,
    tree: &T,
    depth: usize,
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
        return expectation(node, tree, depth, maximizing, evaluate).map(Evaluation::leaf);
    }

    let children = tree.children(node);
    if children.is_empty() {
        return Err(SearchError::no_children(node.id));
    }

    let mut value = if maximizing {
        f64::NEG_INFINITY
    } else {
        f64::INFINITY
    };
    let mut best_child = None;

    for child in children {
        let tentative = successor_value(&child.node, tree, depth - 1, !maximizing, evaluate)?;
        let improves = if maximizing {
            tentative > value
        } else {
            tentative < value
        };
        if improves {
            value = tentative;
            best_child = Some(child);
        }
    }

    Ok(Evaluation { value, best_child })
}

/// Value of a node reached by a move or a draw. Chance nodes are expanded
/// regardless of the remaining depth.
fn successor_value<T, F>(
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
    if node.is_chance() && !tree.is_terminal(node) {
        expectation(node, tree, depth, maximizing, evaluate)
    } else {
        expectiminimax(node, tree, depth, maximizing, evaluate).map(|e| e.value)
    }
}

/// Expected value of a chance node.
fn expectation<T, F>(
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
    let outcomes = tree.outcomes(node);
    if outcomes.is_empty() {
        return Err(SearchError::no_outcomes(node.id));
    }
    if cfg!(debug_assertions) {
        check_distribution(node, &outcomes)?;
    }

    let mut sum = 0.0;
    for outcome in &outcomes {
        let v = successor_value(&outcome.node, tree, depth, maximizing, evaluate)?;
        sum += outcome.probability * v;
    }
    Ok(sum)
}

/// Verify that outcome probabilities are non-negative and sum to one.
pub fn check_distribution<S>(node: &Node<S>, outcomes: &[Outcome<S>]) -> Result<(), SearchError> {
    let total: f64 = outcomes.iter().map(|o| o.probability).sum();
    let negative = outcomes.iter().any(|o| o.probability < 0.0);
    if negative || (total - 1.0).abs() > PROBABILITY_TOLERANCE {
        return Err(SearchError::InvalidDistribution {
            node: node.id,
            total,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explicit::ExplicitTree;

    #[test]
    fn test_single_chance_child_averages_outcomes() {
        let mut tree = ExplicitTree::new();
        let root = tree.add_decision("root", true);
        let roll = tree.add_chance("roll", false);
        let three = tree.add_terminal("three", 3.0, false);
        let seven = tree.add_terminal("seven", 7.0, false);
        tree.add_child(root, roll, "roll");
        tree.add_outcome(roll, three, "low", 0.5);
        tree.add_outcome(roll, seven, "high", 0.5);

        let node = tree.node(root).unwrap();
        let eval = |n: &Node<String>| tree.estimate(n);
        let result = expectiminimax(&node, &tree, 1, true, &eval).unwrap();
        assert_eq!(result.value, 5.0);
        assert_eq!(result.best_child.unwrap().label, "roll");
    }

    #[test]
    fn test_chance_outcomes_use_static_estimate_at_depth_limit() {
        let mut tree = ExplicitTree::new();
        let root = tree.add_decision("root", true);
        let roll = tree.add_chance("roll", false);
        let a = tree.add_decision("a", false);
        let b = tree.add_decision("b", false);
        tree.add_child(root, roll, "roll");
        tree.add_outcome(roll, a, "a", 0.25);
        tree.add_outcome(roll, b, "b", 0.75);
        tree.set_estimate(a, 4.0);
        tree.set_estimate(b, 8.0);

        let node = tree.node(root).unwrap();
        let eval = |n: &Node<String>| tree.estimate(n);
        let result = expectiminimax(&node, &tree, 1, true, &eval).unwrap();
        assert_eq!(result.value, 7.0);
    }

    #[test]
    fn test_min_player_prefers_lower_expectation() {
        let mut tree = ExplicitTree::new();
        let root = tree.add_decision("root", false);
        let safe = tree.add_terminal("safe", 2.0, true);
        let gamble = tree.add_chance("gamble", true);
        let lose = tree.add_terminal("lose", 10.0, true);
        let win = tree.add_terminal("win", -10.0, true);
        tree.add_child(root, safe, "safe");
        tree.add_child(root, gamble, "gamble");
        tree.add_outcome(gamble, lose, "lose", 0.4);
        tree.add_outcome(gamble, win, "win", 0.6);

        let node = tree.node(root).unwrap();
        let eval = |n: &Node<String>| tree.estimate(n);
        let result = expectiminimax(&node, &tree, 2, false, &eval).unwrap();
        assert!((result.value - (-2.0)).abs() < 1e-12);
        assert_eq!(result.best_child.unwrap().label, "gamble");
    }

    #[test]
    fn test_equal_expectations_keep_first_child() {
        let mut tree = ExplicitTree::new();
        let root = tree.add_decision("root", true);
        let sure = tree.add_terminal("sure", 5.0, false);
        let roll = tree.add_chance("roll", false);
        let lo = tree.add_terminal("lo", 0.0, false);
        let hi = tree.add_terminal("hi", 10.0, false);
        tree.add_child(root, sure, "sure");
        tree.add_child(root, roll, "roll");
        tree.add_outcome(roll, lo, "lo", 0.5);
        tree.add_outcome(roll, hi, "hi", 0.5);

        let node = tree.node(root).unwrap();
        let eval = |n: &Node<String>| tree.estimate(n);
        let result = expectiminimax(&node, &tree, 3, true, &eval).unwrap();
        assert_eq!(result.value, 5.0);
        assert_eq!(result.best_child.unwrap().label, "sure");
    }

    #[test]
    fn test_depth_zero_decision_node_is_evaluated() {
        let mut tree = ExplicitTree::new();
        let root = tree.add_decision("root", true);
        let leaf = tree.add_terminal("leaf", 1.0, false);
        tree.add_child(root, leaf, "leaf");
        tree.set_estimate(root, 0.25);

        let node = tree.node(root).unwrap();
        let eval = |n: &Node<String>| tree.estimate(n);
        let result = expectiminimax(&node, &tree, 0, true, &eval).unwrap();
        assert_eq!(result.value, 0.25);
    }

    #[test]
    fn test_depth_zero_chance_node_is_evaluated() {
        let mut tree = ExplicitTree::new();
        let roll = tree.add_chance("roll", true);
        let three = tree.add_terminal("three", 3.0, true);
        let seven = tree.add_terminal("seven", 7.0, true);
        tree.add_outcome(roll, three, "low", 0.5);
        tree.add_outcome(roll, seven, "high", 0.5);
        tree.set_estimate(roll, 1.25);

        let node = tree.node(roll).unwrap();
        let eval = |n: &Node<String>| tree.estimate(n);
        let result = expectiminimax(&node, &tree, 0, true, &eval).unwrap();
        assert_eq!(result.value, 1.25);
        assert!(result.best_child.is_none());

        let result = expectiminimax(&node, &tree, 1, true, &eval).unwrap();
        assert_eq!(result.value, 5.0);
    }

    #[test]
    fn test_nested_chance_layers_cost_no_depth() {
        let mut tree = ExplicitTree::new();
        let root = tree.add_decision("root", true);
        let first = tree.add_chance("first", false);
        let second = tree.add_chance("second", false);
        let two = tree.add_terminal("two", 2.0, false);
        let six = tree.add_terminal("six", 6.0, false);
        let ten = tree.add_terminal("ten", 10.0, false);
        tree.add_child(root, first, "roll");
        tree.add_outcome(first, second, "again", 0.5);
        tree.add_outcome(first, ten, "ten", 0.5);
        tree.add_outcome(second, two, "two", 0.5);
        tree.add_outcome(second, six, "six", 0.5);

        let node = tree.node(root).unwrap();
        let eval = |n: &Node<String>| tree.estimate(n);
        let result = expectiminimax(&node, &tree, 1, true, &eval).unwrap();
        assert_eq!(result.value, 7.0);
    }

    #[test]
    fn test_chance_without_outcomes_is_an_error() {
        let mut tree = ExplicitTree::new();
        let root = tree.add_chance("empty", true);
        let node = tree.node(root).unwrap();
        let eval = |n: &Node<String>| tree.estimate(n);
        let err = expectiminimax(&node, &tree, 2, true, &eval).unwrap_err();
        assert!(matches!(err, SearchError::InvalidTreeState { .. }));
    }

    #[test]
    fn test_check_distribution() {
        let n = Node::chance(crate::tree::NodeId(0), (), true);
        let leaf = |p: f64| Outcome::new(Node::terminal(crate::tree::NodeId(1), (), 0.0, true), "x", p);

        assert!(check_distribution(&n, &[leaf(0.5), leaf(0.5)]).is_ok());
        assert!(matches!(
            check_distribution(&n, &[leaf(0.5), leaf(0.4)]),
            Err(SearchError::InvalidDistribution { .. })
        ));
        assert!(check_distribution(&n, &[leaf(1.5), leaf(-0.5)]).is_err());
    }

    #[cfg(debug_assertions)]
    #[test]
    fn test_malformed_mass_rejected_in_debug_builds() {
        let mut tree = ExplicitTree::new();
        let root = tree.add_decision("root", true);
        let roll = tree.add_chance("roll", false);
        let a = tree.add_terminal("a", 1.0, false);
        tree.add_child(root, roll, "roll");
        tree.add_outcome(roll, a, "a", 0.9);

        let node = tree.node(root).unwrap();
        let eval = |n: &Node<String>| tree.estimate(n);
        let err = expectiminimax(&node, &tree, 1, true, &eval).unwrap_err();
        assert_eq!(err, SearchError::InvalidDistribution { node: roll, total: 0.9 });
    }
}
