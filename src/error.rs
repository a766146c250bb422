//! Error types for search, planning, and the game loop.

use thiserror::Error;

use crate::tree::NodeId;

/// Errors raised when a tree breaks the search contract.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SearchError {
    /// A non-terminal node has nothing to expand, or a node of the wrong
    /// kind was handed to a search that cannot handle it.
    #[error("invalid tree state at node {node}: {reason}")]
    InvalidTreeState { node: NodeId, reason: String },

    /// Outcome probabilities of a chance node do not form a distribution.
    #[error("invalid distribution at node {node}: probabilities sum to {total}")]
    InvalidDistribution { node: NodeId, total: f64 },
}

impl SearchError {
    pub(crate) fn no_children(node: NodeId) -> Self {
        SearchError::InvalidTreeState {
            node,
            reason: "non-terminal node has no children".to_string(),
        }
    }

    pub(crate) fn no_outcomes(node: NodeId) -> Self {
        SearchError::InvalidTreeState {
            node,
            reason: "chance node has no outcomes".to_string(),
        }
    }
}

/// Errors reported by a planner.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlannerError {
    #[error("planner did not converge after {iterations} iterations (residual {residual})")]
    NotConverged { iterations: usize, residual: f64 },

    #[error("planner reached the limit of {limit} states")]
    StateLimit { limit: usize },

    #[error("planner has not been solved")]
    Unsolved,

    #[error("state {0} was not reached by the planner")]
    UnknownState(NodeId),

    #[error("no applicable action from state {0}")]
    NoApplicableActions(NodeId),

    #[error(transparent)]
    Search(#[from] SearchError),
}

/// Errors that end a match.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GameError {
    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Planner(#[from] PlannerError),

    #[error("search at node {0} did not select a move")]
    NoMove(NodeId),

    #[error("move {label} is not a child of node {node}")]
    IllegalMove { node: NodeId, label: String },

    #[error("turn limit of {0} reached before a terminal node")]
    TurnLimit(usize),
}
