//! Runtime configuration for searches, planners, and matches.

use crate::constants::{
    DEFAULT_DEPTH, PLANNER_DISCOUNT, PLANNER_EPSILON, PLANNER_HEURISTIC, PLANNER_MAX_ITERATIONS,
    PLANNER_MAX_STATES,
};

/// Configuration for the fixed-depth search players.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Search depth in plies. Recursion depth grows with it, so keep it bounded.
    pub depth: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            depth: DEFAULT_DEPTH,
        }
    }
}

impl SearchConfig {
    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }
}

/// Configuration for the value-iteration planner.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Stop once the largest Bellman residual of a sweep drops below this.
    pub epsilon: f64,
    pub discount: f64,
    /// Sweeps allowed before reporting non-convergence.
    pub max_iterations: usize,
    /// Upper bound on the number of states enumerated from the initial state.
    pub max_states: usize,
    /// Initial value of non-goal states. Should be at least the best
    /// achievable reward so the first sweeps stay optimistic.
    pub heuristic: f64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            epsilon: PLANNER_EPSILON,
            discount: PLANNER_DISCOUNT,
            max_iterations: PLANNER_MAX_ITERATIONS,
            max_states: PLANNER_MAX_STATES,
            heuristic: PLANNER_HEURISTIC,
        }
    }
}

impl PlannerConfig {
    /// Small limits for tests.
    pub fn for_testing() -> Self {
        Self {
            max_iterations: 100,
            max_states: 10_000,
            ..Self::default()
        }
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_discount(mut self, discount: f64) -> Self {
        self.discount = discount;
        self
    }

    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    pub fn with_max_states(mut self, n: usize) -> Self {
        self.max_states = n;
        self
    }

    pub fn with_heuristic(mut self, value: f64) -> Self {
        self.heuristic = value;
        self
    }
}

/// Configuration for a match between two players.
#[derive(Debug, Clone, Default)]
pub struct MatchConfig {
    /// Abort with an error after this many turns. `None` trusts the tree to
    /// be finite.
    pub max_turns: Option<usize>,
    /// Seed for drawing chance outcomes.
    pub seed: u64,
}

impl MatchConfig {
    pub fn with_max_turns(mut self, n: usize) -> Self {
        self.max_turns = Some(n);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}
