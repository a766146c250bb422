//! Constants for search depth, planner tolerances, and distribution checks.
//!
//! These are the compile-time defaults. Runtime overrides live in
//! [`crate::config`] and on the command line.

// =============================================================================
// Search Parameters
// =============================================================================

/// Default fixed depth for the deterministic and stochastic search players.
pub const DEFAULT_DEPTH: usize = 9;

// =============================================================================
// Probability Checks
// =============================================================================

/// Allowed slack when checking that outcome probabilities sum to one.
pub const PROBABILITY_TOLERANCE: f64 = 1e-9;

// =============================================================================
// Planner Parameters
// =============================================================================

/// Convergence threshold on the maximum Bellman residual.
pub const PLANNER_EPSILON: f64 = 0.001;

/// Discount factor. Games are episodic, so no discounting.
pub const PLANNER_DISCOUNT: f64 = 1.0;

/// Maximum number of sweeps before the planner reports non-convergence.
pub const PLANNER_MAX_ITERATIONS: usize = 10_000;

/// Maximum number of reachable states the planner will enumerate.
pub const PLANNER_MAX_STATES: usize = 1_000_000;

/// Optimistic initial value for unsolved states (the best possible reward).
pub const PLANNER_HEURISTIC: f64 = 1.0;

// =============================================================================
// Labels
// =============================================================================

/// Action label of the self-transition exposed by terminal states.
pub const TERMINAL_LABEL: &str = "TERMINAL";

/// Action label of the pass move exposed where another party moves.
pub const WAIT_LABEL: &str = "WAIT";
