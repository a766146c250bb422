//! Planning over a game tree as a Markov decision process.
//!
//! [`GameDomain`] turns a tree, an opponent model, and a player role into a
//! [`Domain`]: the controlled player picks a child, then the opponent policy
//! decides where the game goes next. Any [`Planner`] built from a
//! [`PlannerFactory`] can solve such a domain. [`ValueIteration`] is the
//! planner shipped with the crate.
//!
//! Planners are opened for one turn and dropped at its end. The only thing
//! that survives a turn is the [`Policy`] a planner exports.

use std::collections::{HashMap, VecDeque};

use tracing::debug;

use crate::config::PlannerConfig;
use crate::constants::{TERMINAL_LABEL, WAIT_LABEL};
use crate::error::{PlannerError, SearchError};
use crate::policy::{chance_distribution, Distribution, OpponentPolicy, Policy};
use crate::tree::{Edge, GameTree, Node, NodeId};

// =============================================================================
// Domain Contract
// =============================================================================

/// The contract a planner solves: states are nodes, actions are edges.
pub trait Domain {
    type State: Clone;

    fn initial_state(&self) -> Node<Self::State>;

    fn is_terminal(&self, state: &Node<Self::State>) -> bool;

    /// Where the game may be after taking `action` in `state`.
    fn transition_distribution(
        &self,
        state: &Node<Self::State>,
        action: &Edge<Self::State>,
    ) -> Result<Distribution<Self::State>, SearchError>;

    fn applicable_actions(&self, state: &Node<Self::State>) -> Vec<Edge<Self::State>>;

    /// Reward for the transition `prev --action--> next`.
    fn transition_value(
        &self,
        prev: &Node<Self::State>,
        action: &Edge<Self::State>,
        next: &Node<Self::State>,
    ) -> f64;

    fn goal_test(&self, state: &Node<Self::State>) -> bool;
}

/// Adapter exposing a game tree and an opponent policy as a [`Domain`].
///
/// Rewards are only paid when the game ends. They equal the terminal value
/// for the max player and its negation for the min player, so a planner
/// always maximizes on behalf of whichever side it controls.
///
/// Planner states are the nodes where the planned side moves, plus terminal
/// nodes. Chance draws and opponent moves in between are folded into the
/// transition distribution. A state where someone else moves (such as a
/// chance root) exposes a single `WAIT` action.
pub struct GameDomain<'a, T: GameTree + ?Sized, P> {
    tree: &'a T,
    root: Node<T::State>,
    opponent: P,
    max_player: bool,
}

impl<'a, T, P> GameDomain<'a, T, P>
where
    T: GameTree + ?Sized,
    P: OpponentPolicy<T::State>,
{
    pub fn new(tree: &'a T, root: Node<T::State>, opponent: P, max_player: bool) -> Self {
        Self {
            tree,
            root,
            opponent,
            max_player,
        }
    }

    fn sign(&self) -> f64 {
        if self.max_player { 1.0 } else { -1.0 }
    }

    /// Whether the planned side picks the move at `node`.
    fn controls(&self, node: &Node<T::State>) -> bool {
        !node.is_chance() && node.max_player == self.max_player
    }

    /// Follow chance draws and opponent moves from `node` until the planned
    /// side is to move or the game is over. Every node reached is pushed with
    /// the probability of getting there.
    fn settle(
        &self,
        node: Node<T::State>,
        p: f64,
        out: &mut Vec<(f64, Node<T::State>)>,
    ) -> Result<(), SearchError> {
        if self.tree.is_terminal(&node) || self.controls(&node) {
            out.push((p, node));
            return Ok(());
        }
        let next = if node.is_chance() {
            chance_distribution(self.tree, &node)?
        } else {
            self.opponent.distribution(&node)?
        };
        for (q, successor) in next {
            self.settle(successor, p * q, out)?;
        }
        Ok(())
    }
}

impl<T, P> Domain for GameDomain<'_, T, P>
where
    T: GameTree + ?Sized,
    P: OpponentPolicy<T::State>,
{
    type State = T::State;

    fn initial_state(&self) -> Node<T::State> {
        self.root.clone()
    }

    fn is_terminal(&self, state: &Node<T::State>) -> bool {
        self.tree.is_terminal(state)
    }

    fn transition_distribution(
        &self,
        _state: &Node<T::State>,
        action: &Edge<T::State>,
    ) -> Result<Distribution<T::State>, SearchError> {
        let mut entries = Vec::new();
        self.settle(action.node.clone(), 1.0, &mut entries)?;
        Ok(Distribution::new(entries))
    }

    fn applicable_actions(&self, state: &Node<T::State>) -> Vec<Edge<T::State>> {
        if self.tree.is_terminal(state) {
            return vec![Edge::new(state.clone(), TERMINAL_LABEL)];
        }
        if !self.controls(state) {
            return vec![Edge::new(state.clone(), WAIT_LABEL)];
        }
        self.tree.children(state)
    }

    fn transition_value(
        &self,
        prev: &Node<T::State>,
        _action: &Edge<T::State>,
        next: &Node<T::State>,
    ) -> f64 {
        if next.is_terminal() && prev != next {
            self.sign() * next.terminal_value
        } else {
            0.0
        }
    }

    fn goal_test(&self, state: &Node<T::State>) -> bool {
        self.tree.is_terminal(state)
    }
}

// =============================================================================
// Planner Contract
// =============================================================================

/// A solver for a [`Domain`].
pub trait Planner<S> {
    /// Compute the value function and policy.
    fn solve(&mut self) -> Result<(), PlannerError>;

    /// Action to take from `state` under the solved policy.
    fn sample_action(&mut self, state: &Node<S>) -> Result<Edge<S>, PlannerError>;

    /// Export the decisions made for every solved state.
    fn policy(&self) -> Policy<S>;
}

/// Opens a planner bound to a domain.
///
/// Injected into players so that the planning algorithm can be swapped
/// without touching the game loop.
pub trait PlannerFactory {
    fn open<'d, D>(&self, domain: D) -> Result<Box<dyn Planner<D::State> + 'd>, PlannerError>
    where
        D: Domain + 'd;
}

// =============================================================================
// Value Iteration
// =============================================================================

/// Factory for [`ValueIterationPlanner`].
#[derive(Debug, Clone, Default)]
pub struct ValueIteration {
    pub config: PlannerConfig,
}

impl ValueIteration {
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }
}

impl PlannerFactory for ValueIteration {
    fn open<'d, D>(&self, domain: D) -> Result<Box<dyn Planner<D::State> + 'd>, PlannerError>
    where
        D: Domain + 'd,
    {
        Ok(Box::new(ValueIterationPlanner::new(domain, self.config.clone())))
    }
}

/// One outcome of an action: probability, successor index, reward.
type Transition = (f64, usize, f64);

/// Value iteration over the states reachable from the domain's initial state.
///
/// States are enumerated breadth-first. Non-goal states start at the
/// configured heuristic, goal states at zero. Sweeps update values in place
/// until the largest change falls below `epsilon`.
pub struct ValueIterationPlanner<D: Domain> {
    domain: D,
    config: PlannerConfig,
    states: Vec<Node<D::State>>,
    index: HashMap<NodeId, usize>,
    goals: Vec<bool>,
    actions: Vec<Vec<(Edge<D::State>, Vec<Transition>)>>,
    values: Vec<f64>,
    solved: bool,
}

impl<D: Domain> ValueIterationPlanner<D> {
    pub fn new(domain: D, config: PlannerConfig) -> Self {
        Self {
            domain,
            config,
            states: Vec::new(),
            index: HashMap::new(),
            goals: Vec::new(),
            actions: Vec::new(),
            values: Vec::new(),
            solved: false,
        }
    }

    /// Value of a solved state.
    pub fn value(&self, state: NodeId) -> Option<f64> {
        self.index
            .get(&state)
            .and_then(|&i| self.values.get(i).copied())
    }

    /// Number of states reached from the initial state.
    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    fn intern(&mut self, node: Node<D::State>, queue: &mut VecDeque<usize>) -> Result<usize, PlannerError> {
        if let Some(&i) = self.index.get(&node.id) {
            return Ok(i);
        }
        if self.states.len() >= self.config.max_states {
            return Err(PlannerError::StateLimit {
                limit: self.config.max_states,
            });
        }
        let i = self.states.len();
        self.index.insert(node.id, i);
        self.goals.push(self.domain.goal_test(&node));
        self.states.push(node);
        self.actions.push(Vec::new());
        queue.push_back(i);
        Ok(i)
    }

    /// Breadth-first enumeration of reachable states and their transitions.
    fn explore(&mut self) -> Result<(), PlannerError> {
        self.states.clear();
        self.index.clear();
        self.goals.clear();
        self.actions.clear();

        let mut queue = VecDeque::new();
        self.intern(self.domain.initial_state(), &mut queue)?;

        while let Some(i) = queue.pop_front() {
            if self.goals[i] {
                continue;
            }
            let state = self.states[i].clone();
            let applicable = self.domain.applicable_actions(&state);
            if applicable.is_empty() {
                return Err(PlannerError::NoApplicableActions(state.id));
            }

            let mut expanded = Vec::with_capacity(applicable.len());
            for action in applicable {
                let dist = self.domain.transition_distribution(&state, &action)?;
                let mut transitions = Vec::with_capacity(dist.len());
                for (p, next) in dist {
                    let reward = self.domain.transition_value(&state, &action, &next);
                    let j = self.intern(next, &mut queue)?;
                    transitions.push((p, j, reward));
                }
                expanded.push((action, transitions));
            }
            self.actions[i] = expanded;
        }
        Ok(())
    }

    fn q_value(&self, transitions: &[Transition]) -> f64 {
        transitions
            .iter()
            .map(|&(p, j, r)| p * (r + self.config.discount * self.values[j]))
            .sum()
    }

    /// Index of the greedy action at state `i`. The first best action wins.
    fn greedy(&self, i: usize) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for (a, (_, transitions)) in self.actions[i].iter().enumerate() {
            let q = self.q_value(transitions);
            if best.is_none_or(|(_, v)| q > v) {
                best = Some((a, q));
            }
        }
        best
    }
}

impl<D: Domain> Planner<D::State> for ValueIterationPlanner<D> {
    fn solve(&mut self) -> Result<(), PlannerError> {
        self.solved = false;
        self.explore()?;

        self.values = self
            .goals
            .iter()
            .map(|&goal| if goal { 0.0 } else { self.config.heuristic })
            .collect();

        let mut residual = f64::INFINITY;
        for iteration in 1..=self.config.max_iterations {
            residual = 0.0;
            for i in 0..self.states.len() {
                if self.goals[i] {
                    continue;
                }
                if let Some((_, q)) = self.greedy(i) {
                    residual = residual.max((q - self.values[i]).abs());
                    self.values[i] = q;
                }
            }
            if residual < self.config.epsilon {
                debug!(
                    states = self.states.len(),
                    iterations = iteration,
                    residual,
                    value = self.values[0],
                    "value iteration converged"
                );
                self.solved = true;
                return Ok(());
            }
        }

        Err(PlannerError::NotConverged {
            iterations: self.config.max_iterations,
            residual,
        })
    }

    fn sample_action(&mut self, state: &Node<D::State>) -> Result<Edge<D::State>, PlannerError> {
        if !self.solved {
            return Err(PlannerError::Unsolved);
        }
        let &i = self
            .index
            .get(&state.id)
            .ok_or(PlannerError::UnknownState(state.id))?;
        if self.goals[i] {
            return self
                .domain
                .applicable_actions(state)
                .into_iter()
                .next()
                .ok_or(PlannerError::NoApplicableActions(state.id));
        }
        let (a, _) = self
            .greedy(i)
            .ok_or(PlannerError::NoApplicableActions(state.id))?;
        Ok(self.actions[i][a].0.clone())
    }

    fn policy(&self) -> Policy<D::State> {
        let mut policy = Policy::new();
        if !self.solved {
            return policy;
        }
        for (i, state) in self.states.iter().enumerate() {
            if self.goals[i] {
                continue;
            }
            if let Some((a, _)) = self.greedy(i) {
                policy.insert(state.id, self.actions[i][a].0.clone(), self.values[i]);
            }
        }
        policy
    }
}
