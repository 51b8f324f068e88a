//! Episode trajectories

use serde::{Deserialize, Serialize};

use crate::{PolicyId, StateKey, Successor};

/// Single `(state, policy, reward, next_state)` entry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    /// State the decision was made in
    pub state: StateKey,
    /// Policy chosen there
    pub policy: PolicyId,
    /// Reward accumulated while the policy's actions executed
    pub reward: f64,
    /// State observed at the next decision point
    pub next: Successor,
}

/// Ordered record of one episode's decisions
///
/// Accumulated over one episode, cleared at episode start, consumed by the
/// credit-propagation pass at episode end.
#[derive(Debug, Clone, Default)]
pub struct Trajectory {
    transitions: Vec<Transition>,
    total_reward: f64,
}

impl Trajectory {
    /// Create an empty trajectory
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a transition
    pub fn push(&mut self, transition: Transition) {
        self.total_reward += transition.reward;
        self.transitions.push(transition);
    }

    /// Number of recorded transitions
    #[must_use]
    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    /// Whether no transitions have been recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// Sum of recorded per-step rewards
    #[must_use]
    pub fn total_reward(&self) -> f64 {
        self.total_reward
    }

    /// Drop all transitions at an episode boundary
    pub fn clear(&mut self) {
        self.transitions.clear();
        self.total_reward = 0.0;
    }

    /// Iterate the transitions in decision order
    pub fn iter(&self) -> std::slice::Iter<'_, Transition> {
        self.transitions.iter()
    }
}

impl<'a> IntoIterator for &'a Trajectory {
    type Item = &'a Transition;
    type IntoIter = std::slice::Iter<'a, Transition>;

    fn into_iter(self) -> Self::IntoIter {
        self.transitions.iter()
    }
}
