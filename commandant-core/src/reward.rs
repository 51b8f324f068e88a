//! Reward contracts at the collaborator boundary

use crate::{AtomicAction, Observation, Outcome};

/// Computes the learning signal for executed actions and episode outcomes
///
/// The reward rules themselves live with the game-side collaborators; the
/// core only defines the accumulation contract. Implementations may carry
/// rolling state (previous unit counts, previous resource levels) and are
/// told about episode boundaries through [`RewardModel::reset`].
pub trait RewardModel {
    /// Instantaneous reward for one dispatched atomic action
    fn action_reward(&mut self, action: AtomicAction, executed: bool, obs: &Observation) -> f64;

    /// Outcome-dependent reward available only at episode end
    fn terminal_reward(&mut self, obs: &Observation, outcome: Outcome) -> f64;

    /// Forget any rolling tracking at an episode boundary
    fn reset(&mut self) {}
}
