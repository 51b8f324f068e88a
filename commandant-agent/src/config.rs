//! Agent configuration and hyperparameter regimes

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Learning rate and discount factor for one update
///
/// Exactly two named regimes exist: [`Hyperparams::live`] for per-tick
/// learning and [`Hyperparams::retrain`] for the terminal propagation pass.
/// The regime in force is passed explicitly into every table update, so
/// there is no shared mutable toggle to restore and no reentrancy hazard if
/// propagation is interrupted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hyperparams {
    /// Step size of the Q-update
    pub learning_rate: f64,
    /// Discount factor applied to the bootstrap term
    pub discount: f64,
}

impl Hyperparams {
    /// Regime used for per-tick learning
    #[must_use]
    pub fn live() -> Self {
        Self {
            learning_rate: 0.001,
            discount: 0.9,
        }
    }

    /// Regime used only during terminal credit propagation
    #[must_use]
    pub fn retrain() -> Self {
        Self {
            learning_rate: 0.01,
            discount: 0.99,
        }
    }
}

/// How the propagation pass combines a step's own reward with the terminal
/// reward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditAssignment {
    /// Substitute the terminal reward for the step's own reward
    #[default]
    ReplaceWithFinal,
    /// Add the step's own reward to the terminal reward
    AddToFinal,
}

/// Configuration for the episode controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Whether learning updates and exploration are active
    pub training: bool,
    /// Upper bound of the exploration rate
    pub exploration_max: f64,
    /// Floor applied to the decayed exploration rate
    pub exploration_min: f64,
    /// Exponential decay rate of exploration per episode
    pub exploration_decay: f64,
    /// Simulation steps per agent step, used by the state encoder
    pub step_mul: u32,
    /// Per-tick learning regime
    pub live: Hyperparams,
    /// Terminal-propagation learning regime
    pub retrain: Hyperparams,
    /// Credit strategy of the propagation pass
    pub credit: CreditAssignment,
    /// Value-table snapshot location
    pub snapshot_path: PathBuf,
    /// Episode statistics log location, if any
    pub stats_path: Option<PathBuf>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            training: true,
            exploration_max: 1.0,
            exploration_min: 0.1,
            exploration_decay: 0.0003,
            step_mul: 8,
            live: Hyperparams::live(),
            retrain: Hyperparams::retrain(),
            credit: CreditAssignment::default(),
            snapshot_path: PathBuf::from("qlearning_table.csv"),
            stats_path: None,
        }
    }
}
