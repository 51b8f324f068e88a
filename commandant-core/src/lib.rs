//! Core types and collaborator contracts for the Commandant decision core
//!
//! This crate provides the foundational abstractions shared by the tabular
//! learning engine and the game-side collaborators: observations, atomic
//! actions, policies, state keys, reward contracts and trajectories.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod action;
pub mod error;
pub mod observation;
pub mod policy;
pub mod reward;
pub mod state;
pub mod trajectory;

// Re-export core traits and types
pub use action::{ActionHandler, ActionOutcome, ActionRegistry, AtomicAction, Command, Position};
pub use error::{AgentError, Result};
pub use observation::{Observation, Outcome, PlayerSnapshot, UnitCensus};
pub use policy::{PolicyId, PolicyRegistry};
pub use reward::RewardModel;
pub use state::{StateEncoder, StateKey, Successor, STATE_DIM};
pub use trajectory::{Trajectory, Transition};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        ActionHandler, ActionOutcome, ActionRegistry, AtomicAction, Command, Observation,
        Outcome, PolicyId, PolicyRegistry, Result, RewardModel, StateEncoder, StateKey,
        Successor, Trajectory, Transition,
    };
}
