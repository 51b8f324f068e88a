//! Skirmish environment and game-side collaborators for the Commandant agent
//!
//! This crate provides the pieces that live on the game side of the decision
//! core: a small deterministic skirmish simulation, the precondition-checking
//! handlers for every atomic action, the reward rules, and an episode runner
//! that wires a controller to the simulation.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod handlers;
pub mod rewards;
pub mod runner;
pub mod skirmish;

// Re-export the environment surface
pub use handlers::standard_handlers;
pub use rewards::StandardRewardModel;
pub use runner::{init_logging, run_episodes};
pub use skirmish::{SkirmishConfig, SkirmishSim};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{standard_handlers, SkirmishConfig, SkirmishSim, StandardRewardModel};
    pub use commandant_agent::prelude::*;
}
