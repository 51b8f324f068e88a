//! Tabular Q-learning engine for the Commandant RTS agent
//!
//! This crate implements the learning side of the decision core: the sparse
//! state/policy value table, the epsilon-greedy decision procedure with
//! time-based exploration decay, the FIFO scheduler that spreads one
//! composite policy across several ticks, and the episode controller that
//! ties them together and performs end-of-episode credit propagation.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod controller;
pub mod queue;
pub mod schedule;
pub mod stats;
pub mod table;

// Re-export the engine types
pub use config::{AgentConfig, CreditAssignment, Hyperparams};
pub use controller::{Controller, Phase};
pub use queue::ActionQueue;
pub use schedule::{ExponentialSchedule, Schedule};
pub use stats::{EpisodeStats, StatsWriter};
pub use table::ValueTable;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{AgentConfig, Controller, CreditAssignment, Hyperparams, ValueTable};
    pub use commandant_core::prelude::*;
}
