//! Game observations, reduced to the numeric fields the core reads

use serde::{Deserialize, Serialize};

/// Outcome reported by the environment on the terminal frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// The agent won the match
    Victory,
    /// The agent lost the match
    Defeat,
    /// The match ended without a winner (e.g. time limit)
    Draw,
}

/// Counts of completed units and structures visible this tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitCensus {
    /// Worker units
    pub workers: u32,
    /// Trained marines
    pub marines: u32,
    /// Trained marauders
    pub marauders: u32,
    /// Completed command centers
    pub command_centers: u32,
    /// Completed supply depots
    pub supply_depots: u32,
    /// Completed barracks
    pub barracks: u32,
    /// Completed refineries
    pub refineries: u32,
    /// Completed tech labs
    pub tech_labs: u32,
    /// Completed bunkers
    pub bunkers: u32,
    /// Detected enemy units and structures
    pub enemy_units: u32,
    /// All own units and structures
    pub own_units: u32,
}

/// Player resource counters for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    /// Minerals currently banked
    pub minerals: u32,
    /// Vespene gas currently banked
    pub vespene: u32,
    /// Total supply capacity
    pub food_cap: u32,
    /// Supply currently consumed
    pub food_used: u32,
}

impl PlayerSnapshot {
    /// Supply still available this tick
    #[must_use]
    pub fn free_supply(&self) -> u32 {
        self.food_cap.saturating_sub(self.food_used)
    }
}

/// One tick of game state as seen by the decision core
///
/// The observation is opaque beyond these numeric fields; everything else
/// the engine reports stays on the far side of the boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Unit and structure counts
    pub census: UnitCensus,
    /// Resource counters; absent on a malformed frame from the engine bridge
    pub player: Option<PlayerSnapshot>,
    /// Simulation ticks elapsed since game start
    pub game_loop: u64,
    /// Set only on the terminal frame of an episode
    pub outcome: Option<Outcome>,
}

impl Observation {
    /// True once the environment has signalled the end of the episode
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.outcome.is_some()
    }
}
