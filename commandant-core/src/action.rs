//! Atomic actions, engine commands and the action-handler registry

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::Observation;

/// One indivisible command issued at a single decision tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AtomicAction {
    /// Idle for one tick
    DoNothing,
    /// Train a worker at a command center
    BuildScv,
    /// Send an idle worker to a mineral patch
    HarvestMinerals,
    /// Send a worker to a refinery
    HarvestGas,
    /// Construct an additional command center
    BuildCommandCenter,
    /// Construct a supply depot
    BuildSupplyDepot,
    /// Construct a barracks
    BuildBarracks,
    /// Attach a tech lab to a barracks
    BuildTechLab,
    /// Construct a bunker
    BuildBunker,
    /// Scout the map with a worker
    Explore,
    /// Train a marine at a barracks
    TrainMarine,
    /// Train a marauder at a tech-lab barracks
    TrainMarauder,
    /// Send marines at the enemy base
    AttackWithMarine,
    /// Pull marines back to defend the base
    DefenseWithMarine,
    /// Send marauders at the enemy base
    AttackWithMarauder,
}

impl AtomicAction {
    /// Every primitive action, in stable order
    pub const ALL: [AtomicAction; 15] = [
        AtomicAction::DoNothing,
        AtomicAction::BuildScv,
        AtomicAction::HarvestMinerals,
        AtomicAction::HarvestGas,
        AtomicAction::BuildCommandCenter,
        AtomicAction::BuildSupplyDepot,
        AtomicAction::BuildBarracks,
        AtomicAction::BuildTechLab,
        AtomicAction::BuildBunker,
        AtomicAction::Explore,
        AtomicAction::TrainMarine,
        AtomicAction::TrainMarauder,
        AtomicAction::AttackWithMarine,
        AtomicAction::DefenseWithMarine,
        AtomicAction::AttackWithMarauder,
    ];

    /// Stable name used in logs and the stats file
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AtomicAction::DoNothing => "do_nothing",
            AtomicAction::BuildScv => "build_scv",
            AtomicAction::HarvestMinerals => "harvest_minerals",
            AtomicAction::HarvestGas => "harvest_gas",
            AtomicAction::BuildCommandCenter => "build_command_center",
            AtomicAction::BuildSupplyDepot => "build_supply_depot",
            AtomicAction::BuildBarracks => "build_barracks",
            AtomicAction::BuildTechLab => "build_tech_lab",
            AtomicAction::BuildBunker => "build_bunker",
            AtomicAction::Explore => "explore",
            AtomicAction::TrainMarine => "train_marine",
            AtomicAction::TrainMarauder => "train_marauder",
            AtomicAction::AttackWithMarine => "attack_with_marine",
            AtomicAction::DefenseWithMarine => "defense_with_marine",
            AtomicAction::AttackWithMarauder => "attack_with_marauder",
        }
    }

    /// Look an action up by its stable name
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|a| a.as_str() == name)
    }

    /// Position of this action in [`AtomicAction::ALL`]
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Whether this is an attack or defense order
    #[must_use]
    pub fn is_combat(self) -> bool {
        matches!(
            self,
            AtomicAction::AttackWithMarine
                | AtomicAction::DefenseWithMarine
                | AtomicAction::AttackWithMarauder
        )
    }
}

impl fmt::Display for AtomicAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map coordinates attached to an engine command
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal map coordinate
    pub x: f32,
    /// Vertical map coordinate
    pub y: f32,
}

impl Position {
    /// Create a position
    #[must_use]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Engine command produced by dispatching an atomic action
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Command {
    /// The action this command carries out
    pub action: AtomicAction,
    /// Target location, when the command needs one
    pub target: Option<Position>,
}

impl Command {
    /// Create a command
    #[must_use]
    pub fn new(action: AtomicAction, target: Option<Position>) -> Self {
        Self { action, target }
    }

    /// The idle command
    #[must_use]
    pub fn no_op() -> Self {
        Self {
            action: AtomicAction::DoNothing,
            target: None,
        }
    }

    /// True for the idle command
    #[must_use]
    pub fn is_no_op(&self) -> bool {
        self.action == AtomicAction::DoNothing
    }
}

/// Result of dispatching one atomic action
///
/// An action whose preconditions are not met this tick still yields a valid
/// outcome with `executed == false`; that is normal operation, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActionOutcome {
    /// Command to hand to the engine this tick
    pub command: Command,
    /// Whether the preconditions held and the command was actually issued
    pub executed: bool,
    /// Where the command takes effect, when known
    pub position: Option<Position>,
}

impl ActionOutcome {
    /// Outcome for an action whose preconditions were not met
    #[must_use]
    pub fn skipped() -> Self {
        Self {
            command: Command::no_op(),
            executed: false,
            position: None,
        }
    }

    /// Outcome for a successfully issued command
    #[must_use]
    pub fn issued(command: Command, position: Option<Position>) -> Self {
        Self {
            command,
            executed: true,
            position,
        }
    }
}

/// Handler for one atomic-action family
///
/// Implementations check the action's preconditions against the observation
/// and produce the engine command for this tick.
pub trait ActionHandler {
    /// Check preconditions and produce the command for this tick
    fn execute(&self, obs: &Observation) -> ActionOutcome;
}

/// Static lookup from atomic action to its handler
///
/// Each controller owns its registry; there is no process-wide dispatch
/// table. A missing handler degrades to a logged no-op outcome.
#[derive(Default)]
pub struct ActionRegistry {
    handlers: IndexMap<AtomicAction, Box<dyn ActionHandler>>,
}

impl ActionRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the handler for one action, replacing any previous handler
    pub fn register(&mut self, action: AtomicAction, handler: impl ActionHandler + 'static) {
        self.handlers.insert(action, Box::new(handler));
    }

    /// Dispatch one action through its registered handler
    pub fn dispatch(&self, action: AtomicAction, obs: &Observation) -> ActionOutcome {
        match self.handlers.get(&action) {
            Some(handler) => handler.execute(obs),
            None => {
                tracing::warn!(action = %action, "no handler registered, emitting no-op");
                ActionOutcome::skipped()
            }
        }
    }

    /// Number of registered handlers
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether the registry has no handlers
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysIssue(AtomicAction);

    impl ActionHandler for AlwaysIssue {
        fn execute(&self, _obs: &Observation) -> ActionOutcome {
            ActionOutcome::issued(Command::new(self.0, None), None)
        }
    }

    #[test]
    fn names_round_trip() {
        for action in AtomicAction::ALL {
            assert_eq!(AtomicAction::from_name(action.as_str()), Some(action));
        }
    }

    #[test]
    fn dispatch_uses_registered_handler() {
        let mut registry = ActionRegistry::new();
        registry.register(AtomicAction::TrainMarine, AlwaysIssue(AtomicAction::TrainMarine));

        let outcome = registry.dispatch(AtomicAction::TrainMarine, &Observation::default());
        assert!(outcome.executed);
        assert_eq!(outcome.command.action, AtomicAction::TrainMarine);
    }

    #[test]
    fn dispatch_without_handler_is_a_noop() {
        let registry = ActionRegistry::new();
        let outcome = registry.dispatch(AtomicAction::BuildBunker, &Observation::default());
        assert!(!outcome.executed);
        assert!(outcome.command.is_no_op());
        assert!(outcome.position.is_none());
    }
}
