//! Precondition-checking handlers for the atomic actions
//!
//! One handler per action family. Each checks the action's preconditions
//! against the current observation and either issues the engine command with
//! its target position or reports a skipped outcome; a skipped action is
//! normal operation, not an error.

use commandant_core::{
    ActionHandler, ActionOutcome, ActionRegistry, AtomicAction, Command, Observation,
    PlayerSnapshot, Position,
};

const OWN_BASE: Position = Position { x: 30.0, y: 30.0 };
const ENEMY_BASE: Position = Position { x: 80.0, y: 80.0 };
const MINERAL_LINE: Position = Position { x: 25.0, y: 32.0 };

// Prices mirrored from the engine's build rules.
const SCV_COST: u32 = 50;
const REFINERY_COST: u32 = 75;
const COMMAND_CENTER_COST: u32 = 400;
const SUPPLY_DEPOT_COST: u32 = 100;
const BARRACKS_COST: u32 = 150;
const TECH_LAB_COST: u32 = 50;
const TECH_LAB_GAS_COST: u32 = 25;
const BUNKER_COST: u32 = 100;
const MARINE_COST: u32 = 50;
const MARAUDER_COST: u32 = 100;
const MARAUDER_GAS_COST: u32 = 25;

fn player(obs: &Observation) -> Option<&PlayerSnapshot> {
    obs.player.as_ref()
}

/// The idle action; always succeeds
pub struct IdleHandler;

impl ActionHandler for IdleHandler {
    fn execute(&self, _obs: &Observation) -> ActionOutcome {
        ActionOutcome::issued(Command::no_op(), None)
    }
}

/// Worker assignment to minerals or gas
pub struct HarvestHandler {
    gas: bool,
}

impl ActionHandler for HarvestHandler {
    fn execute(&self, obs: &Observation) -> ActionOutcome {
        if obs.census.workers == 0 {
            return ActionOutcome::skipped();
        }
        if self.gas {
            // The first gas order pays for the refinery itself.
            let affordable = obs.census.refineries > 0
                || player(obs).is_some_and(|p| p.minerals >= REFINERY_COST);
            if !affordable {
                return ActionOutcome::skipped();
            }
            let command = Command::new(AtomicAction::HarvestGas, Some(OWN_BASE));
            return ActionOutcome::issued(command, Some(OWN_BASE));
        }
        let command = Command::new(AtomicAction::HarvestMinerals, Some(MINERAL_LINE));
        ActionOutcome::issued(command, Some(MINERAL_LINE))
    }
}

/// Worker production at a command center
pub struct TrainScvHandler;

impl ActionHandler for TrainScvHandler {
    fn execute(&self, obs: &Observation) -> ActionOutcome {
        let Some(player) = player(obs) else {
            return ActionOutcome::skipped();
        };
        if obs.census.command_centers > 0 && player.minerals >= SCV_COST && player.free_supply() >= 1
        {
            let command = Command::new(AtomicAction::BuildScv, None);
            return ActionOutcome::issued(command, Some(OWN_BASE));
        }
        ActionOutcome::skipped()
    }
}

/// Structure construction
pub struct BuildHandler {
    action: AtomicAction,
}

impl BuildHandler {
    fn preconditions_hold(&self, obs: &Observation) -> bool {
        let Some(player) = player(obs) else {
            return false;
        };
        let census = &obs.census;
        match self.action {
            AtomicAction::BuildCommandCenter => player.minerals >= COMMAND_CENTER_COST,
            AtomicAction::BuildSupplyDepot => player.minerals >= SUPPLY_DEPOT_COST,
            AtomicAction::BuildBarracks => {
                census.supply_depots > 0 && player.minerals >= BARRACKS_COST
            }
            AtomicAction::BuildTechLab => {
                census.barracks > census.tech_labs
                    && player.minerals >= TECH_LAB_COST
                    && player.vespene >= TECH_LAB_GAS_COST
            }
            AtomicAction::BuildBunker => census.barracks > 0 && player.minerals >= BUNKER_COST,
            _ => false,
        }
    }
}

impl ActionHandler for BuildHandler {
    fn execute(&self, obs: &Observation) -> ActionOutcome {
        if !self.preconditions_hold(obs) {
            return ActionOutcome::skipped();
        }
        // Stagger placements so structures spread out from the base.
        #[allow(clippy::cast_precision_loss)]
        let offset = obs.census.own_units as f32;
        let site = Position::new(OWN_BASE.x + offset % 10.0, OWN_BASE.y + offset % 6.0);
        ActionOutcome::issued(Command::new(self.action, Some(site)), Some(site))
    }
}

/// Combat-unit production at a barracks
pub struct TrainHandler {
    action: AtomicAction,
}

impl ActionHandler for TrainHandler {
    fn execute(&self, obs: &Observation) -> ActionOutcome {
        let Some(player) = player(obs) else {
            return ActionOutcome::skipped();
        };
        let census = &obs.census;
        let ready = match self.action {
            AtomicAction::TrainMarine => {
                census.barracks > 0 && player.minerals >= MARINE_COST && player.free_supply() >= 1
            }
            AtomicAction::TrainMarauder => {
                census.tech_labs > 0
                    && player.minerals >= MARAUDER_COST
                    && player.vespene >= MARAUDER_GAS_COST
                    && player.free_supply() >= 2
            }
            _ => false,
        };
        if ready {
            ActionOutcome::issued(Command::new(self.action, None), Some(OWN_BASE))
        } else {
            ActionOutcome::skipped()
        }
    }
}

/// Attack and defense orders
pub struct CombatHandler {
    action: AtomicAction,
}

impl ActionHandler for CombatHandler {
    fn execute(&self, obs: &Observation) -> ActionOutcome {
        let census = &obs.census;
        let (ready, target) = match self.action {
            AtomicAction::AttackWithMarine => (census.marines > 0, ENEMY_BASE),
            AtomicAction::AttackWithMarauder => (census.marauders > 0, ENEMY_BASE),
            AtomicAction::DefenseWithMarine => (census.marines > 0, OWN_BASE),
            _ => (false, OWN_BASE),
        };
        if ready {
            ActionOutcome::issued(Command::new(self.action, Some(target)), Some(target))
        } else {
            ActionOutcome::skipped()
        }
    }
}

/// Map scouting with a worker
pub struct ScoutHandler;

impl ActionHandler for ScoutHandler {
    fn execute(&self, obs: &Observation) -> ActionOutcome {
        if obs.census.workers == 0 {
            return ActionOutcome::skipped();
        }
        let command = Command::new(AtomicAction::Explore, Some(ENEMY_BASE));
        ActionOutcome::issued(command, Some(ENEMY_BASE))
    }
}

/// Registry with the standard handler for every atomic action
#[must_use]
pub fn standard_handlers() -> ActionRegistry {
    let mut registry = ActionRegistry::new();
    registry.register(AtomicAction::DoNothing, IdleHandler);
    registry.register(AtomicAction::BuildScv, TrainScvHandler);
    registry.register(AtomicAction::HarvestMinerals, HarvestHandler { gas: false });
    registry.register(AtomicAction::HarvestGas, HarvestHandler { gas: true });
    for action in [
        AtomicAction::BuildCommandCenter,
        AtomicAction::BuildSupplyDepot,
        AtomicAction::BuildBarracks,
        AtomicAction::BuildTechLab,
        AtomicAction::BuildBunker,
    ] {
        registry.register(action, BuildHandler { action });
    }
    for action in [AtomicAction::TrainMarine, AtomicAction::TrainMarauder] {
        registry.register(action, TrainHandler { action });
    }
    for action in [
        AtomicAction::AttackWithMarine,
        AtomicAction::AttackWithMarauder,
        AtomicAction::DefenseWithMarine,
    ] {
        registry.register(action, CombatHandler { action });
    }
    registry.register(AtomicAction::Explore, ScoutHandler);
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use commandant_core::UnitCensus;

    fn obs(census: UnitCensus, minerals: u32, vespene: u32) -> Observation {
        Observation {
            census,
            player: Some(PlayerSnapshot {
                minerals,
                vespene,
                food_cap: 30,
                food_used: 10,
            }),
            game_loop: 0,
            outcome: None,
        }
    }

    #[test]
    fn every_action_has_a_handler() {
        let registry = standard_handlers();
        assert_eq!(registry.len(), AtomicAction::ALL.len());
    }

    #[test]
    fn training_a_marine_requires_a_barracks_and_minerals() {
        let registry = standard_handlers();

        let broke = obs(UnitCensus { barracks: 1, ..UnitCensus::default() }, 20, 0);
        assert!(!registry.dispatch(AtomicAction::TrainMarine, &broke).executed);

        let no_barracks = obs(UnitCensus::default(), 500, 0);
        assert!(!registry.dispatch(AtomicAction::TrainMarine, &no_barracks).executed);

        let ready = obs(UnitCensus { barracks: 1, ..UnitCensus::default() }, 50, 0);
        let outcome = registry.dispatch(AtomicAction::TrainMarine, &ready);
        assert!(outcome.executed);
        assert_eq!(outcome.command.action, AtomicAction::TrainMarine);
    }

    #[test]
    fn attack_orders_target_the_enemy_base() {
        let registry = standard_handlers();
        let army = obs(UnitCensus { marines: 6, ..UnitCensus::default() }, 0, 0);

        let outcome = registry.dispatch(AtomicAction::AttackWithMarine, &army);
        assert!(outcome.executed);
        assert_eq!(outcome.command.target, Some(ENEMY_BASE));

        let defense = registry.dispatch(AtomicAction::DefenseWithMarine, &army);
        assert_eq!(defense.command.target, Some(OWN_BASE));
    }

    #[test]
    fn missing_player_counters_skip_resource_actions() {
        let registry = standard_handlers();
        let blind = Observation {
            census: UnitCensus { barracks: 1, workers: 5, ..UnitCensus::default() },
            ..Observation::default()
        };

        assert!(!registry.dispatch(AtomicAction::BuildScv, &blind).executed);
        assert!(!registry.dispatch(AtomicAction::BuildBarracks, &blind).executed);
        // Census-only actions still work.
        assert!(registry.dispatch(AtomicAction::HarvestMinerals, &blind).executed);
    }

    #[test]
    fn idle_always_executes() {
        let registry = standard_handlers();
        let outcome = registry.dispatch(AtomicAction::DoNothing, &Observation::default());
        assert!(outcome.executed);
        assert!(outcome.command.is_no_op());
    }
}
