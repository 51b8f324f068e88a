//! Deterministic skirmish simulation
//!
//! A tiny Terran-flavored economy and combat model, deterministic for a given
//! command sequence so tests and training smoke runs are reproducible. One
//! `step` consumes the command the agent issued for the current tick, applies
//! its effect, advances the economy and the enemy, and returns the next
//! observation.

use serde::{Deserialize, Serialize};

use commandant_core::{AtomicAction, Command, Observation, Outcome, PlayerSnapshot, UnitCensus};

// Mineral and gas prices of the buildable units and structures.
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

const MINERALS_PER_WORKER: u32 = 5;
const GAS_PER_REFINERY: u32 = 4;
const SUPPLY_PER_COMMAND_CENTER: u32 = 15;
const SUPPLY_PER_DEPOT: u32 = 8;

// Simulation ticks advance the game clock by one agent step.
const LOOPS_PER_TICK: u64 = 128;

/// Tunable parameters of the skirmish simulation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkirmishConfig {
    /// Tick at which an undecided game ends in a draw
    pub max_ticks: u64,
    /// Minerals banked at game start
    pub starting_minerals: u32,
    /// Workers present at game start
    pub starting_workers: u32,
    /// Enemy units present at game start
    pub starting_enemy: u32,
    /// Ticks between enemy reinforcement waves
    pub enemy_growth_interval: u64,
    /// Enemy units added per reinforcement wave
    pub enemy_growth: u32,
    /// Enemy strength at which the base is overrun
    pub defeat_threshold: u32,
}

impl Default for SkirmishConfig {
    fn default() -> Self {
        Self {
            max_ticks: 400,
            starting_minerals: 50,
            starting_workers: 12,
            starting_enemy: 5,
            enemy_growth_interval: 10,
            enemy_growth: 2,
            defeat_threshold: 60,
        }
    }
}

/// Deterministic mini-RTS match state
#[derive(Debug, Clone)]
pub struct SkirmishSim {
    config: SkirmishConfig,
    census: UnitCensus,
    minerals: u32,
    vespene: u32,
    food_cap: u32,
    food_used: u32,
    tick: u64,
    outcome: Option<Outcome>,
}

impl SkirmishSim {
    /// Start a fresh match
    #[must_use]
    pub fn new(config: SkirmishConfig) -> Self {
        let mut census = UnitCensus {
            workers: config.starting_workers,
            command_centers: 1,
            enemy_units: config.starting_enemy,
            ..UnitCensus::default()
        };
        census.own_units = own_total(&census);
        Self {
            minerals: config.starting_minerals,
            vespene: 0,
            food_cap: SUPPLY_PER_COMMAND_CENTER,
            food_used: config.starting_workers,
            tick: 0,
            outcome: None,
            census,
            config,
        }
    }

    /// Observation for the current tick
    #[must_use]
    pub fn observe(&self) -> Observation {
        Observation {
            census: self.census,
            player: Some(PlayerSnapshot {
                minerals: self.minerals,
                vespene: self.vespene,
                food_cap: self.food_cap,
                food_used: self.food_used,
            }),
            game_loop: self.tick * LOOPS_PER_TICK,
            outcome: self.outcome,
        }
    }

    /// Whether the match has ended
    #[must_use]
    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    /// Apply one command, advance one tick and return the next observation
    pub fn step(&mut self, command: Command) -> Observation {
        if self.outcome.is_none() {
            self.apply(command);
            self.advance();
        }
        self.observe()
    }

    fn free_supply(&self) -> u32 {
        self.food_cap.saturating_sub(self.food_used)
    }

    #[allow(clippy::too_many_lines)]
    fn apply(&mut self, command: Command) {
        match command.action {
            AtomicAction::DoNothing
            | AtomicAction::HarvestMinerals
            | AtomicAction::Explore => {}
            AtomicAction::BuildScv => {
                if self.census.command_centers > 0
                    && self.minerals >= SCV_COST
                    && self.free_supply() >= 1
                {
                    self.minerals -= SCV_COST;
                    self.census.workers += 1;
                    self.food_used += 1;
                }
            }
            AtomicAction::HarvestGas => {
                // The first gas order builds the refinery itself.
                if self.census.refineries == 0 && self.minerals >= REFINERY_COST {
                    self.minerals -= REFINERY_COST;
                    self.census.refineries += 1;
                }
            }
            AtomicAction::BuildCommandCenter => {
                if self.minerals >= COMMAND_CENTER_COST {
                    self.minerals -= COMMAND_CENTER_COST;
                    self.census.command_centers += 1;
                    self.food_cap += SUPPLY_PER_COMMAND_CENTER;
                }
            }
            AtomicAction::BuildSupplyDepot => {
                if self.minerals >= SUPPLY_DEPOT_COST {
                    self.minerals -= SUPPLY_DEPOT_COST;
                    self.census.supply_depots += 1;
                    self.food_cap += SUPPLY_PER_DEPOT;
                }
            }
            AtomicAction::BuildBarracks => {
                if self.census.supply_depots > 0 && self.minerals >= BARRACKS_COST {
                    self.minerals -= BARRACKS_COST;
                    self.census.barracks += 1;
                }
            }
            AtomicAction::BuildTechLab => {
                if self.census.barracks > self.census.tech_labs
                    && self.minerals >= TECH_LAB_COST
                    && self.vespene >= TECH_LAB_GAS_COST
                {
                    self.minerals -= TECH_LAB_COST;
                    self.vespene -= TECH_LAB_GAS_COST;
                    self.census.tech_labs += 1;
                }
            }
            AtomicAction::BuildBunker => {
                if self.census.barracks > 0 && self.minerals >= BUNKER_COST {
                    self.minerals -= BUNKER_COST;
                    self.census.bunkers += 1;
                }
            }
            AtomicAction::TrainMarine => {
                if self.census.barracks > 0
                    && self.minerals >= MARINE_COST
                    && self.free_supply() >= 1
                {
                    self.minerals -= MARINE_COST;
                    self.census.marines += 1;
                    self.food_used += 1;
                }
            }
            AtomicAction::TrainMarauder => {
                if self.census.tech_labs > 0
                    && self.minerals >= MARAUDER_COST
                    && self.vespene >= MARAUDER_GAS_COST
                    && self.free_supply() >= 2
                {
                    self.minerals -= MARAUDER_COST;
                    self.vespene -= MARAUDER_GAS_COST;
                    self.census.marauders += 1;
                    self.food_used += 2;
                }
            }
            AtomicAction::AttackWithMarine | AtomicAction::AttackWithMarauder => {
                let army = self.census.marines + self.census.marauders;
                if army > 0 {
                    let kills = (army / 2 + 1).min(self.census.enemy_units);
                    self.census.enemy_units -= kills;
                    // Attacking trades some marines for enemy kills.
                    let losses = (kills / 3).min(self.census.marines);
                    self.census.marines -= losses;
                    self.food_used = self.food_used.saturating_sub(losses);
                }
            }
            AtomicAction::DefenseWithMarine => {
                if self.census.marines > 0 {
                    let kills = (self.census.marines / 4).min(self.census.enemy_units);
                    self.census.enemy_units -= kills;
                }
            }
        }
    }

    fn advance(&mut self) {
        self.tick += 1;
        self.minerals += self.census.workers * MINERALS_PER_WORKER;
        self.vespene += self.census.refineries * GAS_PER_REFINERY;

        if self.tick % self.config.enemy_growth_interval == 0 {
            self.census.enemy_units += self.config.enemy_growth;
        }
        self.census.own_units = own_total(&self.census);

        self.outcome = if self.census.enemy_units == 0 {
            Some(Outcome::Victory)
        } else if self.census.enemy_units >= self.config.defeat_threshold {
            Some(Outcome::Defeat)
        } else if self.tick >= self.config.max_ticks {
            Some(Outcome::Draw)
        } else {
            None
        };
        if let Some(outcome) = self.outcome {
            tracing::info!(?outcome, tick = self.tick, "match ended");
        }
    }
}

fn own_total(census: &UnitCensus) -> u32 {
    census.workers
        + census.marines
        + census.marauders
        + census.command_centers
        + census.supply_depots
        + census.barracks
        + census.refineries
        + census.tech_labs
        + census.bunkers
}
