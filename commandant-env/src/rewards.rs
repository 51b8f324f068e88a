//! Reward rules for the skirmish agent
//!
//! Instantaneous rewards penalize unit losses by importance and inefficient
//! spending, and pay small bonuses for army production and proactive combat
//! orders. The terminal reward is a fixed value on a decided game and a
//! bounded army-ratio value on a draw.

use commandant_core::{AtomicAction, Observation, Outcome, RewardModel, UnitCensus};

// Base reward per executed action, slightly negative to discourage idling.
const BASE_REWARD: f64 = -0.001;
const COMBAT_ORDER_BONUS: f64 = 1.0;

// Loss penalties by unit importance.
const MINOR_LOSS: f64 = -0.1;
const MAJOR_LOSS: f64 = -0.3;
const CRITICAL_LOSS: f64 = -1.0;

const ARMY_GAIN_REWARD: f64 = 1.0;
const OTHER_GAIN_REWARD: f64 = 0.001;

// Idle-infrastructure penalties.
const IDLE_BARRACKS_PENALTY: f64 = -2.0;
const IDLE_TECH_LAB_PENALTY: f64 = -1.0;

// Estimated production prices for the spending-efficiency check.
const MARINE_COST: f64 = 50.0;
const MARAUDER_COST: f64 = 125.0;

// Terminal rewards.
const WIN_REWARD: f64 = 100.0;
const LOSS_REWARD: f64 = -50.0;
const DRAW_RATIO_WEIGHT: f64 = 0.1;
const DRAW_REWARD_CAP: i64 = 10;
const DRAW_PENALTY_CAP: i64 = -1;

/// Rolling reward rules over consecutive observations
///
/// Tracks the previous tick's resources and unit counts so losses and
/// spending can be scored as deltas. The tracking updates only on executed
/// actions, matching the accumulation contract: a skipped action scores the
/// base reward and leaves the rolling state untouched.
#[derive(Debug, Clone, Default)]
pub struct StandardRewardModel {
    prev_minerals: u32,
    prev_vespene: u32,
    prev_census: UnitCensus,
}

impl StandardRewardModel {
    /// Create the model with empty tracking
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn spending_penalty(&mut self, obs: &Observation) -> f64 {
        let Some(player) = obs.player.as_ref() else {
            return 0.0;
        };

        let minerals_used = i64::from(self.prev_minerals) - i64::from(player.minerals);
        let gas_used = i64::from(self.prev_vespene) - i64::from(player.vespene);
        self.prev_minerals = player.minerals;
        self.prev_vespene = player.vespene;

        #[allow(clippy::cast_precision_loss)]
        let spent = (minerals_used + gas_used).max(0) as f64;
        if spent <= 0.0 {
            return 0.0;
        }

        let expected = f64::from(self.prev_census.marines) * MARINE_COST
            + f64::from(self.prev_census.marauders) * MARAUDER_COST;
        let efficiency = expected / spent;
        if efficiency < 1.0 {
            -0.2 * (1.0 - efficiency)
        } else {
            0.0
        }
    }

    fn census_reward(&mut self, obs: &Observation) -> f64 {
        let current = obs.census;
        let prev = self.prev_census;
        self.prev_census = current;

        let mut reward = 0.0;
        let pairs: [(u32, u32, f64, f64); 9] = [
            (prev.workers, current.workers, MINOR_LOSS, OTHER_GAIN_REWARD),
            (prev.marines, current.marines, CRITICAL_LOSS, ARMY_GAIN_REWARD),
            (prev.marauders, current.marauders, CRITICAL_LOSS, ARMY_GAIN_REWARD),
            (prev.command_centers, current.command_centers, CRITICAL_LOSS, OTHER_GAIN_REWARD),
            (prev.supply_depots, current.supply_depots, MINOR_LOSS, OTHER_GAIN_REWARD),
            (prev.barracks, current.barracks, MAJOR_LOSS, OTHER_GAIN_REWARD),
            (prev.refineries, current.refineries, MINOR_LOSS, OTHER_GAIN_REWARD),
            (prev.tech_labs, current.tech_labs, MAJOR_LOSS, OTHER_GAIN_REWARD),
            (prev.bunkers, current.bunkers, MINOR_LOSS, OTHER_GAIN_REWARD),
        ];
        for (before, after, loss, gain) in pairs {
            let delta = i64::from(after) - i64::from(before);
            #[allow(clippy::cast_precision_loss)]
            let magnitude = delta.unsigned_abs() as f64;
            if delta < 0 {
                reward += loss * magnitude;
            } else if delta > 0 {
                reward += gain * magnitude;
            }
        }

        // Standing infrastructure that produces no army is wasted spending.
        let army = current.marines + current.marauders;
        if current.barracks > 0 && army == 0 {
            reward += IDLE_BARRACKS_PENALTY;
        }
        if current.barracks > 0 && current.tech_labs > 0 && current.marauders == 0 {
            reward += IDLE_TECH_LAB_PENALTY;
        }
        reward
    }
}

impl RewardModel for StandardRewardModel {
    fn action_reward(&mut self, action: AtomicAction, executed: bool, obs: &Observation) -> f64 {
        let mut reward = BASE_REWARD;
        if !executed {
            return reward;
        }

        // Spending is scored against the previous tick's army, so the
        // spending check must run before the census tracking updates.
        reward += self.spending_penalty(obs);
        reward += self.census_reward(obs);
        if action.is_combat() {
            reward += COMBAT_ORDER_BONUS;
        }
        reward
    }

    fn terminal_reward(&mut self, obs: &Observation, outcome: Outcome) -> f64 {
        match outcome {
            Outcome::Victory => WIN_REWARD,
            Outcome::Defeat => LOSS_REWARD,
            Outcome::Draw => {
                // Bounded army-ratio reward; zero counts guard the division.
                let own = f64::from(obs.census.own_units.max(1));
                let enemy = f64::from(obs.census.enemy_units.max(1));
                #[allow(clippy::cast_possible_truncation)]
                let bounded = if own >= enemy {
                    let scaled = (DRAW_RATIO_WEIGHT * (own / enemy)) as i64;
                    scaled.min(DRAW_REWARD_CAP)
                } else {
                    let scaled = (-DRAW_RATIO_WEIGHT * (enemy / own)) as i64;
                    scaled.max(DRAW_PENALTY_CAP)
                };
                #[allow(clippy::cast_precision_loss)]
                let reward = bounded as f64;
                reward
            }
        }
    }

    fn reset(&mut self) {
        self.prev_minerals = 0;
        self.prev_vespene = 0;
        self.prev_census = UnitCensus::default();
    }
}
