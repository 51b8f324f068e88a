//! State keys and the observation encoder

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{AgentError, Observation, Result};

/// Number of features in a state key
pub const STATE_DIM: usize = 14;

/// Immutable, hashable value-table key
///
/// Features are held in fixed-point deci-units (one decimal digit), so
/// equality and hashing are exact and snapshots round-trip bit-for-bit.
/// The table treats keys as opaque; no semantic interpretation happens past
/// the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateKey([i64; STATE_DIM]);

impl StateKey {
    /// Build a key from feature values, rounding each to one decimal
    #[must_use]
    pub fn from_features(features: [f64; STATE_DIM]) -> Self {
        let mut deci = [0_i64; STATE_DIM];
        for (slot, value) in deci.iter_mut().zip(features) {
            #[allow(clippy::cast_possible_truncation)]
            {
                *slot = (value * 10.0).round() as i64;
            }
        }
        Self(deci)
    }

    /// Feature values as floats
    #[must_use]
    pub fn features(&self) -> [f64; STATE_DIM] {
        let mut out = [0.0; STATE_DIM];
        for (slot, deci) in out.iter_mut().zip(self.0) {
            #[allow(clippy::cast_precision_loss)]
            {
                *slot = deci as f64 / 10.0;
            }
        }
        out
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, value) in self.features().iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{value:.1}")?;
        }
        Ok(())
    }
}

impl FromStr for StateKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut features = [0.0; STATE_DIM];
        let mut fields = s.split(':');
        for (i, slot) in features.iter_mut().enumerate() {
            let field = fields
                .next()
                .ok_or_else(|| anyhow::anyhow!("state key has {i} features, expected {STATE_DIM}"))?;
            *slot = field.parse()?;
        }
        if fields.next().is_some() {
            anyhow::bail!("state key has more than {STATE_DIM} features");
        }
        Ok(Self::from_features(features))
    }
}

/// The state a transition leads to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Successor {
    /// A regular next state
    State(StateKey),
    /// The episode ended here; no bootstrap term applies
    Terminal,
}

impl Successor {
    /// True for the terminal sentinel
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Successor::Terminal)
    }
}

impl From<StateKey> for Successor {
    fn from(state: StateKey) -> Self {
        Successor::State(state)
    }
}

// Normalization scales, one per feature.
const WORKER_SCALE: f64 = 100.0;
const MARINE_SCALE: f64 = 200.0;
const MARAUDER_SCALE: f64 = 100.0;
const STRUCTURE_SCALE: f64 = 50.0;
const ENEMY_CAP: u32 = 1000;
const ENEMY_SCALE: f64 = 1000.0;
const MINERALS_USED_SCALE: f64 = 20000.0;
const GAS_USED_SCALE: f64 = 5000.0;
const SUPPLY_USED_SCALE: f64 = 500.0;
const GAME_TIME_SCALE: f64 = 100.0;

/// Converts raw observations into normalized state keys
///
/// Carries the previous tick's resource counters so the "consumed since
/// last tick" features can be computed as deltas; that rolling snapshot is
/// its only state.
#[derive(Debug, Clone)]
pub struct StateEncoder {
    step_mul: u32,
    prev_minerals: u32,
    prev_vespene: u32,
    prev_free_supply: u32,
}

impl StateEncoder {
    /// Create an encoder for a run with the given step multiplier
    #[must_use]
    pub fn new(step_mul: u32) -> Self {
        Self {
            step_mul: step_mul.max(1),
            prev_minerals: 0,
            prev_vespene: 0,
            prev_free_supply: 0,
        }
    }

    /// Encode one observation, updating the rolling resource snapshot
    ///
    /// # Errors
    ///
    /// [`AgentError::MalformedObservation`] when the player counters are
    /// absent from the frame.
    pub fn encode(&mut self, obs: &Observation) -> Result<StateKey> {
        let player = obs
            .player
            .as_ref()
            .ok_or(AgentError::MalformedObservation { field: "player" })?;

        // Consumption deltas are clamped to zero: income between decisions
        // can make the raw difference negative.
        let minerals_used = self.prev_minerals.saturating_sub(player.minerals);
        let gas_used = self.prev_vespene.saturating_sub(player.vespene);
        let free_supply = player.free_supply();
        let supply_used = self.prev_free_supply.saturating_sub(free_supply);

        self.prev_minerals = player.minerals;
        self.prev_vespene = player.vespene;
        self.prev_free_supply = free_supply;

        let census = &obs.census;
        let enemy = census.enemy_units.min(ENEMY_CAP);
        #[allow(clippy::cast_precision_loss)]
        let game_time = self.game_time(obs.game_loop) as f64;

        Ok(StateKey::from_features([
            f64::from(census.workers) / WORKER_SCALE,
            f64::from(census.marines) / MARINE_SCALE,
            f64::from(census.marauders) / MARAUDER_SCALE,
            f64::from(census.command_centers) / STRUCTURE_SCALE,
            f64::from(census.supply_depots) / STRUCTURE_SCALE,
            f64::from(census.barracks) / STRUCTURE_SCALE,
            f64::from(census.refineries) / STRUCTURE_SCALE,
            f64::from(census.tech_labs) / STRUCTURE_SCALE,
            f64::from(census.bunkers) / STRUCTURE_SCALE,
            f64::from(enemy) / ENEMY_SCALE,
            f64::from(minerals_used) / MINERALS_USED_SCALE,
            f64::from(gas_used) / GAS_USED_SCALE,
            f64::from(supply_used) / SUPPLY_USED_SCALE,
            game_time / GAME_TIME_SCALE,
        ]))
    }

    /// Decision-tick timestamp derived from the raw loop counter
    #[must_use]
    pub fn game_time(&self, game_loop: u64) -> u64 {
        game_loop / (16 * u64::from(self.step_mul))
    }

    /// Clear the rolling resource snapshot at an episode boundary
    pub fn reset(&mut self) {
        self.prev_minerals = 0;
        self.prev_vespene = 0;
        self.prev_free_supply = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PlayerSnapshot, UnitCensus};

    fn observation(minerals: u32, vespene: u32, food_cap: u32, food_used: u32) -> Observation {
        Observation {
            census: UnitCensus {
                workers: 12,
                marines: 4,
                enemy_units: 2500,
                ..UnitCensus::default()
            },
            player: Some(PlayerSnapshot {
                minerals,
                vespene,
                food_cap,
                food_used,
            }),
            game_loop: 3200,
            outcome: None,
        }
    }

    #[test]
    fn encodes_normalized_features() {
        let mut encoder = StateEncoder::new(8);
        let key = encoder.encode(&observation(50, 0, 15, 12)).unwrap();
        let features = key.features();

        assert_eq!(features[0], 0.1); // 12 workers / 100
        assert_eq!(features[1], 0.0); // 4 marines / 200 rounds to 0.0
        assert_eq!(features[9], 1.0); // enemy capped at 1000
        assert_eq!(features[13], 0.3); // game_loop 3200 / (16 * 8) = 25, / 100
    }

    #[test]
    fn consumption_deltas_clamp_at_zero() {
        let mut encoder = StateEncoder::new(1);
        // First tick establishes the snapshot; deltas start at zero.
        let first = encoder.encode(&observation(2000, 500, 20, 10)).unwrap();
        assert_eq!(first.features()[10], 0.0);

        // Spending 2000 minerals shows up as a positive consumption feature.
        let second = encoder.encode(&observation(0, 500, 20, 10)).unwrap();
        assert_eq!(second.features()[10], 0.1);

        // Income (minerals going up) never yields a negative delta.
        let third = encoder.encode(&observation(9000, 500, 20, 10)).unwrap();
        assert_eq!(third.features()[10], 0.0);
    }

    #[test]
    fn missing_player_is_malformed() {
        let mut encoder = StateEncoder::new(1);
        let obs = Observation::default();
        assert!(matches!(
            encoder.encode(&obs),
            Err(AgentError::MalformedObservation { field: "player" })
        ));
    }

    proptest::proptest! {
        #[test]
        fn any_key_survives_the_text_form(raw in proptest::collection::vec(0.0_f64..10.0, STATE_DIM)) {
            let mut features = [0.0; STATE_DIM];
            features.copy_from_slice(&raw);

            let key = StateKey::from_features(features);
            let parsed: StateKey = key.to_string().parse().unwrap();
            proptest::prop_assert_eq!(parsed, key);

            // Quantization error stays within half a deci-unit.
            for (rounded, original) in key.features().iter().zip(features) {
                approx::assert_abs_diff_eq!(*rounded, original, epsilon = 0.05 + 1e-12);
            }
        }
    }

    #[test]
    fn key_text_round_trips() {
        let key = StateKey::from_features([
            0.1, 0.0, 0.3, 0.0, 0.1, 0.0, 0.0, 0.0, 0.0, 1.0, 0.1, 0.0, 0.0, 0.3,
        ]);
        let parsed: StateKey = key.to_string().parse().unwrap();
        assert_eq!(parsed, key);
        assert!("0.1:0.2".parse::<StateKey>().is_err());
    }
}
