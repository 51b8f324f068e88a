//! Sparse state/policy value table

use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use commandant_core::{
    AgentError, PolicyId, PolicyRegistry, Result, StateKey, Successor, Trajectory,
};

use crate::config::{CreditAssignment, Hyperparams};

/// Sparse, lazily growing mapping from state key to per-policy values
///
/// Each row is a fixed-size array aligned to the policy registry's
/// registration order, so a policy id indexes its column directly and every
/// row always has exactly one value per registered policy. Rows are
/// zero-initialized on first touch and persist across episodes through the
/// snapshot file.
#[derive(Debug)]
pub struct ValueTable {
    registry: Arc<PolicyRegistry>,
    rows: HashMap<StateKey, Vec<f64>>,
    live: Hyperparams,
    retrain: Hyperparams,
    credit: CreditAssignment,
    rng: StdRng,
}

impl ValueTable {
    /// Create an empty table over the given registry
    #[must_use]
    pub fn new(
        registry: Arc<PolicyRegistry>,
        live: Hyperparams,
        retrain: Hyperparams,
        credit: CreditAssignment,
    ) -> Self {
        Self {
            registry,
            rows: HashMap::new(),
            live,
            retrain,
            credit,
            rng: StdRng::from_entropy(),
        }
    }

    /// Reseed the exploration RNG (deterministic tests)
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Load a table from a snapshot, or start empty when none exists
    ///
    /// # Errors
    ///
    /// [`AgentError::CorruptSnapshot`] when the file exists but cannot be
    /// parsed or its header does not match the registry. This is fatal at
    /// startup: learning over a half-read table would poison the values.
    pub fn open(
        registry: Arc<PolicyRegistry>,
        path: &Path,
        live: Hyperparams,
        retrain: Hyperparams,
        credit: CreditAssignment,
    ) -> Result<Self> {
        let mut table = Self::new(registry, live, retrain, credit);
        if !path.exists() {
            tracing::info!(path = %path.display(), "no snapshot found, starting empty");
            return Ok(table);
        }

        let corrupt = |reason: String| AgentError::CorruptSnapshot {
            path: path.display().to_string(),
            reason,
        };

        let text = std::fs::read_to_string(path)?;
        let mut lines = text.lines();
        let header = lines.next().ok_or_else(|| corrupt("empty file".into()))?;
        if header != table.header() {
            return Err(corrupt(format!(
                "header `{header}` does not match the policy registry"
            )));
        }

        let columns = table.registry.len();
        for (lineno, line) in lines.enumerate() {
            if line.is_empty() {
                continue;
            }
            let mut fields = line.split(',');
            let key: StateKey = fields
                .next()
                .unwrap_or_default()
                .parse()
                .map_err(|err| corrupt(format!("line {}: bad state key: {err}", lineno + 2)))?;
            let values = fields
                .map(str::parse)
                .collect::<std::result::Result<Vec<f64>, _>>()
                .map_err(|err| corrupt(format!("line {}: bad value: {err}", lineno + 2)))?;
            if values.len() != columns {
                return Err(corrupt(format!(
                    "line {}: {} values for {columns} policies",
                    lineno + 2,
                    values.len()
                )));
            }
            table.rows.insert(key, values);
        }

        tracing::info!(
            path = %path.display(),
            states = table.rows.len(),
            "loaded value-table snapshot"
        );
        Ok(table)
    }

    /// Insert a zero-filled row for `state` if it is not present
    pub fn ensure_row(&mut self, state: &StateKey) {
        let columns = self.registry.len();
        self.rows.entry(*state).or_insert_with(|| vec![0.0; columns]);
    }

    /// Value of one policy at one state, if the row exists
    #[must_use]
    pub fn value(&self, state: &StateKey, policy: PolicyId) -> Option<f64> {
        self.rows.get(state)?.get(policy.index()).copied()
    }

    /// Maximum value over all policies at one state
    #[must_use]
    pub fn row_max(&self, state: &StateKey) -> Option<f64> {
        let row = self.rows.get(state)?;
        row.iter().copied().reduce(f64::max)
    }

    /// Number of states in the table
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no state has been touched yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Epsilon-greedy policy selection
    ///
    /// In training mode a uniform random policy is explored with probability
    /// `epsilon`; otherwise the row's maximum is exploited, breaking ties
    /// uniformly. Returns the chosen policy and whether it was exploration.
    ///
    /// Evaluation mode on a row with no entries falls back to the no-op
    /// policy. `ensure_row` makes this unreachable in normal operation; the
    /// path is kept as a defensive fallback.
    pub fn choose_policy(
        &mut self,
        state: &StateKey,
        epsilon: f64,
        training: bool,
    ) -> (PolicyId, bool) {
        self.ensure_row(state);

        if training && self.rng.gen::<f64>() < epsilon {
            let policy = self.registry.sample(&mut self.rng);
            return (policy, true);
        }

        match self.greedy(state) {
            Some(policy) => (policy, false),
            None => {
                tracing::warn!(state = %state, "no row entries, falling back to no-op policy");
                (self.registry.no_op(), false)
            }
        }
    }

    fn greedy(&mut self, state: &StateKey) -> Option<PolicyId> {
        let row = self.rows.get(state)?;
        let max = row.iter().copied().reduce(f64::max)?;
        let ties: Vec<usize> = row
            .iter()
            .enumerate()
            .filter(|(_, value)| **value == max)
            .map(|(index, _)| index)
            .collect();
        ties.choose(&mut self.rng).copied().map(PolicyId)
    }

    /// One live-regime Q-update for the transition `(state, policy, reward,
    /// next)`
    ///
    /// The target is `reward` when `next` is terminal, otherwise
    /// `reward + discount * max(next row)`; the row for `next` is created
    /// first so the bootstrap term always reads a full row.
    ///
    /// # Errors
    ///
    /// [`AgentError::UnknownPolicy`] when `policy` is not in the registry;
    /// the table is left unmodified.
    pub fn learn(
        &mut self,
        state: StateKey,
        policy: PolicyId,
        reward: f64,
        next: Successor,
    ) -> Result<()> {
        let live = self.live;
        self.update(state, policy, reward, next, live)
    }

    /// Terminal credit propagation over a whole episode trajectory
    ///
    /// Replays every recorded transition under the retrain regime, applying
    /// the configured credit strategy (by default the terminal reward
    /// substitutes each step's own reward). The live regime is untouched:
    /// regimes are passed per-update, so a failure mid-pass cannot leak
    /// retrain parameters into later live updates. Transitions naming an
    /// unknown policy are logged and skipped.
    pub fn propagate_rewards(&mut self, trajectory: &Trajectory, final_reward: f64) {
        let retrain = self.retrain;
        for transition in trajectory {
            let reward = match self.credit {
                CreditAssignment::ReplaceWithFinal => final_reward,
                CreditAssignment::AddToFinal => transition.reward + final_reward,
            };
            if let Err(err) = self.update(
                transition.state,
                transition.policy,
                reward,
                transition.next,
                retrain,
            ) {
                tracing::warn!(error = %err, "skipping transition during propagation");
            }
        }
    }

    fn update(
        &mut self,
        state: StateKey,
        policy: PolicyId,
        reward: f64,
        next: Successor,
        params: Hyperparams,
    ) -> Result<()> {
        let columns = self.registry.len();
        if policy.index() >= columns {
            return Err(AgentError::UnknownPolicy(policy));
        }

        let target = match next {
            Successor::Terminal => reward,
            Successor::State(next_state) => {
                self.ensure_row(&next_state);
                let bootstrap = self.row_max(&next_state).unwrap_or(0.0);
                reward + params.discount * bootstrap
            }
        };

        let row = self.rows.entry(state).or_insert_with(|| vec![0.0; columns]);
        let q = &mut row[policy.index()];
        *q += params.learning_rate * (target - *q);
        Ok(())
    }

    fn header(&self) -> String {
        let mut header = String::from("state");
        for id in self.registry.ids() {
            let _ = write!(header, ",{id}");
        }
        header
    }

    /// Write the table as a tabular snapshot
    ///
    /// Header row of policy ids, then one row per state: the state key
    /// followed by its per-policy values. Values use the shortest
    /// round-tripping float form, so `open(save(T))` reproduces `T` exactly.
    ///
    /// # Errors
    ///
    /// IO errors from writing the file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut out = self.header();
        out.push('\n');

        // Stable row order keeps consecutive snapshots diffable.
        let mut keys: Vec<&StateKey> = self.rows.keys().collect();
        keys.sort_by_key(|key| key.to_string());

        for key in keys {
            let _ = write!(out, "{key}");
            for value in &self.rows[key] {
                let _ = write!(out, ",{value}");
            }
            out.push('\n');
        }

        std::fs::write(path, out)?;
        tracing::debug!(path = %path.display(), states = self.rows.len(), "snapshot written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use commandant_core::{Transition, STATE_DIM};

    fn key(seed: f64) -> StateKey {
        StateKey::from_features([seed; STATE_DIM])
    }

    fn table() -> ValueTable {
        ValueTable::new(
            Arc::new(PolicyRegistry::standard()),
            Hyperparams::live(),
            Hyperparams::retrain(),
            CreditAssignment::default(),
        )
        .with_seed(7)
    }

    #[test]
    fn ensure_row_zero_fills_every_policy() {
        let mut table = table();
        let state = key(0.2);
        table.ensure_row(&state);
        table.ensure_row(&state); // idempotent

        assert_eq!(table.len(), 1);
        for id in PolicyRegistry::standard().ids() {
            assert_eq!(table.value(&state, id), Some(0.0));
        }
    }

    #[test]
    fn terminal_learn_has_no_bootstrap() {
        let mut table = table();
        let state = key(0.1);
        table.learn(state, PolicyId(3), 10.0, Successor::Terminal).unwrap();

        // q = 0 + 0.001 * (10 - 0)
        assert_relative_eq!(table.value(&state, PolicyId(3)).unwrap(), 0.01);
    }

    #[test]
    fn learn_bootstraps_from_the_best_next_value() {
        let mut table = table();
        let (s, s_next) = (key(0.1), key(0.2));

        // Seed the next row with a known maximum in some other column.
        table.learn(s_next, PolicyId(9), 100.0, Successor::Terminal).unwrap();
        let best_next = table.value(&s_next, PolicyId(9)).unwrap();
        assert_relative_eq!(best_next, 0.1);

        table.learn(s, PolicyId(2), 1.0, Successor::State(s_next)).unwrap();

        // target = 1 + 0.9 * 0.1; q = 0.001 * target
        assert_relative_eq!(
            table.value(&s, PolicyId(2)).unwrap(),
            0.001 * (1.0 + 0.9 * best_next)
        );
    }

    #[test]
    fn unknown_policy_leaves_the_table_unmodified() {
        let mut table = table();
        let state = key(0.4);
        table.ensure_row(&state);

        let err = table
            .learn(state, PolicyId(99), 5.0, Successor::Terminal)
            .unwrap_err();
        assert!(matches!(err, AgentError::UnknownPolicy(PolicyId(99))));
        for id in PolicyRegistry::standard().ids() {
            assert_eq!(table.value(&state, id), Some(0.0));
        }
    }

    #[test]
    fn full_exploration_is_roughly_uniform() {
        let mut table = table();
        let state = key(0.3);
        let mut counts = vec![0_u32; 14];

        let trials = 14_000;
        for _ in 0..trials {
            let (policy, explored) = table.choose_policy(&state, 1.0, true);
            assert!(explored);
            counts[policy.index()] += 1;
        }

        // Expect ~1000 per policy; allow a generous band for sampling noise.
        for &count in &counts {
            assert!((700..=1300).contains(&count), "skewed count: {count}");
        }
    }

    #[test]
    fn zero_epsilon_always_exploits_the_maximum() {
        let mut table = table();
        let state = key(0.5);
        table.learn(state, PolicyId(6), 50.0, Successor::Terminal).unwrap();

        for _ in 0..100 {
            let (policy, explored) = table.choose_policy(&state, 0.0, true);
            assert!(!explored);
            assert_eq!(policy, PolicyId(6));
        }
    }

    #[test]
    fn exploitation_breaks_ties_uniformly() {
        let mut table = table();
        let state = key(0.6);
        // Two columns share the maximum.
        table.learn(state, PolicyId(1), 10.0, Successor::Terminal).unwrap();
        let v = table.value(&state, PolicyId(1)).unwrap();
        table.learn(state, PolicyId(2), 10.0, Successor::Terminal).unwrap();
        assert_relative_eq!(table.value(&state, PolicyId(2)).unwrap(), v);

        let mut seen = [0_u32; 2];
        for _ in 0..1000 {
            let (policy, _) = table.choose_policy(&state, 0.0, true);
            match policy {
                PolicyId(1) => seen[0] += 1,
                PolicyId(2) => seen[1] += 1,
                other => panic!("non-maximal policy chosen: {other}"),
            }
        }
        assert!(seen[0] > 300 && seen[1] > 300, "ties not uniform: {seen:?}");
    }

    #[test]
    fn evaluation_mode_never_explores() {
        let mut table = table();
        let state = key(0.7);
        table.learn(state, PolicyId(4), 10.0, Successor::Terminal).unwrap();

        let (policy, explored) = table.choose_policy(&state, 1.0, false);
        assert!(!explored);
        assert_eq!(policy, PolicyId(4));
    }

    #[test]
    fn propagation_replaces_step_rewards_with_the_final_reward() {
        let mut table = table();
        let (s1, s2) = (key(0.1), key(0.2));
        let mut trajectory = Trajectory::new();
        trajectory.push(Transition {
            state: s1,
            policy: PolicyId(1),
            reward: 3.0,
            next: Successor::State(s2),
        });
        trajectory.push(Transition {
            state: s2,
            policy: PolicyId(2),
            reward: -1.0,
            next: Successor::Terminal,
        });

        let final_reward = -50.0;
        table.propagate_rewards(&trajectory, final_reward);

        // Retrain regime, final reward substituted for both step rewards.
        // First update: rows are all zero, so target = -50 + 0.99 * 0.
        assert_relative_eq!(table.value(&s1, PolicyId(1)).unwrap(), 0.01 * -50.0);
        assert_relative_eq!(table.value(&s2, PolicyId(2)).unwrap(), 0.01 * -50.0);

        // A later live-regime update must use live arithmetic exactly.
        let s3 = key(0.3);
        table.learn(s3, PolicyId(0), 1.0, Successor::Terminal).unwrap();
        assert_relative_eq!(table.value(&s3, PolicyId(0)).unwrap(), 0.001);
    }

    #[test]
    fn propagation_can_be_configured_to_add_rewards() {
        let mut table = ValueTable::new(
            Arc::new(PolicyRegistry::standard()),
            Hyperparams::live(),
            Hyperparams::retrain(),
            CreditAssignment::AddToFinal,
        )
        .with_seed(3);

        let s = key(0.8);
        let mut trajectory = Trajectory::new();
        trajectory.push(Transition {
            state: s,
            policy: PolicyId(5),
            reward: 10.0,
            next: Successor::Terminal,
        });

        table.propagate_rewards(&trajectory, -50.0);
        assert_relative_eq!(table.value(&s, PolicyId(5)).unwrap(), 0.01 * -40.0);
    }

    #[test]
    fn single_decision_episode_propagates_exactly() {
        let mut table = table();
        let s0 = key(0.0);
        let p0 = PolicyId(0);
        let mut trajectory = Trajectory::new();
        trajectory.push(Transition {
            state: s0,
            policy: p0,
            reward: 0.0,
            next: Successor::Terminal,
        });

        table.propagate_rewards(&trajectory, -50.0);
        assert_eq!(table.value(&s0, p0), Some(-0.5));
    }

    #[test]
    fn snapshot_round_trips_exactly() {
        let registry = Arc::new(PolicyRegistry::standard());
        let mut table = table();
        table.learn(key(0.1), PolicyId(1), 3.25, Successor::Terminal).unwrap();
        table.learn(key(0.2), PolicyId(7), -0.875, Successor::State(key(0.3))).unwrap();
        table.ensure_row(&key(0.9));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.csv");
        table.save(&path).unwrap();

        let loaded = ValueTable::open(
            Arc::clone(&registry),
            &path,
            Hyperparams::live(),
            Hyperparams::retrain(),
            CreditAssignment::default(),
        )
        .unwrap();

        assert_eq!(loaded.len(), table.len());
        for state in [key(0.1), key(0.2), key(0.3), key(0.9)] {
            for id in registry.ids() {
                let (a, b) = (table.value(&state, id), loaded.value(&state, id));
                match (a, b) {
                    (Some(a), Some(b)) => assert!((a - b).abs() < 1e-9),
                    (None, None) => {}
                    other => panic!("key-set mismatch at {state}: {other:?}"),
                }
            }
        }
    }

    #[test]
    fn corrupt_snapshot_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.csv");
        std::fs::write(&path, "state,policy_0\n0.1:garbage,1.0\n").unwrap();

        let err = ValueTable::open(
            Arc::new(PolicyRegistry::standard()),
            &path,
            Hyperparams::live(),
            Hyperparams::retrain(),
            CreditAssignment::default(),
        )
        .unwrap_err();
        assert!(matches!(err, AgentError::CorruptSnapshot { .. }));
    }

    #[test]
    fn missing_snapshot_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let table = ValueTable::open(
            Arc::new(PolicyRegistry::standard()),
            &dir.path().join("absent.csv"),
            Hyperparams::live(),
            Hyperparams::retrain(),
            CreditAssignment::default(),
        )
        .unwrap();
        assert!(table.is_empty());
    }
}
