//! Policies and the policy registry

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::AtomicAction;

/// Identifier of a registered policy
///
/// A stable index into the registry, which doubles as the policy's column
/// position in every value-table row.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PolicyId(pub usize);

impl PolicyId {
    /// Column position of this policy in a value-table row
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for PolicyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "policy_{}", self.0)
    }
}

impl FromStr for PolicyId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let n = s
            .strip_prefix("policy_")
            .ok_or_else(|| anyhow::anyhow!("policy id must look like `policy_<n>`: `{s}`"))?;
        Ok(Self(n.parse()?))
    }
}

/// Ordered, immutable mapping from policy id to its atomic-action sequence
///
/// Registered once at startup; the set of policies is fixed for the lifetime
/// of any value table built against it, because table columns are aligned to
/// registration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRegistry {
    policies: Vec<Vec<AtomicAction>>,
}

impl PolicyRegistry {
    /// Build a registry from ordered action sequences
    ///
    /// Index 0 is the designated fallback policy and must be a lone
    /// do-nothing action.
    #[must_use]
    pub fn new(policies: Vec<Vec<AtomicAction>>) -> Self {
        debug_assert!(
            matches!(policies.first().map(Vec::as_slice), Some([AtomicAction::DoNothing])),
            "policy 0 is the no-op fallback"
        );
        Self { policies }
    }

    /// The fourteen policies of the standard agent
    ///
    /// A mix of atomic economy policies and composite expansion, production
    /// and combat policies; composite lists repeat entries so one decision
    /// spans several ticks.
    #[must_use]
    pub fn standard() -> Self {
        use AtomicAction::{
            AttackWithMarauder, AttackWithMarine, BuildBarracks, BuildBunker,
            BuildCommandCenter, BuildScv, BuildSupplyDepot, BuildTechLab, DefenseWithMarine,
            DoNothing, Explore, HarvestGas, HarvestMinerals, TrainMarauder, TrainMarine,
        };

        let mut military_production = vec![BuildBarracks];
        military_production.extend([TrainMarine; 5]);

        let mut tech_upgrade = vec![BuildTechLab];
        tech_upgrade.extend([TrainMarauder; 4]);

        let mut combined_assault = vec![AttackWithMarine; 5];
        combined_assault.extend([AttackWithMarauder; 2]);

        Self::new(vec![
            vec![DoNothing],
            // Economy
            vec![BuildScv],
            vec![HarvestMinerals],
            vec![HarvestGas],
            // Expansion
            vec![BuildCommandCenter, HarvestMinerals, HarvestMinerals],
            vec![Explore],
            vec![BuildSupplyDepot],
            // Military infrastructure and production
            military_production,
            vec![BuildBunker],
            tech_upgrade,
            // Combat
            vec![AttackWithMarine; 5],
            vec![DefenseWithMarine; 5],
            combined_assault,
            vec![AttackWithMarauder; 3],
        ])
    }

    /// Action sequence of one policy, or `None` for an unknown id
    #[must_use]
    pub fn get(&self, id: PolicyId) -> Option<&[AtomicAction]> {
        self.policies.get(id.index()).map(Vec::as_slice)
    }

    /// All policy ids in registration order
    pub fn ids(&self) -> impl Iterator<Item = PolicyId> + '_ {
        (0..self.policies.len()).map(PolicyId)
    }

    /// Number of registered policies
    #[must_use]
    pub fn len(&self) -> usize {
        self.policies.len()
    }

    /// Whether the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    /// The designated fallback policy
    #[must_use]
    pub fn no_op(&self) -> PolicyId {
        PolicyId(0)
    }

    /// Sample a policy uniformly at random
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> PolicyId {
        PolicyId(rng.gen_range(0..self.policies.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn id_display_round_trips() {
        let id = PolicyId(7);
        assert_eq!(id.to_string(), "policy_7");
        assert_eq!("policy_7".parse::<PolicyId>().unwrap(), id);
        assert!("marine_rush".parse::<PolicyId>().is_err());
    }

    #[test]
    fn standard_registry_shape() {
        let registry = PolicyRegistry::standard();
        assert_eq!(registry.len(), 14);
        assert_eq!(
            registry.get(registry.no_op()),
            Some([AtomicAction::DoNothing].as_slice())
        );
        // Composite policies repeat entries.
        assert_eq!(registry.get(PolicyId(7)).unwrap().len(), 6);
        assert_eq!(registry.get(PolicyId(10)).unwrap().len(), 5);
        assert_eq!(registry.get(PolicyId(12)).unwrap().len(), 7);
        assert!(registry.get(PolicyId(14)).is_none());
    }

    #[test]
    fn sample_stays_in_range() {
        let registry = PolicyRegistry::standard();
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let id = registry.sample(&mut rng);
            assert!(registry.get(id).is_some());
        }
    }
}
