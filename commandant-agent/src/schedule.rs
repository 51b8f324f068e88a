//! Exploration-rate schedules

/// A value that varies with the episode counter (e.g. epsilon decay)
pub trait Schedule {
    /// Value at episode `episode`
    fn value(&self, episode: u64) -> f64;
}

/// Exponential exploration decay
///
/// `epsilon(episode) = max_rate * exp(-decay_rate * episode)` — exact, with
/// no floor; the controller applies the exploration minimum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExponentialSchedule {
    /// Exploration rate at episode zero
    pub max_rate: f64,
    /// Decay rate per episode
    pub decay_rate: f64,
}

impl ExponentialSchedule {
    /// Create a schedule
    #[must_use]
    pub fn new(max_rate: f64, decay_rate: f64) -> Self {
        Self {
            max_rate,
            decay_rate,
        }
    }

    /// Epsilon for one episode
    #[must_use]
    pub fn epsilon_for_episode(&self, episode: u64) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let episode = episode as f64;
        self.max_rate * (-self.decay_rate * episode).exp()
    }
}

impl Schedule for ExponentialSchedule {
    fn value(&self, episode: u64) -> f64 {
        self.epsilon_for_episode(episode)
    }
}

/// Constant schedule, useful in evaluation runs and tests
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantSchedule(pub f64);

impl Schedule for ConstantSchedule {
    fn value(&self, _episode: u64) -> f64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn episode_zero_is_max_rate() {
        let schedule = ExponentialSchedule::new(1.0, 0.0003);
        assert_relative_eq!(schedule.epsilon_for_episode(0), 1.0);
    }

    #[test]
    fn known_decay_values() {
        let schedule = ExponentialSchedule::new(1.0, 0.0003);
        assert_relative_eq!(
            schedule.epsilon_for_episode(1000),
            (-0.3_f64).exp(),
            epsilon = 1e-12
        );
    }

    proptest! {
        #[test]
        fn strictly_decreasing(episode in 0_u64..100_000) {
            let schedule = ExponentialSchedule::new(1.0, 0.0003);
            prop_assert!(
                schedule.epsilon_for_episode(episode + 1) < schedule.epsilon_for_episode(episode)
            );
        }

        #[test]
        fn bounded_by_max_rate(max_rate in 0.01_f64..1.0, episode in 0_u64..50_000) {
            let schedule = ExponentialSchedule::new(max_rate, 0.0003);
            let eps = schedule.epsilon_for_episode(episode);
            prop_assert!(eps > 0.0 && eps <= max_rate);
        }
    }
}
