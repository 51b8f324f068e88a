//! Episode controller state machine

use std::sync::Arc;

use chrono::{DateTime, Utc};

use commandant_core::{
    ActionRegistry, AtomicAction, Command, Observation, Outcome, PolicyId, PolicyRegistry,
    Result, RewardModel, StateEncoder, StateKey, Successor, Trajectory, Transition,
};

use crate::config::AgentConfig;
use crate::queue::ActionQueue;
use crate::schedule::ExponentialSchedule;
use crate::stats::{EpisodeStats, StatsWriter};
use crate::table::ValueTable;

/// Where the controller is within the decision cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// The queue has drained; the next tick picks a new policy
    AwaitingDecision,
    /// A policy's actions are still pending in the queue
    ExecutingQueue,
}

#[derive(Debug, Clone)]
struct EpisodeCounters {
    steps: u64,
    game_time: u64,
    executed: [u64; AtomicAction::ALL.len()],
    failed: u64,
    exploration: u64,
    exploitation: u64,
    episode_reward: f64,
    final_reward: f64,
    started_at: DateTime<Utc>,
}

impl EpisodeCounters {
    fn new() -> Self {
        Self {
            steps: 0,
            game_time: 0,
            executed: [0; AtomicAction::ALL.len()],
            failed: 0,
            exploration: 0,
            exploitation: 0,
            episode_reward: 0.0,
            final_reward: 0.0,
            started_at: Utc::now(),
        }
    }
}

/// Tick-driven episode loop over the learning engine
///
/// Alternates between decision ticks, which learn from the previous decision
/// and pick the next policy, and execution ticks, which drain the chosen
/// policy's actions one per tick. A terminal frame short-circuits both
/// phases into the terminal path on the same tick: remaining queued actions
/// are abandoned, credit is propagated over the whole trajectory, the table
/// is persisted and all episode-scoped state is cleared.
///
/// `step` is called synchronously once per simulation tick and never blocks;
/// pacing belongs to the caller.
pub struct Controller {
    config: AgentConfig,
    registry: Arc<PolicyRegistry>,
    actions: ActionRegistry,
    rewards: Box<dyn RewardModel>,
    table: ValueTable,
    encoder: StateEncoder,
    schedule: ExponentialSchedule,
    queue: ActionQueue,
    phase: Phase,
    episode: u64,
    epsilon: f64,
    trajectory: Trajectory,
    previous: Option<(StateKey, PolicyId)>,
    accumulated_reward: f64,
    counters: EpisodeCounters,
    stats: Option<StatsWriter>,
}

impl Controller {
    /// Create a controller, loading any existing value-table snapshot
    ///
    /// # Errors
    ///
    /// [`commandant_core::AgentError::CorruptSnapshot`] when a snapshot file
    /// exists but cannot be parsed. This is the only fatal startup error.
    pub fn new(
        config: AgentConfig,
        registry: Arc<PolicyRegistry>,
        actions: ActionRegistry,
        rewards: Box<dyn RewardModel>,
    ) -> Result<Self> {
        let table = ValueTable::open(
            Arc::clone(&registry),
            &config.snapshot_path,
            config.live,
            config.retrain,
            config.credit,
        )?;
        let schedule = ExponentialSchedule::new(config.exploration_max, config.exploration_decay);
        let encoder = StateEncoder::new(config.step_mul);
        let stats = config.stats_path.clone().map(StatsWriter::new);
        let epsilon = schedule.epsilon_for_episode(0).max(config.exploration_min);

        Ok(Self {
            config,
            registry,
            actions,
            rewards,
            table,
            encoder,
            schedule,
            queue: ActionQueue::new(),
            phase: Phase::AwaitingDecision,
            episode: 0,
            epsilon,
            trajectory: Trajectory::new(),
            previous: None,
            accumulated_reward: 0.0,
            counters: EpisodeCounters::new(),
            stats,
        })
    }

    /// Reseed the table's exploration RNG (deterministic tests)
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.table = self.table.with_seed(seed);
        self
    }

    /// Advance one simulation tick and produce the command for it
    pub fn step(&mut self, obs: &Observation) -> Command {
        self.counters.steps += 1;

        // A terminal frame preempts whatever phase we are in.
        if let Some(outcome) = obs.outcome {
            self.finish_episode(obs, outcome);
            return Command::no_op();
        }

        if self.phase == Phase::ExecutingQueue {
            if let Some(action) = self.queue.pop_next() {
                let command = self.execute(action, obs);
                if self.queue.is_empty() {
                    self.phase = Phase::AwaitingDecision;
                }
                return command;
            }
            self.phase = Phase::AwaitingDecision;
        }

        self.decide(obs)
    }

    /// Flush the table snapshot and clear all episode-scoped state
    ///
    /// For callers that abandon an episode without a terminal frame; the
    /// normal terminal path does all of this itself.
    ///
    /// # Errors
    ///
    /// IO errors from writing the snapshot.
    pub fn reset(&mut self) -> Result<()> {
        if self.config.training {
            self.table.save(&self.config.snapshot_path)?;
        }
        self.reset_episode();
        Ok(())
    }

    fn decide(&mut self, obs: &Observation) -> Command {
        let state = match self.encoder.encode(obs) {
            Ok(state) => state,
            Err(err) => {
                tracing::warn!(error = %err, "malformed observation, idling this tick");
                return Command::no_op();
            }
        };

        self.counters.game_time += self.encoder.game_time(obs.game_loop);

        // Close out the previous decision now that its queue has drained.
        if let Some((prev_state, prev_policy)) = self.previous {
            let reward = self.accumulated_reward;
            self.trajectory.push(Transition {
                state: prev_state,
                policy: prev_policy,
                reward,
                next: Successor::State(state),
            });
            if self.config.training {
                if let Err(err) = self.table.learn(prev_state, prev_policy, reward, state.into()) {
                    tracing::warn!(error = %err, "learn failed for previous decision");
                }
            }
            self.accumulated_reward = 0.0;
        }

        self.epsilon = self
            .schedule
            .epsilon_for_episode(self.episode)
            .max(self.config.exploration_min);

        let (chosen, explored) = self
            .table
            .choose_policy(&state, self.epsilon, self.config.training);
        if explored {
            self.counters.exploration += 1;
        } else {
            self.counters.exploitation += 1;
        }

        let policy = match self.registry.get(chosen) {
            Some(plan) => {
                self.queue.load(plan);
                chosen
            }
            None => {
                tracing::warn!(policy = %chosen, "unregistered policy chosen, falling back to no-op");
                let fallback = self.registry.no_op();
                if let Some(plan) = self.registry.get(fallback) {
                    self.queue.load(plan);
                }
                fallback
            }
        };

        tracing::debug!(
            episode = self.episode,
            state = %state,
            policy = %policy,
            epsilon = self.epsilon,
            explored,
            "decision"
        );

        self.previous = Some((state, policy));
        self.phase = Phase::ExecutingQueue;
        Command::no_op()
    }

    fn execute(&mut self, action: AtomicAction, obs: &Observation) -> Command {
        let outcome = self.actions.dispatch(action, obs);
        if outcome.executed {
            self.counters.executed[action.index()] += 1;
        } else {
            self.counters.failed += 1;
        }

        let reward = self.rewards.action_reward(action, outcome.executed, obs);
        self.accumulated_reward += reward;
        self.counters.episode_reward += reward;

        outcome.command
    }

    fn finish_episode(&mut self, obs: &Observation, outcome: Outcome) {
        // Mid-policy actions are abandoned, not completed.
        self.queue.clear();

        let final_reward = self.rewards.terminal_reward(obs, outcome);
        self.counters.final_reward = final_reward;

        if self.config.training {
            if let Some((prev_state, prev_policy)) = self.previous {
                self.trajectory.push(Transition {
                    state: prev_state,
                    policy: prev_policy,
                    reward: final_reward,
                    next: Successor::Terminal,
                });
                if let Err(err) =
                    self.table
                        .learn(prev_state, prev_policy, final_reward, Successor::Terminal)
                {
                    tracing::warn!(error = %err, "terminal learn failed");
                }
                self.table.propagate_rewards(&self.trajectory, final_reward);
            }
            if let Err(err) = self.table.save(&self.config.snapshot_path) {
                tracing::error!(error = %err, "failed to persist value-table snapshot");
            }
        }

        tracing::info!(
            episode = self.episode,
            outcome = ?outcome,
            final_reward,
            steps = self.counters.steps,
            states = self.table.len(),
            "episode finished"
        );

        self.write_stats();
        self.reset_episode();
    }

    fn write_stats(&mut self) {
        let Some(writer) = &self.stats else {
            return;
        };
        let stats = EpisodeStats {
            episode: self.episode,
            epsilon: self.epsilon,
            total_steps: self.counters.steps,
            total_game_time: self.counters.game_time,
            executed: self.counters.executed.to_vec(),
            failed_actions: self.counters.failed,
            count_exploration: self.counters.exploration,
            count_exploitation: self.counters.exploitation,
            total_reward: self.counters.episode_reward,
            final_reward: self.counters.final_reward,
            started_at: self.counters.started_at,
            finished_at: Utc::now(),
        };
        if let Err(err) = writer.append(&stats) {
            tracing::warn!(error = %err, "failed to append episode statistics");
        }
    }

    fn reset_episode(&mut self) {
        self.episode += 1;
        self.trajectory.clear();
        self.queue.clear();
        self.previous = None;
        self.accumulated_reward = 0.0;
        self.phase = Phase::AwaitingDecision;
        self.encoder.reset();
        self.rewards.reset();
        self.counters = EpisodeCounters::new();
    }

    /// Current phase of the decision cycle
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Episodes finished so far
    #[must_use]
    pub fn episode(&self) -> u64 {
        self.episode
    }

    /// Exploration rate in force for the current episode
    #[must_use]
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Actions still pending for the policy in flight
    #[must_use]
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Read access to the value table
    #[must_use]
    pub fn table(&self) -> &ValueTable {
        &self.table
    }

    /// Mutable access to the value table, for tooling that seeds or inspects
    /// values directly
    pub fn table_mut(&mut self) -> &mut ValueTable {
        &mut self.table
    }
}
