//! FIFO scheduler for the policy currently in flight

use std::collections::VecDeque;

use commandant_core::AtomicAction;

/// Per-controller FIFO of pending atomic actions
///
/// Holds the remaining actions of the policy currently being executed.
/// Purely mechanical; no learning logic. Each controller owns its queue, so
/// independent training runs in one process never share scheduling state.
#[derive(Debug, Clone, Default)]
pub struct ActionQueue {
    pending: VecDeque<AtomicAction>,
}

impl ActionQueue {
    /// Create an empty queue
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the queue contents with a freshly chosen policy's actions
    pub fn load(&mut self, actions: &[AtomicAction]) {
        self.pending.clear();
        self.pending.extend(actions.iter().copied());
    }

    /// Pop the next pending action, front first
    pub fn pop_next(&mut self) -> Option<AtomicAction> {
        self.pending.pop_front()
    }

    /// Number of pending actions
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether the queue has drained
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Abandon all pending actions (terminal mid-policy cancellation)
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_fifo_order() {
        let mut queue = ActionQueue::new();
        queue.load(&[
            AtomicAction::BuildBarracks,
            AtomicAction::TrainMarine,
            AtomicAction::TrainMarine,
        ]);

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.pop_next(), Some(AtomicAction::BuildBarracks));
        assert_eq!(queue.pop_next(), Some(AtomicAction::TrainMarine));
        assert_eq!(queue.pop_next(), Some(AtomicAction::TrainMarine));
        assert_eq!(queue.pop_next(), None);
    }

    #[test]
    fn load_replaces_pending_actions() {
        let mut queue = ActionQueue::new();
        queue.load(&[AtomicAction::Explore, AtomicAction::Explore]);
        queue.load(&[AtomicAction::BuildBunker]);

        assert_eq!(queue.pop_next(), Some(AtomicAction::BuildBunker));
        assert!(queue.is_empty());
    }
}
