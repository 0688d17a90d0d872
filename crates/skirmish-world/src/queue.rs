//! FIFO queue of pending battles.

use parking_lot::{Condvar, Mutex};
use skirmish_core::EntityId;
use std::collections::VecDeque;

/// An unordered pair of entities found within kill range.
///
/// Tasks may be stale by the time they are dequeued; the consumer must
/// re-check both participants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BattleTask {
    pub first: EntityId,
    pub second: EntityId,
}

impl BattleTask {
    pub fn new(first: EntityId, second: EntityId) -> Self {
        Self { first, second }
    }
}

#[derive(Debug, Default)]
struct QueueState {
    tasks: VecDeque<BattleTask>,
    closed: bool,
}

/// Mutex-guarded FIFO paired with a condition signaled on push and on close.
#[derive(Debug, Default)]
pub struct BattleQueue {
    state: Mutex<QueueState>,
    ready: Condvar,
}

impl BattleQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, task: BattleTask) {
        self.state.lock().tasks.push_back(task);
        self.ready.notify_one();
    }

    /// Block until a task is available or the queue is closed.
    ///
    /// Returns `None` only once the queue is closed and empty, so tasks queued
    /// before shutdown are still drained.
    pub fn pop_blocking(&self) -> Option<BattleTask> {
        let mut state = self.state.lock();
        self.ready
            .wait_while(&mut state, |s| s.tasks.is_empty() && !s.closed);
        state.tasks.pop_front()
    }

    pub fn try_pop(&self) -> Option<BattleTask> {
        self.state.lock().tasks.pop_front()
    }

    /// Request shutdown and wake every waiter.
    pub fn close(&self) {
        self.state.lock().closed = true;
        self.ready.notify_all();
    }

    pub fn reopen(&self) {
        self.state.lock().closed = false;
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Drop every pending task. Returns how many were discarded.
    pub fn clear(&self) -> usize {
        let mut state = self.state.lock();
        let discarded = state.tasks.len();
        state.tasks.clear();
        discarded
    }

    pub fn len(&self) -> usize {
        self.state.lock().tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
