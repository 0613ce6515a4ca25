use crate::card::InstanceId;
use std::collections::VecDeque;

/// Deferred engine work. Each one fires once its delay has elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// Resolve the effect of a card whose cost was already paid.
    CommitPlay(InstanceId),
    /// Re-check whether the player's turn should end on its own.
    AutoEndCheck,
    EnemyAct,
    GrantReward,
}

#[derive(Debug, Clone)]
struct ScheduledEvent {
    due_ms: u64,
    seq: u64, // Insertion order breaks ties between equal due times
    event: TimerEvent,
}

/// Virtual clock plus a queue of pending timers, ordered by due time.
///
/// Nothing here sleeps: callers move time forward with [`Scheduler::pop_due`]
/// and [`Scheduler::advance_to`], which keeps battles fully deterministic.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    now_ms: u64,
    next_seq: u64,
    queue: VecDeque<ScheduledEvent>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> u64 {
        self.now_ms
    }

    pub fn schedule(&mut self, delay_ms: u64, event: TimerEvent) {
        let scheduled = ScheduledEvent {
            due_ms: self.now_ms.saturating_add(delay_ms),
            seq: self.next_seq,
            event,
        };
        self.next_seq += 1;

        let key = (scheduled.due_ms, scheduled.seq);
        let position = self.queue.partition_point(|e| (e.due_ms, e.seq) < key);
        self.queue.insert(position, scheduled);
    }

    /// Pop the earliest timer due at or before `until_ms`, moving the clock to it.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<TimerEvent> {
        if self.queue.front()?.due_ms > until_ms {
            return None;
        }
        let next = self.queue.pop_front()?;
        self.now_ms = self.now_ms.max(next.due_ms);
        Some(next.event)
    }

    pub fn advance_to(&mut self, until_ms: u64) {
        self.now_ms = self.now_ms.max(until_ms);
    }

    /// Milliseconds until the next timer fires, if any is pending.
    pub fn next_due_in(&self) -> Option<u64> {
        self.queue
            .front()
            .map(|e| e.due_ms.saturating_sub(self.now_ms))
    }

    pub fn is_pending(&self, event: &TimerEvent) -> bool {
        self.queue.iter().any(|e| e.event == *event)
    }

    pub fn cancel(&mut self, event: &TimerEvent) {
        self.queue.retain(|e| e.event != *event);
    }

    pub fn cancel_all(&mut self) {
        self.queue.clear();
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
