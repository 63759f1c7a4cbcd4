//! Deferred task queue
//!
//! Single-threaded timer wheel on a virtual clock. Each `TaskKey` has at
//! most one armed timer; arming again cancels the previous one (debounce).

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

/// Deferred jobs the engines schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKey {
    /// Redistribute every pending host
    Validate,
    /// Evaluate queued attached/detached transitions
    Attachment,
    /// Initial document upgrade pass and ready broadcast
    Bootstrap,
}

/// (due time in ms, arming sequence)
type Slot = (u64, u64);

#[derive(Debug, Default)]
pub struct TaskQueue {
    now: u64,
    seq: u64,
    timers: BTreeMap<Slot, TaskKey>,
    armed: HashMap<TaskKey, Slot>,
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time
    pub fn now(&self) -> Duration {
        Duration::from_millis(self.now)
    }

    /// Arm `key` to fire after `delay`, cancelling any timer already armed
    pub fn arm(&mut self, key: TaskKey, delay: Duration) {
        self.cancel(key);
        let slot = (self.now.saturating_add(millis(delay)), self.seq);
        self.seq += 1;
        self.timers.insert(slot, key);
        self.armed.insert(key, slot);
    }

    /// Arm `key` only if it is not already armed. Returns whether it armed.
    pub fn arm_once(&mut self, key: TaskKey, delay: Duration) -> bool {
        if self.is_armed(key) {
            return false;
        }
        self.arm(key, delay);
        true
    }

    pub fn cancel(&mut self, key: TaskKey) -> bool {
        match self.armed.remove(&key) {
            Some(slot) => {
                self.timers.remove(&slot);
                true
            }
            None => false,
        }
    }

    pub fn is_armed(&self, key: TaskKey) -> bool {
        self.armed.contains_key(&key)
    }

    pub fn is_idle(&self) -> bool {
        self.timers.is_empty()
    }

    /// Due time of the earliest armed timer
    pub fn next_due(&self) -> Option<Duration> {
        self.timers.keys().next().map(|&(due, _)| Duration::from_millis(due))
    }

    /// Remove the earliest timer due at or before `until`, moving the clock
    /// forward to its due time
    pub fn pop_due(&mut self, until: Duration) -> Option<TaskKey> {
        let (&slot, &key) = self.timers.first_key_value()?;
        if slot.0 > millis(until) {
            return None;
        }
        self.timers.remove(&slot);
        self.armed.remove(&key);
        self.now = self.now.max(slot.0);
        Some(key)
    }

    /// Move the clock forward without firing anything
    pub fn advance_to(&mut self, time: Duration) {
        self.now = self.now.max(millis(time));
    }
}
