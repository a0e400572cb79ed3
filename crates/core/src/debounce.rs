use std::collections::VecDeque;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
struct Pending {
    deadline: Instant,
    generation: u64,
}

/// Deferred single-shot tasks keyed by a generation counter.
///
/// Each [`schedule`](Debouncer::schedule) queues a task due `delay` later and
/// tagged with a fresh generation. [`fire`](Debouncer::fire) hands back the
/// generation of the newest task that has come due; the caller applies it
/// only if [`is_current`](Debouncer::is_current) still holds, so a task
/// superseded by a later trigger never runs. Time is passed in by the
/// caller; the event loop decides how to wait.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    generation: u64,
    pending: VecDeque<Pending>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: 0,
            pending: VecDeque::new(),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Queue a task due at `now + delay` and return its generation.
    pub fn schedule(&mut self, now: Instant) -> u64 {
        self.generation += 1;
        self.pending.push_back(Pending {
            deadline: now + self.delay,
            generation: self.generation,
        });
        self.generation
    }

    /// Drain every task due by `now` and return the newest one's generation.
    /// Each task is handed out at most once.
    pub fn fire(&mut self, now: Instant) -> Option<u64> {
        let mut fired = None;
        while let Some(task) = self.pending.front().copied() {
            if task.deadline > now {
                break;
            }
            self.pending.pop_front();
            fired = Some(task.generation);
        }
        fired
    }

    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }

    pub fn is_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Time left until the newest task is due, zero if overdue.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.pending
            .back()
            .map(|task| task.deadline.saturating_duration_since(now))
    }

    pub fn cancel(&mut self) {
        self.pending.clear();
    }
}
