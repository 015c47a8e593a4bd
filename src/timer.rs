use std::time::{Duration, Instant};

/// A single-threaded queue of deferred tasks.
///
/// Nothing runs by itself: the event loop asks for [`Scheduler::drain_due`]
/// with the current time and handles whatever comes back.  Deadlines that
/// tie fire in the order they were scheduled.
#[derive(Debug)]
pub struct Scheduler<T> {
    entries: Vec<Entry<T>>,
    next_seq: u64,
}

#[derive(Debug)]
struct Entry<T> {
    deadline: Instant,
    seq: u64,
    task: T,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Scheduler {
            entries: Vec::new(),
            next_seq: 0,
        }
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `task` to fire `delay` after `now`.  A zero delay fires on the
    /// next drain.
    pub fn schedule(&mut self, now: Instant, delay: Duration, task: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(Entry {
            deadline: now + delay,
            seq,
            task,
        });
    }

    /// Remove and return every task whose deadline is at or before `now`.
    pub fn drain_due(&mut self, now: Instant) -> Vec<T> {
        let (mut due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|e| e.deadline <= now);
        self.entries = pending;

        due.sort_by_key(|e| (e.deadline, e.seq));
        due.into_iter().map(|e| e.task).collect()
    }

    /// The earliest deadline still waiting, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries.iter().map(|e| e.deadline).min()
    }

    pub fn cancel_all(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
