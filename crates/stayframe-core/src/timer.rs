//! Keyed, cancellable timers.
//!
//! Each state machine owns one `Timers` and names its timers with a small
//! key enum (one key per purpose). Scheduling a key that is already pending
//! replaces its deadline: last write wins, nothing queues. The driver asks
//! for [`Timers::next_deadline`], sleeps (or advances virtual time), and
//! feeds a tick back; the state machine then drains [`Timers::expired`].

use std::fmt::Debug;

#[derive(Debug, Clone)]
struct Entry<K, I> {
    key: K,
    deadline: I,
    seq: u64,
}

/// Pending timers keyed by purpose.
#[derive(Debug, Clone)]
pub struct Timers<K, I> {
    entries: Vec<Entry<K, I>>,
    next_seq: u64,
}

impl<K, I> Timers<K, I>
where
    K: Copy + Eq + Debug,
    I: Copy + Ord,
{
    /// Create an empty timer set.
    pub fn new() -> Self {
        Self { entries: Vec::new(), next_seq: 0 }
    }

    /// Schedule `key` to fire at `deadline`.
    ///
    /// Returns true if a pending timer with the same key was superseded.
    pub fn schedule(&mut self, key: K, deadline: I) -> bool {
        let seq = self.next_seq;
        self.next_seq += 1;

        if let Some(entry) = self.entries.iter_mut().find(|e| e.key == key) {
            entry.deadline = deadline;
            entry.seq = seq;
            true
        } else {
            self.entries.push(Entry { key, deadline, seq });
            false
        }
    }

    /// Cancel `key`. Returns true if it was pending.
    pub fn cancel(&mut self, key: K) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.key != key);
        self.entries.len() != before
    }

    /// Cancel everything.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Returns true if `key` is pending.
    pub fn is_scheduled(&self, key: K) -> bool {
        self.entries.iter().any(|e| e.key == key)
    }

    /// Deadline of `key`, if pending.
    pub fn deadline(&self, key: K) -> Option<I> {
        self.entries.iter().find(|e| e.key == key).map(|e| e.deadline)
    }

    /// Earliest pending deadline.
    pub fn next_deadline(&self) -> Option<I> {
        self.entries.iter().map(|e| e.deadline).min()
    }

    /// Remove and return every key due at `now`.
    ///
    /// Keys come back in deadline order; ties resolve in scheduling order.
    pub fn expired(&mut self, now: I) -> Vec<K> {
        let mut due: Vec<Entry<K, I>> = Vec::new();
        let mut pending = Vec::with_capacity(self.entries.len());

        for entry in self.entries.drain(..) {
            if entry.deadline <= now {
                due.push(entry);
            } else {
                pending.push(entry);
            }
        }
        self.entries = pending;

        due.sort_by(|a, b| a.deadline.cmp(&b.deadline).then(a.seq.cmp(&b.seq)));
        due.into_iter().map(|e| e.key).collect()
    }

    /// Number of pending timers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, I> Default for Timers<K, I>
where
    K: Copy + Eq + Debug,
    I: Copy + Ord,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Key {
        Apply,
        Viewport,
        Retry,
    }

    #[test]
    fn fires_in_deadline_order() {
        let mut timers = Timers::new();
        timers.schedule(Key::Viewport, 250u64);
        timers.schedule(Key::Apply, 30);
        timers.schedule(Key::Retry, 500);

        assert_eq!(timers.next_deadline(), Some(30));
        assert_eq!(timers.expired(300), vec![Key::Apply, Key::Viewport]);
        assert_eq!(timers.len(), 1);
        assert!(timers.is_scheduled(Key::Retry));
    }

    #[test]
    fn reschedule_supersedes() {
        let mut timers = Timers::new();
        assert!(!timers.schedule(Key::Apply, 30u64));
        assert!(timers.schedule(Key::Apply, 60));

        assert!(timers.expired(30).is_empty());
        assert_eq!(timers.expired(60), vec![Key::Apply]);
        assert!(timers.is_empty());
    }

    #[test]
    fn cancel_removes_only_that_key() {
        let mut timers = Timers::new();
        timers.schedule(Key::Apply, 30u64);
        timers.schedule(Key::Retry, 30);

        assert!(timers.cancel(Key::Apply));
        assert!(!timers.cancel(Key::Apply));
        assert_eq!(timers.expired(30), vec![Key::Retry]);
    }

    #[test]
    fn ties_resolve_in_scheduling_order() {
        let mut timers = Timers::new();
        timers.schedule(Key::Retry, 100u64);
        timers.schedule(Key::Apply, 100);
        timers.schedule(Key::Retry, 100);

        assert_eq!(timers.expired(100), vec![Key::Apply, Key::Retry]);
    }

    proptest! {
        #[test]
        fn prop_expired_never_returns_future_deadlines(
            deadlines in proptest::collection::vec(0u64..1_000, 0..16),
            now in 0u64..1_000,
        ) {
            let keys = [Key::Apply, Key::Viewport, Key::Retry];
            let mut timers = Timers::new();
            for (i, deadline) in deadlines.iter().enumerate() {
                timers.schedule(keys[i % keys.len()], *deadline);
            }

            let fired = timers.expired(now);
            for key in &fired {
                prop_assert!(!timers.is_scheduled(*key));
            }
            if let Some(next) = timers.next_deadline() {
                prop_assert!(next > now);
            }
        }
    }
}
