// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Deduplicating, rate-limited work queue shared by event intake and the workers.
//!
//! A key is in at most one of two places at a time: waiting for delivery, or in
//! flight with a worker. Adding a key that is in flight marks it dirty so it is
//! delivered once more after `done`, never to a second worker concurrently.

use super::backoff::ExponentialBackoff;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet, VecDeque};
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, trace};

pub struct WorkQueue<K> {
    name: String,
    state: Mutex<QueueState<K>>,
    notify: Notify,
    backoff: ExponentialBackoff,
}

struct QueueState<K> {
    /// Keys ready for delivery, in arrival order
    queue: VecDeque<K>,
    /// Keys needing processing: everything in `queue` plus keys re-added while in flight
    dirty: HashSet<K>,
    /// Keys handed out by `get` and not yet `done`
    processing: HashSet<K>,
    failures: HashMap<K, u32>,
    /// Deadline per delayed key; heap entries that disagree with it are stale
    waiting: HashMap<K, Instant>,
    delayed: BinaryHeap<Reverse<(Instant, K)>>,
    shutting_down: bool,
}

impl<K> QueueState<K>
where
    K: Clone + Eq + Hash + Ord,
{
    fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            dirty: HashSet::new(),
            processing: HashSet::new(),
            failures: HashMap::new(),
            waiting: HashMap::new(),
            delayed: BinaryHeap::new(),
            shutting_down: false,
        }
    }

    /// Returns true when the key became ready for delivery.
    fn insert(&mut self, key: K) -> bool {
        if self.dirty.contains(&key) {
            return false;
        }
        self.dirty.insert(key.clone());
        if self.processing.contains(&key) {
            return false;
        }
        self.queue.push_back(key);
        true
    }

    fn promote_due(&mut self, now: Instant) {
        while self.delayed.peek().is_some_and(|Reverse((at, _))| *at <= now) {
            let Some(Reverse((at, key))) = self.delayed.pop() else {
                break;
            };
            if self.waiting.get(&key) == Some(&at) {
                self.waiting.remove(&key);
                self.insert(key);
            }
        }
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.delayed.peek().map(|Reverse((at, _))| *at)
    }
}

impl<K> WorkQueue<K>
where
    K: Clone + Eq + Hash + Ord + Debug + Send,
{
    pub fn new(name: impl Into<String>, backoff: ExponentialBackoff) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(QueueState::new()),
            notify: Notify::new(),
            backoff,
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState<K>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a key unless it is already pending. A key that is currently in
    /// flight is delivered again once its worker calls `done`.
    pub fn add(&self, key: K) {
        let mut state = self.lock();
        if state.shutting_down {
            return;
        }
        trace!(queue = %self.name, ?key, "add");
        if state.insert(key) {
            self.notify.notify_waiters();
        }
    }

    /// Wait for the next key. Returns `None` once the queue is shut down.
    ///
    /// The returned key stays in flight until `done` is called for it.
    pub async fn get(&self) -> Option<K> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let deadline = {
                let mut state = self.lock();
                if state.shutting_down {
                    return None;
                }
                state.promote_due(Instant::now());
                if let Some(key) = state.queue.pop_front() {
                    state.dirty.remove(&key);
                    state.processing.insert(key.clone());
                    if !state.queue.is_empty() {
                        self.notify.notify_waiters();
                    }
                    return Some(key);
                }
                state.next_deadline()
            };

            match deadline {
                Some(at) => {
                    tokio::select! {
                        _ = notified.as_mut() => {}
                        _ = sleep_until(at) => {}
                    }
                }
                None => notified.await,
            }
        }
    }

    /// Release a key handed out by `get`, re-queueing it if it was added meanwhile.
    pub fn done(&self, key: &K) {
        let mut state = self.lock();
        state.processing.remove(key);
        if state.dirty.contains(key) && !state.shutting_down {
            state.queue.push_back(key.clone());
            self.notify.notify_waiters();
        }
    }

    /// Make a key visible after `delay`. If the key is already waiting, the
    /// earlier deadline wins.
    pub fn add_after(&self, key: K, delay: Duration) {
        if delay.is_zero() {
            self.add(key);
            return;
        }

        let mut state = self.lock();
        if state.shutting_down {
            return;
        }
        let at = Instant::now() + delay;
        if state.waiting.get(&key).is_some_and(|existing| *existing <= at) {
            return;
        }
        state.waiting.insert(key.clone(), at);
        state.delayed.push(Reverse((at, key)));
        // waiters may be sleeping towards a later deadline
        self.notify.notify_waiters();
    }

    /// Requeue a key after its backoff and count the failure.
    pub fn add_rate_limited(&self, key: K) {
        let delay = {
            let mut state = self.lock();
            let failures = state.failures.entry(key.clone()).or_insert(0);
            let delay = self.backoff.delay(*failures);
            *failures = failures.saturating_add(1);
            delay
        };
        debug!(queue = %self.name, ?key, ?delay, "requeue with backoff");
        self.add_after(key, delay);
    }

    /// Reset the failure count of a key.
    pub fn forget(&self, key: &K) {
        self.lock().failures.remove(key);
    }

    /// How many times the key was requeued through `add_rate_limited` since the
    /// last `forget`.
    pub fn num_requeues(&self, key: &K) -> u32 {
        self.lock().failures.get(key).copied().unwrap_or(0)
    }

    /// Keys ready for delivery right now.
    pub fn len(&self) -> usize {
        self.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stop handing out keys; blocked and future `get` calls return `None`.
    pub fn shut_down(&self) {
        let mut state = self.lock();
        if !state.shutting_down {
            debug!(queue = %self.name, pending = state.queue.len(), "shutting down");
            state.shutting_down = true;
        }
        self.notify.notify_waiters();
    }

    pub fn is_shutting_down(&self) -> bool {
        self.lock().shutting_down
    }
}

/// Scoped in-flight marker: calls `done` for its key when dropped, whether the
/// worker finished, returned early or unwound.
pub struct InFlight<'a, K>
where
    K: Clone + Eq + Hash + Ord + Debug + Send,
{
    queue: &'a WorkQueue<K>,
    key: K,
}

impl<'a, K> InFlight<'a, K>
where
    K: Clone + Eq + Hash + Ord + Debug + Send,
{
    pub fn new(queue: &'a WorkQueue<K>, key: K) -> Self {
        Self { queue, key }
    }

    pub fn key(&self) -> &K {
        &self.key
    }
}

impl<K> Drop for InFlight<'_, K>
where
    K: Clone + Eq + Hash + Ord + Debug + Send,
{
    fn drop(&mut self) {
        self.queue.done(&self.key);
    }
}
