//! Tick-driven timers.
//!
//! Timers are checked when the host ticks. A timer is due once its interval
//! has elapsed since it was armed; repeating timers re-arm from their due
//! time. Callbacks run with mutable access to a context `C`, and may set or
//! kill timers on the queue that owns them.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

pub type TimerId = i32;

/// A timer callback. Errors are reported by the context that runs it.
pub type TimerCallback<C> = Box<dyn FnMut(&mut C) -> anyhow::Result<()>>;

struct Timer<C> {
    interval: Duration,
    repeat: bool,
    due: Instant,
    /// `None` while the callback is running.
    callback: Option<TimerCallback<C>>,
}

/// Pending timers in id order.
pub struct TimerQueue<C> {
    timers: BTreeMap<TimerId, Timer<C>>,
    next_id: TimerId,
}

impl<C> Default for TimerQueue<C> {
    fn default() -> Self {
        Self {
            timers: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl<C> TimerQueue<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a timer due `interval_ms` after `now`.
    pub fn set(
        &mut self,
        interval_ms: u32,
        repeat: bool,
        now: Instant,
        callback: TimerCallback<C>,
    ) -> TimerId {
        let id = self.allocate_id();
        let interval = Duration::from_millis(u64::from(interval_ms));
        self.timers.insert(
            id,
            Timer {
                interval,
                repeat,
                due: now + interval,
                callback: Some(callback),
            },
        );
        id
    }

    /// The next id not held by a pending timer.
    fn allocate_id(&mut self) -> TimerId {
        loop {
            let id = self.next_id;
            self.next_id = self.next_id.wrapping_add(1).max(1);
            if !self.timers.contains_key(&id) {
                return id;
            }
        }
    }

    /// Disarm a timer. Returns false if it was not pending.
    pub fn kill(&mut self, id: TimerId) -> bool {
        self.timers.remove(&id).is_some()
    }

    pub fn contains(&self, id: TimerId) -> bool {
        self.timers.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Ids due at `now`, earliest first.
    pub fn due(&self, now: Instant) -> Vec<TimerId> {
        let mut due: Vec<(Instant, TimerId)> = self
            .timers
            .iter()
            .filter(|(_, t)| t.due <= now && t.callback.is_some())
            .map(|(&id, t)| (t.due, id))
            .collect();
        due.sort();
        due.into_iter().map(|(_, id)| id).collect()
    }

    /// Take the callback of a due timer so it can run.
    pub fn begin(&mut self, id: TimerId) -> Option<TimerCallback<C>> {
        self.timers.get_mut(&id)?.callback.take()
    }

    /// Return a callback after it ran: repeating timers are re-armed, others
    /// removed. A timer killed while its callback ran stays dead.
    pub fn finish(&mut self, id: TimerId, callback: TimerCallback<C>, now: Instant) {
        let Some(timer) = self.timers.get_mut(&id) else {
            return;
        };
        if !timer.repeat {
            self.timers.remove(&id);
            return;
        }
        timer.due += timer.interval;
        if timer.due <= now {
            timer.due = now + timer.interval;
        }
        timer.callback = Some(callback);
    }
}
