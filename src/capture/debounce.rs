//! Cancelable single-slot debounce timer
//!
//! The timer is deadline based: callers arm it with the current time and
//! poll it with [`Debouncer::tick`]. Only one value is ever pending, so a
//! second pending timer cannot exist by construction.

use std::sync::atomic::{AtomicU64, Ordering};

/// Source of the current time in epoch milliseconds
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> u64;
}

/// Wall-clock time
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or_default()
    }
}

/// Clock that only moves when told to
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start_millis: u64) -> Self {
        Self {
            now: AtomicU64::new(start_millis),
        }
    }

    /// Move the clock forward
    pub fn advance(&self, millis: u64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }

    pub fn set(&self, millis: u64) {
        self.now.store(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
struct Pending<T> {
    key: String,
    value: T,
    deadline: u64,
}

/// Holds at most one value until its owner has been idle for the delay
#[derive(Debug)]
pub struct Debouncer<T> {
    delay_ms: u64,
    pending: Option<Pending<T>>,
}

impl<T> Debouncer<T> {
    pub fn new(delay_ms: u64) -> Self {
        Self { delay_ms, pending: None }
    }

    /// Arm (or re-arm) the timer for `key`.
    ///
    /// Re-arming the same key replaces its value and pushes the deadline
    /// back. Arming a different key hands back the displaced value so the
    /// caller can commit it.
    pub fn arm(&mut self, key: impl Into<String>, value: T, now: u64) -> Option<T> {
        let key = key.into();
        let displaced = match self.pending.take() {
            Some(previous) if previous.key != key => Some(previous.value),
            _ => None,
        };
        self.pending = Some(Pending {
            key,
            value,
            deadline: now.saturating_add(self.delay_ms),
        });
        displaced
    }

    /// Take the pending value if its deadline has passed
    pub fn tick(&mut self, now: u64) -> Option<T> {
        match &self.pending {
            Some(pending) if now >= pending.deadline => self.pending.take().map(|p| p.value),
            _ => None,
        }
    }

    /// Take the pending value regardless of its deadline
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take().map(|p| p.value)
    }

    /// Drop the pending value
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending_key(&self) -> Option<&str> {
        self.pending.as_ref().map(|p| p.key.as_str())
    }

    /// When the pending value becomes due
    pub fn deadline(&self) -> Option<u64> {
        self.pending.as_ref().map(|p| p.deadline)
    }
}
