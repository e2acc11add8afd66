use std::ops::Range;
use std::time::{Duration, Instant};

use rand::Rng;

/// Default window the cue delay is drawn from, in milliseconds.
pub const DEFAULT_DELAY_RANGE_MS: Range<u64> = 1000..4000;

/// Identifies one arming of the timer. Handles are never reused, so a handle
/// from an earlier round can't match a later one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone, Copy)]
struct Pending {
    handle: TimerHandle,
    deadline: Instant,
}

/// One-shot delayed "ready" event.
///
/// The service never runs on its own thread: the owner calls [`poll`] with
/// the current time and receives the handle once its deadline has passed.
/// Arming again replaces whatever was pending.
///
/// [`poll`]: TimerService::poll
#[derive(Debug, Default)]
pub struct TimerService {
    next_id: u64,
    pending: Option<Pending>,
}

impl TimerService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&mut self, delay: Duration, now: Instant) -> TimerHandle {
        self.next_id += 1;
        let handle = TimerHandle(self.next_id);
        self.pending = Some(Pending {
            handle,
            deadline: now + delay,
        });
        handle
    }

    /// Cancelling a fired, cancelled or unknown handle does nothing.
    pub fn cancel(&mut self, handle: TimerHandle) {
        if self.pending.is_some_and(|p| p.handle == handle) {
            self.pending = None;
        }
    }

    /// Returns the pending handle if its deadline is at or before `now`.
    /// A handle is delivered at most once.
    pub fn poll(&mut self, now: Instant) -> Option<TimerHandle> {
        match self.pending {
            Some(p) if now >= p.deadline => {
                self.pending = None;
                Some(p.handle)
            }
            _ => None,
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.map(|p| p.deadline)
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.pending.is_some_and(|p| p.handle == handle)
    }
}

/// Draws a cue delay uniformly from `range` (half-open, in milliseconds).
pub fn random_delay<R: Rng + ?Sized>(rng: &mut R, range: &Range<u64>) -> Duration {
    if range.is_empty() {
        return Duration::from_millis(range.start);
    }
    Duration::from_millis(rng.gen_range(range.clone()))
}
