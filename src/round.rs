use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::timer::{TimerHandle, TimerService};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success { reaction_time_ms: u64 },
    TooEarly,
}

/// Lifecycle of a single round. `Resolved` is never held: the outcome is
/// handed back from [`Round::interact`] and the round is already Idle again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundState {
    Idle,
    Armed {
        armed_at: Instant,
        timer: TimerHandle,
    },
    Ready {
        armed_at: Instant,
        ready_at: Instant,
    },
}

/// Coarse phase for renderers that don't care about timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Phase {
    Idle,
    Armed,
    Ready,
}

/// What a call to the round changed, for the controller to react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Armed { delay: Duration },
    Ready,
    Resolved(Outcome),
}

#[derive(Debug)]
pub struct Round {
    state: RoundState,
    last_outcome: Option<Outcome>,
}

impl Default for Round {
    fn default() -> Self {
        Self::new()
    }
}

impl Round {
    pub fn new() -> Self {
        Self {
            state: RoundState::Idle,
            last_outcome: None,
        }
    }

    pub fn state(&self) -> RoundState {
        self.state
    }

    pub fn phase(&self) -> Phase {
        match self.state {
            RoundState::Idle => Phase::Idle,
            RoundState::Armed { .. } => Phase::Armed,
            RoundState::Ready { .. } => Phase::Ready,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, RoundState::Idle)
    }

    /// Outcome of the most recently resolved round, cleared by `start`.
    pub fn last_outcome(&self) -> Option<Outcome> {
        self.last_outcome
    }

    /// Arms a new round. Does nothing unless the round is Idle, so a double
    /// start never orphans a timer.
    pub fn start(
        &mut self,
        timers: &mut TimerService,
        delay: Duration,
        now: Instant,
    ) -> Option<Transition> {
        if !self.is_idle() {
            debug!(phase = %self.phase(), "start_ignored");
            return None;
        }

        let timer = timers.arm(delay, now);
        self.state = RoundState::Armed {
            armed_at: now,
            timer,
        };
        self.last_outcome = None;
        info!(delay_ms = delay.as_millis() as u64, "round_armed");
        Some(Transition::Armed { delay })
    }

    /// Delivers a fired timer. Handles that don't belong to the armed round
    /// are dropped.
    pub fn on_timer(&mut self, fired: TimerHandle, now: Instant) -> Option<Transition> {
        match self.state {
            RoundState::Armed { armed_at, timer } if timer == fired => {
                let ready_at = now.max(armed_at);
                self.state = RoundState::Ready { armed_at, ready_at };
                debug!(
                    waited_ms = ready_at.duration_since(armed_at).as_millis() as u64,
                    "round_ready"
                );
                Some(Transition::Ready)
            }
            _ => {
                debug!("stale_timer_dropped");
                None
            }
        }
    }

    /// A reaction signal received at `now`. While Armed this cancels the
    /// timer and resolves as `TooEarly`; while Ready it resolves as
    /// `Success`. Idle ignores it.
    ///
    /// An input received before `ready_at` was made before the cue was
    /// shown, even if it is only handled afterwards, so it is `TooEarly` too.
    pub fn interact(&mut self, timers: &mut TimerService, now: Instant) -> Option<Transition> {
        let outcome = match self.state {
            RoundState::Idle => return None,
            RoundState::Armed { timer, .. } => {
                timers.cancel(timer);
                Outcome::TooEarly
            }
            RoundState::Ready { ready_at, .. } if now < ready_at => {
                debug!(
                    early_by_ms = ready_at.duration_since(now).as_millis() as u64,
                    "input_predates_cue"
                );
                Outcome::TooEarly
            }
            RoundState::Ready { ready_at, .. } => Outcome::Success {
                reaction_time_ms: now.saturating_duration_since(ready_at).as_millis() as u64,
            },
        };

        self.state = RoundState::Idle;
        self.last_outcome = Some(outcome);
        info!(?outcome, "round_resolved");
        Some(Transition::Resolved(outcome))
    }

    /// Drops the current round without an outcome, cancelling any pending
    /// timer.
    pub fn abort(&mut self, timers: &mut TimerService) {
        if let RoundState::Armed { timer, .. } = self.state {
            timers.cancel(timer);
        }
        if !self.is_idle() {
            info!(phase = %self.phase(), "round_aborted");
        }
        self.state = RoundState::Idle;
    }
}
