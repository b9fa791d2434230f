//! Per-step decision countdown.
//!
//! The timer is a plain state machine; it does not sleep. The session's
//! driver task calls [`DecisionTimer::tick`] once per second and acts on
//! the returned [`TickOutcome`].
//!
//! ```text
//!   IDLE --start--> RUNNING --tick(0)--> EXPIRED
//!                    |   ^
//!             suspend|   |resume
//!                    v   |
//!                  SUSPENDED
//! ```
//!
//! `stop` returns to IDLE from anywhere; `start` always restarts from the
//! full limit.

use crisis72_types::{TimerPhase, TimerStatus};

/// Errors that can occur when building a timer.
#[derive(Debug, thiserror::Error)]
pub enum TimerError {
    /// Invalid timer configuration (e.g. a zero limit).
    #[error("invalid timer configuration: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The timer was not running; nothing changed.
    Ignored,
    /// One second elapsed; the value is the remaining seconds.
    Counting(u32),
    /// The countdown reached zero on this tick. Reported exactly once.
    Expired,
}

/// Countdown bound to the step currently on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionTimer {
    phase: TimerPhase,
    remaining: u32,
    limit: u32,
    urgent_threshold: u32,
}

impl DecisionTimer {
    /// Create an idle timer.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::InvalidConfig`] if `limit_secs` is zero.
    pub fn new(limit_secs: u32, urgent_threshold_secs: u32) -> Result<Self, TimerError> {
        if limit_secs == 0 {
            return Err(TimerError::InvalidConfig {
                reason: "decision time limit must be at least 1 second".to_owned(),
            });
        }
        Ok(Self {
            phase: TimerPhase::Idle,
            remaining: limit_secs,
            limit: limit_secs,
            urgent_threshold: urgent_threshold_secs,
        })
    }

    /// Reset to the full limit and start counting.
    pub const fn start(&mut self) {
        self.remaining = self.limit;
        self.phase = TimerPhase::Running;
    }

    /// Pause while a request is in flight. Only affects a running timer.
    pub fn suspend(&mut self) {
        if self.phase == TimerPhase::Running {
            self.phase = TimerPhase::Suspended;
        }
    }

    /// Continue a suspended countdown with the preserved remaining time.
    pub fn resume(&mut self) {
        if self.phase == TimerPhase::Suspended {
            self.phase = TimerPhase::Running;
        }
    }

    /// Go idle (no step on screen, or the run is over).
    pub const fn stop(&mut self) {
        self.phase = TimerPhase::Idle;
    }

    /// Advance one second.
    pub fn tick(&mut self) -> TickOutcome {
        if self.phase != TimerPhase::Running {
            return TickOutcome::Ignored;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.phase = TimerPhase::Expired;
            TickOutcome::Expired
        } else {
            TickOutcome::Counting(self.remaining)
        }
    }

    /// Current lifecycle phase.
    pub const fn phase(&self) -> TimerPhase {
        self.phase
    }

    /// Seconds left.
    pub const fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Configured limit in seconds.
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Running with at most the urgent threshold left.
    pub fn is_urgent(&self) -> bool {
        self.phase == TimerPhase::Running && self.remaining <= self.urgent_threshold
    }

    /// Observable status for snapshots and tick events.
    pub fn status(&self) -> TimerStatus {
        TimerStatus {
            phase: self.phase,
            remaining_secs: self.remaining,
            limit_secs: self.limit,
            urgent: self.is_urgent(),
        }
    }
}
