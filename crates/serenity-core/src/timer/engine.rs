//! Session timer state machine.
//!
//! The timer counts down in whole ticks. It owns no clock and no thread:
//! whoever drives it (see [`super::runner`]) calls `tick()` once per period
//! while the timer is running.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused
//!           |
//!           +-> Completed        (remaining reaches 0)
//! any state -> Idle              (reset)
//! ```
//!
//! ## Usage
//!
//! ```
//! use serenity_core::timer::{SessionTimer, TimerPhase};
//!
//! let mut timer = SessionTimer::new(3).unwrap();
//! timer.start().unwrap();
//! for _ in 0..3 {
//!     timer.tick().unwrap();
//! }
//! assert_eq!(timer.phase(), TimerPhase::Completed);
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::TimerError;
use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerPhase {
    Idle,
    Running,
    Paused,
    Completed,
}

impl fmt::Display for TimerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TimerPhase::Idle => "idle",
            TimerPhase::Running => "running",
            TimerPhase::Paused => "paused",
            TimerPhase::Completed => "completed",
        };
        f.write_str(s)
    }
}

/// Point-in-time view of a timer, suitable for printing or shipping to a UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub phase: TimerPhase,
    pub total_secs: u64,
    pub remaining_secs: u64,
    pub progress: f64,
    pub started_at: Option<DateTime<Utc>>,
}

/// A finished session, ready to be recorded or uploaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedSession {
    pub duration_secs: u64,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

/// Countdown timer for a single meditation session.
///
/// Only built through [`SessionTimer::new`], so `remaining_secs <= total_secs`
/// always holds. [`TimerSnapshot`] is the serialized view.
#[derive(Debug, Clone)]
pub struct SessionTimer {
    phase: TimerPhase,
    total_secs: u64,
    remaining_secs: u64,
    /// Set on the first start after configure/reset.
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
}

impl SessionTimer {
    /// Create an idle timer for a session of `duration_secs`.
    ///
    /// # Errors
    /// Returns `InvalidArgument` if the duration is zero.
    pub fn new(duration_secs: u64) -> Result<Self, TimerError> {
        validate_duration(duration_secs)?;
        Ok(Self {
            phase: TimerPhase::Idle,
            total_secs: duration_secs,
            remaining_secs: duration_secs,
            started_at: None,
            completed_at: None,
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> TimerPhase {
        self.phase
    }

    pub fn total_secs(&self) -> u64 {
        self.total_secs
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.total_secs.saturating_sub(self.remaining_secs)
    }

    pub fn is_running(&self) -> bool {
        self.phase == TimerPhase::Running
    }

    /// 0.0 .. 1.0 progress through the session.
    pub fn progress(&self) -> f64 {
        if self.total_secs == 0 {
            return 0.0;
        }
        self.elapsed_secs() as f64 / self.total_secs as f64
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            phase: self.phase,
            total_secs: self.total_secs,
            remaining_secs: self.remaining_secs,
            progress: self.progress(),
            started_at: self.started_at,
        }
    }

    /// The finished session, once the timer has completed.
    pub fn completed_session(&self) -> Option<CompletedSession> {
        if self.phase != TimerPhase::Completed {
            return None;
        }
        let completed_at = self.completed_at?;
        Some(CompletedSession {
            duration_secs: self.total_secs,
            started_at: self.started_at.unwrap_or(completed_at),
            completed_at,
        })
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn configure(&mut self, duration_secs: u64) -> Result<Option<Event>, TimerError> {
        if self.phase != TimerPhase::Idle {
            return Err(self.rejected("configure"));
        }
        validate_duration(duration_secs)?;
        self.total_secs = duration_secs;
        self.remaining_secs = duration_secs;
        self.started_at = None;
        debug!(total_secs = duration_secs, "session configured");
        Ok(Some(Event::SessionConfigured {
            total_secs: duration_secs,
            at: Utc::now(),
        }))
    }

    pub fn start(&mut self) -> Result<Option<Event>, TimerError> {
        match self.phase {
            TimerPhase::Idle => {
                let now = Utc::now();
                self.phase = TimerPhase::Running;
                self.started_at = Some(now);
                debug!(total_secs = self.total_secs, "timer started");
                Ok(Some(Event::TimerStarted {
                    total_secs: self.total_secs,
                    at: now,
                }))
            }
            TimerPhase::Paused => {
                self.phase = TimerPhase::Running;
                debug!(remaining_secs = self.remaining_secs, "timer resumed");
                Ok(Some(Event::TimerResumed {
                    remaining_secs: self.remaining_secs,
                    at: Utc::now(),
                }))
            }
            TimerPhase::Running => Ok(None), // Already running.
            TimerPhase::Completed => Err(self.rejected("start")),
        }
    }

    pub fn pause(&mut self) -> Result<Option<Event>, TimerError> {
        match self.phase {
            TimerPhase::Running => {
                self.phase = TimerPhase::Paused;
                debug!(remaining_secs = self.remaining_secs, "timer paused");
                Ok(Some(Event::TimerPaused {
                    remaining_secs: self.remaining_secs,
                    at: Utc::now(),
                }))
            }
            TimerPhase::Idle | TimerPhase::Paused => Ok(None),
            TimerPhase::Completed => Err(self.rejected("pause")),
        }
    }

    /// Return to `Idle` with the full duration restored. Valid in every phase.
    pub fn reset(&mut self) -> Event {
        let from = self.phase;
        self.phase = TimerPhase::Idle;
        self.remaining_secs = self.total_secs;
        self.started_at = None;
        self.completed_at = None;
        debug!(%from, "timer reset");
        Event::TimerReset {
            from,
            total_secs: self.total_secs,
            at: Utc::now(),
        }
    }

    /// Advance by one tick. Ignored unless running.
    ///
    /// Returns `Event::TimerCompleted` on the tick that reaches zero and
    /// `Event::Progress` on every other running tick.
    pub fn tick(&mut self) -> Result<Option<Event>, TimerError> {
        if self.phase != TimerPhase::Running {
            return Ok(None);
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        let now = Utc::now();
        if self.remaining_secs == 0 {
            self.phase = TimerPhase::Completed;
            self.completed_at = Some(now);
            debug!(total_secs = self.total_secs, "timer completed");
            return Ok(Some(Event::TimerCompleted {
                total_secs: self.total_secs,
                at: now,
            }));
        }
        Ok(Some(Event::Progress {
            remaining_secs: self.remaining_secs,
            total_secs: self.total_secs,
            progress: self.progress(),
            at: now,
        }))
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn rejected(&self, operation: &'static str) -> TimerError {
        TimerError::InvalidState {
            operation,
            phase: self.phase,
        }
    }
}

fn validate_duration(duration_secs: u64) -> Result<(), TimerError> {
    if duration_secs == 0 {
        return Err(TimerError::InvalidArgument(
            "session duration must be greater than zero".into(),
        ));
    }
    Ok(())
}
