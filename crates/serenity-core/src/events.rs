use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::TimerPhase;

/// Every session timer transition produces an Event.
/// Observers subscribe to them; the CLI prints them as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionConfigured {
        total_secs: u64,
        at: DateTime<Utc>,
    },
    TimerStarted {
        total_secs: u64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// One tick elapsed and the session is still running.
    Progress {
        remaining_secs: u64,
        total_secs: u64,
        progress: f64,
        at: DateTime<Utc>,
    },
    /// Remaining time reached zero. Emitted once per session.
    TimerCompleted {
        total_secs: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        /// Phase the timer was in before the reset.
        from: TimerPhase,
        total_secs: u64,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn is_completion(&self) -> bool {
        matches!(self, Event::TimerCompleted { .. })
    }
}
