use serde::{Deserialize, Serialize};

use crate::error::TimerError;

/// Session lengths offered before the user picks a custom one.
pub const DEFAULT_PRESETS_MIN: [u64; 5] = [5, 10, 15, 20, 30];

/// How the user chose a session length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum DurationChoice {
    /// Index into the preset list.
    Preset(usize),
    Minutes(u64),
    Seconds(u64),
}

impl DurationChoice {
    /// Resolve to a positive number of seconds.
    ///
    /// # Errors
    /// Returns `InvalidArgument` for an unknown preset or a zero length.
    pub fn resolve(&self, presets_min: &[u64]) -> Result<u64, TimerError> {
        let secs = match *self {
            DurationChoice::Preset(index) => {
                let minutes = presets_min.get(index).ok_or_else(|| {
                    TimerError::InvalidArgument(format!(
                        "no preset #{index} (have {})",
                        presets_min.len()
                    ))
                })?;
                minutes.saturating_mul(60)
            }
            DurationChoice::Minutes(minutes) => minutes.saturating_mul(60),
            DurationChoice::Seconds(secs) => secs,
        };
        if secs == 0 {
            return Err(TimerError::InvalidArgument(
                "session duration must be greater than zero".into(),
            ));
        }
        Ok(secs)
    }
}

/// Render seconds as `MM:SS`, or `H:MM:SS` past an hour.
pub fn format_clock(secs: u64) -> String {
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}
