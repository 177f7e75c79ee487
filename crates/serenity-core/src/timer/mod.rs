pub mod duration;
mod engine;
pub mod runner;
pub mod tick;

pub use duration::{format_clock, DurationChoice, DEFAULT_PRESETS_MIN};
pub use engine::{CompletedSession, SessionTimer, TimerPhase, TimerSnapshot};
pub use runner::{SessionHandle, SessionObserver, SessionRunner};
pub use tick::{IntervalTicks, ManualTickHandle, ManualTicks, TickSource, TICK_PERIOD};
