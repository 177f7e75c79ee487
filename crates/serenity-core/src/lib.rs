//! # Serenity Core Library
//!
//! This library provides the core logic for the Serenity meditation app.
//! The CLI binary is a thin front end over the same library.
//!
//! ## Architecture
//!
//! - **Session Timer**: A tick-driven countdown state machine. It owns no
//!   clock; a [`SessionRunner`] pairs it with an injectable tick source and
//!   notifies observers of progress, completion and cancellation
//! - **Settings**: Profile switches and ambient sound selection keyed by
//!   stable identifiers
//! - **Storage**: SQLite session log and TOML-based configuration
//! - **API**: REST client that attaches the stored bearer token
//!
//! ## Key Components
//!
//! - [`SessionTimer`]: Core timer state machine
//! - [`SessionRunner`] / [`SessionHandle`]: Async driver and its handle
//! - [`Database`]: Session history and statistics
//! - [`Config`]: Application configuration management
//! - [`ApiClient`]: Backend client

pub mod api;
pub mod error;
pub mod events;
pub mod settings;
pub mod storage;
pub mod timer;

pub use api::{ApiClient, KeyringTokenStore, MemoryTokenStore, TokenStore};
pub use error::{ApiError, ConfigError, CoreError, DatabaseError, TimerError};
pub use events::Event;
pub use settings::{Preference, Preferences, SoundId, SoundSettings};
pub use storage::{Config, Database};
pub use timer::{
    CompletedSession, DurationChoice, IntervalTicks, ManualTicks, SessionHandle, SessionObserver,
    SessionRunner, SessionTimer, TimerPhase, TimerSnapshot,
};
