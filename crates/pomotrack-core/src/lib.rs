//! # Pomotrack Core Library
//!
//! Core business logic for the Pomotrack productivity timer. All operations
//! are available through this library; the CLI binary is a thin layer over
//! the same core.
//!
//! ## Architecture
//!
//! - **Clock Engine**: a wall-clock-anchored countdown state machine that
//!   requires the caller to periodically invoke `tick()`. Remaining time is
//!   recomputed from anchors, never from tick counts, so delayed or missed
//!   ticks cost no accuracy.
//! - **Session Store**: versioned JSON envelope persisted with debounced,
//!   atomic-replace writes.
//! - **Orchestrator**: turns timer lifecycle transitions into session
//!   records, enforcing the at-most-one-current-session invariant.
//! - **Stats**: pure day/week/month/streak projections over the log.
//!
//! ## Key Components
//!
//! - [`ClockEngine`]: core timer state machine
//! - [`SessionStore`]: session log persistence
//! - [`Orchestrator`]: user-intent coordination
//! - [`StatsAggregator`]: derived statistics

pub mod error;
pub mod events;
pub mod orchestrator;
pub mod session;
pub mod stats;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, Result, StorageError};
pub use events::Event;
pub use orchestrator::{CompletionNotifier, NoopNotifier, Orchestrator};
pub use session::{Session, SessionStatus, SessionUpdate, Tag, TimerState};
pub use stats::{AggregateStats, DayStats, StatsAggregator};
pub use storage::{Config, Envelope, SessionStore, STORAGE_VERSION};
pub use timer::{ClockEngine, ClockState};
