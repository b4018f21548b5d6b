use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::ClockState;

/// Every timer transition produces an Event.
/// Consumers (CLI output, future GUI polling) read them as tagged JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        duration_secs: u32,
        at: DateTime<Utc>,
    },
    TimerPaused {
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    TimerResumed {
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    TimerCompleted {
        at: DateTime<Utc>,
    },
    TimerReset {
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: ClockState,
        remaining_secs: u32,
        duration_secs: u32,
        at: DateTime<Utc>,
    },
}
