//! Countdown engine implementation.
//!
//! The engine is a wall-clock-based state machine. It does not use
//! internal threads - the caller is responsible for calling `tick()`
//! periodically (nominally once per second).
//!
//! Remaining time is never decremented per tick. It is always recomputed
//! from the start anchor and the accumulated pause offset, so arbitrary
//! delay in tick delivery (suspended process, missed intervals) loses no
//! accuracy.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> Paused -> Running -> Idle (completed or reset)
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockState {
    Idle,
    Running,
    Paused,
}

/// Core countdown engine.
///
/// Operates on wall-clock reads -- no internal thread. The caller is
/// responsible for calling `tick()` periodically. Serializable so that
/// short-lived processes (the CLI) can persist it between invocations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockEngine {
    /// Nominal countdown length in seconds.
    duration_secs: u32,
    state: ClockState,
    /// Timestamp (ms since epoch) when the countdown was started.
    #[serde(default)]
    anchor_epoch_ms: Option<u64>,
    /// Timestamp (ms since epoch) of the pause instant, while paused.
    #[serde(default)]
    paused_at_epoch_ms: Option<u64>,
    /// Total time spent paused since `start`, folded in on each resume.
    #[serde(default)]
    accumulated_pause_ms: u64,
}

impl ClockEngine {
    /// Create a new engine in the `Idle` state.
    pub fn new(duration_secs: u32) -> Self {
        Self {
            duration_secs,
            state: ClockState::Idle,
            anchor_epoch_ms: None,
            paused_at_epoch_ms: None,
            accumulated_pause_ms: 0,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> ClockState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, ClockState::Running | ClockState::Paused)
    }

    pub fn is_paused(&self) -> bool {
        self.state == ClockState::Paused
    }

    pub fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    /// Whole seconds remaining, clamped at 0.
    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs_at(now_ms())
    }

    pub(crate) fn remaining_secs_at(&self, now_ms: u64) -> u32 {
        let elapsed_ms = match self.state {
            ClockState::Idle => return self.duration_secs,
            // While paused, elapsed time is frozen at the pause instant.
            ClockState::Paused => {
                let frozen = self.paused_at_epoch_ms.unwrap_or(now_ms);
                self.elapsed_ms_until(frozen)
            }
            ClockState::Running => self.elapsed_ms_until(now_ms),
        };
        let elapsed_secs = (elapsed_ms / 1000) as u32;
        self.duration_secs.saturating_sub(elapsed_secs)
    }

    fn elapsed_ms_until(&self, now_ms: u64) -> u64 {
        match self.anchor_epoch_ms {
            Some(anchor) => now_ms
                .saturating_sub(anchor)
                .saturating_sub(self.accumulated_pause_ms),
            None => 0,
        }
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            state: self.state,
            remaining_secs: self.remaining_secs(),
            duration_secs: self.duration_secs,
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Anchor the countdown at now and run. Restarting while active
    /// re-anchors from scratch.
    pub fn start(&mut self) -> Event {
        self.start_at(now_ms())
    }

    pub(crate) fn start_at(&mut self, now_ms: u64) -> Event {
        self.state = ClockState::Running;
        self.anchor_epoch_ms = Some(now_ms);
        self.paused_at_epoch_ms = None;
        self.accumulated_pause_ms = 0;
        Event::TimerStarted {
            duration_secs: self.duration_secs,
            at: Utc::now(),
        }
    }

    /// Freeze elapsed time. No-op unless running.
    pub fn pause(&mut self) -> Option<Event> {
        self.pause_at(now_ms())
    }

    pub(crate) fn pause_at(&mut self, now_ms: u64) -> Option<Event> {
        if self.state != ClockState::Running {
            return None;
        }
        self.state = ClockState::Paused;
        self.paused_at_epoch_ms = Some(now_ms);
        Some(Event::TimerPaused {
            remaining_secs: self.remaining_secs_at(now_ms),
            at: Utc::now(),
        })
    }

    /// Fold the pause gap into the accumulated offset and run again.
    /// No-op unless paused.
    pub fn resume(&mut self) -> Option<Event> {
        self.resume_at(now_ms())
    }

    pub(crate) fn resume_at(&mut self, now_ms: u64) -> Option<Event> {
        if self.state != ClockState::Paused {
            return None;
        }
        if let Some(paused_at) = self.paused_at_epoch_ms.take() {
            self.accumulated_pause_ms += now_ms.saturating_sub(paused_at);
        }
        self.state = ClockState::Running;
        Some(Event::TimerResumed {
            remaining_secs: self.remaining_secs_at(now_ms),
            at: Utc::now(),
        })
    }

    /// Return to `Idle` from any state. Remaining time is restored to the
    /// configured duration and no stale completion can fire afterwards.
    pub fn reset(&mut self) -> Event {
        self.state = ClockState::Idle;
        self.anchor_epoch_ms = None;
        self.paused_at_epoch_ms = None;
        self.accumulated_pause_ms = 0;
        Event::TimerReset { at: Utc::now() }
    }

    /// Call periodically. Returns `Some(Event::TimerCompleted)` exactly once
    /// per `start()` when the countdown reaches zero; the engine folds back
    /// to `Idle` at that point.
    pub fn tick(&mut self) -> Option<Event> {
        self.tick_at(now_ms())
    }

    pub(crate) fn tick_at(&mut self, now_ms: u64) -> Option<Event> {
        if self.state != ClockState::Running {
            return None;
        }
        if self.remaining_secs_at(now_ms) > 0 {
            return None;
        }
        self.state = ClockState::Idle;
        self.anchor_epoch_ms = None;
        self.paused_at_epoch_ms = None;
        self.accumulated_pause_ms = 0;
        Some(Event::TimerCompleted { at: Utc::now() })
    }
}

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
